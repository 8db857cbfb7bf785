use std::collections::HashMap;

use chrono::Local;
use crossterm::event::KeyEvent;
use ratatui::buffer::Buffer;
use ratatui::layout::Position;
use tracing::trace;

use super::border::render_border;
use super::canvas::{Canvas, to_rect};
use super::focus::{FocusManager, FocusTarget};
use super::panels::{Panel, PanelContext, PanelKind, ViewModel, top_panels};
use crate::config::CanvasConfig;
use crate::glyphs::{Glyphs, TreeGlyphs};
use crate::layout::{LayoutError, LayoutTree, NodeId};
use crate::system::Collector;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenState {
    /// Built, but no terminal size known yet.
    Constructed,
    LaidOut,
    Terminal,
}

#[derive(Debug)]
struct PanelSlot {
    /// The panel's own leaf.
    node: NodeId,
    /// The titled border around it.
    frame: NodeId,
    panel: Panel,
}

/// Owns the widget tree: a column of three rows (status boxes, the process
/// tree, details of the selected process).
#[derive(Debug)]
pub struct Screen {
    tree: LayoutTree,
    root: NodeId,
    slots: Vec<PanelSlot>,
    by_node: HashMap<NodeId, usize>,
    focus: FocusManager,
    state: ScreenState,
    size: (u16, u16),
    glyphs: Glyphs,
    tree_glyphs: TreeGlyphs,
    canvas: CanvasConfig,
    view: ViewModel,
}

impl Screen {
    pub fn new(
        collector: &Collector,
        glyphs: Glyphs,
        canvas: CanvasConfig,
    ) -> Result<Self, LayoutError> {
        let rows = vec![
            top_panels(collector),
            vec![Panel::new(PanelKind::Processes, "Processes")],
            vec![Panel::new(PanelKind::ProcessDetails, "Process Details")],
        ];

        let mut tree = LayoutTree::new();
        let root = tree.add_vertical_flow();
        let mut slots = Vec::new();
        for panels in rows {
            let row = tree.add_horizontal_flow();
            tree.push_child(root, row)?;
            for panel in panels {
                let node = tree.add_leaf();
                tree.set_stretch_x(node, true)?;
                tree.set_stretch_y(node, panel.stretch_y())?;
                let frame = tree.add_border(node)?;
                tree.push_child(row, frame)?;
                slots.push(PanelSlot { node, frame, panel });
            }
        }
        let by_node: HashMap<NodeId, usize> = slots
            .iter()
            .enumerate()
            .map(|(i, slot)| (slot.node, i))
            .collect();

        let targets = tree
            .preorder(root)
            .into_iter()
            .filter_map(|node| by_node.get(&node).map(|&i| (node, slots[i].panel.part_count())))
            .flat_map(|(node, parts)| (0..parts).map(move |part| FocusTarget { node, part }))
            .collect();

        let tree_glyphs = TreeGlyphs::from_glyphs(&glyphs);
        let mut screen = Self {
            tree,
            root,
            slots,
            by_node,
            focus: FocusManager::new(targets),
            state: ScreenState::Constructed,
            size: (0, 0),
            glyphs,
            tree_glyphs,
            canvas,
            view: ViewModel::default(),
        };
        screen.update_from_model(collector)?;
        Ok(screen)
    }

    pub fn state(&self) -> ScreenState {
        self.state
    }

    pub fn view(&self) -> &ViewModel {
        &self.view
    }

    pub fn focus(&self) -> &FocusManager {
        &self.focus
    }

    pub fn panels(&self) -> impl Iterator<Item = &Panel> {
        self.slots.iter().map(|slot| &slot.panel)
    }

    pub fn layout_tree(&self) -> &LayoutTree {
        &self.tree
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Refills every panel, top to bottom, and pushes the new minimum sizes
    /// into the layout tree. Unchanged sizes leave the tree valid.
    pub fn update_from_model(&mut self, collector: &Collector) -> Result<(), LayoutError> {
        let ctx = PanelContext {
            collector,
            delta: collector.delta(),
            glyphs: &self.glyphs,
            tree_glyphs: &self.tree_glyphs,
            now: Local::now(),
        };
        for slot in &mut self.slots {
            slot.panel.update_from_model(&ctx, &mut self.view);
            let (width, height) = slot.panel.min_size();
            self.tree.set_min_size(slot.node, width, height)?;
        }
        Ok(())
    }

    /// Re-lays out only when something changed since the last layout.
    pub fn tick(&mut self) {
        if self.state == ScreenState::LaidOut && !self.tree.is_valid(self.root) {
            self.relayout();
        }
    }

    /// Always re-lays out, whatever the validity flags say. The size is
    /// capped by the canvas ceilings.
    pub fn resize(&mut self, width: u16, height: u16) {
        if self.state == ScreenState::Terminal {
            return;
        }
        self.size = (
            width.min(self.canvas.max_width),
            height.min(self.canvas.max_height),
        );
        self.state = ScreenState::LaidOut;
        self.relayout();
    }

    pub fn close(&mut self) {
        self.state = ScreenState::Terminal;
    }

    fn relayout(&mut self) {
        let (width, height) = self.size;
        self.tree.layout(self.root, width, height);
        for slot in &mut self.slots {
            let area = self.tree.area(slot.node);
            slot.panel.layout(area.width, area.height);
        }
        for line in self.tree.describe(self.root) {
            trace!(target: "jill::layout", "{line}");
        }
    }

    pub fn focus_next(&mut self) {
        self.focus.next();
    }

    pub fn focus_prev(&mut self) {
        self.focus.prev();
    }

    /// Sends `key` to the focused part. Returns whether it was consumed.
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        let Some(target) = self.focus.current() else {
            return false;
        };
        let Some(&index) = self.by_node.get(&target.node) else {
            return false;
        };
        self.slots[index].panel.handle_key(target.part, key)
    }

    /// Draws every panel and returns where the terminal cursor belongs, if
    /// the focused part has a caret.
    pub fn paint(&self, buf: &mut Buffer) -> Option<Position> {
        if self.state != ScreenState::LaidOut {
            return None;
        }
        let mut canvas = Canvas::new(buf, self.canvas);
        for slot in &self.slots {
            let focused = self.focus.focused_part(slot.node);
            let frame = to_rect(self.tree.absolute_area(slot.frame));
            render_border(
                &mut canvas,
                frame,
                slot.panel.title(),
                focused.is_some(),
                &self.glyphs,
            );
            let inner = to_rect(self.tree.absolute_area(slot.node));
            slot.panel.render(&mut canvas, inner, focused);
        }

        let target = self.focus.current()?;
        let slot = &self.slots[*self.by_node.get(&target.node)?];
        let inner = to_rect(self.tree.absolute_area(slot.node));
        slot.panel
            .cursor(inner, target.part)
            .filter(|pos| canvas.bounds().contains(*pos))
    }
}
