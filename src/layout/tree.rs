use thiserror::Error;

use super::split::split_evenly;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Position and size of a node, relative to its parent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Area {
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
}

impl Area {
    pub fn new(x: u16, y: u16, width: u16, height: u16) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Leaf,
    HorizontalFlow(Vec<NodeId>),
    VerticalFlow(Vec<NodeId>),
    /// One cell of margin on every side of the single child.
    Border(NodeId),
}

impl NodeKind {
    pub fn name(&self) -> &'static str {
        match self {
            NodeKind::Leaf => "Leaf",
            NodeKind::HorizontalFlow(_) => "HorizontalFlow",
            NodeKind::VerticalFlow(_) => "VerticalFlow",
            NodeKind::Border(_) => "Border",
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LayoutError {
    #[error("{property} of node {node:?} is derived from its children and cannot be set")]
    DerivedProperty {
        node: NodeId,
        property: &'static str,
    },
    #[error("node {0:?} already has a parent")]
    AlreadyParented(NodeId),
    #[error("node {0:?} cannot hold children")]
    NotAContainer(NodeId),
}

#[derive(Debug, Clone)]
struct Node {
    kind: NodeKind,
    parent: Option<NodeId>,
    min_width: u16,
    min_height: u16,
    stretch_x: bool,
    stretch_y: bool,
    area: Area,
    valid: bool,
}

impl Node {
    fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            parent: None,
            min_width: 0,
            min_height: 0,
            stretch_x: false,
            stretch_y: false,
            area: Area::default(),
            valid: false,
        }
    }
}

/// Arena of layout nodes. Parents are stored as ids, children as id lists,
/// so the tree never holds owning back-references.
///
/// Leaves carry their own min size and stretch flags. Containers derive
/// theirs from their children:
///
/// | kind           | min_width        | min_height       | stretch_x | stretch_y |
/// |----------------|------------------|------------------|-----------|-----------|
/// | HorizontalFlow | sum              | max              | own       | any child |
/// | VerticalFlow   | max              | sum              | any child | own       |
/// | Border         | child + 2        | child + 2        | child's   | child's   |
///
/// Every mutation calls [`LayoutTree::mark_dirty`], which invalidates the node
/// and each of its ancestors so the next paint knows to re-run [`LayoutTree::layout`].
#[derive(Debug, Clone, Default)]
pub struct LayoutTree {
    nodes: Vec<Node>,
}

impl LayoutTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn add_leaf(&mut self) -> NodeId {
        self.push(Node::new(NodeKind::Leaf))
    }

    pub fn add_horizontal_flow(&mut self) -> NodeId {
        self.push(Node::new(NodeKind::HorizontalFlow(Vec::new())))
    }

    pub fn add_vertical_flow(&mut self) -> NodeId {
        self.push(Node::new(NodeKind::VerticalFlow(Vec::new())))
    }

    pub fn add_border(&mut self, child: NodeId) -> Result<NodeId, LayoutError> {
        if self.nodes[child.0].parent.is_some() {
            return Err(LayoutError::AlreadyParented(child));
        }
        let id = self.push(Node::new(NodeKind::Border(child)));
        self.nodes[child.0].parent = Some(id);
        Ok(id)
    }

    pub fn push_child(&mut self, container: NodeId, child: NodeId) -> Result<(), LayoutError> {
        if self.nodes[child.0].parent.is_some() {
            return Err(LayoutError::AlreadyParented(child));
        }
        match &mut self.nodes[container.0].kind {
            NodeKind::HorizontalFlow(children) | NodeKind::VerticalFlow(children) => {
                children.push(child);
            }
            NodeKind::Leaf | NodeKind::Border(_) => {
                return Err(LayoutError::NotAContainer(container));
            }
        }
        self.nodes[child.0].parent = Some(container);
        self.mark_dirty(container);
        Ok(())
    }

    fn push(&mut self, node: Node) -> NodeId {
        self.nodes.push(node);
        NodeId(self.nodes.len() - 1)
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.0].kind
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        match &self.nodes[id.0].kind {
            NodeKind::Leaf => &[],
            NodeKind::HorizontalFlow(children) | NodeKind::VerticalFlow(children) => children,
            NodeKind::Border(child) => std::slice::from_ref(child),
        }
    }

    pub fn min_width(&self, id: NodeId) -> u16 {
        let node = &self.nodes[id.0];
        match &node.kind {
            NodeKind::Leaf => node.min_width,
            NodeKind::HorizontalFlow(children) => children
                .iter()
                .fold(0u16, |acc, c| acc.saturating_add(self.min_width(*c))),
            NodeKind::VerticalFlow(children) => {
                children.iter().map(|c| self.min_width(*c)).max().unwrap_or(0)
            }
            NodeKind::Border(child) => self.min_width(*child).saturating_add(2),
        }
    }

    pub fn min_height(&self, id: NodeId) -> u16 {
        let node = &self.nodes[id.0];
        match &node.kind {
            NodeKind::Leaf => node.min_height,
            NodeKind::HorizontalFlow(children) => children
                .iter()
                .map(|c| self.min_height(*c))
                .max()
                .unwrap_or(0),
            NodeKind::VerticalFlow(children) => children
                .iter()
                .fold(0u16, |acc, c| acc.saturating_add(self.min_height(*c))),
            NodeKind::Border(child) => self.min_height(*child).saturating_add(2),
        }
    }

    pub fn stretch_x(&self, id: NodeId) -> bool {
        let node = &self.nodes[id.0];
        match &node.kind {
            NodeKind::VerticalFlow(children) => children.iter().any(|c| self.stretch_x(*c)),
            NodeKind::Border(child) => self.stretch_x(*child),
            NodeKind::Leaf | NodeKind::HorizontalFlow(_) => node.stretch_x,
        }
    }

    pub fn stretch_y(&self, id: NodeId) -> bool {
        let node = &self.nodes[id.0];
        match &node.kind {
            NodeKind::HorizontalFlow(children) => children.iter().any(|c| self.stretch_y(*c)),
            NodeKind::Border(child) => self.stretch_y(*child),
            NodeKind::Leaf | NodeKind::VerticalFlow(_) => node.stretch_y,
        }
    }

    /// Sets the intrinsic min size of a leaf. Unchanged values leave the
    /// layout valid.
    pub fn set_min_size(&mut self, id: NodeId, width: u16, height: u16) -> Result<(), LayoutError> {
        if !matches!(self.nodes[id.0].kind, NodeKind::Leaf) {
            return Err(LayoutError::DerivedProperty {
                node: id,
                property: "min size",
            });
        }
        let node = &mut self.nodes[id.0];
        if node.min_width != width || node.min_height != height {
            node.min_width = width;
            node.min_height = height;
            self.mark_dirty(id);
        }
        Ok(())
    }

    pub fn set_stretch_x(&mut self, id: NodeId, stretch: bool) -> Result<(), LayoutError> {
        match self.nodes[id.0].kind {
            NodeKind::VerticalFlow(_) => Err(LayoutError::DerivedProperty {
                node: id,
                property: "stretch_x",
            }),
            NodeKind::Border(child) => self.set_stretch_x(child, stretch),
            NodeKind::Leaf | NodeKind::HorizontalFlow(_) => {
                if self.nodes[id.0].stretch_x != stretch {
                    self.nodes[id.0].stretch_x = stretch;
                    self.mark_dirty(id);
                }
                Ok(())
            }
        }
    }

    pub fn set_stretch_y(&mut self, id: NodeId, stretch: bool) -> Result<(), LayoutError> {
        match self.nodes[id.0].kind {
            NodeKind::HorizontalFlow(_) => Err(LayoutError::DerivedProperty {
                node: id,
                property: "stretch_y",
            }),
            NodeKind::Border(child) => self.set_stretch_y(child, stretch),
            NodeKind::Leaf | NodeKind::VerticalFlow(_) => {
                if self.nodes[id.0].stretch_y != stretch {
                    self.nodes[id.0].stretch_y = stretch;
                    self.mark_dirty(id);
                }
                Ok(())
            }
        }
    }

    /// Invalidates `id` and every ancestor up to the root.
    pub fn mark_dirty(&mut self, id: NodeId) {
        let mut current = Some(id);
        while let Some(node_id) = current {
            let node = &mut self.nodes[node_id.0];
            node.valid = false;
            current = node.parent;
        }
    }

    /// A border has no layout state of its own; it mirrors its child.
    pub fn is_valid(&self, id: NodeId) -> bool {
        match self.nodes[id.0].kind {
            NodeKind::Border(child) => self.is_valid(child),
            _ => self.nodes[id.0].valid,
        }
    }

    pub fn area(&self, id: NodeId) -> Area {
        self.nodes[id.0].area
    }

    /// Area with the offsets of every ancestor applied.
    pub fn absolute_area(&self, id: NodeId) -> Area {
        let mut area = self.nodes[id.0].area;
        let mut current = self.nodes[id.0].parent;
        while let Some(parent) = current {
            let parent_area = self.nodes[parent.0].area;
            area.x = area.x.saturating_add(parent_area.x);
            area.y = area.y.saturating_add(parent_area.y);
            current = self.nodes[parent.0].parent;
        }
        area
    }

    /// Assigns `width` x `height` to `id`, recursively lays out its children
    /// and marks the subtree valid. The node keeps the position its parent gave it.
    pub fn layout(&mut self, id: NodeId, width: u16, height: u16) {
        {
            let area = &mut self.nodes[id.0].area;
            area.width = width;
            area.height = height;
        }
        match self.nodes[id.0].kind.clone() {
            NodeKind::Leaf => {}
            NodeKind::HorizontalFlow(children) => self.layout_horizontal(&children, width, height),
            NodeKind::VerticalFlow(children) => self.layout_vertical(&children, width, height),
            NodeKind::Border(child) => {
                self.place(child, 1, 1);
                self.layout(child, width.saturating_sub(2), height.saturating_sub(2));
            }
        }
        self.nodes[id.0].valid = true;
    }

    fn layout_horizontal(&mut self, children: &[NodeId], width: u16, height: u16) {
        let sum_min = children
            .iter()
            .fold(0u16, |acc, c| acc.saturating_add(self.min_width(*c)));
        let stretchable = children.iter().filter(|c| self.stretch_x(**c)).count();
        let mut shares = split_evenly(width.saturating_sub(sum_min), stretchable).into_iter();

        let mut x = 0u16;
        for &child in children {
            let mut child_width = self.min_width(child);
            if self.stretch_x(child) {
                child_width = child_width.saturating_add(shares.next().unwrap_or(0));
            }
            self.place(child, x, 0);
            self.layout(child, child_width, height);
            x = x.saturating_add(child_width);
        }
    }

    fn layout_vertical(&mut self, children: &[NodeId], width: u16, height: u16) {
        let sum_min = children
            .iter()
            .fold(0u16, |acc, c| acc.saturating_add(self.min_height(*c)));
        let stretchable = children.iter().filter(|c| self.stretch_y(**c)).count();
        let mut shares = split_evenly(height.saturating_sub(sum_min), stretchable).into_iter();

        let mut y = 0u16;
        for &child in children {
            let mut row_height = self.min_height(child);
            if self.stretch_y(child) {
                row_height = row_height.saturating_add(shares.next().unwrap_or(0));
            }
            self.place(child, 0, y);
            self.layout(child, width, row_height);
            y = y.saturating_add(row_height);
        }
    }

    fn place(&mut self, id: NodeId, x: u16, y: u16) {
        let area = &mut self.nodes[id.0].area;
        area.x = x;
        area.y = y;
    }

    /// Pre-order list of `root` and all its descendants.
    pub fn preorder(&self, root: NodeId) -> Vec<NodeId> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            out.push(id);
            for child in self.children(id).iter().rev() {
                stack.push(*child);
            }
        }
        out
    }

    /// One indented line per node: kind, area and validity.
    pub fn describe(&self, root: NodeId) -> Vec<String> {
        let mut lines = Vec::new();
        self.describe_into(root, 0, &mut lines);
        lines
    }

    fn describe_into(&self, id: NodeId, indent: usize, lines: &mut Vec<String>) {
        let node = &self.nodes[id.0];
        let a = node.area;
        let role = match node.kind {
            NodeKind::Leaf => "Component",
            _ => "Container",
        };
        lines.push(format!(
            "{}{role}[{}]({}, {})-({}, {}) {{layout {}}}",
            " ".repeat(indent),
            node.kind.name(),
            a.x,
            a.y,
            a.x + a.width,
            a.y + a.height,
            self.is_valid(id)
        ));
        for child in self.children(id) {
            self.describe_into(*child, indent + 1, lines);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(tree: &mut LayoutTree, w: u16, h: u16, sx: bool, sy: bool) -> NodeId {
        let id = tree.add_leaf();
        tree.set_min_size(id, w, h).unwrap();
        tree.set_stretch_x(id, sx).unwrap();
        tree.set_stretch_y(id, sy).unwrap();
        id
    }

    #[test]
    fn horizontal_flow_gives_surplus_to_stretchers() {
        let mut tree = LayoutTree::new();
        let row = tree.add_horizontal_flow();
        let a = leaf(&mut tree, 10, 1, false, false);
        let b = leaf(&mut tree, 20, 1, true, false);
        tree.push_child(row, a).unwrap();
        tree.push_child(row, b).unwrap();

        tree.layout(row, 50, 5);

        assert_eq!(tree.area(a), Area::new(0, 0, 10, 5));
        assert_eq!(tree.area(b), Area::new(10, 0, 40, 5));
        assert_eq!(tree.area(a).width + tree.area(b).width, 50);
    }

    #[test]
    fn horizontal_flow_overflows_when_too_narrow() {
        let mut tree = LayoutTree::new();
        let row = tree.add_horizontal_flow();
        let a = leaf(&mut tree, 10, 1, true, false);
        let b = leaf(&mut tree, 20, 1, true, false);
        tree.push_child(row, a).unwrap();
        tree.push_child(row, b).unwrap();

        tree.layout(row, 15, 1);

        assert_eq!(tree.area(a).width, 10);
        assert_eq!(tree.area(b).width, 20);
    }

    #[test]
    fn horizontal_flow_derives_height_and_vertical_stretch() {
        let mut tree = LayoutTree::new();
        let row = tree.add_horizontal_flow();
        let a = leaf(&mut tree, 1, 3, false, false);
        let b = leaf(&mut tree, 1, 7, false, true);
        tree.push_child(row, a).unwrap();
        tree.push_child(row, b).unwrap();

        assert_eq!(tree.min_height(row), 7);
        assert_eq!(tree.min_width(row), 2);
        assert!(tree.stretch_y(row));
        assert_eq!(
            tree.set_stretch_y(row, false),
            Err(LayoutError::DerivedProperty {
                node: row,
                property: "stretch_y"
            })
        );
    }

    #[test]
    fn vertical_flow_stretches_rows_and_keeps_full_width() {
        let mut tree = LayoutTree::new();
        let column = tree.add_vertical_flow();
        let top = leaf(&mut tree, 5, 2, false, false);
        let mid = leaf(&mut tree, 5, 3, false, true);
        let low = leaf(&mut tree, 5, 2, false, false);
        for child in [top, mid, low] {
            tree.push_child(column, child).unwrap();
        }

        tree.layout(column, 40, 20);

        assert_eq!(tree.area(top), Area::new(0, 0, 40, 2));
        assert_eq!(tree.area(mid), Area::new(0, 2, 40, 16));
        assert_eq!(tree.area(low), Area::new(0, 18, 40, 2));
        assert!(tree.set_stretch_x(column, true).is_err());
    }

    #[test]
    fn border_adds_margin_and_forwards_stretch() {
        let mut tree = LayoutTree::new();
        let inner = leaf(&mut tree, 8, 3, false, false);
        let border = tree.add_border(inner).unwrap();

        assert_eq!(tree.min_width(border), 10);
        assert_eq!(tree.min_height(border), 5);

        tree.set_stretch_x(border, true).unwrap();
        assert!(tree.stretch_x(inner));
        assert!(tree.stretch_x(border));

        tree.layout(border, 20, 6);
        assert_eq!(tree.area(inner), Area::new(1, 1, 18, 4));
        assert!(tree.is_valid(border));

        tree.mark_dirty(inner);
        assert!(!tree.is_valid(border));
    }

    #[test]
    fn border_rejects_an_already_parented_child() {
        let mut tree = LayoutTree::new();
        let row = tree.add_horizontal_flow();
        let a = tree.add_leaf();
        tree.push_child(row, a).unwrap();
        assert_eq!(tree.add_border(a), Err(LayoutError::AlreadyParented(a)));
        assert_eq!(tree.push_child(a, row), Err(LayoutError::AlreadyParented(row)));
    }

    #[test]
    fn dirty_marks_reach_the_root() {
        let mut tree = LayoutTree::new();
        let root = tree.add_vertical_flow();
        let row = tree.add_horizontal_flow();
        let a = leaf(&mut tree, 4, 1, true, false);
        let framed = tree.add_border(a).unwrap();
        tree.push_child(row, framed).unwrap();
        tree.push_child(root, row).unwrap();
        tree.layout(root, 30, 10);
        assert!(tree.is_valid(root));

        // Same value: nothing to do
        tree.set_min_size(a, 4, 1).unwrap();
        assert!(tree.is_valid(root));

        tree.set_min_size(a, 6, 1).unwrap();
        assert!(!tree.is_valid(a));
        assert!(!tree.is_valid(row));
        assert!(!tree.is_valid(root));
    }

    #[test]
    fn containers_reject_min_size() {
        let mut tree = LayoutTree::new();
        let row = tree.add_horizontal_flow();
        assert!(matches!(
            tree.set_min_size(row, 1, 1),
            Err(LayoutError::DerivedProperty { .. })
        ));
    }

    #[test]
    fn absolute_area_accumulates_offsets() {
        let mut tree = LayoutTree::new();
        let root = tree.add_vertical_flow();
        let first = leaf(&mut tree, 1, 3, false, false);
        let row = tree.add_horizontal_flow();
        let pad = leaf(&mut tree, 5, 1, false, false);
        let target = leaf(&mut tree, 2, 2, false, false);
        let framed = tree.add_border(target).unwrap();
        tree.push_child(row, pad).unwrap();
        tree.push_child(row, framed).unwrap();
        tree.push_child(root, first).unwrap();
        tree.push_child(root, row).unwrap();

        tree.layout(root, 20, 10);

        assert_eq!(tree.absolute_area(target), Area::new(6, 4, 2, 2));
    }

    #[test]
    fn preorder_and_describe_walk_children_in_order() {
        let mut tree = LayoutTree::new();
        let root = tree.add_vertical_flow();
        let a = tree.add_leaf();
        let b = tree.add_leaf();
        let framed = tree.add_border(b).unwrap();
        tree.push_child(root, a).unwrap();
        tree.push_child(root, framed).unwrap();

        assert_eq!(tree.preorder(root), vec![root, a, framed, b]);

        tree.layout(root, 10, 4);
        let lines = tree.describe(root);
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "Container[VerticalFlow](0, 0)-(10, 4) {layout true}");
        assert_eq!(lines[1], " Component[Leaf](0, 0)-(10, 0) {layout true}");
        assert!(lines[2].starts_with(" Container[Border]"));
        assert!(lines[3].starts_with("  Component[Leaf](1, 1)"));
    }
}
