use crossterm::event::{KeyCode, KeyEvent};
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use unicode_width::UnicodeWidthStr;

use super::canvas::Canvas;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableColumn {
    pub caption: String,
    pub min_width: Option<u16>,
    pub max_width: Option<u16>,
    pub visible: bool,
}

impl TableColumn {
    pub fn new(caption: &str) -> Self {
        Self {
            caption: caption.to_string(),
            min_width: None,
            max_width: None,
            visible: true,
        }
    }

    pub fn min_width(mut self, width: u16) -> Self {
        self.min_width = Some(width);
        self
    }

    pub fn max_width(mut self, width: u16) -> Self {
        self.max_width = Some(width);
        self
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TableOptions {
    pub row_limit: Option<u16>,
    pub show_header: bool,
    /// Keep a marker on the selection while unfocused.
    pub always_highlight: bool,
}

/// Rows of string cells with auto-sizing columns, a selected row and
/// vertical scrolling that keeps the selection on screen.
#[derive(Debug, Clone, Default)]
pub struct Table {
    columns: Vec<TableColumn>,
    widths: Vec<u16>,
    rows: Vec<Vec<String>>,
    selected: usize,
    options: TableOptions,
    height: u16,
}

impl Table {
    pub fn new(columns: Vec<TableColumn>, options: TableOptions) -> Self {
        let widths = columns
            .iter()
            .map(|c| if c.visible { c.min_width.unwrap_or(0) } else { 0 })
            .collect();
        Self {
            columns,
            widths,
            options,
            ..Default::default()
        }
    }

    pub fn columns(&self) -> &[TableColumn] {
        &self.columns
    }

    pub fn column_width(&self, col: usize) -> Option<u16> {
        self.widths.get(col).copied()
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn value(&self, row: usize, col: usize) -> Option<&str> {
        self.rows.get(row)?.get(col).map(String::as_str)
    }

    pub fn header_rows(&self) -> u16 {
        u16::from(self.options.show_header)
    }

    pub fn clear(&mut self) {
        self.rows.clear();
    }

    /// Widths only grow, up to the column's max width.
    pub fn set_value(&mut self, row: usize, col: usize, value: impl Into<String>) {
        let value = value.into();
        while self.columns.len() <= col {
            self.columns.push(TableColumn::new(""));
            self.widths.push(0);
        }
        if self.rows.len() <= row {
            self.rows.resize_with(row + 1, Vec::new);
        }
        let cells = &mut self.rows[row];
        if cells.len() <= col {
            cells.resize(col + 1, String::new());
        }

        let column = &self.columns[col];
        if column.visible {
            let mut width = value.width().min(u16::MAX as usize) as u16;
            if let Some(max) = column.max_width {
                width = width.min(max);
            }
            self.widths[col] = self.widths[col].max(width);
        }
        cells[col] = value;
    }

    pub fn min_width(&self) -> u16 {
        let visible: Vec<u16> = self
            .columns
            .iter()
            .zip(&self.widths)
            .filter(|(c, _)| c.visible)
            .map(|(_, w)| *w)
            .collect();
        let gaps = visible.len().saturating_sub(1) as u16;
        visible
            .iter()
            .fold(gaps, |acc, w| acc.saturating_add(*w))
    }

    pub fn min_height(&self) -> u16 {
        let rows = self.rows.len().min(u16::MAX as usize) as u16;
        let rows = match self.options.row_limit {
            Some(limit) => rows.min(limit),
            None => rows,
        };
        rows + self.header_rows()
    }

    pub fn layout(&mut self, _width: u16, height: u16) {
        self.height = height;
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn select(&mut self, row: usize) {
        self.selected = row.min(self.rows.len().saturating_sub(1));
    }

    fn visible_rows(&self) -> usize {
        self.height.saturating_sub(self.header_rows()).max(1) as usize
    }

    /// First data row shown, chosen so the selection is always in view.
    pub fn scroll_offset(&self) -> usize {
        (self.selected + self.header_rows() as usize + 1).saturating_sub(self.height as usize)
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        let last = self.rows.len().saturating_sub(1);
        let page = self.visible_rows();
        self.selected = match key.code {
            KeyCode::Char('j') | KeyCode::Down => self.selected + 1,
            KeyCode::Char('k') | KeyCode::Up => self.selected.saturating_sub(1),
            KeyCode::PageDown => self.selected + page,
            KeyCode::PageUp => self.selected.saturating_sub(page),
            KeyCode::Home => 0,
            KeyCode::End => last,
            _ => return false,
        }
        .min(last);
        true
    }

    /// Identifiers from the top of the displayed tree down to the selected
    /// row, following `parent_col` values back through the rows.
    pub fn selection_path(&self, id_col: usize, parent_col: usize) -> Vec<String> {
        let mut path = Vec::new();
        let mut current = self.selected;
        let mut guard = self.rows.len();
        while let Some(id) = self.value(current, id_col) {
            path.push(id.to_string());
            let parent = self.value(current, parent_col).unwrap_or_default();
            if parent.is_empty() || guard == 0 {
                break;
            }
            guard -= 1;
            match self
                .rows
                .iter()
                .position(|r| r.get(id_col).is_some_and(|v| v == parent))
            {
                Some(row) => current = row,
                None => break,
            }
        }
        path.reverse();
        path
    }

    /// Selects the row of the deepest identifier of `path` still present,
    /// scanning rows in order. Row 0 if nothing matches.
    pub fn restore_selection(&mut self, path: &[String], id_col: usize) {
        let mut selected = 0;
        let mut next = 0;
        for (row, cells) in self.rows.iter().enumerate() {
            if next < path.len() && cells.get(id_col) == Some(&path[next]) {
                selected = row;
                next += 1;
            }
        }
        self.selected = selected;
    }

    pub fn render(&self, canvas: &mut Canvas, area: Rect, focused: bool) {
        let mut canvas = canvas.region(area);
        let header = self.header_rows();
        if self.options.show_header {
            let reverse = Style::default().add_modifier(Modifier::REVERSED);
            self.render_row(&mut canvas, area.x, area.y, |col| &self.columns[col].caption, reverse);
        }

        let offset = self.scroll_offset();
        let shown = area.height.saturating_sub(header) as usize;
        for (index, cells) in self.rows.iter().enumerate().skip(offset).take(shown) {
            let style = self.row_style(index, focused);
            let y = area.y + header + (index - offset) as u16;
            self.render_row(
                &mut canvas,
                area.x,
                y,
                |col| cells.get(col).map(String::as_str).unwrap_or_default(),
                style,
            );
        }
    }

    fn row_style(&self, index: usize, focused: bool) -> Style {
        let style = Style::default();
        if focused {
            if index == self.selected {
                return style.add_modifier(Modifier::REVERSED);
            }
        } else if self.options.always_highlight
            && (index == self.selected || index + 1 == self.selected)
        {
            return style.add_modifier(Modifier::UNDERLINED);
        }
        style
    }

    fn render_row<'s, F>(&self, canvas: &mut Canvas, x: u16, y: u16, cell: F, style: Style)
    where
        F: Fn(usize) -> &'s str,
    {
        let mut x = x;
        for (col, column) in self.columns.iter().enumerate() {
            if !column.visible {
                continue;
            }
            let width = self.widths[col];
            canvas.put_field(x, y, cell(col), width, style);
            canvas.put(x.saturating_add(width), y, " ", style);
            x = x.saturating_add(width + 1);
        }
    }
}
