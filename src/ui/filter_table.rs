use crossterm::event::KeyEvent;
use ratatui::layout::{Position, Rect};

use super::canvas::Canvas;
use super::input::InputField;
use super::table::{Table, TableColumn, TableOptions};
use crate::system::tree::FilterCriteria;

/// A [`Table`] with one filter input above each visible column.
///
/// Focus parts are numbered: the inputs of the visible columns from left to
/// right, then the table itself.
#[derive(Debug, Clone)]
pub struct FilterTable {
    inputs: Vec<InputField>,
    table: Table,
}

impl FilterTable {
    pub fn new(columns: Vec<TableColumn>, options: TableOptions) -> Self {
        let inputs = columns.iter().map(|c| InputField::new(&c.caption)).collect();
        let options = TableOptions {
            show_header: true,
            ..options
        };
        Self {
            inputs,
            table: Table::new(columns, options),
        }
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn table_mut(&mut self) -> &mut Table {
        &mut self.table
    }

    fn visible_columns(&self) -> Vec<usize> {
        self.table
            .columns()
            .iter()
            .enumerate()
            .filter(|(_, c)| c.visible)
            .map(|(i, _)| i)
            .collect()
    }

    pub fn part_count(&self) -> usize {
        self.visible_columns().len() + 1
    }

    pub fn table_part(&self) -> usize {
        self.part_count() - 1
    }

    /// Column index of the input behind a focus part, `None` for the table.
    fn input_column(&self, part: usize) -> Option<usize> {
        self.visible_columns().get(part).copied()
    }

    pub fn search_values(&self) -> FilterCriteria {
        self.inputs
            .iter()
            .map(|input| (input.name(), input.value()))
            .collect()
    }

    pub fn min_width(&self) -> u16 {
        self.table.min_width()
    }

    pub fn min_height(&self) -> u16 {
        self.table.min_height() + 1
    }

    pub fn layout(&mut self, width: u16, height: u16) {
        self.table.layout(width, height.saturating_sub(1));
    }

    pub fn handle_key(&mut self, part: usize, key: KeyEvent) -> bool {
        match self.input_column(part) {
            Some(col) => self.inputs[col].handle_key(key),
            None => self.table.handle_key(key),
        }
    }

    /// Inputs sit on the first line, each as wide as its column plus the gap.
    fn input_area(&self, area: Rect, col: usize) -> Rect {
        let mut x = area.x;
        for (i, column) in self.table.columns().iter().enumerate() {
            let width = self.table.column_width(i).unwrap_or(0);
            if i == col {
                let room = area.right().saturating_sub(x);
                return Rect::new(x, area.y, (width + 1).min(room), area.height.min(1));
            }
            if column.visible {
                x = x.saturating_add(width + 1);
            }
        }
        Rect::new(area.x, area.y, 0, 0)
    }

    pub fn render(&self, canvas: &mut Canvas, area: Rect, focused: Option<usize>) {
        let focused_col = focused.and_then(|p| self.input_column(p));
        for col in self.visible_columns() {
            let input_area = self.input_area(area, col);
            self.inputs[col].render(canvas, input_area, focused_col == Some(col));
        }
        let table_area = Rect::new(
            area.x,
            area.y.saturating_add(1),
            area.width,
            area.height.saturating_sub(1),
        );
        self.table
            .render(canvas, table_area, focused == Some(self.table_part()));
    }

    pub fn cursor(&self, area: Rect, part: usize) -> Option<Position> {
        let col = self.input_column(part)?;
        Some(self.inputs[col].cursor(self.input_area(area, col)))
    }
}
