use crossterm::event::{KeyCode, KeyEvent};
use ratatui::layout::{Position, Rect};
use ratatui::style::{Modifier, Style};

use super::canvas::Canvas;
use crate::format::pad_unicode;

/// A single-line text field, named after the column it filters.
#[derive(Debug, Clone, Default)]
pub struct InputField {
    name: String,
    value: String,
}

impl InputField {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            value: String::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        match key.code {
            KeyCode::Backspace => {
                self.value.pop();
                true
            }
            KeyCode::Char(c) if !c.is_control() => {
                self.value.push(c);
                true
            }
            _ => false,
        }
    }

    /// Shows the tail of the value when it is wider than the field.
    pub fn render(&self, canvas: &mut Canvas, area: Rect, focused: bool) {
        let width = area.width as usize;
        if width == 0 {
            return;
        }
        let chars: Vec<char> = self.value.chars().collect();
        let shown: String = chars[chars.len().saturating_sub(width)..].iter().collect();
        let style = if focused {
            Style::default().add_modifier(Modifier::REVERSED)
        } else {
            Style::default()
        };
        canvas.put(area.x, area.y, &pad_unicode(&shown, width), style);
    }

    pub fn cursor(&self, area: Rect) -> Position {
        let len = self.value.chars().count().min(u16::MAX as usize) as u16;
        let dx = len.min(area.width.saturating_sub(1));
        Position::new(area.x + dx, area.y)
    }
}
