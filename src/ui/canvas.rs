use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::Style;

use crate::config::CanvasConfig;
use crate::format::pad_unicode;
use crate::layout::Area;

pub fn to_rect(area: Area) -> Rect {
    Rect::new(area.x, area.y, area.width, area.height)
}

/// Writes into a [`Buffer`], dropping anything outside `bounds`.
///
/// `bounds` starts as the buffer area capped by the configured ceilings and
/// only ever shrinks through [`Canvas::region`].
pub struct Canvas<'a> {
    buf: &'a mut Buffer,
    bounds: Rect,
}

impl<'a> Canvas<'a> {
    pub fn new(buf: &'a mut Buffer, limits: CanvasConfig) -> Self {
        let ceiling = Rect::new(0, 0, limits.max_width, limits.max_height);
        let bounds = buf.area.intersection(ceiling);
        Self { buf, bounds }
    }

    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    /// A canvas restricted to `area`.
    pub fn region(&mut self, area: Rect) -> Canvas<'_> {
        let bounds = self.bounds.intersection(area);
        Canvas {
            buf: &mut *self.buf,
            bounds,
        }
    }

    pub fn put(&mut self, x: u16, y: u16, text: &str, style: Style) {
        if !self.contains(x, y) {
            return;
        }
        let room = (self.bounds.right() - x) as usize;
        self.buf.set_stringn(x, y, text, room, style);
    }

    /// Writes `text` left-aligned in a field of `width` cells.
    pub fn put_field(&mut self, x: u16, y: u16, text: &str, width: u16, style: Style) {
        if width == 0 {
            return;
        }
        let text = pad_unicode(text, width as usize);
        self.put(x, y, &text, style);
    }

    fn contains(&self, x: u16, y: u16) -> bool {
        x >= self.bounds.left()
            && x < self.bounds.right()
            && y >= self.bounds.top()
            && y < self.bounds.bottom()
    }
}
