use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};

use super::canvas::Canvas;
use crate::glyphs::Glyphs;

/// Frames `area` with the char set's box glyphs and writes ` title ` into
/// the top edge at column 2.
pub fn render_border(
    canvas: &mut Canvas,
    area: Rect,
    title: &str,
    child_focused: bool,
    glyphs: &Glyphs,
) {
    if area.width == 0 || area.height == 0 {
        return;
    }
    let plain = Style::default();
    let right = area.right() - 1;
    let bottom = area.bottom() - 1;

    for x in area.left()..area.right() {
        canvas.put(x, area.top(), glyphs.horizontal, plain);
        canvas.put(x, bottom, glyphs.horizontal, plain);
    }
    for y in area.top()..area.bottom() {
        canvas.put(area.left(), y, glyphs.vertical, plain);
        canvas.put(right, y, glyphs.vertical, plain);
    }
    canvas.put(area.left(), area.top(), glyphs.corner_top_left, plain);
    canvas.put(right, area.top(), glyphs.corner_top_right, plain);
    canvas.put(area.left(), bottom, glyphs.corner_bottom_left, plain);
    canvas.put(right, bottom, glyphs.corner_bottom_right, plain);

    let title_style = if child_focused {
        plain.add_modifier(Modifier::REVERSED)
    } else {
        plain
    };
    let mut frame = canvas.region(area);
    frame.put(area.x.saturating_add(2), area.y, &format!(" {title} "), title_style);
}
