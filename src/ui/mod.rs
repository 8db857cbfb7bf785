pub mod border;
pub mod canvas;
pub mod filter_table;
pub mod focus;
pub mod input;
pub mod panels;
pub mod screen;
pub mod table;

pub use screen::{Screen, ScreenState};

use ratatui::Frame;

use crate::app::App;

/// Paints the screen into the frame and places the terminal cursor on the
/// focused input, if any.
pub fn draw(frame: &mut Frame, app: &App) {
    let cursor = app.screen.paint(frame.buffer_mut());
    if let Some(position) = cursor {
        frame.set_cursor_position(position);
    }
}
