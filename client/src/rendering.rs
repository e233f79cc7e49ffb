use crate::cache::{CacheSnapshot, ChatLine, GameResult};
use macroquad::prelude::*;
use shared::{Cell, Symbol, BOARD_SIZE};

/// Height reserved under the board for the status line and chat
pub const PANEL_HEIGHT: f32 = 160.0;
const MARGIN: f32 = 20.0;
const CHAT_LINES_SHOWN: usize = 5;

/// Where the board sits in the window
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoardLayout {
    pub origin_x: f32,
    pub origin_y: f32,
    pub cell_size: f32,
}

impl BoardLayout {
    /// Largest square board that fits above the panel, centered horizontally
    pub fn fit(width: f32, height: f32) -> Self {
        let side = (width.min(height - PANEL_HEIGHT) - 2.0 * MARGIN).max(0.0);
        Self {
            origin_x: (width - side) / 2.0,
            origin_y: MARGIN,
            cell_size: side / BOARD_SIZE as f32,
        }
    }

    pub fn side(&self) -> f32 {
        self.cell_size * BOARD_SIZE as f32
    }

    /// Maps a window position onto cell 1-9
    pub fn cell_at(&self, x: f32, y: f32) -> Option<u8> {
        let dx = x - self.origin_x;
        let dy = y - self.origin_y;
        if dx < 0.0 || dy < 0.0 || self.cell_size <= 0.0 {
            return None;
        }

        let col = (dx / self.cell_size) as usize;
        let row = (dy / self.cell_size) as usize;
        if row >= BOARD_SIZE || col >= BOARD_SIZE {
            return None;
        }
        Some((row * BOARD_SIZE + col + 1) as u8)
    }

    pub fn cell_origin(&self, row: usize, col: usize) -> (f32, f32) {
        (
            self.origin_x + col as f32 * self.cell_size,
            self.origin_y + row as f32 * self.cell_size,
        )
    }

    pub fn cell_center(&self, row: usize, col: usize) -> (f32, f32) {
        let (x, y) = self.cell_origin(row, col);
        (x + self.cell_size / 2.0, y + self.cell_size / 2.0)
    }
}

/// One-line summary of whose turn it is, the last result and any notice
pub fn status_line(snapshot: &CacheSnapshot) -> String {
    if !snapshot.connected {
        return snapshot
            .status
            .clone()
            .unwrap_or_else(|| "Disconnected".to_string());
    }

    let Some(symbol) = snapshot.symbol else {
        return "Waiting for the server...".to_string();
    };

    let mut line = match snapshot.last_result {
        Some(GameResult::Won(winner)) if winner == symbol => "You won! ".to_string(),
        Some(GameResult::Won(winner)) => format!("{} won. ", winner),
        Some(GameResult::Draw) => "Draw. ".to_string(),
        None => String::new(),
    };

    if snapshot.my_turn {
        line.push_str(&format!("You are {}, your move", symbol));
    } else {
        line.push_str(&format!("You are {}, waiting for {}", symbol, symbol.opponent()));
    }

    if let Some(status) = &snapshot.status {
        line.push_str(&format!(" ({})", status));
    }
    line
}

pub struct Renderer {
    layout: BoardLayout,
}

impl Renderer {
    pub fn new(width: usize, height: usize) -> Self {
        Renderer {
            layout: BoardLayout::fit(width as f32, height as f32),
        }
    }

    pub fn layout(&self) -> &BoardLayout {
        &self.layout
    }

    pub fn render(&mut self, snapshot: &CacheSnapshot, chat_buffer: &str) {
        self.layout = BoardLayout::fit(screen_width(), screen_height());

        clear_background(Color::from_rgba(26, 26, 26, 255));

        self.draw_grid();
        for row in 0..BOARD_SIZE {
            for col in 0..BOARD_SIZE {
                if let Some(Cell::Taken(symbol)) = snapshot.board.cell(row, col) {
                    self.draw_symbol(row, col, symbol);
                }
            }
        }

        self.draw_panel(snapshot, chat_buffer);
    }

    fn draw_grid(&self) {
        let side = self.layout.side();
        let (x0, y0) = (self.layout.origin_x, self.layout.origin_y);

        for i in 1..BOARD_SIZE {
            let offset = i as f32 * self.layout.cell_size;
            draw_line(x0 + offset, y0, x0 + offset, y0 + side, 4.0, LIGHTGRAY);
            draw_line(x0, y0 + offset, x0 + side, y0 + offset, 4.0, LIGHTGRAY);
        }

        for index in 1..=(BOARD_SIZE * BOARD_SIZE) {
            let (x, y) = self.layout.cell_origin((index - 1) / BOARD_SIZE, (index - 1) % BOARD_SIZE);
            draw_text(&index.to_string(), x + 6.0, y + 18.0, 18.0, DARKGRAY);
        }
    }

    fn draw_symbol(&self, row: usize, col: usize, symbol: Symbol) {
        let (cx, cy) = self.layout.cell_center(row, col);
        let reach = self.layout.cell_size * 0.3;

        match symbol {
            Symbol::X => {
                let color = Color::from_rgba(255, 68, 68, 255);
                draw_line(cx - reach, cy - reach, cx + reach, cy + reach, 8.0, color);
                draw_line(cx - reach, cy + reach, cx + reach, cy - reach, 8.0, color);
            }
            Symbol::O => {
                draw_circle_lines(cx, cy, reach, 8.0, Color::from_rgba(0, 170, 255, 255));
            }
        }
    }

    fn draw_panel(&self, snapshot: &CacheSnapshot, chat_buffer: &str) {
        let top = screen_height() - PANEL_HEIGHT;
        draw_rectangle(
            0.0,
            top,
            screen_width(),
            PANEL_HEIGHT,
            Color::from_rgba(40, 40, 40, 255),
        );

        let status_color = if snapshot.connected { WHITE } else { RED };
        draw_text(&status_line(snapshot), MARGIN, top + 24.0, 20.0, status_color);

        let recent = snapshot
            .chat_log
            .iter()
            .skip(snapshot.chat_log.len().saturating_sub(CHAT_LINES_SHOWN));
        for (i, line) in recent.enumerate() {
            let (prefix, color) = match line {
                ChatLine::Received(_) => ("them: ", YELLOW),
                ChatLine::Sent(_) => ("you: ", GREEN),
            };
            let y = top + 48.0 + i as f32 * 18.0;
            draw_text(&format!("{}{}", prefix, line.text()), MARGIN, y, 16.0, color);
        }

        let prompt = if snapshot.chat_mode {
            format!("> {}_", chat_buffer)
        } else {
            "1-9/click: move   0: chat   R: reset".to_string()
        };
        draw_text(&prompt, MARGIN, screen_height() - 12.0, 18.0, LIGHTGRAY);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;
    use shared::Board;

    fn snapshot() -> CacheSnapshot {
        CacheSnapshot {
            board: Board::new(),
            symbol: Some(Symbol::X),
            my_turn: true,
            chat_mode: false,
            last_result: None,
            status: None,
            chat_log: Vec::new(),
            connected: true,
        }
    }

    #[test]
    fn test_layout_fits_default_window() {
        let layout = BoardLayout::fit(600.0, 720.0);
        assert_approx_eq!(layout.side(), 520.0);
        assert_approx_eq!(layout.origin_x, 40.0);
        assert_approx_eq!(layout.origin_y, MARGIN);
        assert_approx_eq!(layout.cell_size, 520.0 / 3.0, 1e-4);
    }

    #[test]
    fn test_layout_in_wide_window_is_centered() {
        let layout = BoardLayout::fit(1000.0, 560.0);
        assert_approx_eq!(layout.side(), 360.0);
        assert_approx_eq!(layout.origin_x, 320.0);
    }

    #[test]
    fn test_cell_at_maps_row_major() {
        let layout = BoardLayout {
            origin_x: 10.0,
            origin_y: 10.0,
            cell_size: 100.0,
        };

        assert_eq!(layout.cell_at(15.0, 15.0), Some(1));
        assert_eq!(layout.cell_at(250.0, 50.0), Some(3));
        assert_eq!(layout.cell_at(150.0, 150.0), Some(5));
        assert_eq!(layout.cell_at(50.0, 250.0), Some(7));
        assert_eq!(layout.cell_at(309.0, 309.0), Some(9));
    }

    #[test]
    fn test_cell_at_outside_board() {
        let layout = BoardLayout {
            origin_x: 10.0,
            origin_y: 10.0,
            cell_size: 100.0,
        };

        assert_eq!(layout.cell_at(5.0, 50.0), None);
        assert_eq!(layout.cell_at(50.0, 311.0), None);
        assert_eq!(layout.cell_at(400.0, 50.0), None);
    }

    #[test]
    fn test_cell_center() {
        let layout = BoardLayout {
            origin_x: 0.0,
            origin_y: 20.0,
            cell_size: 90.0,
        };
        let (x, y) = layout.cell_center(2, 1);
        assert_approx_eq!(x, 135.0);
        assert_approx_eq!(y, 245.0);
    }

    #[test]
    fn test_status_line_variants() {
        let mut snap = snapshot();
        assert_eq!(status_line(&snap), "You are X, your move");

        snap.my_turn = false;
        snap.last_result = Some(GameResult::Won(Symbol::O));
        assert_eq!(status_line(&snap), "O won. You are X, waiting for O");

        snap.last_result = Some(GameResult::Won(Symbol::X));
        snap.status = Some("cell occupied".to_string());
        assert_eq!(
            status_line(&snap),
            "You won! You are X, waiting for O (cell occupied)"
        );

        snap.symbol = None;
        assert_eq!(status_line(&snap), "Waiting for the server...");

        snap.connected = false;
        assert_eq!(status_line(&snap), "cell occupied");
    }
}
