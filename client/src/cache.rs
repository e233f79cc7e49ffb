//! Client-side mirror of the server's game state
//!
//! The receiver task writes into the cache and the render loop reads from it,
//! so everything both sides touch lives behind one mutex. A condition variable
//! carries the "something changed, redraw" signal from the receiver to the
//! window thread.

use log::{debug, info, warn};
use shared::{Board, Cell, Frame, Move, Symbol};
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use thiserror::Error;

/// Chat lines kept for display; older lines are dropped first
pub const CHAT_HISTORY: usize = 50;

/// How the last finished game ended, shown until the next move
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameResult {
    Won(Symbol),
    Draw,
}

/// One entry in the chat panel
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatLine {
    /// Relayed from the other player
    Received(String),
    /// Typed locally and handed to the network task
    Sent(String),
}

impl ChatLine {
    pub fn text(&self) -> &str {
        match self {
            ChatLine::Received(text) | ChatLine::Sent(text) => text,
        }
    }
}

/// Why a cell selection was not turned into a move
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MoveError {
    #[error("no symbol assigned yet")]
    NoSymbol,
    #[error("not your turn")]
    NotYourTurn,
    #[error("chat mode is active")]
    ChatMode,
    #[error("cell {0} does not exist")]
    InvalidCell(u8),
    #[error("cell {0} is already taken")]
    Occupied(u8),
}

/// Copy of the cache handed to the renderer
///
/// Taken under the lock and then read without it, so a frame is always drawn
/// from one consistent state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheSnapshot {
    /// Last board received from the server
    pub board: Board,
    /// Assigned symbol, `None` until the server greets us
    pub symbol: Option<Symbol>,
    /// Whether a cell selection may be sent now
    pub my_turn: bool,
    /// Keys go to the chat line instead of the board
    pub chat_mode: bool,
    /// Result of the game that just ended
    pub last_result: Option<GameResult>,
    /// One-line notice such as a rejection or error from the server
    pub status: Option<String>,
    /// Most recent chat lines, oldest first
    pub chat_log: Vec<ChatLine>,
    /// Cleared once the connection ends
    pub connected: bool,
}

#[derive(Debug)]
struct CacheState {
    snapshot: CacheSnapshot,
    redraw_pending: bool,
}

/// State shared between the network receiver and the window thread
///
/// The cache maintains:
/// - The board and turn as last reported by the server
/// - Chat history and the chat-mode toggle
/// - A pending-redraw flag paired with a condition variable
///
/// Every mutation sets the flag and notifies, so the window thread can sleep
/// in [`wait_for_redraw`](Self::wait_for_redraw) between changes.
pub struct ClientCache {
    state: Mutex<CacheState>,
    redraw: Condvar,
}

impl ClientCache {
    /// Creates a cache for a fresh connection with an empty board
    pub fn new() -> Self {
        Self {
            state: Mutex::new(CacheState {
                snapshot: CacheSnapshot {
                    board: Board::new(),
                    symbol: None,
                    my_turn: false,
                    chat_mode: false,
                    last_result: None,
                    status: None,
                    chat_log: Vec::new(),
                    connected: true,
                },
                // draw once before the first frame arrives
                redraw_pending: true,
            }),
            redraw: Condvar::new(),
        }
    }

    // A panic on the other side of the lock leaves plain data behind; keep going.
    fn lock(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn update<R>(&self, f: impl FnOnce(&mut CacheSnapshot) -> R) -> R {
        let mut state = self.lock();
        let result = f(&mut state.snapshot);
        state.redraw_pending = true;
        drop(state);
        self.redraw.notify_all();
        result
    }

    /// Folds one server frame into the cache and wakes the render path
    ///
    /// `MOVE` writes the cell without running the rules, `STATE` replaces the
    /// board and derives whose turn it is from the mark counts. `WINNER` and
    /// `DRAW` clear the board and record the result for display.
    pub fn apply(&self, frame: &Frame) {
        self.update(|cache| match frame {
            Frame::Assign(symbol) => {
                info!("Playing as {}", symbol);
                cache.symbol = Some(*symbol);
                cache.my_turn = *symbol == Symbol::X;
            }
            Frame::Move(mv) => {
                cache.board.set_cell(mv.row, mv.col, Cell::Taken(mv.symbol));
                cache.my_turn = cache.symbol.is_some_and(|me| mv.symbol != me);
                cache.last_result = None;
                cache.status = None;
            }
            Frame::Winner(symbol) => {
                info!("{} wins", symbol);
                cache.board.reset();
                cache.last_result = Some(GameResult::Won(*symbol));
            }
            Frame::Draw => {
                info!("Game drawn");
                cache.board.reset();
                cache.last_result = Some(GameResult::Draw);
            }
            Frame::State(board) => {
                cache.board = board.clone();
                cache.my_turn = cache.symbol == Some(board.current_turn());
            }
            Frame::Chat(text) => {
                cache.chat_log.push(ChatLine::Received(text.clone()));
                trim_chat(&mut cache.chat_log);
            }
            Frame::Reject(reason) => {
                warn!("Server refused the connection: {}", reason);
                cache.status = Some(format!("Rejected: {}", reason));
                cache.connected = false;
                cache.my_turn = false;
            }
            Frame::Error(reason) => {
                debug!("Server notice: {}", reason);
                cache.status = Some(reason.clone());
            }
            Frame::Reset => {
                warn!("Ignoring RESET sent by the server");
            }
        });
    }

    /// Current state, without touching the redraw flag
    pub fn snapshot(&self) -> CacheSnapshot {
        self.lock().snapshot.clone()
    }

    /// Blocks until a redraw is due or `timeout` passes
    ///
    /// Returns a snapshot and clears the pending flag when a redraw is due,
    /// `None` on timeout.
    pub fn wait_for_redraw(&self, timeout: Duration) -> Option<CacheSnapshot> {
        let state = self.lock();
        let (mut state, _) = self
            .redraw
            .wait_timeout_while(state, timeout, |state| !state.redraw_pending)
            .unwrap_or_else(PoisonError::into_inner);

        if !state.redraw_pending {
            return None;
        }
        state.redraw_pending = false;
        Some(state.snapshot.clone())
    }

    /// Returns the chat mode after toggling
    pub fn toggle_chat_mode(&self) -> bool {
        self.update(|cache| {
            cache.chat_mode = !cache.chat_mode;
            cache.chat_mode
        })
    }

    /// Turns a 1-9 cell selection into a move and gives up the turn
    ///
    /// The cell must be empty in the local copy. The server still has the
    /// final say; the turn flag comes back with the next `MOVE` or `STATE`.
    pub fn claim_move(&self, cell_index: u8) -> Result<Move, MoveError> {
        let mut state = self.lock();
        let cache = &mut state.snapshot;

        let symbol = cache.symbol.ok_or(MoveError::NoSymbol)?;
        if cache.chat_mode {
            return Err(MoveError::ChatMode);
        }
        if !cache.my_turn {
            return Err(MoveError::NotYourTurn);
        }
        let mv = Move::from_cell_index(cell_index, symbol)
            .ok_or(MoveError::InvalidCell(cell_index))?;
        if cache.board.cell(mv.row, mv.col) != Some(Cell::Empty) {
            return Err(MoveError::Occupied(cell_index));
        }

        cache.my_turn = false;
        state.redraw_pending = true;
        drop(state);
        self.redraw.notify_all();
        Ok(mv)
    }

    /// Adds a locally sent line to the chat history
    ///
    /// The server does not echo chat back to its sender, so this is the only
    /// place our own lines enter the log.
    pub fn record_sent_chat(&self, text: &str) {
        self.update(|cache| {
            cache.chat_log.push(ChatLine::Sent(text.to_string()));
            trim_chat(&mut cache.chat_log);
        });
    }

    /// Shows a notice in the status line until the next move
    pub fn set_status(&self, status: impl Into<String>) {
        let status = status.into();
        self.update(|cache| cache.status = Some(status));
    }

    /// Marks the connection as ended and takes away the turn
    ///
    /// Keeps an existing status, e.g. a server rejection, rather than
    /// replacing it with the generic message.
    pub fn set_disconnected(&self) {
        self.update(|cache| {
            cache.connected = false;
            cache.my_turn = false;
            if cache.status.is_none() {
                cache.status = Some("Disconnected from server".to_string());
            }
        });
    }
}

impl Default for ClientCache {
    fn default() -> Self {
        Self::new()
    }
}

fn trim_chat(log: &mut Vec<ChatLine>) {
    if log.len() > CHAT_HISTORY {
        let excess = log.len() - CHAT_HISTORY;
        log.drain(..excess);
    }
}
