//! Text frames exchanged between server and clients
//!
//! Every frame is a short ASCII line. The encoding below is the payload only;
//! the line terminator is added by [`crate::codec::FrameCodec`].
//!
//! | Frame | Text |
//! |---|---|
//! | `Assign` | `X` or `O` |
//! | `State` | `STATE:` + 9 cells, row-major, space = empty |
//! | `Move` | `MOVE:<row>,<col>,<symbol>` |
//! | `Chat` | `CHAT:<text>` |
//! | `Winner` | `WINNER:<symbol>` |
//! | `Draw` | `DRAW` |
//! | `Reset` | `RESET` |
//! | `Reject` | `REJECT:<reason>` |
//! | `Error` | `ERROR:<reason>` |

use crate::board::{Board, Cell, Move, Symbol, BOARD_SIZE, CELL_COUNT};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

const STATE_PREFIX: &str = "STATE:";
const MOVE_PREFIX: &str = "MOVE:";
const CHAT_PREFIX: &str = "CHAT:";
const WINNER_PREFIX: &str = "WINNER:";
const REJECT_PREFIX: &str = "REJECT:";
const ERROR_PREFIX: &str = "ERROR:";
const DRAW: &str = "DRAW";
const RESET: &str = "RESET";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// Symbol handed to a client right after it connects
    Assign(Symbol),
    State(Board),
    Move(Move),
    Chat(String),
    Winner(Symbol),
    Draw,
    Reset,
    /// Connection refused; the server closes the socket after sending it
    Reject(String),
    /// Opt-in notice for a dropped request
    Error(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    #[error("empty frame")]
    Empty,
    #[error("unknown frame: {0:?}")]
    UnknownFrame(String),
    #[error("malformed move: {0:?}")]
    MalformedMove(String),
    #[error("move coordinate out of range: row {row}, col {col}")]
    OutOfRange { row: usize, col: usize },
    #[error("invalid symbol: {0:?}")]
    InvalidSymbol(String),
    #[error("state payload must be {expected} cells, got {actual}")]
    StateLength { expected: usize, actual: usize },
    #[error("invalid cell {0:?} in state payload")]
    InvalidCell(char),
    #[error("text payload contains a line break")]
    LineBreak,
}

/// Free-text payloads are relayed as-is, so they must re-encode as one line
fn parse_text(payload: &str) -> Result<String, ProtocolError> {
    if payload.contains(['\r', '\n']) {
        return Err(ProtocolError::LineBreak);
    }
    Ok(payload.to_string())
}

fn parse_symbol(text: &str) -> Result<Symbol, ProtocolError> {
    let mut chars = text.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => {
            Symbol::from_char(c).ok_or_else(|| ProtocolError::InvalidSymbol(text.to_string()))
        }
        _ => Err(ProtocolError::InvalidSymbol(text.to_string())),
    }
}

fn parse_coordinate(text: &str, payload: &str) -> Result<usize, ProtocolError> {
    let mut chars = text.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii_digit() => Ok(c as usize - '0' as usize),
        _ => Err(ProtocolError::MalformedMove(payload.to_string())),
    }
}

fn parse_move(payload: &str) -> Result<Move, ProtocolError> {
    let parts: Vec<&str> = payload.split(',').collect();
    let [row, col, symbol] = parts.as_slice() else {
        return Err(ProtocolError::MalformedMove(payload.to_string()));
    };

    let row = parse_coordinate(row, payload)?;
    let col = parse_coordinate(col, payload)?;
    if row >= BOARD_SIZE || col >= BOARD_SIZE {
        return Err(ProtocolError::OutOfRange { row, col });
    }

    Ok(Move::new(row, col, parse_symbol(symbol)?))
}

fn parse_state(payload: &str) -> Result<Board, ProtocolError> {
    let actual = payload.chars().count();
    if actual != CELL_COUNT {
        return Err(ProtocolError::StateLength {
            expected: CELL_COUNT,
            actual,
        });
    }

    let mut cells = [Cell::Empty; CELL_COUNT];
    for (slot, c) in cells.iter_mut().zip(payload.chars()) {
        *slot = Cell::from_char(c).ok_or(ProtocolError::InvalidCell(c))?;
    }
    Ok(Board::from_cells(cells))
}

impl FromStr for Frame {
    type Err = ProtocolError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        if text.is_empty() {
            return Err(ProtocolError::Empty);
        }

        if let Some(payload) = text.strip_prefix(MOVE_PREFIX) {
            return parse_move(payload).map(Frame::Move);
        }
        if let Some(payload) = text.strip_prefix(STATE_PREFIX) {
            return parse_state(payload).map(Frame::State);
        }
        if let Some(payload) = text.strip_prefix(CHAT_PREFIX) {
            return parse_text(payload).map(Frame::Chat);
        }
        if let Some(payload) = text.strip_prefix(WINNER_PREFIX) {
            return parse_symbol(payload).map(Frame::Winner);
        }
        if let Some(payload) = text.strip_prefix(REJECT_PREFIX) {
            return parse_text(payload).map(Frame::Reject);
        }
        if let Some(payload) = text.strip_prefix(ERROR_PREFIX) {
            return parse_text(payload).map(Frame::Error);
        }

        match text {
            DRAW => Ok(Frame::Draw),
            RESET => Ok(Frame::Reset),
            "X" => Ok(Frame::Assign(Symbol::X)),
            "O" => Ok(Frame::Assign(Symbol::O)),
            other => Err(ProtocolError::UnknownFrame(other.to_string())),
        }
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Frame::Assign(symbol) => write!(f, "{}", symbol),
            Frame::State(board) => write!(f, "{}{}", STATE_PREFIX, board),
            Frame::Move(mv) => write!(f, "{}{},{},{}", MOVE_PREFIX, mv.row, mv.col, mv.symbol),
            Frame::Chat(text) => write!(f, "{}{}", CHAT_PREFIX, text),
            Frame::Winner(symbol) => write!(f, "{}{}", WINNER_PREFIX, symbol),
            Frame::Draw => f.write_str(DRAW),
            Frame::Reset => f.write_str(RESET),
            Frame::Reject(reason) => write!(f, "{}{}", REJECT_PREFIX, reason),
            Frame::Error(reason) => write!(f, "{}{}", ERROR_PREFIX, reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_move() {
        let frame: Frame = "MOVE:1,2,O".parse().unwrap();
        assert_eq!(frame, Frame::Move(Move::new(1, 2, Symbol::O)));
        assert_eq!(frame.to_string(), "MOVE:1,2,O");
    }

    #[test]
    fn test_parse_move_out_of_range() {
        assert_eq!(
            "MOVE:3,0,X".parse::<Frame>(),
            Err(ProtocolError::OutOfRange { row: 3, col: 0 })
        );
    }

    #[test]
    fn test_parse_move_malformed() {
        for text in ["MOVE:", "MOVE:1,1", "MOVE:1,1,X,", "MOVE:a,1,X", "MOVE:11,1,X", "MOVE:-1,0,X"] {
            assert!(
                matches!(text.parse::<Frame>(), Err(ProtocolError::MalformedMove(_))),
                "{} should be malformed",
                text
            );
        }
    }

    #[test]
    fn test_parse_move_bad_symbol() {
        assert_eq!(
            "MOVE:0,0,Z".parse::<Frame>(),
            Err(ProtocolError::InvalidSymbol("Z".to_string()))
        );
        assert!(matches!(
            "MOVE:0,0,XO".parse::<Frame>(),
            Err(ProtocolError::InvalidSymbol(_))
        ));
    }

    #[test]
    fn test_parse_state() {
        let frame: Frame = "STATE:X   O    ".parse().unwrap();
        match frame {
            Frame::State(board) => {
                assert_eq!(board.cell(0, 0), Some(Cell::Taken(Symbol::X)));
                assert_eq!(board.cell(1, 1), Some(Cell::Taken(Symbol::O)));
                assert_eq!(board.cells().filter(|c| c.is_empty()).count(), 7);
            }
            other => panic!("Unexpected frame {:?}", other),
        }
    }

    #[test]
    fn test_parse_state_rejects_bad_payload() {
        assert_eq!(
            "STATE:XO".parse::<Frame>(),
            Err(ProtocolError::StateLength {
                expected: 9,
                actual: 2
            })
        );
        assert_eq!(
            "STATE:X-       ".parse::<Frame>(),
            Err(ProtocolError::InvalidCell('-'))
        );
    }

    #[test]
    fn test_empty_state_encoding() {
        assert_eq!(Frame::State(Board::new()).to_string(), "STATE:         ");
    }

    #[test]
    fn test_chat_is_verbatim() {
        let frame: Frame = "CHAT: hello, MOVE:0,0,X ".parse().unwrap();
        assert_eq!(frame, Frame::Chat(" hello, MOVE:0,0,X ".to_string()));
        assert_eq!(frame.to_string(), "CHAT: hello, MOVE:0,0,X ");
    }

    #[test]
    fn test_text_payload_with_line_break_is_refused() {
        for text in ["CHAT:a\rb", "CHAT:a\nb", "REJECT:full\r", "ERROR:\nx"] {
            assert_eq!(
                text.parse::<Frame>(),
                Err(ProtocolError::LineBreak),
                "{:?} should be refused",
                text
            );
        }
    }

    #[test]
    fn test_parse_simple_frames() {
        assert_eq!("X".parse::<Frame>(), Ok(Frame::Assign(Symbol::X)));
        assert_eq!("O".parse::<Frame>(), Ok(Frame::Assign(Symbol::O)));
        assert_eq!("DRAW".parse::<Frame>(), Ok(Frame::Draw));
        assert_eq!("RESET".parse::<Frame>(), Ok(Frame::Reset));
        assert_eq!("WINNER:O".parse::<Frame>(), Ok(Frame::Winner(Symbol::O)));
        assert_eq!(
            "REJECT:server full".parse::<Frame>(),
            Ok(Frame::Reject("server full".to_string()))
        );
        assert_eq!(
            "ERROR:cell occupied".parse::<Frame>(),
            Ok(Frame::Error("cell occupied".to_string()))
        );
    }

    #[test]
    fn test_unknown_frames() {
        assert_eq!("".parse::<Frame>(), Err(ProtocolError::Empty));
        assert!(matches!("reset".parse::<Frame>(), Err(ProtocolError::UnknownFrame(_))));
        assert!(matches!("RESET ".parse::<Frame>(), Err(ProtocolError::UnknownFrame(_))));
        assert!(matches!("WINNER:".parse::<Frame>(), Err(ProtocolError::InvalidSymbol(_))));
    }
}
