//! Types shared by the tic-tac-toe server and client: the board rules, the
//! text frame protocol and the stream codec that carries it.

pub mod board;
pub mod codec;
pub mod protocol;

pub use board::{Board, Cell, GameOutcome, Move, MoveRejection, Symbol, BOARD_SIZE, CELL_COUNT};
pub use codec::{CodecError, FrameCodec, MAX_FRAME_LEN};
pub use protocol::{Frame, ProtocolError};

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8080;

/// Reason sent with `REJECT` when both seats are taken
pub const SERVER_FULL_REASON: &str = "server full";
