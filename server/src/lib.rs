//! # Tic-Tac-Toe Server Library
//!
//! This library provides the authoritative server for two-player networked
//! tic-tac-toe. It owns the only real copy of the board, arbitrates whose turn
//! it is, and broadcasts every change to the connected participants so each
//! client's local copy stays in step.
//!
//! ## Core Responsibilities
//!
//! ### Authoritative Board
//! Moves are validated and applied here. Clients never decide the outcome of a
//! move; they mirror what the server broadcasts.
//!
//! ### Session Management
//! Handles the lifecycle of a participant's connection:
//! - Accepting the socket and assigning `X` or `O`
//! - Sending the greeting (symbol, then a full `STATE` snapshot)
//! - Refusing a third participant with `REJECT:server full`
//! - Unregistering and releasing the socket on disconnect or error
//!
//! ### Broadcasting
//! Moves, results and board snapshots go to every session; chat goes to every
//! session except its sender.
//!
//! ## Architecture Design
//!
//! ### Task Per Connection
//! The accept loop spawns one handler task per connection into a `JoinSet`, and
//! each handler spawns a writer task that owns the socket's write half. Handlers
//! push outbound frames onto per-session queues, so no lock is ever held across
//! a socket write.
//!
//! ### Ordering
//! The game sits behind a single mutex. A handler applies a move and queues the
//! resulting frames while holding it, which makes the mutex the one ordering
//! point: every session receives frames in the order moves were accepted.
//! Locks are always taken game first, then session registry.
//!
//! ### Framing
//! Frames are newline-terminated text lines (see [`shared::codec`]). A frame
//! that fails to parse is dropped and the connection stays open; a stream-level
//! error (oversized line, invalid UTF-8, I/O failure) closes that connection
//! only.
//!
//! ### Scalability
//! There is no cap on accepted sockets and no backpressure on outbound queues.
//! With at most two seated players this is fine; it is the ceiling to revisit
//! before hosting more than one game per process.
//!
//! ## Module Organization
//!
//! ### Game Module (`game`)
//! The authoritative board plus the rules for turning an accepted move into
//! the ordered list of frames to broadcast.
//!
//! ### Sessions Module (`sessions`)
//! Registry of connected sessions and the symbol each one plays.
//!
//! ### Broadcast Module (`broadcast`)
//! Fan-out to registered sessions with optional sender exclusion.
//!
//! ### Network Module (`network`)
//! TCP listener, per-connection state machine and socket writers.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::network::{Server, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let server = Server::bind(ServerConfig::new("127.0.0.1:8080")).await?;
//!     server.run().await?;
//!     Ok(())
//! }
//! ```

pub mod broadcast;
pub mod game;
pub mod network;
pub mod sessions;
