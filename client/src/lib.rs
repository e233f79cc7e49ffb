//! # Tic-Tac-Toe Client Library
//!
//! This library provides the client side of networked tic-tac-toe: a local
//! mirror of the server's board, the network task that keeps it in step, and
//! the window that shows it and turns key presses into requests.
//!
//! ## Architecture Overview
//!
//! The server is authoritative. The client never applies its own move to the
//! board; it sends `MOVE` and waits for the broadcast to come back. Two
//! threads of control share one [`cache::ClientCache`]:
//!
//! ### Receiver
//! A tokio task reads frames from the socket and folds each one into the
//! cache, then signals a redraw.
//!
//! ### Window Loop
//! The macroquad loop samples input, turns events into outbound frames, waits
//! briefly for the redraw signal and renders from a snapshot of the cache.
//!
//! ## Module Organization
//!
//! ### Cache Module (`cache`)
//! The client's only mutable state behind a single lock:
//! - Board copy, assigned symbol and the my-turn flag
//! - Chat mode and chat history
//! - Last game result and status notices
//! - Redraw signal for the window thread
//!
//! ### Input Module (`input`)
//! Keyboard and mouse sampling, plus the dispatcher that validates a cell
//! selection against the cache before it becomes a `MOVE`.
//!
//! ### Network Module (`network`)
//! TCP connection, the receiver task and the outbound writer.
//!
//! ### Rendering Module (`rendering`)
//! Board layout geometry and the macroquad drawing code.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use client::cache::ClientCache;
//! use client::network::Client;
//! use shared::Frame;
//! use std::sync::Arc;
//! use tokio::sync::mpsc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let cache = Arc::new(ClientCache::new());
//!     let client = Client::connect("127.0.0.1:8080", Arc::clone(&cache)).await?;
//!
//!     let (outbound, rx) = mpsc::unbounded_channel();
//!     outbound.send(Frame::Reset)?;
//!     drop(outbound);
//!
//!     client.run(rx).await?;
//!     println!("{:?}", cache.snapshot().board);
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod input;
pub mod network;
pub mod rendering;
