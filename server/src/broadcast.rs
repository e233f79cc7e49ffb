//! Fan-out of frames to registered sessions
//!
//! This module handles:
//! - Broadcasting one frame to every seated session, optionally skipping the sender
//! - Queueing a frame for a single session, used for opt-in error notices
//! - Unregistering sessions whose outbound queue has closed

use crate::sessions::{SessionId, SessionRegistry};
use log::{debug, warn};
use shared::Frame;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Delivers frames to every registered session, optionally skipping one
///
/// Delivery pushes onto each session's outbound queue and never waits on a
/// socket. A queue whose writer has gone away counts as a disconnect: that
/// session is unregistered and the remaining sessions still get the frame.
#[derive(Clone)]
pub struct Broadcaster {
    /// Registry shared with the connection tasks
    sessions: Arc<RwLock<SessionRegistry>>,
}

impl Broadcaster {
    /// Creates a broadcaster over the server's registry
    pub fn new(sessions: Arc<RwLock<SessionRegistry>>) -> Self {
        Self { sessions }
    }

    /// Queues a frame for every session except `exclude`
    ///
    /// Targets are snapshotted under a read lock and delivered after it is
    /// released. Sessions whose queue is closed are collected and unregistered
    /// under one write lock at the end.
    ///
    /// Returns the number of sessions the frame was queued for.
    pub async fn send(&self, frame: &Frame, exclude: Option<SessionId>) -> usize {
        let targets = {
            let sessions = self.sessions.read().await;
            sessions.all()
        };

        let mut delivered = 0;
        let mut dead = Vec::new();

        for (session_id, sender) in targets {
            if Some(session_id) == exclude {
                continue;
            }

            if sender.send(frame.clone()).is_ok() {
                delivered += 1;
            } else {
                warn!("Session {} is gone, dropping it from broadcasts", session_id);
                dead.push(session_id);
            }
        }

        if !dead.is_empty() {
            let mut sessions = self.sessions.write().await;
            for session_id in dead {
                sessions.unregister(session_id);
            }
        }

        debug!("Broadcast {:?} to {} session(s)", frame, delivered);
        delivered
    }

    /// Queues a frame for a single session
    ///
    /// Returns `false` if the session is not registered or its queue has
    /// closed. A closed queue unregisters the session, as in [`send`](Self::send).
    pub async fn send_to(&self, session_id: SessionId, frame: Frame) -> bool {
        let sender = {
            let sessions = self.sessions.read().await;
            sessions.get(session_id).map(|session| session.sender().clone())
        };

        let Some(sender) = sender else {
            return false;
        };

        if sender.send(frame).is_err() {
            warn!("Session {} is gone, dropping it", session_id);
            self.sessions.write().await.unregister(session_id);
            return false;
        }
        true
    }
}
