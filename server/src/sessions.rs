//! Session registry: who is connected and which symbol each participant plays
//!
//! A session is one accepted connection plus the symbol it was assigned. Only
//! two symbols exist, so the registry seats at most two sessions; anything
//! beyond that is refused rather than handed a duplicate symbol. When a player
//! leaves, the freed symbol goes to the next connection.
//!
//! The registry itself is a plain data structure. The server shares it behind
//! a single `RwLock`, and every read or write goes through that lock.

use log::info;
use shared::{Frame, Symbol};
use std::collections::HashMap;
use std::net::SocketAddr;
use thiserror::Error;
use tokio::sync::mpsc;

/// Identifier handed out per accepted connection, never reused
pub type SessionId = u32;

/// Outbound queue feeding a session's socket writer
pub type FrameSender = mpsc::UnboundedSender<Frame>;

/// Reasons a connection cannot be seated
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// X and O are both taken; the connection gets `REJECT` instead
    #[error("both symbols are already assigned")]
    Full,
}

/// A connected participant
///
/// Each session maintains:
/// - The id it was registered under
/// - The peer address, for logging
/// - The symbol it plays for as long as it stays connected
/// - The sending end of its outbound queue
#[derive(Debug)]
pub struct Session {
    /// Registry key, increasing with every accepted connection
    pub id: SessionId,
    /// Remote address of the connection
    pub addr: SocketAddr,
    /// Symbol this session may move for
    pub symbol: Symbol,
    /// Queue drained by the session's writer task
    sender: FrameSender,
}

impl Session {
    /// Outbound queue for this session
    ///
    /// Sending fails once the writer task has stopped, which is how callers
    /// find out the connection is gone.
    pub fn sender(&self) -> &FrameSender {
        &self.sender
    }
}

/// Seats at most two sessions, one per symbol
pub struct SessionRegistry {
    /// Currently seated sessions keyed by id
    sessions: HashMap<SessionId, Session>,
    /// Id handed to the next registered session
    next_session_id: SessionId,
}

impl SessionRegistry {
    /// Creates an empty registry whose first session gets id 1
    pub fn new() -> Self {
        Self {
            sessions: HashMap::new(),
            next_session_id: 1,
        }
    }

    /// Seats a new session on the first free symbol, X before O
    ///
    /// A symbol freed by [`unregister`](Self::unregister) is handed out again,
    /// so a reconnecting player can take its old seat. Fails with
    /// [`RegistryError::Full`] while both symbols are held.
    pub fn register(
        &mut self,
        addr: SocketAddr,
        sender: FrameSender,
    ) -> Result<(SessionId, Symbol), RegistryError> {
        let symbol = [Symbol::X, Symbol::O]
            .into_iter()
            .find(|symbol| self.session_for(*symbol).is_none())
            .ok_or(RegistryError::Full)?;

        let id = self.next_session_id;
        self.next_session_id += 1;

        info!("Session {} from {} plays {}", id, addr, symbol);
        self.sessions.insert(
            id,
            Session {
                id,
                addr,
                symbol,
                sender,
            },
        );

        Ok((id, symbol))
    }

    /// Removes a session and frees its symbol
    ///
    /// Both the connection task and a failed broadcast may call this for the
    /// same session. The second call finds nothing and returns `None`.
    pub fn unregister(&mut self, id: SessionId) -> Option<Session> {
        let removed = self.sessions.remove(&id);
        if let Some(session) = &removed {
            info!("Session {} ({}) left, {} is free", id, session.addr, session.symbol);
        }
        removed
    }

    /// Snapshot of every registered session's outbound queue, ordered by id
    ///
    /// The senders are clones, so the caller can deliver after releasing the
    /// registry lock.
    pub fn all(&self) -> Vec<(SessionId, FrameSender)> {
        let mut targets: Vec<(SessionId, FrameSender)> = self
            .sessions
            .values()
            .map(|session| (session.id, session.sender.clone()))
            .collect();
        targets.sort_by_key(|(id, _)| *id);
        targets
    }

    /// Looks up a seated session
    pub fn get(&self, id: SessionId) -> Option<&Session> {
        self.sessions.get(&id)
    }

    /// Symbol the session currently holds
    ///
    /// `None` once the session has been unregistered, even if its connection
    /// task is still winding down.
    pub fn symbol_of(&self, id: SessionId) -> Option<Symbol> {
        self.sessions.get(&id).map(|session| session.symbol)
    }

    fn session_for(&self, symbol: Symbol) -> Option<&Session> {
        self.sessions.values().find(|session| session.symbol == symbol)
    }

    /// Number of seated sessions, never more than two
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
