//! Server network layer: TCP accept loop and per-connection handlers

use crate::broadcast::Broadcaster;
use crate::game::Game;
use crate::sessions::{RegistryError, SessionId, SessionRegistry};
use futures::{SinkExt, StreamExt};
use log::{debug, error, info, warn};
use shared::{CodecError, Frame, FrameCodec, Move, Symbol, SERVER_FULL_REASON};
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncWrite;
use tokio::net::tcp::OwnedReadHalf;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, Mutex, RwLock};
use tokio::task::JoinSet;
use tokio_util::codec::{FramedRead, FramedWrite};
use tokio_util::sync::CancellationToken;

/// Runtime options for the server
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub addr: String,
    /// Reply with `ERROR:` to the sender of a rejected move or malformed frame
    pub reject_notices: bool,
}

impl ServerConfig {
    pub fn new(addr: impl Into<String>) -> Self {
        Self {
            addr: addr.into(),
            reject_notices: false,
        }
    }
}

/// Lifecycle of a single connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Assigned,
    Active,
    Closed,
}

/// State shared by the accept loop and every connection task
#[derive(Clone)]
struct Shared {
    sessions: Arc<RwLock<SessionRegistry>>,
    game: Arc<Mutex<Game>>,
    broadcaster: Broadcaster,
    reject_notices: bool,
}

/// Authoritative tic-tac-toe server
pub struct Server {
    listener: TcpListener,
    shared: Shared,
}

impl Server {
    pub async fn bind(config: ServerConfig) -> io::Result<Self> {
        let listener = TcpListener::bind(&config.addr).await?;
        info!("Server listening on {}", listener.local_addr()?);

        let sessions = Arc::new(RwLock::new(SessionRegistry::new()));
        let broadcaster = Broadcaster::new(Arc::clone(&sessions));

        Ok(Server {
            listener,
            shared: Shared {
                sessions,
                game: Arc::new(Mutex::new(Game::new())),
                broadcaster,
                reject_notices: config.reject_notices,
            },
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accepts connections for the lifetime of the process
    ///
    /// Each connection runs in its own task inside a `JoinSet`, so finished or
    /// panicked handlers are reaped and logged here instead of being detached.
    pub async fn run(self) -> io::Result<()> {
        let mut connections: JoinSet<SocketAddr> = JoinSet::new();

        info!("Server started successfully");

        loop {
            tokio::select! {
                accepted = self.listener.accept() => {
                    match accepted {
                        Ok((stream, addr)) => {
                            info!("New connection from {}", addr);
                            let connection = Connection::new(self.shared.clone(), addr);
                            connections.spawn(async move {
                                connection.run(stream).await;
                                addr
                            });
                        }
                        Err(e) => {
                            error!("Error accepting connection: {}", e);
                            tokio::time::sleep(Duration::from_millis(10)).await;
                        }
                    }
                },

                Some(finished) = connections.join_next() => {
                    match finished {
                        Ok(addr) => debug!("Connection task for {} finished", addr),
                        Err(e) => error!("Connection task failed: {}", e),
                    }
                },
            }
        }
    }
}

/// Handler for one accepted socket
///
/// Walks `Connecting -> Assigned -> Active -> Closed`. The session is
/// unregistered and the writer task joined on every way out of `Active`, so the
/// socket is released whether the peer hung up, sent garbage, or failed a read.
struct Connection {
    shared: Shared,
    addr: SocketAddr,
    state: ConnectionState,
}

impl Connection {
    fn new(shared: Shared, addr: SocketAddr) -> Self {
        Self {
            shared,
            addr,
            state: ConnectionState::Connecting,
        }
    }

    fn transition(&mut self, next: ConnectionState) {
        debug!("Connection {}: {:?} -> {:?}", self.addr, self.state, next);
        self.state = next;
    }

    async fn run(mut self, stream: TcpStream) {
        let (reader, writer) = stream.into_split();
        let mut frames = FramedRead::new(reader, FrameCodec::new());

        let (tx, rx) = mpsc::unbounded_channel();
        let writer_closed = CancellationToken::new();
        let writer_task = tokio::spawn(write_frames(
            FramedWrite::new(writer, FrameCodec::new()),
            rx,
            self.addr,
            writer_closed.clone(),
        ));

        let admitted = self.admit(&tx).await;
        // the registry owns the only sender from here on
        drop(tx);

        if let Some((session_id, symbol)) = admitted {
            self.transition(ConnectionState::Active);

            tokio::select! {
                biased;

                _ = writer_closed.cancelled() => {
                    warn!("Session {} can no longer be written to, closing it", session_id);
                }
                served = self.serve(session_id, symbol, &mut frames) => match served {
                    Ok(()) => info!("Session {} disconnected", session_id),
                    Err(e) => warn!("Session {} closed after error: {}", session_id, e),
                },
            }

            self.shared.sessions.write().await.unregister(session_id);
        }

        if let Err(e) = writer_task.await {
            error!("Writer task for {} failed: {}", self.addr, e);
        }
        self.transition(ConnectionState::Closed);
    }

    /// Registers the session and queues its greeting, or queues a rejection
    ///
    /// Runs under the game lock so the snapshot is exactly the board the
    /// following broadcasts build on.
    async fn admit(&mut self, tx: &mpsc::UnboundedSender<Frame>) -> Option<(SessionId, Symbol)> {
        let game_lock = Arc::clone(&self.shared.game);
        let game = game_lock.lock().await;
        let registered = self
            .shared
            .sessions
            .write()
            .await
            .register(self.addr, tx.clone());

        match registered {
            Ok((session_id, symbol)) => {
                self.transition(ConnectionState::Assigned);
                let _ = tx.send(Frame::Assign(symbol));
                let _ = tx.send(game.snapshot());
                Some((session_id, symbol))
            }
            Err(RegistryError::Full) => {
                warn!("Refusing {}: {}", self.addr, SERVER_FULL_REASON);
                let _ = tx.send(Frame::Reject(SERVER_FULL_REASON.to_string()));
                None
            }
        }
    }

    /// Reads frames until EOF or a stream error
    ///
    /// The caller races this against the writer task, so a session whose
    /// socket can no longer be written to stops being read as well.
    async fn serve(
        &self,
        session_id: SessionId,
        symbol: Symbol,
        frames: &mut FramedRead<OwnedReadHalf, FrameCodec>,
    ) -> Result<(), CodecError> {
        while let Some(line) = frames.next().await {
            let line = line?;

            match line.parse::<Frame>() {
                Ok(frame) => self.dispatch(session_id, symbol, frame).await,
                Err(e) => {
                    warn!("Dropping malformed frame from session {}: {}", session_id, e);
                    self.notify(session_id, e.to_string()).await;
                }
            }
        }

        Ok(())
    }

    async fn dispatch(&self, session_id: SessionId, symbol: Symbol, frame: Frame) {
        match frame {
            Frame::Move(mv) => self.handle_move(session_id, symbol, mv).await,
            Frame::Chat(text) => {
                debug!("Relaying chat from session {}", session_id);
                self.shared
                    .broadcaster
                    .send(&Frame::Chat(text), Some(session_id))
                    .await;
            }
            Frame::Reset => {
                info!("Session {} requested a reset", session_id);
                let mut game = self.shared.game.lock().await;
                let state = game.reset();
                self.shared.broadcaster.send(&state, None).await;
            }
            other => {
                warn!("Ignoring unexpected {:?} from session {}", other, session_id);
                self.notify(session_id, format!("unexpected frame {}", other))
                    .await;
            }
        }
    }

    async fn handle_move(&self, session_id: SessionId, symbol: Symbol, mv: Move) {
        if mv.symbol != symbol {
            debug!(
                "Session {} playing {} tried to move as {}",
                session_id, symbol, mv.symbol
            );
            self.notify(session_id, format!("you play {}", symbol)).await;
            return;
        }

        // broadcasts are queued before the lock is released to keep their order
        let mut game = self.shared.game.lock().await;

        // a session dropped by a failed broadcast may have lost its seat already
        let seated = self.shared.sessions.read().await.symbol_of(session_id);
        if seated != Some(symbol) {
            debug!("Ignoring move from unseated session {}", session_id);
            return;
        }

        match game.apply_move(mv) {
            Ok(updates) => {
                for frame in &updates {
                    self.shared.broadcaster.send(frame, None).await;
                }
            }
            Err(rejection) => {
                drop(game);
                debug!("Rejected move from session {}: {}", session_id, rejection);
                self.notify(session_id, rejection.to_string()).await;
            }
        }
    }

    /// Sends an `ERROR` notice when notices are enabled, otherwise stays silent
    async fn notify(&self, session_id: SessionId, reason: String) {
        if self.shared.reject_notices {
            self.shared
                .broadcaster
                .send_to(session_id, Frame::Error(reason))
                .await;
        }
    }
}

/// Drains a session's outbound queue onto its socket
///
/// Ends when every sender is gone or a write fails. Dropping the receiver on
/// failure makes the next broadcast to this session fail, which unregisters it.
/// `closed` is cancelled on the way out, whatever the reason, which ends the
/// connection's read side too.
async fn write_frames<W>(
    mut sink: FramedWrite<W, FrameCodec>,
    mut outbound: mpsc::UnboundedReceiver<Frame>,
    addr: SocketAddr,
    closed: CancellationToken,
) where
    W: AsyncWrite + Unpin,
{
    let _closed = closed.drop_guard();
    while let Some(frame) = outbound.recv().await {
        if let Err(e) = sink.send(frame).await {
            warn!("Failed to write to {}: {}", addr, e);
            break;
        }
    }
}
