//! Client connection: one task reads server frames into the cache, the
//! caller's loop writes outbound frames

use crate::cache::ClientCache;
use futures::{SinkExt, StreamExt};
use log::{debug, info, warn};
use shared::{CodecError, Frame, FrameCodec};
use std::io;
use std::sync::Arc;
use tokio::io::AsyncRead;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpStream, ToSocketAddrs};
use tokio::sync::mpsc;
use tokio_util::codec::{FramedRead, FramedWrite};

pub struct Client {
    reader: FramedRead<OwnedReadHalf, FrameCodec>,
    writer: FramedWrite<OwnedWriteHalf, FrameCodec>,
    cache: Arc<ClientCache>,
}

impl Client {
    pub async fn connect(addr: impl ToSocketAddrs, cache: Arc<ClientCache>) -> io::Result<Self> {
        let stream = TcpStream::connect(addr).await?;
        info!("Connected to {}", stream.peer_addr()?);
        stream.set_nodelay(true)?;

        let (reader, writer) = stream.into_split();
        Ok(Client {
            reader: FramedRead::new(reader, FrameCodec::new()),
            writer: FramedWrite::new(writer, FrameCodec::new()),
            cache,
        })
    }

    /// Runs until the server goes away or every outbound sender is dropped
    ///
    /// Incoming frames are applied on a separate task so a slow write never
    /// delays a board update.
    pub async fn run(self, mut outbound: mpsc::UnboundedReceiver<Frame>) -> Result<(), CodecError> {
        let Client {
            reader,
            mut writer,
            cache,
        } = self;

        let mut receiver = tokio::spawn(receive_updates(reader, Arc::clone(&cache)));

        let result = loop {
            tokio::select! {
                frame = outbound.recv() => {
                    let Some(frame) = frame else {
                        debug!("Outbound queue closed");
                        break Ok(());
                    };
                    if let Err(e) = writer.send(frame).await {
                        warn!("Failed to send to server: {}", e);
                        cache.set_disconnected();
                        break Err(e);
                    }
                },

                finished = &mut receiver => {
                    break match finished {
                        Ok(result) => result,
                        Err(e) => {
                            warn!("Receiver task failed: {}", e);
                            cache.set_disconnected();
                            Ok(())
                        }
                    };
                },
            }
        };

        receiver.abort();
        result
    }
}

/// Applies every frame from `frames` to `cache` until EOF or a stream error
///
/// Lines that do not parse are logged and skipped. The cache is marked
/// disconnected on the way out either way.
pub async fn receive_updates<R>(
    mut frames: FramedRead<R, FrameCodec>,
    cache: Arc<ClientCache>,
) -> Result<(), CodecError>
where
    R: AsyncRead + Unpin,
{
    let result = async {
        while let Some(line) = frames.next().await {
            let line = line?;
            match line.parse::<Frame>() {
                Ok(frame) => {
                    debug!("Received {:?}", frame);
                    cache.apply(&frame);
                }
                Err(e) => warn!("Skipping malformed frame {:?}: {}", line, e),
            }
        }
        Ok(())
    }
    .await;

    match &result {
        Ok(()) => info!("Server closed the connection"),
        Err(e) => warn!("Connection lost: {}", e),
    }
    cache.set_disconnected();
    result
}
