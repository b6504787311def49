//! Per-connection task
//!
//! Each accepted socket is split in two. The read half stays here and feeds
//! the demultiplexer; the write half moves into a writer task that drains the
//! session's outbound queue. Responses, cache replays and broadcast frames
//! all go through that queue, so a slow subscriber only ever blocks its own
//! writer.
//!
//! ```text
//!   socket ──read──► Demuxer ──► Session ──► Registry ──► other sessions' queues
//!                                  │
//!                                  └──► own queue ──► writer task ──► socket
//! ```

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;

use crate::error::{Error, Result};
use crate::protocol::{Demuxer, Packet};
use crate::registry::Registry;
use crate::session::{Flow, Session, SessionHandle};

use super::config::ServerConfig;

/// Why the read loop woke up
enum Event {
    Read(io::Result<usize>),
    WriterStopped(io::Result<()>),
    Shutdown,
}

/// One client connection
pub struct Connection {
    session: Session,
    reader: OwnedReadHalf,
    demuxer: Demuxer,
    writer: Option<JoinHandle<io::Result<()>>>,
    stop_writer: Option<oneshot::Sender<()>>,
    config: ServerConfig,
    shutdown: watch::Receiver<bool>,
}

impl Connection {
    /// Wrap an accepted socket and start its writer task
    pub fn new(
        session_id: String,
        socket: TcpStream,
        peer_addr: SocketAddr,
        config: ServerConfig,
        registry: Arc<Registry>,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        let (reader, write_half) = socket.into_split();
        let (outbox, queue) = mpsc::unbounded_channel();
        let (stop_writer, stop) = oneshot::channel();

        let handle = Arc::new(SessionHandle::new(session_id, peer_addr, outbox));
        let writer = tokio::spawn(write_loop(write_half, queue, stop));

        Self {
            session: Session::new(handle, registry),
            reader,
            demuxer: Demuxer::with_capacity(config.read_buffer_size),
            writer: Some(writer),
            stop_writer: Some(stop_writer),
            config,
            shutdown,
        }
    }

    pub fn session_id(&self) -> &str {
        self.session.id()
    }

    /// Run until the peer goes away, TEARDOWN, an error or server shutdown
    ///
    /// The session always leaves the registry and queued output is flushed
    /// before this returns.
    pub async fn run(&mut self) -> Result<()> {
        tracing::info!(
            session_id = %self.session.id(),
            peer = %self.session.handle().peer_addr(),
            "Session started"
        );

        let result = self.read_loop().await;

        self.session.close().await;
        self.finish_writer().await;

        result
    }

    async fn read_loop(&mut self) -> Result<()> {
        loop {
            while let Some(packet) = self.demuxer.next_packet() {
                match packet {
                    Packet::Request(request) => {
                        if self.session.on_request(request).await == Flow::Close {
                            return Ok(());
                        }
                    }
                    Packet::Frame(frame) => self.session.on_frame(frame).await,
                }
            }

            let event = {
                let idle_timeout = self.config.idle_timeout;
                let buf = self.demuxer.read_buffer(self.config.read_buffer_size);
                let read = self.reader.read_buf(buf);
                let writer = self.writer.as_mut();

                tokio::select! {
                    result = read_with_timeout(read, idle_timeout) => Event::Read(result),
                    result = wait_writer(writer) => Event::WriterStopped(result),
                    _ = self.shutdown.changed() => Event::Shutdown,
                }
            };

            match event {
                Event::Read(Ok(0)) => {
                    tracing::debug!(session_id = %self.session.id(), "Peer closed connection");
                    return Ok(());
                }
                Event::Read(Ok(_)) => {}
                Event::Read(Err(e)) => return Err(e.into()),
                Event::WriterStopped(result) => {
                    self.writer = None;
                    let reason = match result {
                        Ok(()) => "writer stopped".to_string(),
                        Err(e) => e.to_string(),
                    };
                    return Err(Error::Transport(reason));
                }
                Event::Shutdown => {
                    tracing::debug!(session_id = %self.session.id(), "Closing for server shutdown");
                    return Ok(());
                }
            }
        }
    }

    /// Let the writer flush what is queued, then shut the socket down
    async fn finish_writer(&mut self) {
        if let Some(stop) = self.stop_writer.take() {
            let _ = stop.send(());
        }
        if let Some(writer) = self.writer.take() {
            match writer.await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    tracing::debug!(session_id = %self.session.id(), error = %e, "Writer error");
                }
                Err(e) => {
                    tracing::warn!(session_id = %self.session.id(), error = %e, "Writer task failed");
                }
            }
        }
    }
}

async fn read_with_timeout<F>(read: F, idle_timeout: Option<std::time::Duration>) -> io::Result<usize>
where
    F: std::future::Future<Output = io::Result<usize>>,
{
    match idle_timeout {
        Some(limit) => match tokio::time::timeout(limit, read).await {
            Ok(result) => result,
            Err(_) => Err(io::Error::new(io::ErrorKind::TimedOut, "idle timeout")),
        },
        None => read.await,
    }
}

async fn wait_writer(writer: Option<&mut JoinHandle<io::Result<()>>>) -> io::Result<()> {
    match writer {
        Some(handle) => match handle.await {
            Ok(result) => result,
            Err(e) => Err(io::Error::other(e)),
        },
        None => std::future::pending().await,
    }
}

/// Drain the outbound queue into the socket
///
/// On stop, whatever is already queued is written before the socket is shut
/// down.
async fn write_loop(
    mut writer: OwnedWriteHalf,
    mut queue: mpsc::UnboundedReceiver<Bytes>,
    mut stop: oneshot::Receiver<()>,
) -> io::Result<()> {
    loop {
        tokio::select! {
            biased;
            data = queue.recv() => match data {
                Some(data) => writer.write_all(&data).await?,
                None => break,
            },
            _ = &mut stop => {
                while let Ok(data) = queue.try_recv() {
                    writer.write_all(&data).await?;
                }
                break;
            }
        }
    }
    writer.shutdown().await
}

#[cfg(test)]
mod tests {
    use tokio::net::TcpListener;

    use super::*;

    async fn pair() -> (TcpStream, TcpStream) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let client = TcpStream::connect(addr).await.unwrap();
        let (server, _) = listener.accept().await.unwrap();
        (server, client)
    }

    #[tokio::test]
    async fn test_teardown_flushes_and_closes() {
        let (server, mut client) = pair().await;
        let peer = server.peer_addr().unwrap();
        let (_tx, shutdown) = watch::channel(false);

        let mut connection = Connection::new(
            "C1".into(),
            server,
            peer,
            ServerConfig::default(),
            Arc::new(Registry::new()),
            shutdown,
        );
        let task = tokio::spawn(async move { connection.run().await });

        client
            .write_all(b"OPTIONS * RTSP/1.0\r\nCSeq: 1\r\n\r\nTEARDOWN * RTSP/1.0\r\nCSeq: 2\r\n\r\n")
            .await
            .unwrap();

        let mut received = Vec::new();
        client.read_to_end(&mut received).await.unwrap();
        let text = String::from_utf8(received).unwrap();
        assert!(text.starts_with("RTSP/1.0 200 OK\r\nCSeq: 1\r\nSession: C1\r\nPublic: "));
        assert!(text.ends_with("RTSP/1.0 200 OK\r\nCSeq: 2\r\nSession: C1\r\n\r\n"));

        assert!(task.await.unwrap().is_ok());
    }

    #[tokio::test]
    async fn test_shutdown_signal_ends_connection() {
        let (server, mut client) = pair().await;
        let peer = server.peer_addr().unwrap();
        let (tx, shutdown) = watch::channel(false);

        let mut connection = Connection::new(
            "C2".into(),
            server,
            peer,
            ServerConfig::default(),
            Arc::new(Registry::new()),
            shutdown,
        );
        let task = tokio::spawn(async move { connection.run().await });

        tx.send(true).unwrap();
        assert!(task.await.unwrap().is_ok());

        let mut rest = Vec::new();
        client.read_to_end(&mut rest).await.unwrap();
        assert!(rest.is_empty());
    }

    #[tokio::test]
    async fn test_idle_timeout() {
        let (server, _client) = pair().await;
        let peer = server.peer_addr().unwrap();
        let (_tx, shutdown) = watch::channel(false);
        let config = ServerConfig::default().idle_timeout(std::time::Duration::from_millis(50));

        let mut connection = Connection::new(
            "C3".into(),
            server,
            peer,
            config,
            Arc::new(Registry::new()),
            shutdown,
        );

        let result = connection.run().await;
        assert!(matches!(result, Err(Error::Io(e)) if e.kind() == io::ErrorKind::TimedOut));
    }
}
