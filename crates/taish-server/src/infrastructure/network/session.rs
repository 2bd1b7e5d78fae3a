//! One connected operator session.
//!
//! Reads happen on the dispatcher task.  Writes never do: responses go into
//! a bounded outbox drained by a per-session writer task, so a client that
//! stops reading fills its own outbox instead of stalling the dispatcher.

use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::debug;
use uuid::Uuid;

/// Longest accepted command line, excluding the line terminator.
pub const MAX_LINE_BYTES: usize = 4096;

/// Responses that may wait for a slow reader before the session is dropped.
pub const OUTBOX_CAPACITY: usize = 64;

/// How long a closed session may keep flushing queued output.
const CLOSE_LINGER: Duration = Duration::from_secs(2);

/// A response could not be queued.
#[derive(Debug, Error)]
pub enum SendError {
    #[error("client is not reading; {0} responses already queued")]
    Backlogged(usize),

    #[error("client connection is closed")]
    Closed,
}

/// The active client: a capped line reader, an outbox, and identity for
/// logging.
#[derive(Debug)]
pub struct ClientSession {
    id: Uuid,
    peer: SocketAddr,
    reader: BufReader<OwnedReadHalf>,
    partial: Vec<u8>,
    outbox: mpsc::Sender<String>,
    writer: JoinHandle<()>,
}

impl ClientSession {
    /// Splits `stream` and starts the writer task.  Must be called inside a
    /// tokio runtime.
    pub fn new(stream: TcpStream, peer: SocketAddr) -> Self {
        let id = Uuid::new_v4();
        let (reader, writer) = stream.into_split();
        let (outbox, pending) = mpsc::channel(OUTBOX_CAPACITY);
        Self {
            id,
            peer,
            reader: BufReader::new(reader),
            partial: Vec::new(),
            outbox,
            writer: tokio::spawn(write_responses(writer, pending, id)),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    /// Next line without its `\n` or `\r\n`; `None` at end of stream.
    ///
    /// Cancel-safe: bytes of a partly read line are kept in the session and
    /// the next call continues the same line.
    ///
    /// # Errors
    ///
    /// `InvalidData` for a line longer than [`MAX_LINE_BYTES`] or one that is
    /// not UTF-8, and any I/O error from the socket.
    pub async fn read_line(&mut self) -> io::Result<Option<String>> {
        // One extra byte for the `\n`, one for a `\r` before it.
        let limit = (MAX_LINE_BYTES + 2).saturating_sub(self.partial.len()) as u64;
        (&mut self.reader)
            .take(limit)
            .read_until(b'\n', &mut self.partial)
            .await?;

        if self.partial.last() != Some(&b'\n') {
            if self.partial.len() >= MAX_LINE_BYTES + 2 {
                self.partial.clear();
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("line longer than {MAX_LINE_BYTES} bytes"),
                ));
            }
            if self.partial.is_empty() {
                return Ok(None);
            }
        }

        let mut line = std::mem::take(&mut self.partial);
        if line.last() == Some(&b'\n') {
            line.pop();
            if line.last() == Some(&b'\r') {
                line.pop();
            }
        }
        if line.len() > MAX_LINE_BYTES {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("line longer than {MAX_LINE_BYTES} bytes"),
            ));
        }
        String::from_utf8(line)
            .map(Some)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }

    /// Queues `text` for the writer task.  Never waits.
    ///
    /// # Errors
    ///
    /// [`SendError::Backlogged`] when the outbox is full, and
    /// [`SendError::Closed`] when the writer task has stopped.
    pub fn send(&self, text: String) -> Result<(), SendError> {
        self.outbox.try_send(text).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => SendError::Backlogged(OUTBOX_CAPACITY),
            mpsc::error::TrySendError::Closed(_) => SendError::Closed,
        })
    }

    /// Ends the session without waiting.
    ///
    /// The writer task flushes what is queued and then sends FIN.  If the
    /// peer does not take the output within a short linger period the task
    /// is aborted and the socket dropped.
    pub fn close(self) {
        let Self {
            id,
            outbox,
            mut writer,
            ..
        } = self;
        drop(outbox);
        tokio::spawn(async move {
            if timeout(CLOSE_LINGER, &mut writer).await.is_err() {
                debug!("session {id}: output not drained in {CLOSE_LINGER:?}, dropping it");
                writer.abort();
            }
        });
    }
}

async fn write_responses(
    mut writer: OwnedWriteHalf,
    mut pending: mpsc::Receiver<String>,
    id: Uuid,
) {
    while let Some(text) = pending.recv().await {
        let written = async {
            writer.write_all(text.as_bytes()).await?;
            writer.flush().await
        }
        .await;
        if let Err(e) = written {
            debug!("session {id}: write failed: {e}");
            return;
        }
    }
    let _ = writer.shutdown().await;
}
