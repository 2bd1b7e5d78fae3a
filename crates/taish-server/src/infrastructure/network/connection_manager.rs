//! ConnectionManager: the listening socket and the single client slot.
//!
//! ```text
//!            accept                 disconnect
//! Listening ────────► Connected ───────────────► Listening
//!     │                   │
//!     └── listener error ─┴──► Faulted ── restart ──► Listening
//! ```
//!
//! At most one client is connected.  A connection that arrives while the slot
//! is taken is accepted, told why, and closed (see [`ConnectionManager::refuse`]).

use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use taish_core::ERROR_PREFIX;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;
use tracing::{info, warn};

use super::session::ClientSession;

/// Error type for listener management.
#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("bind failed on {addr}: {source}")]
    BindFailed {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },
}

/// Where the manager is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Listening,
    Connected,
    Faulted,
}

/// Something the dispatcher has to react to.
#[derive(Debug)]
pub enum ConnectionEvent {
    /// A new connection is ready to be installed or refused.
    Accepted(TcpStream, SocketAddr),
    /// `accept` failed.
    AcceptFailed(io::Error),
    /// The client sent a full line.
    Line(String),
    /// The client closed its side.
    Closed,
    /// Reading from the client failed, including non-UTF-8 input.
    ClientError(io::Error),
}

/// Text sent to a second client before it is closed.
pub const BUSY_MESSAGE: &str = "another session is active; try again later";

const REFUSE_TIMEOUT: Duration = Duration::from_secs(2);

/// Owns the listener and the client slot.
pub struct ConnectionManager {
    bind_addr: SocketAddr,
    listener: Option<TcpListener>,
    client: Option<ClientSession>,
    restarts: u64,
}

impl ConnectionManager {
    /// Binds the listening socket.
    ///
    /// When `addr` has port 0 the chosen port is remembered, so a later
    /// [`restart`](Self::restart) binds the same port again.
    ///
    /// # Errors
    ///
    /// Returns [`NetworkError::BindFailed`] if the socket cannot be bound.
    pub async fn bind(addr: SocketAddr) -> Result<Self, NetworkError> {
        let listener = bind_listener(addr).await?;
        let bind_addr = listener.local_addr().unwrap_or(addr);
        info!("listening on {bind_addr}");
        Ok(Self {
            bind_addr,
            listener: Some(listener),
            client: None,
            restarts: 0,
        })
    }

    pub fn state(&self) -> ConnectionState {
        match (&self.listener, &self.client) {
            (None, _) => ConnectionState::Faulted,
            (Some(_), Some(_)) => ConnectionState::Connected,
            (Some(_), None) => ConnectionState::Listening,
        }
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.bind_addr
    }

    /// Points later restarts at `addr`.
    #[cfg(test)]
    pub(crate) fn set_bind_addr(&mut self, addr: SocketAddr) {
        self.bind_addr = addr;
    }

    /// Number of successful listener restarts so far.
    pub fn restarts(&self) -> u64 {
        self.restarts
    }

    pub fn client_mut(&mut self) -> Option<&mut ClientSession> {
        self.client.as_mut()
    }

    /// Waits for the next listener or client event.
    ///
    /// Cancel-safe: both `accept` and the line reader keep their progress when
    /// this future is dropped, so the dispatcher may race it against other
    /// sources.  With no listener and no client this never resolves.
    pub async fn next_event(&mut self) -> ConnectionEvent {
        let listener = self.listener.as_ref();
        let client = self.client.as_mut();

        let accept = async {
            match listener {
                Some(listener) => listener.accept().await,
                None => std::future::pending().await,
            }
        };
        let read = async {
            match client {
                Some(client) => client.read_line().await,
                None => std::future::pending().await,
            }
        };

        tokio::select! {
            accepted = accept => match accepted {
                Ok((stream, peer)) => ConnectionEvent::Accepted(stream, peer),
                Err(e) => ConnectionEvent::AcceptFailed(e),
            },
            line = read => match line {
                Ok(Some(line)) => ConnectionEvent::Line(line),
                Ok(None) => ConnectionEvent::Closed,
                Err(e) => ConnectionEvent::ClientError(e),
            },
        }
    }

    /// Makes `stream` the active client.  The slot must be free.
    pub fn install(&mut self, stream: TcpStream, peer: SocketAddr) -> &mut ClientSession {
        let session = ClientSession::new(stream, peer);
        info!("client {peer} connected (session {})", session.id());
        self.client.insert(session)
    }

    /// Tells a surplus client the slot is taken and closes it.
    ///
    /// The notice is written on its own task so the caller never waits on
    /// the refused peer.
    pub fn refuse(&self, mut stream: TcpStream, peer: SocketAddr) {
        warn!("refusing {peer}: a session is already active");
        tokio::spawn(async move {
            let message = format!("{ERROR_PREFIX}{BUSY_MESSAGE}\n");
            let notified = timeout(REFUSE_TIMEOUT, async {
                stream.write_all(message.as_bytes()).await?;
                stream.shutdown().await
            })
            .await;
            match notified {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!("failed to notify refused client {peer}: {e}"),
                Err(_) => warn!("refused client {peer} did not take the notice"),
            }
        });
    }

    /// Drops the active client, if any.  The listener keeps running.
    pub fn disconnect(&mut self) {
        if let Some(session) = self.client.take() {
            info!("client {} disconnected (session {})", session.peer(), session.id());
            session.close();
        }
    }

    /// Closes and recreates the listening socket.
    ///
    /// # Errors
    ///
    /// Returns [`NetworkError::BindFailed`] and stays [`ConnectionState::Faulted`]
    /// if the socket cannot be recreated.
    pub async fn restart(&mut self) -> Result<(), NetworkError> {
        self.listener = None;
        let listener = bind_listener(self.bind_addr).await?;
        self.listener = Some(listener);
        self.restarts += 1;
        info!("listener restarted on {}", self.bind_addr);
        Ok(())
    }
}

/// Accept errors that say nothing about the listener itself.
pub fn is_transient_accept_error(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::Interrupted
            | io::ErrorKind::WouldBlock
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::ConnectionReset
    )
}

async fn bind_listener(addr: SocketAddr) -> Result<TcpListener, NetworkError> {
    TcpListener::bind(addr)
        .await
        .map_err(|source| NetworkError::BindFailed { addr, source })
}
