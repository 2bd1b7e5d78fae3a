//! The event dispatcher: one loop, three sources.
//!
//! Each iteration waits on the presence channel, the listener and the client
//! (through [`ConnectionManager::next_event`]) plus the shutdown signal.  The
//! wait is `biased` with presence first, so when hardware appears in the same
//! iteration a command arrives, the command sees the new module.  One event is
//! handled per iteration, and everything that touches the shell does so under
//! the global lock.
//!
//! The loop never waits on the client.  Responses are queued on the session
//! and written by its own task; a client whose queue fills up is dropped.
//!
//! Error handling follows three tiers:
//!
//! - command errors are written to the client and the loop continues;
//! - connection faults move the connection manager between states;
//! - a failed presence-triggered module build or a failed listener restart
//!   ends the loop with a [`DispatchError`].

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use taish_core::{CommandStatus, PROMPT};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::application::commands;
use crate::application::hardware::PresenceError;
use crate::application::shell::Shell;

use super::network::connection_manager::is_transient_accept_error;
use super::network::{ConnectionEvent, ConnectionManager, NetworkError};
use super::presence::PresenceChannel;

/// Conditions that end the server.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("presence handling failed: {0}")]
    Presence(#[from] PresenceError),

    #[error("restarting the listener failed: {0}")]
    Restart(#[source] NetworkError),
}

/// Owns the connection manager and routes events to the shell.
pub struct Dispatcher {
    shell: Arc<Mutex<Shell>>,
    presence: PresenceChannel,
    connections: ConnectionManager,
}

impl Dispatcher {
    pub fn new(shell: Arc<Mutex<Shell>>, presence: PresenceChannel, connections: ConnectionManager) -> Self {
        Self {
            shell,
            presence,
            connections,
        }
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.connections.local_addr()
    }

    /// Runs until `shutdown` resolves or a fatal error occurs.  The backend
    /// is uninitialized on the way out in both cases.
    pub async fn run<F>(mut self, shutdown: F) -> Result<(), DispatchError>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        info!("dispatcher started on {}", self.connections.local_addr());

        let result = loop {
            let before = self.connections.state();
            let step = tokio::select! {
                biased;
                () = self.presence.notified() => self.drain_presence().await,
                event = self.connections.next_event() => self.handle_connection(event).await,
                () = &mut shutdown => {
                    info!("shutdown requested");
                    break Ok(());
                }
            };
            let after = self.connections.state();
            if before != after {
                debug!("connection state {before:?} -> {after:?}");
            }
            if let Err(e) = step {
                error!("fatal: {e}");
                break Err(e);
            }
        };

        self.connections.disconnect();
        let undrained = self.presence.pending();
        if undrained > 0 {
            debug!("{undrained} presence event(s) left undrained");
        }
        self.shell.lock().await.shutdown();
        info!("dispatcher stopped");
        result
    }

    async fn drain_presence(&mut self) -> Result<(), DispatchError> {
        let mut shell = self.shell.lock().await;
        let events = self.presence.drain();
        if events.is_empty() {
            return Ok(());
        }
        debug!("draining {} presence event(s)", events.len());
        shell.handle_presence(events)?;
        Ok(())
    }

    async fn handle_connection(&mut self, event: ConnectionEvent) -> Result<(), DispatchError> {
        match event {
            ConnectionEvent::Accepted(stream, peer) => {
                if self.connections.client_mut().is_some() {
                    self.connections.refuse(stream, peer);
                    return Ok(());
                }
                let greeted = self.connections.install(stream, peer).send(PROMPT.to_string());
                if let Err(e) = greeted {
                    warn!("failed to greet {peer}: {e}");
                    self.connections.disconnect();
                }
            }
            ConnectionEvent::AcceptFailed(e) if is_transient_accept_error(&e) => {
                debug!("transient accept failure: {e}");
            }
            ConnectionEvent::AcceptFailed(e) => {
                warn!("listener failed: {e}; restarting");
                self.connections.disconnect();
                self.connections
                    .restart()
                    .await
                    .map_err(DispatchError::Restart)?;
                info!("listener restart #{} complete", self.connections.restarts());
            }
            ConnectionEvent::Line(line) => self.run_command(&line).await,
            ConnectionEvent::Closed => self.connections.disconnect(),
            ConnectionEvent::ClientError(e) => {
                warn!("client read failed: {e}");
                self.connections.disconnect();
            }
        }
        Ok(())
    }

    /// One command: execute under the lock, then queue the output and the
    /// prompt.
    async fn run_command(&mut self, line: &str) {
        let mut response = String::new();
        let status = {
            let mut shell = self.shell.lock().await;
            commands::execute(&mut shell, line, &mut response)
        };
        debug!("`{}` -> {}", line.trim_end(), status.code());
        response.push_str(PROMPT);

        let Some(session) = self.connections.client_mut() else {
            return;
        };
        if let Err(e) = session.send(response) {
            warn!("dropping client {}: {e}", session.peer());
            self.connections.disconnect();
            return;
        }
        if status == CommandStatus::Terminate {
            self.connections.disconnect();
        }
    }
}
