//! Embedding API.
//!
//! A host process that links the shell as a library drives it through a
//! [`ShellHandle`] instead of a TCP session.  The handle owns the global lock;
//! the dispatcher gets its copy from [`ShellHandle::shared`], so calls made
//! here serialize with presence handling and with remote commands.
//!
//! ```no_run
//! # async fn demo(handle: taish_server::application::embed::ShellHandle) -> Result<(), Box<dyn std::error::Error>> {
//! handle.load("simulator").await?;
//! handle.initialize_and_wait(2).await?;
//! let id = handle.module_id("1-1").await;
//! # let _ = id;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use taish_core::{NetifAttr, ObjectId};
use tokio::sync::{watch, Mutex};

use super::shell::{Shell, ShellError};

/// Cloneable handle over the shell and its global lock.
#[derive(Clone)]
pub struct ShellHandle {
    shell: Arc<Mutex<Shell>>,
    drained: watch::Receiver<u64>,
}

impl ShellHandle {
    /// Puts `shell` behind the global lock.
    pub fn new(shell: Shell) -> Self {
        let drained = shell.subscribe_presence();
        Self {
            shell: Arc::new(Mutex::new(shell)),
            drained,
        }
    }

    /// The global lock, for the dispatcher.
    pub fn shared(&self) -> Arc<Mutex<Shell>> {
        Arc::clone(&self.shell)
    }

    pub async fn load(&self, backend: &str) -> Result<(), ShellError> {
        self.shell.lock().await.load(backend)
    }

    pub async fn init(&self) -> Result<(), ShellError> {
        self.shell.lock().await.init()
    }

    /// Runs `init`, then waits until at least `expected` presence events
    /// have been processed by the dispatcher.
    pub async fn initialize_and_wait(&self, expected: u64) -> Result<(), ShellError> {
        self.init().await?;
        self.wait_for_presence(expected).await
    }

    /// Waits until at least `expected` presence events have been processed.
    ///
    /// # Errors
    ///
    /// [`ShellError::Stopped`] if the shell is dropped first.
    pub async fn wait_for_presence(&self, expected: u64) -> Result<(), ShellError> {
        let mut drained = self.drained.clone();
        drained
            .wait_for(|n| *n >= expected)
            .await
            .map(|_| ())
            .map_err(|_| ShellError::Stopped { expected })
    }

    pub async fn set_netif_attribute(&self, module: ObjectId, attr: NetifAttr) -> Result<(), ShellError> {
        self.shell.lock().await.set_netif_attribute(module, attr)
    }

    pub async fn module_id(&self, location: &str) -> Option<ObjectId> {
        self.shell.lock().await.module_id(location)
    }

    /// Snapshot of `(location, module id)` in discovery order.
    pub async fn module_list(&self) -> Vec<(String, ObjectId)> {
        self.shell
            .lock()
            .await
            .module_list()
            .map(|(loc, id)| (loc.to_string(), id))
            .collect()
    }
}
