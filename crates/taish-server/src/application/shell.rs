//! The shell state guarded by the global lock.
//!
//! One [`Shell`] exists per process.  The dispatcher and every command
//! handler reach it through the same `tokio::sync::Mutex`, so vendor calls
//! and hardware-model updates are never concurrent.

use std::sync::Arc;

use taish_core::{
    ApiCategory, ApiError, BackendLoader, LoadError, LogLevel, ModuleError, NetifAttr, ObjectId,
    PresenceCallback, PresenceEvent, ServiceMethodTable, TransponderApi,
};
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::hardware::{HardwareModel, PresenceError};

/// Failures of shell operations.  All are reported to the operator; none
/// ends the session.
#[derive(Debug, Error)]
pub enum ShellError {
    #[error("Need to load TAI library at first")]
    NotLoaded,

    #[error("TAI library is already loaded")]
    AlreadyLoaded,

    #[error("Need to initialize TAI library at first")]
    NotInitialized,

    #[error("TAI library is already initialized")]
    AlreadyInitialized,

    #[error("Loading failed: {0}")]
    Load(#[from] LoadError),

    #[error("Failed to initialize: {0}")]
    Initialize(#[source] ApiError),

    #[error("Failed to load API for {category}: {source}")]
    Query {
        category: ApiCategory,
        #[source]
        source: ApiError,
    },

    #[error("Failed to set log level for {category}: {source}")]
    LogSet {
        category: ApiCategory,
        #[source]
        source: ApiError,
    },

    #[error("Invalid module ID {0}")]
    UnknownModule(ObjectId),

    #[error("{0}")]
    SetAttribute(#[from] ModuleError),

    #[error("shell stopped before {expected} presence event(s) were processed")]
    Stopped { expected: u64 },
}

/// Loaded backend, init flag, vendor log levels and the hardware model.
pub struct Shell {
    loader: Arc<dyn BackendLoader>,
    presence_callback: PresenceCallback,
    api: Option<Box<dyn TransponderApi>>,
    initialized: bool,
    log_levels: [LogLevel; 4],
    hardware: HardwareModel,
    drained: watch::Sender<u64>,
}

impl Shell {
    /// Creates an empty shell.
    ///
    /// `presence_callback` is handed to the backend on `init`; it must only
    /// enqueue.
    pub fn new(loader: Arc<dyn BackendLoader>, presence_callback: PresenceCallback) -> Self {
        let (drained, _) = watch::channel(0);
        Self {
            loader,
            presence_callback,
            api: None,
            initialized: false,
            log_levels: [LogLevel::default(); 4],
            hardware: HardwareModel::new(),
            drained,
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.api.is_some()
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn log_level(&self, category: ApiCategory) -> LogLevel {
        self.log_levels[category.index()]
    }

    pub fn hardware(&self) -> &HardwareModel {
        &self.hardware
    }

    /// Observes the running count of drained presence events.
    pub fn subscribe_presence(&self) -> watch::Receiver<u64> {
        self.drained.subscribe()
    }

    /// Resolves the named backend through the injected loader.
    pub fn load(&mut self, backend: &str) -> Result<(), ShellError> {
        if self.api.is_some() {
            return Err(ShellError::AlreadyLoaded);
        }
        let api = self.loader.load(backend)?;
        info!("backend `{backend}` loaded");
        self.api = Some(api);
        Ok(())
    }

    /// Pushes the stored log levels, initializes the backend with the
    /// presence callback and checks the module, network-interface and
    /// host-interface categories.
    pub fn init(&mut self) -> Result<(), ShellError> {
        let api = self.api.as_deref_mut().ok_or(ShellError::NotLoaded)?;
        if self.initialized {
            return Err(ShellError::AlreadyInitialized);
        }

        for category in ApiCategory::ALL {
            let level = self.log_levels[category.index()];
            api.log_set(category, level)
                .map_err(|source| ShellError::LogSet { category, source })?;
        }

        api.initialize(ServiceMethodTable {
            module_presence: Arc::clone(&self.presence_callback),
        })
        .map_err(ShellError::Initialize)?;
        self.initialized = true;

        for category in [
            ApiCategory::Module,
            ApiCategory::NetworkInterface,
            ApiCategory::HostInterface,
        ] {
            api.query(category)
                .map_err(|source| ShellError::Query { category, source })?;
        }
        info!("backend initialized");
        Ok(())
    }

    /// Stores `level` for `category` and pushes it to the backend.
    pub fn set_log_level(&mut self, category: ApiCategory, level: LogLevel) -> Result<(), ShellError> {
        let api = self.api.as_deref_mut().ok_or(ShellError::NotLoaded)?;
        self.log_levels[category.index()] = level;
        api.log_set(category, level)
            .map_err(|source| ShellError::LogSet { category, source })?;
        debug!("vendor log level for {category} set to {level}");
        Ok(())
    }

    /// Checks that attributes can be applied to `module` right now.
    pub fn ensure_module(&self, module: ObjectId) -> Result<(), ShellError> {
        if self.api.is_none() {
            return Err(ShellError::NotLoaded);
        }
        if !self.initialized {
            return Err(ShellError::NotInitialized);
        }
        match self.hardware.module(module) {
            Some(_) => Ok(()),
            None => Err(ShellError::UnknownModule(module)),
        }
    }

    /// Applies `attr` to every network interface of `module`.
    pub fn set_netif_attribute(&mut self, module: ObjectId, attr: NetifAttr) -> Result<(), ShellError> {
        self.ensure_module(module)?;
        let api = self.api.as_deref_mut().ok_or(ShellError::NotLoaded)?;
        let target = self
            .hardware
            .module(module)
            .ok_or(ShellError::UnknownModule(module))?;
        target.set_netif_attribute(api, attr)?;
        debug!("module {module}: {:?} applied to {} netif(s)", attr, target.network_interfaces().len());
        Ok(())
    }

    /// Module id registered for `location`.
    pub fn module_id(&self, location: &str) -> Option<ObjectId> {
        self.hardware.registry().module_at(location)
    }

    /// `(location, module id)` pairs in discovery order.
    pub fn module_list(&self) -> impl Iterator<Item = (&str, ObjectId)> {
        self.hardware.registry().iter()
    }

    /// Applies a batch of drained presence events in arrival order.
    ///
    /// Events that arrive while no backend is initialized are counted and
    /// skipped.
    ///
    /// # Errors
    ///
    /// The first vendor failure stops the batch and is returned; the caller
    /// treats it as fatal.
    pub fn handle_presence(&mut self, events: Vec<PresenceEvent>) -> Result<(), PresenceError> {
        for event in events {
            info!("presence: present={} location={}", event.present, event.location);
            match self.api.as_deref_mut() {
                Some(api) if self.initialized => {
                    self.hardware.apply_presence(api, &event)?;
                }
                _ => warn!(
                    "presence for {} ignored: backend not initialized",
                    event.location
                ),
            }
            self.drained.send_modify(|n| *n += 1);
        }
        Ok(())
    }

    /// Uninitializes the backend if `init` succeeded.  Called once on
    /// shutdown.
    pub fn shutdown(&mut self) {
        if !self.initialized {
            return;
        }
        if let Some(api) = self.api.as_deref_mut() {
            match api.uninitialize() {
                Ok(()) => info!("backend uninitialized"),
                Err(e) => warn!("failed to uninitialize backend: {e}"),
            }
        }
        self.initialized = false;
    }
}
