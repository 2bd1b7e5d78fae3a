//! The vendor transponder API boundary.
//!
//! A vendor ships its transponder support as a library exposing a table of
//! entry points: initialize/uninitialize, per-category log levels, and
//! create/get/set operations on modules, host interfaces and network
//! interfaces.  The shell never talks to hardware directly; it only calls
//! through a [`TransponderApi`] implementation injected at run time by a
//! [`BackendLoader`].
//!
//! # Threading contract
//!
//! Every method takes `&mut self`.  The server keeps the backend behind its
//! single global lock, so calls into the vendor API are never concurrent.
//! The one exception is the presence callback handed over in
//! [`ServiceMethodTable`]: the backend may invoke it from a thread it owns, at
//! any time, without holding that lock.  The callback therefore only enqueues
//! and never calls back into the API.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

mod types;

pub use types::{
    ApiCategory, ApiError, AttributeValue, LogLevel, ModuleAttrId, ObjectId, UnknownName,
};

use crate::attributes::NetifAttr;

/// Callback invoked by the vendor layer when a module appears (`true`) or
/// disappears (`false`) at a location.
///
/// Implementations must return promptly: they run on a vendor-owned thread.
pub type PresenceCallback = Arc<dyn Fn(bool, &str) + Send + Sync>;

/// Services the shell hands to the vendor library at initialization.
#[derive(Clone)]
pub struct ServiceMethodTable {
    pub module_presence: PresenceCallback,
}

impl fmt::Debug for ServiceMethodTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceMethodTable")
            .field("module_presence", &"<callback>")
            .finish()
    }
}

/// Capability set of a vendor transponder backend.
///
/// Each method maps to one entry of the vendor's function table.  All of them
/// report failure through [`ApiError`]; success carries the created handle or
/// the queried values.
#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
pub trait TransponderApi: Send {
    /// Starts the vendor library.  After this returns the library may begin
    /// calling `services.module_presence`.
    fn initialize(&mut self, services: ServiceMethodTable) -> Result<(), ApiError>;

    /// Stops the vendor library.  No presence callbacks follow a successful return.
    fn uninitialize(&mut self) -> Result<(), ApiError>;

    /// Checks that the backend exposes the operations of `category`.
    fn query(&mut self, category: ApiCategory) -> Result<(), ApiError>;

    /// Sets the vendor-side log verbosity for one category.
    fn log_set(&mut self, category: ApiCategory, level: LogLevel) -> Result<(), ApiError>;

    /// Creates the module object for the hardware at `location`.
    fn create_module(&mut self, location: &str) -> Result<ObjectId, ApiError>;

    /// Reads module attributes.  The result has one value per requested id,
    /// in request order.
    fn get_module_attributes(
        &mut self,
        module: ObjectId,
        ids: &[ModuleAttrId],
    ) -> Result<Vec<AttributeValue>, ApiError>;

    /// Creates the host interface with the given index on `module`.
    fn create_host_interface(&mut self, module: ObjectId, index: u32) -> Result<ObjectId, ApiError>;

    /// Creates the network interface with the given index on `module`.
    fn create_network_interface(
        &mut self,
        module: ObjectId,
        index: u32,
    ) -> Result<ObjectId, ApiError>;

    /// Applies attributes to one network interface.
    fn set_network_interface_attributes(
        &mut self,
        netif: ObjectId,
        attrs: &[NetifAttr],
    ) -> Result<(), ApiError>;
}

/// Errors produced while resolving a backend by name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    #[error("no backend named `{0}`")]
    UnknownBackend(String),

    #[error("failed to load `{name}`: {reason}")]
    Failed { name: String, reason: String },
}

/// Resolves a vendor backend by name, the way a plugin loader resolves a
/// shared library path.
pub trait BackendLoader: Send + Sync {
    fn load(&self, name: &str) -> Result<Box<dyn TransponderApi>, LoadError>;
}
