//! # taish-core
//!
//! Shared library for the TAI shell: the boundary to the vendor transponder
//! API, the in-memory hardware object model, the network-interface attribute
//! vocabulary, and the line-oriented command protocol.
//!
//! This crate has no dependencies on sockets, async runtimes, or the file
//! system.  The server crate (`taish-server`) builds the event loop, the
//! connection manager and the command handlers on top of it.
//!
//! # Architecture overview
//!
//! A transponder *module* is a pluggable optical unit sitting in a physical
//! slot (its *location*).  The vendor library discovers modules on its own
//! thread and reports them through a presence callback.  For each reported
//! module the shell creates a [`Module`] object, which in turn creates one
//! host interface per client-facing port and one network interface per
//! line-facing port.
//!
//! - **`api`** – The capability set a vendor backend provides
//!   ([`TransponderApi`]) plus the values and ids that cross that boundary.
//!
//! - **`attributes`** – The fixed vocabulary of network-interface attributes
//!   an operator may set, and the parser that turns `name value` text into a
//!   typed [`NetifAttr`].
//!
//! - **`domain`** – [`Module`], its interfaces, and the [`LocationRegistry`].
//!
//! - **`protocol`** – Tokenising command lines, the prompt, and command status
//!   codes.

pub mod api;
pub mod attributes;
pub mod domain;
pub mod protocol;

// Re-export the most-used types at the crate root.
pub use api::{
    ApiCategory, ApiError, AttributeValue, BackendLoader, LoadError, LogLevel, ModuleAttrId,
    ObjectId, PresenceCallback, ServiceMethodTable, TransponderApi,
};
#[cfg(any(test, feature = "mock"))]
pub use api::MockTransponderApi;
pub use attributes::{parse_netif_attr, AttrError, ModulationFormat, NetifAttr, NetifAttrId, TxGridSpacing};
pub use domain::{HostInterface, LocationRegistry, Module, ModuleError, NetworkInterface, PresenceEvent};
pub use protocol::{tokenize, CommandStatus, ERROR_PREFIX, PROMPT};
