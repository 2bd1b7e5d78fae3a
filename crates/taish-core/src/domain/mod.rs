//! Hardware object model.
//!
//! - [`Module`] – a discovered transponder and its host/network interfaces.
//! - [`LocationRegistry`] – which module occupies which physical slot.
//! - [`PresenceEvent`] – the vendor's "hardware appeared/disappeared" notice.
//!
//! Nothing here locks.  The server owns one instance of each behind its
//! global lock and mutates them only while holding it.

pub mod module;
pub mod registry;

pub use module::{HostInterface, Module, ModuleError, NetworkInterface};
pub use registry::LocationRegistry;

/// A presence notification queued by the vendor callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresenceEvent {
    /// `true` when hardware appeared, `false` when it went away.
    pub present: bool,
    /// Opaque slot identifier, e.g. `"1-1"`.
    pub location: String,
}

impl PresenceEvent {
    pub fn new(present: bool, location: impl Into<String>) -> Self {
        Self {
            present,
            location: location.into(),
        }
    }
}
