//! Transponder module and its interfaces.

use thiserror::Error;
use tracing::{debug, info};

use crate::api::{ApiError, ModuleAttrId, ObjectId, TransponderApi};
use crate::attributes::NetifAttr;

/// Errors raised while building a module or applying attributes to it.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModuleError {
    #[error("failed to read interface counts of module {module:#x}: {source}")]
    AttributeQuery {
        module: ObjectId,
        #[source]
        source: ApiError,
    },

    #[error("module {module:#x} returned a malformed interface count")]
    MalformedCount { module: ObjectId },

    #[error("failed to create host interface {index} on module {module:#x}: {source}")]
    HostInterface {
        module: ObjectId,
        index: u32,
        #[source]
        source: ApiError,
    },

    #[error("failed to create network interface {index} on module {module:#x}: {source}")]
    NetworkInterface {
        module: ObjectId,
        index: u32,
        #[source]
        source: ApiError,
    },

    #[error(
        "failed to set network interface attribute on netif {netif:#x} \
         (applied to {applied} of {total} netifs): {source}"
    )]
    SetAttribute {
        netif: ObjectId,
        /// Interfaces that accepted the value before the failure.
        applied: usize,
        total: usize,
        #[source]
        source: ApiError,
    },
}

/// A client-facing signal path of a module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostInterface {
    pub id: ObjectId,
    pub index: u32,
}

/// A line-facing signal path of a module.  Accepts attribute changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkInterface {
    pub id: ObjectId,
    pub index: u32,
}

/// A discovered transponder module with all of its interfaces.
///
/// The interface lists are filled once, in [`Module::create`], and never
/// change afterwards.  A module is either fully constructed or not at all:
/// there is no value of this type with only some of its interfaces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Module {
    id: ObjectId,
    location: String,
    host_interfaces: Vec<HostInterface>,
    network_interfaces: Vec<NetworkInterface>,
}

impl Module {
    /// Builds the module object for an already-created vendor module.
    ///
    /// Queries the host and network interface counts, then creates every
    /// interface in index order, hosts first.
    ///
    /// # Errors
    ///
    /// Any vendor failure aborts construction.  Interfaces created before the
    /// failure are not rolled back; callers treat this error as fatal.
    pub fn create(
        api: &mut dyn TransponderApi,
        id: ObjectId,
        location: &str,
    ) -> Result<Self, ModuleError> {
        let values = api
            .get_module_attributes(
                id,
                &[ModuleAttrId::NumHostInterfaces, ModuleAttrId::NumNetworkInterfaces],
            )
            .map_err(|source| ModuleError::AttributeQuery { module: id, source })?;

        let (num_hostifs, num_netifs) = match values.as_slice() {
            [h, n] => match (h.as_u32(), n.as_u32()) {
                (Some(h), Some(n)) => (h, n),
                _ => return Err(ModuleError::MalformedCount { module: id }),
            },
            _ => return Err(ModuleError::MalformedCount { module: id }),
        };
        debug!("module {id:#x}: {num_hostifs} host interface(s), {num_netifs} network interface(s)");

        let mut host_interfaces = Vec::with_capacity(num_hostifs as usize);
        for index in 0..num_hostifs {
            let hostif = api
                .create_host_interface(id, index)
                .map_err(|source| ModuleError::HostInterface { module: id, index, source })?;
            debug!("module {id:#x}: hostif[{index}] = {hostif:#x}");
            host_interfaces.push(HostInterface { id: hostif, index });
        }

        let mut network_interfaces = Vec::with_capacity(num_netifs as usize);
        for index in 0..num_netifs {
            let netif = api
                .create_network_interface(id, index)
                .map_err(|source| ModuleError::NetworkInterface { module: id, index, source })?;
            debug!("module {id:#x}: netif[{index}] = {netif:#x}");
            network_interfaces.push(NetworkInterface { id: netif, index });
        }

        info!(
            "module {id:#x} at {location} ready: {} hostif(s), {} netif(s)",
            host_interfaces.len(),
            network_interfaces.len()
        );

        Ok(Self {
            id,
            location: location.to_string(),
            host_interfaces,
            network_interfaces,
        })
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn host_interfaces(&self) -> &[HostInterface] {
        &self.host_interfaces
    }

    pub fn network_interfaces(&self) -> &[NetworkInterface] {
        &self.network_interfaces
    }

    /// Applies `attr` to every network interface, in index order.
    ///
    /// # Errors
    ///
    /// Stops at the first interface the vendor rejects.  Interfaces earlier in
    /// the list keep the new value; the error says how many did.
    pub fn set_netif_attribute(
        &self,
        api: &mut dyn TransponderApi,
        attr: NetifAttr,
    ) -> Result<(), ModuleError> {
        let total = self.network_interfaces.len();
        for (applied, netif) in self.network_interfaces.iter().enumerate() {
            api.set_network_interface_attributes(netif.id, &[attr])
                .map_err(|source| ModuleError::SetAttribute {
                    netif: netif.id,
                    applied,
                    total,
                    source,
                })?;
        }
        Ok(())
    }
}
