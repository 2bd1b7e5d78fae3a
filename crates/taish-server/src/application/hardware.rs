//! Hardware model: every module the vendor has reported, keyed two ways.
//!
//! Modules are added when a `present=true` event is drained and are never
//! removed.  A `present=false` event is counted and logged, nothing more:
//! the vendor objects stay alive and the location keeps its module id.

use std::collections::HashMap;

use taish_core::{
    ApiError, LocationRegistry, Module, ModuleError, ObjectId, PresenceEvent, TransponderApi,
};
use thiserror::Error;
use tracing::{info, warn};

/// A presence event could not be turned into a module.
///
/// Every variant is fatal for the server: the vendor may have created some of
/// the module's objects, and the shell does not track partial modules.
#[derive(Debug, Error)]
pub enum PresenceError {
    #[error("failed to create module at {location}: {source}")]
    CreateModule {
        location: String,
        #[source]
        source: ApiError,
    },

    #[error(transparent)]
    Module(#[from] ModuleError),

    #[error("vendor returned module id {id:#x} for {location}, but {owner} already holds it")]
    DuplicateModuleId {
        id: ObjectId,
        location: String,
        owner: String,
    },
}

/// What [`HardwareModel::apply_presence`] did with an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresenceOutcome {
    /// A new module was built and registered.
    Created(ObjectId),
    /// The location already had a module; the event was ignored.
    AlreadyPresent(ObjectId),
    /// Hardware went away.  Recorded only.
    Absent,
}

/// Device table plus location registry.
#[derive(Debug, Default)]
pub struct HardwareModel {
    modules: HashMap<ObjectId, Module>,
    registry: LocationRegistry,
    absences: u64,
}

impl HardwareModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reacts to one drained presence event.
    ///
    /// For `present=true` at an unknown location this creates the vendor
    /// module, builds all of its interfaces and registers the location.
    ///
    /// # Errors
    ///
    /// Returns [`PresenceError`] if any vendor call fails.  The model is left
    /// unchanged in that case.
    pub fn apply_presence(
        &mut self,
        api: &mut dyn TransponderApi,
        event: &PresenceEvent,
    ) -> Result<PresenceOutcome, PresenceError> {
        if !event.present {
            self.absences += 1;
            info!("module at {} reported absent", event.location);
            return Ok(PresenceOutcome::Absent);
        }

        if let Some(existing) = self.registry.module_at(&event.location) {
            warn!(
                "duplicate presence for {}: module {existing:#x} already registered",
                event.location
            );
            return Ok(PresenceOutcome::AlreadyPresent(existing));
        }

        let id = api
            .create_module(&event.location)
            .map_err(|source| PresenceError::CreateModule {
                location: event.location.clone(),
                source,
            })?;
        info!("module created at {}: id {id}", event.location);

        if let Some(owner) = self.registry.location_of(id) {
            return Err(PresenceError::DuplicateModuleId {
                id,
                location: event.location.clone(),
                owner: owner.to_string(),
            });
        }

        let module = Module::create(api, id, &event.location)?;
        self.registry.insert(&event.location, id);
        self.modules.insert(id, module);
        Ok(PresenceOutcome::Created(id))
    }

    pub fn module(&self, id: ObjectId) -> Option<&Module> {
        self.modules.get(&id)
    }

    pub fn registry(&self) -> &LocationRegistry {
        &self.registry
    }

    pub fn module_count(&self) -> usize {
        self.modules.len()
    }

    /// Number of `present=false` events seen so far.
    pub fn absences(&self) -> u64 {
        self.absences
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use taish_core::{AttributeValue, MockTransponderApi};

    fn expect_module(api: &mut MockTransponderApi, location: &'static str, id: ObjectId) {
        api.expect_create_module()
            .withf(move |loc| loc == location)
            .times(1)
            .returning(move |_| Ok(id));
        api.expect_get_module_attributes()
            .withf(move |module, _| *module == id)
            .times(1)
            .returning(|_, _| Ok(vec![AttributeValue::U32(1), AttributeValue::U32(1)]));
        api.expect_create_host_interface()
            .withf(move |module, _| *module == id)
            .returning(move |_, i| Ok(id * 0x100 + u64::from(i)));
        api.expect_create_network_interface()
            .withf(move |module, _| *module == id)
            .returning(move |_, i| Ok(id * 0x100 + 0x80 + u64::from(i)));
    }

    #[test]
    fn test_present_event_creates_and_registers_module() {
        // Arrange
        let mut api = MockTransponderApi::new();
        expect_module(&mut api, "1-1", 7);
        let mut model = HardwareModel::new();

        // Act
        let outcome = model
            .apply_presence(&mut api, &PresenceEvent::new(true, "1-1"))
            .unwrap();

        // Assert
        assert_eq!(outcome, PresenceOutcome::Created(7));
        assert_eq!(model.registry().module_at("1-1"), Some(7));
        assert_eq!(model.module(7).map(|m| m.network_interfaces().len()), Some(1));
    }

    #[test]
    fn test_absent_event_makes_no_vendor_calls() {
        // Arrange: a mock without expectations panics on any call
        let mut api = MockTransponderApi::new();
        let mut model = HardwareModel::new();

        // Act
        let outcome = model
            .apply_presence(&mut api, &PresenceEvent::new(false, "1-1"))
            .unwrap();

        // Assert
        assert_eq!(outcome, PresenceOutcome::Absent);
        assert_eq!(model.absences(), 1);
        assert!(model.registry().is_empty());
    }

    #[test]
    fn test_duplicate_presence_is_ignored() {
        let mut api = MockTransponderApi::new();
        expect_module(&mut api, "1-1", 7);
        let mut model = HardwareModel::new();
        model
            .apply_presence(&mut api, &PresenceEvent::new(true, "1-1"))
            .unwrap();

        let outcome = model
            .apply_presence(&mut api, &PresenceEvent::new(true, "1-1"))
            .unwrap();

        assert_eq!(outcome, PresenceOutcome::AlreadyPresent(7));
        assert_eq!(model.module_count(), 1);
    }

    #[test]
    fn test_create_module_failure_is_reported_and_leaves_model_empty() {
        // Arrange
        let mut api = MockTransponderApi::new();
        api.expect_create_module()
            .returning(|_| Err(ApiError::Status(-2)));
        let mut model = HardwareModel::new();

        // Act
        let result = model.apply_presence(&mut api, &PresenceEvent::new(true, "1-1"));

        // Assert
        assert!(matches!(
            result,
            Err(PresenceError::CreateModule { ref location, source: ApiError::Status(-2) }) if location == "1-1"
        ));
        assert!(model.registry().is_empty());
    }

    #[test]
    fn test_interface_failure_does_not_register_location() {
        let mut api = MockTransponderApi::new();
        api.expect_create_module().returning(|_| Ok(3));
        api.expect_get_module_attributes()
            .returning(|_, _| Ok(vec![AttributeValue::U32(0), AttributeValue::U32(1)]));
        api.expect_create_network_interface()
            .returning(|_, _| Err(ApiError::Status(-1)));
        let mut model = HardwareModel::new();

        let result = model.apply_presence(&mut api, &PresenceEvent::new(true, "2-1"));

        assert!(matches!(result, Err(PresenceError::Module(_))));
        assert!(!model.registry().contains_location("2-1"));
        assert_eq!(model.module_count(), 0);
    }

    #[test]
    fn test_reused_module_id_is_fatal_before_interfaces_are_built() {
        // Arrange: the vendor hands out id 7 for a second location
        let mut api = MockTransponderApi::new();
        expect_module(&mut api, "1-1", 7);
        api.expect_create_module()
            .withf(|loc| loc == "1-2")
            .times(1)
            .returning(|_| Ok(7));
        let mut model = HardwareModel::new();
        model
            .apply_presence(&mut api, &PresenceEvent::new(true, "1-1"))
            .unwrap();

        // Act
        let result = model.apply_presence(&mut api, &PresenceEvent::new(true, "1-2"));

        // Assert
        assert!(matches!(
            result,
            Err(PresenceError::DuplicateModuleId { id: 7, ref location, ref owner })
                if location == "1-2" && owner == "1-1"
        ));
        assert!(!model.registry().contains_location("1-2"));
    }

    #[test]
    fn test_registry_order_follows_event_order() {
        let mut api = MockTransponderApi::new();
        expect_module(&mut api, "1-2", 20);
        expect_module(&mut api, "1-1", 10);
        let mut model = HardwareModel::new();

        for loc in ["1-2", "1-1"] {
            model
                .apply_presence(&mut api, &PresenceEvent::new(true, loc))
                .unwrap();
        }

        let listed: Vec<_> = model.registry().iter().collect();
        assert_eq!(listed, vec![("1-2", 20), ("1-1", 10)]);
    }
}
