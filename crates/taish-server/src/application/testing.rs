//! Test fixtures shared by the application-layer unit tests.

use std::sync::{Arc, Mutex};

use taish_core::{
    ApiCategory, AttributeValue, BackendLoader, LoadError, MockTransponderApi, ObjectId,
    PresenceCallback, TransponderApi,
};

use super::shell::Shell;

/// Loader that hands out one prepared backend under a fixed name.
pub struct OnceLoader {
    name: &'static str,
    backend: Mutex<Option<Box<dyn TransponderApi>>>,
}

impl OnceLoader {
    pub fn new(name: &'static str, backend: impl TransponderApi + 'static) -> Self {
        Self {
            name,
            backend: Mutex::new(Some(Box::new(backend))),
        }
    }
}

impl BackendLoader for OnceLoader {
    fn load(&self, name: &str) -> Result<Box<dyn TransponderApi>, LoadError> {
        if name != self.name {
            return Err(LoadError::UnknownBackend(name.to_string()));
        }
        self.backend
            .lock()
            .unwrap()
            .take()
            .ok_or_else(|| LoadError::Failed {
                name: name.to_string(),
                reason: "already handed out".to_string(),
            })
    }
}

pub fn silent_presence() -> PresenceCallback {
    Arc::new(|_, _| {})
}

/// Expectations for a successful `init`: one `log_set` per category,
/// `initialize`, then the three category queries.
pub fn expect_init(api: &mut MockTransponderApi) {
    api.expect_log_set()
        .times(ApiCategory::ALL.len())
        .returning(|_, _| Ok(()));
    api.expect_initialize().times(1).returning(|_| Ok(()));
    api.expect_query()
        .withf(|c| *c != ApiCategory::Unspecified)
        .times(3)
        .returning(|_| Ok(()));
}

/// Expectations for a module at `location` with one host and `netifs`
/// network interfaces.  Network interface ids are `id * 0x10 + index`.
pub fn expect_module(api: &mut MockTransponderApi, location: &'static str, id: ObjectId, netifs: u32) {
    api.expect_create_module()
        .withf(move |loc| loc == location)
        .times(1)
        .returning(move |_| Ok(id));
    api.expect_get_module_attributes()
        .withf(move |module, _| *module == id)
        .returning(move |_, _| Ok(vec![AttributeValue::U32(1), AttributeValue::U32(netifs)]));
    api.expect_create_host_interface()
        .withf(move |module, _| *module == id)
        .returning(move |_, _| Ok(id * 0x10 + 0xf));
    api.expect_create_network_interface()
        .withf(move |module, _| *module == id)
        .returning(move |_, index| Ok(id * 0x10 + u64::from(index)));
}

/// A shell with `api` loaded under the name `mock` and initialized.
pub fn initialized_shell(mut api: MockTransponderApi) -> Shell {
    expect_init(&mut api);
    let mut shell = Shell::new(Arc::new(OnceLoader::new("mock", api)), silent_presence());
    shell.load("mock").unwrap();
    shell.init().unwrap();
    shell
}
