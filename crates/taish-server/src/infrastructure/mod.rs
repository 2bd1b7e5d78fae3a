//! Infrastructure layer of the shell.
//!
//! Contains the OS-facing adapters: the presence channel fed from vendor
//! threads, the TCP listener and client session, the event dispatcher that
//! ties them to the shell, the config file, and the built-in simulated
//! vendor backend.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `taish_core`, but MUST NOT be imported by the `application` layer.

pub mod dispatcher;
pub mod network;
pub mod presence;
pub mod storage;
pub mod vendor;
