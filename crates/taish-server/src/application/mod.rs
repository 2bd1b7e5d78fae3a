//! Application layer of the shell.
//!
//! Everything the operator can do, independent of how the request arrived:
//!
//! - **`shell`** – [`shell::Shell`], the state guarded by the global lock:
//!   the loaded backend, the init flag, per-category vendor log levels and
//!   the hardware model.
//!
//! - **`hardware`** – [`hardware::HardwareModel`], the device table and the
//!   location registry, grown by presence events.
//!
//! - **`commands`** – The static command table and its handlers.  One line
//!   in, text plus a [`taish_core::CommandStatus`] out.
//!
//! - **`embed`** – [`embed::ShellHandle`], the API for hosting the shell
//!   inside another process instead of driving it over TCP.
//!
//! **Dependency rule**: nothing here touches sockets or the file system and
//! nothing here imports `crate::infrastructure`.

pub mod commands;
pub mod embed;
pub mod hardware;
pub mod shell;

#[cfg(test)]
pub(crate) mod testing;
