//! TCP side of the shell: the listener, its single client slot, and the
//! client session.

pub mod connection_manager;
pub mod session;

pub use connection_manager::{
    ConnectionEvent, ConnectionManager, ConnectionState, NetworkError, BUSY_MESSAGE,
};
pub use session::{ClientSession, SendError, MAX_LINE_BYTES, OUTBOX_CAPACITY};
