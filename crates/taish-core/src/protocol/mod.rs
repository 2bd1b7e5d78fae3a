//! Line-oriented command protocol.
//!
//! ```text
//! client:  set_netif_attr 4097 tx-grid 50\r\n
//! server:  >
//! client:  module_list\n
//! server:  Module List
//!          location: 1-1  module ID: 4097
//!          >
//! ```
//!
//! One command per line, fields separated by whitespace, an optional trailing
//! carriage return is ignored.  Every processed line, successful or not, is
//! answered with the output followed by [`PROMPT`], so a line-mode client can
//! always resynchronise on the prompt.  Reported errors are single lines
//! starting with [`ERROR_PREFIX`].

/// Written after every processed line.
pub const PROMPT: &str = "> ";

/// Prefix of every reported error line.
pub const ERROR_PREFIX: &str = "%% ";

/// Outcome of one processed command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandStatus {
    /// The command ran.
    Success,
    /// The command failed; the error was written to the response.
    Error,
    /// The session must end (`quit`/`exit`, or end of stream).
    Terminate,
}

impl CommandStatus {
    /// The signed status code: `0`, `-1`, or the `-10` session-end sentinel.
    pub fn code(self) -> i32 {
        match self {
            CommandStatus::Success => 0,
            CommandStatus::Error => -1,
            CommandStatus::Terminate => -10,
        }
    }
}

/// Splits a command line into whitespace-separated tokens.
///
/// A trailing `\r` (from `\r\n` line endings) is dropped first.  An empty or
/// blank line yields no tokens.
pub fn tokenize(line: &str) -> Vec<&str> {
    line.strip_suffix('\r')
        .unwrap_or(line)
        .split_whitespace()
        .collect()
}
