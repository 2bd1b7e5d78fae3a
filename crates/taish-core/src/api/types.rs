//! Ids, values and error types that cross the vendor API boundary.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Opaque numeric handle assigned by the vendor API when an object is created.
pub type ObjectId = u64;

/// Errors reported by a vendor backend.
///
/// Every vendor call returns a status; anything other than success is
/// surfaced as one of these variants and never silently ignored.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// A stateful call was made before `initialize` succeeded.
    #[error("vendor API is not initialized")]
    Uninitialized,

    /// `initialize` was called twice without an `uninitialize` in between.
    #[error("vendor API is already initialized")]
    AlreadyInitialized,

    /// The backend does not expose the requested API category.
    #[error("API category `{0}` is not supported by this backend")]
    NotSupported(ApiCategory),

    /// The handle does not name a live object of the expected kind.
    #[error("invalid object id {0:#x}")]
    InvalidObject(ObjectId),

    /// The backend rejected an attribute or its value.
    #[error("invalid attribute: {0}")]
    InvalidAttribute(String),

    /// Any other non-success status code returned by the vendor library.
    #[error("vendor call failed with status {0}")]
    Status(i32),
}

/// Returned by the `FromStr` impls in this module for out-of-vocabulary names.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} `{value}`")]
pub struct UnknownName {
    pub kind: &'static str,
    pub value: String,
}

/// Groups of vendor operations.  Log levels are configured per category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiCategory {
    Unspecified,
    Module,
    HostInterface,
    NetworkInterface,
}

impl ApiCategory {
    /// All categories, in table order.
    pub const ALL: [ApiCategory; 4] = [
        ApiCategory::Unspecified,
        ApiCategory::Module,
        ApiCategory::HostInterface,
        ApiCategory::NetworkInterface,
    ];

    /// Position of this category in per-category tables.
    pub fn index(self) -> usize {
        match self {
            ApiCategory::Unspecified => 0,
            ApiCategory::Module => 1,
            ApiCategory::HostInterface => 2,
            ApiCategory::NetworkInterface => 3,
        }
    }

    /// The operator-facing name used by `logset`.
    pub fn name(self) -> &'static str {
        match self {
            ApiCategory::Unspecified => "unspecified",
            ApiCategory::Module => "module",
            ApiCategory::HostInterface => "hostif",
            ApiCategory::NetworkInterface => "networkif",
        }
    }
}

impl fmt::Display for ApiCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ApiCategory {
    type Err = UnknownName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ApiCategory::ALL
            .into_iter()
            .find(|c| c.name() == s)
            .ok_or_else(|| UnknownName {
                kind: "API category",
                value: s.to_string(),
            })
    }
}

/// Vendor-side log verbosity, set per [`ApiCategory`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    Notice,
    Warn,
    Error,
    Critical,
}

impl LogLevel {
    pub const ALL: [LogLevel; 6] = [
        LogLevel::Debug,
        LogLevel::Info,
        LogLevel::Notice,
        LogLevel::Warn,
        LogLevel::Error,
        LogLevel::Critical,
    ];

    pub fn name(self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Notice => "notice",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
            LogLevel::Critical => "critical",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for LogLevel {
    type Err = UnknownName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LogLevel::ALL
            .into_iter()
            .find(|l| l.name() == s)
            .ok_or_else(|| UnknownName {
                kind: "log level",
                value: s.to_string(),
            })
    }
}

/// Read-only module attributes the shell queries while building a [`crate::Module`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModuleAttrId {
    Location,
    NumHostInterfaces,
    NumNetworkInterfaces,
}

/// A single attribute value returned by the vendor API.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    Bool(bool),
    U16(u16),
    U32(u32),
    U64(u64),
    F32(f32),
    Text(String),
}

impl AttributeValue {
    /// Returns the value as a `u32` count, if it is one.
    pub fn as_u32(&self) -> Option<u32> {
        match self {
            AttributeValue::U32(v) => Some(*v),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_category_parses_operator_names() {
        assert_eq!("module".parse::<ApiCategory>(), Ok(ApiCategory::Module));
        assert_eq!("hostif".parse::<ApiCategory>(), Ok(ApiCategory::HostInterface));
        assert_eq!("networkif".parse::<ApiCategory>(), Ok(ApiCategory::NetworkInterface));
        assert_eq!("unspecified".parse::<ApiCategory>(), Ok(ApiCategory::Unspecified));
    }

    #[test]
    fn test_api_category_rejects_unknown_name() {
        let err = "netif".parse::<ApiCategory>().unwrap_err();
        assert_eq!(err.to_string(), "unknown API category `netif`");
    }

    #[test]
    fn test_api_category_indices_are_distinct_and_dense() {
        let mut seen: Vec<usize> = ApiCategory::ALL.iter().map(|c| c.index()).collect();
        seen.sort_unstable();
        assert_eq!(seen, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_log_level_round_trips_through_name() {
        for level in LogLevel::ALL {
            assert_eq!(level.name().parse::<LogLevel>(), Ok(level));
        }
    }

    #[test]
    fn test_log_level_default_is_info() {
        assert_eq!(LogLevel::default(), LogLevel::Info);
    }

    #[test]
    fn test_attribute_value_as_u32_only_matches_u32() {
        assert_eq!(AttributeValue::U32(4).as_u32(), Some(4));
        assert_eq!(AttributeValue::U64(4).as_u32(), None);
    }
}
