//! Network-interface attribute vocabulary.
//!
//! Operators set line-side parameters by name:
//!
//! ```text
//! set_netif_attr <module-id> <attr> <value>
//! ```
//!
//! The names and accepted values are fixed.  [`parse_netif_attr`] validates
//! both and coerces the value to its type (boolean, enumerated, integer or
//! float), so a [`NetifAttr`] that reaches the vendor API is always valid.
//! Anything outside the vocabulary is rejected with an [`AttrError`] whose
//! message names the accepted values.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Errors produced while parsing an attribute name or value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttrError {
    #[error("Invalid attribute `{0}` (tx-enable, tx-grid, tx-channel, output-power, tx-laser-freq, modulation or differential-encoding)")]
    UnknownAttribute(String),

    #[error("Invalid argument `{value}` for {attr} ({expected})")]
    InvalidValue {
        attr: NetifAttrId,
        value: String,
        expected: &'static str,
    },
}

/// Names of the settable network-interface attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NetifAttrId {
    TxEnable,
    TxGridSpacing,
    TxChannel,
    OutputPower,
    TxLaserFreq,
    ModulationFormat,
    DifferentialEncoding,
}

impl NetifAttrId {
    pub const ALL: [NetifAttrId; 7] = [
        NetifAttrId::TxEnable,
        NetifAttrId::TxGridSpacing,
        NetifAttrId::TxChannel,
        NetifAttrId::OutputPower,
        NetifAttrId::TxLaserFreq,
        NetifAttrId::ModulationFormat,
        NetifAttrId::DifferentialEncoding,
    ];

    /// The name typed by the operator.
    pub fn name(self) -> &'static str {
        match self {
            NetifAttrId::TxEnable => "tx-enable",
            NetifAttrId::TxGridSpacing => "tx-grid",
            NetifAttrId::TxChannel => "tx-channel",
            NetifAttrId::OutputPower => "output-power",
            NetifAttrId::TxLaserFreq => "tx-laser-freq",
            NetifAttrId::ModulationFormat => "modulation",
            NetifAttrId::DifferentialEncoding => "differential-encoding",
        }
    }

    /// Human-readable description of the accepted values, used in usage and
    /// error text.
    pub fn expected(self) -> &'static str {
        match self {
            NetifAttrId::TxEnable | NetifAttrId::DifferentialEncoding => "true or false",
            NetifAttrId::TxGridSpacing => "100, 50, 33, 25, 12.5 or 6.25",
            NetifAttrId::TxChannel => "integer 0-65535",
            NetifAttrId::OutputPower => "float",
            NetifAttrId::TxLaserFreq => "unsigned integer",
            NetifAttrId::ModulationFormat => {
                "bpsk, dp-bpsk, qpsk, dp-qpsk, 8qam, dp-8qam, 16qam, dp-16qam, 32qam, dp-32qam, 64qam or dp-64qam"
            }
        }
    }
}

impl fmt::Display for NetifAttrId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for NetifAttrId {
    type Err = AttrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NetifAttrId::ALL
            .into_iter()
            .find(|id| id.name() == s)
            .ok_or_else(|| AttrError::UnknownAttribute(s.to_string()))
    }
}

/// Transmit grid spacing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TxGridSpacing {
    Ghz100,
    Ghz50,
    Ghz33,
    Ghz25,
    Ghz12_5,
    Ghz6_25,
}

impl TxGridSpacing {
    const TABLE: [(&'static str, TxGridSpacing); 6] = [
        ("100", TxGridSpacing::Ghz100),
        ("50", TxGridSpacing::Ghz50),
        ("33", TxGridSpacing::Ghz33),
        ("25", TxGridSpacing::Ghz25),
        ("12.5", TxGridSpacing::Ghz12_5),
        ("6.25", TxGridSpacing::Ghz6_25),
    ];

    fn parse(s: &str) -> Option<Self> {
        Self::TABLE.iter().find(|(n, _)| *n == s).map(|(_, g)| *g)
    }
}

/// Line modulation format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModulationFormat {
    Bpsk,
    DpBpsk,
    Qpsk,
    DpQpsk,
    Qam8,
    DpQam8,
    Qam16,
    DpQam16,
    Qam32,
    DpQam32,
    Qam64,
    DpQam64,
}

impl ModulationFormat {
    const TABLE: [(&'static str, ModulationFormat); 12] = [
        ("bpsk", ModulationFormat::Bpsk),
        ("dp-bpsk", ModulationFormat::DpBpsk),
        ("qpsk", ModulationFormat::Qpsk),
        ("dp-qpsk", ModulationFormat::DpQpsk),
        ("8qam", ModulationFormat::Qam8),
        ("dp-8qam", ModulationFormat::DpQam8),
        ("16qam", ModulationFormat::Qam16),
        ("dp-16qam", ModulationFormat::DpQam16),
        ("32qam", ModulationFormat::Qam32),
        ("dp-32qam", ModulationFormat::DpQam32),
        ("64qam", ModulationFormat::Qam64),
        ("dp-64qam", ModulationFormat::DpQam64),
    ];

    fn parse(s: &str) -> Option<Self> {
        Self::TABLE.iter().find(|(n, _)| *n == s).map(|(_, m)| *m)
    }
}

/// A validated, typed network-interface attribute ready for the vendor API.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NetifAttr {
    TxEnable(bool),
    TxGridSpacing(TxGridSpacing),
    TxChannel(u16),
    OutputPower(f32),
    TxLaserFreq(u64),
    ModulationFormat(ModulationFormat),
    DifferentialEncoding(bool),
}

impl NetifAttr {
    pub fn id(&self) -> NetifAttrId {
        match self {
            NetifAttr::TxEnable(_) => NetifAttrId::TxEnable,
            NetifAttr::TxGridSpacing(_) => NetifAttrId::TxGridSpacing,
            NetifAttr::TxChannel(_) => NetifAttrId::TxChannel,
            NetifAttr::OutputPower(_) => NetifAttrId::OutputPower,
            NetifAttr::TxLaserFreq(_) => NetifAttrId::TxLaserFreq,
            NetifAttr::ModulationFormat(_) => NetifAttrId::ModulationFormat,
            NetifAttr::DifferentialEncoding(_) => NetifAttrId::DifferentialEncoding,
        }
    }
}

/// Parses an operator-supplied `name value` pair into a typed attribute.
///
/// # Errors
///
/// [`AttrError::UnknownAttribute`] for a name outside the vocabulary,
/// [`AttrError::InvalidValue`] for a value that does not fit the attribute.
///
/// # Examples
///
/// ```rust
/// use taish_core::attributes::{parse_netif_attr, NetifAttr, TxGridSpacing};
///
/// assert_eq!(
///     parse_netif_attr("tx-grid", "12.5"),
///     Ok(NetifAttr::TxGridSpacing(TxGridSpacing::Ghz12_5))
/// );
/// assert!(parse_netif_attr("tx-grid", "17").is_err());
/// ```
pub fn parse_netif_attr(name: &str, value: &str) -> Result<NetifAttr, AttrError> {
    let id: NetifAttrId = name.parse()?;
    let invalid = || AttrError::InvalidValue {
        attr: id,
        value: value.to_string(),
        expected: id.expected(),
    };

    let attr = match id {
        NetifAttrId::TxEnable => NetifAttr::TxEnable(parse_bool(value).ok_or_else(invalid)?),
        NetifAttrId::DifferentialEncoding => {
            NetifAttr::DifferentialEncoding(parse_bool(value).ok_or_else(invalid)?)
        }
        NetifAttrId::TxGridSpacing => {
            NetifAttr::TxGridSpacing(TxGridSpacing::parse(value).ok_or_else(invalid)?)
        }
        NetifAttrId::ModulationFormat => {
            NetifAttr::ModulationFormat(ModulationFormat::parse(value).ok_or_else(invalid)?)
        }
        NetifAttrId::TxChannel => NetifAttr::TxChannel(value.parse().map_err(|_| invalid())?),
        NetifAttrId::TxLaserFreq => NetifAttr::TxLaserFreq(value.parse().map_err(|_| invalid())?),
        NetifAttrId::OutputPower => {
            let power: f32 = value.parse().map_err(|_| invalid())?;
            if !power.is_finite() {
                return Err(invalid());
            }
            NetifAttr::OutputPower(power)
        }
    };
    Ok(attr)
}

fn parse_bool(s: &str) -> Option<bool> {
    match s {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}
