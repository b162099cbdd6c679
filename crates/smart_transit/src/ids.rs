//! Identifiers shared by every part of the controller: transport types,
//! route keys, stop handles and the opaque 128-bit rule id.

use std::fmt;
use std::str::FromStr;

use bitcode::{Decode, Encode};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::TransitError;

// =============================================================================
// Transport types
// =============================================================================

/// Transport modes that can carry a transit line.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Encode, Decode,
)]
pub enum TransportType {
    Bus,
    Tram,
    Subway,
    Train,
    Ship,
    Airplane,
    Ferry,
}

impl TransportType {
    pub const ALL: [TransportType; 7] = [
        TransportType::Bus,
        TransportType::Tram,
        TransportType::Subway,
        TransportType::Train,
        TransportType::Ship,
        TransportType::Airplane,
        TransportType::Ferry,
    ];

    /// Display name, also the name of the type's built-in rule.
    pub fn name(self) -> &'static str {
        match self {
            TransportType::Bus => "Bus",
            TransportType::Tram => "Tram",
            TransportType::Subway => "Subway",
            TransportType::Train => "Train",
            TransportType::Ship => "Ship",
            TransportType::Airplane => "Airplane",
            TransportType::Ferry => "Ferry",
        }
    }

    /// Case-insensitive lookup by display name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|t| t.name().eq_ignore_ascii_case(name.trim()))
    }

    pub fn ordinal(self) -> u32 {
        match self {
            TransportType::Bus => 0,
            TransportType::Tram => 1,
            TransportType::Subway => 2,
            TransportType::Train => 3,
            TransportType::Ship => 4,
            TransportType::Airplane => 5,
            TransportType::Ferry => 6,
        }
    }

    /// Fixed id of this type's built-in rule. Built-ins live in the legacy
    /// 32-bit range so old saves that stored `ordinal + 1` resolve directly.
    pub fn builtin_rule_id(self) -> RuleId {
        RuleId::from_legacy(self.ordinal() + 1)
    }
}

impl fmt::Display for TransportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// Route and stop handles
// =============================================================================

/// A route as the host identifies it: transport type plus line number.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Encode, Decode,
)]
pub struct RouteKey {
    pub transport_type: TransportType,
    pub number: u32,
}

impl RouteKey {
    pub fn new(transport_type: TransportType, number: u32) -> Self {
        Self {
            transport_type,
            number,
        }
    }
}

impl fmt::Display for RouteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} Line {}", self.transport_type, self.number)
    }
}

/// Clickable location handle of a stop in the host world.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Encode, Decode,
)]
pub struct StopId(pub u32);

// =============================================================================
// Rule ids
// =============================================================================

/// Opaque 128-bit rule identifier.
///
/// Displayed and parsed as 32 lowercase hex digits (dashes are accepted on
/// input). Ids whose upper 96 bits are zero form the legacy range: they come
/// from old 32-bit saves or name a built-in rule, and the generator never
/// hands them out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Encode, Decode)]
pub struct RuleId(pub u128);

impl RuleId {
    /// Id of the all-zero "Disabled" rule; the legacy `-1` reinterpreted as u32.
    pub const DISABLED: RuleId = RuleId(0xFFFF_FFFF);

    /// Zero-extend a legacy 32-bit id.
    pub fn from_legacy(id: u32) -> Self {
        RuleId(u128::from(id))
    }

    pub fn is_legacy_range(self) -> bool {
        self.0 >> 32 == 0
    }

    /// True for the seven transport-type defaults and "Disabled".
    pub fn is_builtin(self) -> bool {
        self == Self::DISABLED || self.builtin_type().is_some()
    }

    /// Transport type whose default rule this id names, if any.
    pub fn builtin_type(self) -> Option<TransportType> {
        TransportType::ALL
            .into_iter()
            .find(|t| t.builtin_rule_id() == self)
    }

    /// Parse an externally supplied id. Malformed input means "no rule
    /// selected" and is logged rather than propagated.
    pub fn parse_or_none(raw: &str) -> Option<Self> {
        match raw.parse() {
            Ok(id) => Some(id),
            Err(e) => {
                bevy::log::warn!("ignoring rule id: {e}");
                None
            }
        }
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:032x}", self.0)
    }
}

impl FromStr for RuleId {
    type Err = TransitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits: String = s.trim().chars().filter(|c| *c != '-').collect();
        if digits.is_empty() || digits.len() > 32 {
            return Err(TransitError::InvalidRuleId(s.to_string()));
        }
        u128::from_str_radix(&digits, 16)
            .map(RuleId)
            .map_err(|_| TransitError::InvalidRuleId(s.to_string()))
    }
}

impl Serialize for RuleId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for RuleId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
