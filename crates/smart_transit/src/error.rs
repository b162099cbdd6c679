// ---------------------------------------------------------------------------
// TransitError: failures surfaced by the rule and route command surface
// ---------------------------------------------------------------------------

use std::fmt;

use crate::ids::{RouteKey, RuleId};

/// Errors returned by the command layer.
///
/// The controller pass itself never fails: unknown rules fall back to
/// defaults and unreadable telemetry skips the route. These errors only reach
/// callers of explicit commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitError {
    /// No rule is stored under this id.
    UnknownRule(RuleId),
    /// The rule carries a built-in name and cannot be removed.
    ProtectedRule(String),
    /// An externally supplied id string did not parse.
    InvalidRuleId(String),
    /// The host does not know this route.
    UnknownRoute(RouteKey),
    /// A built-in rule of another transport type was offered to a route.
    ForeignBuiltinRule { route: RouteKey, rule: RuleId },
    /// A JSON payload could not be decoded.
    InvalidPayload(String),
}

impl fmt::Display for TransitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransitError::UnknownRule(id) => write!(f, "Unknown rule: {id}"),
            TransitError::ProtectedRule(name) => {
                write!(f, "Rule '{name}' is built in and cannot be removed")
            }
            TransitError::InvalidRuleId(raw) => write!(f, "Invalid rule id: '{raw}'"),
            TransitError::UnknownRoute(key) => write!(f, "Unknown route: {key}"),
            TransitError::ForeignBuiltinRule { route, rule } => {
                write!(f, "Rule {rule} is another transport type's default and cannot be bound to {route}")
            }
            TransitError::InvalidPayload(msg) => write!(f, "Invalid payload: {msg}"),
        }
    }
}

impl std::error::Error for TransitError {}

impl From<serde_json::Error> for TransitError {
    fn from(e: serde_json::Error) -> Self {
        TransitError::InvalidPayload(e.to_string())
    }
}
