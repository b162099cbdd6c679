//! Route-to-rule bindings and effective rule resolution.
//!
//! A route either names a rule or is unbound and follows its transport
//! type's default. Resolution never fails: a binding to a rule that no
//! longer exists falls back to the type default, and a disabled transport
//! type always resolves to the inactive "Disabled" rule.

use std::collections::BTreeMap;

use bevy::prelude::*;
use bitcode::{Decode, Encode};
use serde::{Deserialize, Serialize};

use crate::ids::{RouteKey, RuleId, TransportType};
use crate::occupancy_controller::RuleConfig;
use crate::rule_store::{Rule, RuleOrigin, RuleStore};
use crate::settings::TransitSettings;

pub const BINDING_SCHEMA_VERSION: u32 = 2;

#[derive(Resource, Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteBindings {
    bindings: BTreeMap<RouteKey, RuleId>,
}

impl RouteBindings {
    /// Bind `route` to `rule`, or unbind it with `None`.
    pub fn bind(&mut self, route: RouteKey, rule: Option<RuleId>) {
        match rule {
            Some(id) => {
                self.bindings.insert(route, id);
            }
            None => {
                self.bindings.remove(&route);
            }
        }
    }

    pub fn rule_for(&self, route: RouteKey) -> Option<RuleId> {
        self.bindings.get(&route).copied()
    }

    /// Unbind every route that pointed at `rule`. Returns how many were unbound.
    pub fn forget_rule(&mut self, rule: RuleId) -> usize {
        let before = self.bindings.len();
        self.bindings.retain(|_, id| *id != rule);
        before - self.bindings.len()
    }

    /// Drop bindings of routes the host no longer has.
    pub fn prune_missing(&mut self, mut exists: impl FnMut(RouteKey) -> bool) {
        self.bindings.retain(|route, _| exists(*route));
    }

    pub fn iter(&self) -> impl Iterator<Item = (RouteKey, RuleId)> + '_ {
        self.bindings.iter().map(|(k, v)| (*k, *v))
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

// =============================================================================
// Resolution
// =============================================================================

/// The rule a route runs under this pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectiveRule {
    pub rule: Rule,
    pub origin: RuleOrigin,
}

impl EffectiveRule {
    pub fn config(&self) -> RuleConfig {
        RuleConfig::from_rule(&self.rule, self.origin)
    }
}

fn type_default(transport_type: TransportType, settings: &TransitSettings) -> EffectiveRule {
    EffectiveRule {
        rule: Rule::builtin(transport_type, settings.transport.get(transport_type)),
        origin: RuleOrigin::TypeDefault,
    }
}

pub fn resolve_effective_rule(
    route: RouteKey,
    bindings: &RouteBindings,
    rules: &RuleStore,
    settings: &TransitSettings,
) -> EffectiveRule {
    if settings.is_type_disabled(route.transport_type) {
        return EffectiveRule {
            rule: Rule::disabled(),
            origin: RuleOrigin::TypeDefault,
        };
    }

    let Some(id) = bindings.rule_for(route) else {
        return type_default(route.transport_type, settings);
    };
    if id == RuleId::DISABLED {
        return EffectiveRule {
            rule: Rule::disabled(),
            origin: RuleOrigin::TypeDefault,
        };
    }
    if id.builtin_type().is_some() {
        // Only the route's own default applies, whichever built-in is bound.
        return type_default(route.transport_type, settings);
    }
    match rules.get_rule(id) {
        Some(rule) => EffectiveRule {
            rule: rule.clone(),
            origin: RuleOrigin::Custom,
        },
        None => {
            debug!("{route}: bound rule {id} is gone, using the {} default", route.transport_type);
            type_default(route.transport_type, settings)
        }
    }
}

// =============================================================================
// Persistence
// =============================================================================
//
// Schema 1 stored the rule as a signed 32-bit id (`-1` meaning "Disabled").
// It is reinterpreted as u32 and zero-extended, which maps `-1` onto
// `RuleId::DISABLED` and the type ordinals onto the built-in ids.

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct LegacyBindingRecord {
    pub schema_version: u32,
    pub transport_type: TransportType,
    pub route_number: u32,
    pub rule_id: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct BindingRecord {
    pub schema_version: u32,
    pub transport_type: TransportType,
    pub route_number: u32,
    pub rule_id: u128,
}

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub enum StoredBinding {
    V1(LegacyBindingRecord),
    V2(BindingRecord),
}

impl StoredBinding {
    pub fn new(route: RouteKey, rule: RuleId) -> Self {
        StoredBinding::V2(BindingRecord {
            schema_version: BINDING_SCHEMA_VERSION,
            transport_type: route.transport_type,
            route_number: route.number,
            rule_id: rule.0,
        })
    }

    pub fn into_binding(self) -> (RouteKey, RuleId) {
        match self {
            StoredBinding::V1(r) => (
                RouteKey::new(r.transport_type, r.route_number),
                RuleId::from_legacy(r.rule_id as u32),
            ),
            StoredBinding::V2(r) => (
                RouteKey::new(r.transport_type, r.route_number),
                RuleId(r.rule_id),
            ),
        }
    }
}

impl crate::Saveable for RouteBindings {
    const SAVE_KEY: &'static str = "route_bindings";

    fn save_to_bytes(&self) -> Option<Vec<u8>> {
        if self.bindings.is_empty() {
            return None;
        }
        let records: Vec<StoredBinding> = self
            .iter()
            .map(|(route, rule)| StoredBinding::new(route, rule))
            .collect();
        Some(bitcode::encode(&records))
    }

    fn load_from_bytes(bytes: &[u8]) -> Self {
        let records: Vec<StoredBinding> = crate::decode_or_warn(Self::SAVE_KEY, bytes);
        let mut bindings = RouteBindings::default();
        for record in records {
            let (route, rule) = record.into_binding();
            bindings.bind(route, Some(rule));
        }
        bindings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule_store::RuleParams;
    use crate::Saveable;

    fn bus(n: u32) -> RouteKey {
        RouteKey::new(TransportType::Bus, n)
    }

    #[test]
    fn test_unbound_route_uses_type_default() {
        let settings = TransitSettings::default();
        let resolved = resolve_effective_rule(
            bus(1),
            &RouteBindings::default(),
            &RuleStore::with_seed(1),
            &settings,
        );
        assert_eq!(resolved.origin, RuleOrigin::TypeDefault);
        assert_eq!(resolved.rule.name, "Bus");
        assert_eq!(resolved.rule.occupancy_target_pct, 30);
    }

    #[test]
    fn test_bound_custom_rule_wins() {
        let settings = TransitSettings::default();
        let mut rules = RuleStore::with_seed(2);
        let id = rules.add_rule();
        rules.set_rule(
            id,
            &RuleParams {
                name: "Rush".to_string(),
                occupancy_target_pct: 60,
                ..Default::default()
            },
        );
        let mut bindings = RouteBindings::default();
        bindings.bind(bus(1), Some(id));

        let resolved = resolve_effective_rule(bus(1), &bindings, &rules, &settings);
        assert_eq!(resolved.origin, RuleOrigin::Custom);
        assert_eq!(resolved.rule.name, "Rush");
        assert_eq!(resolved.config().occupancy_target_pct, 60);
    }

    #[test]
    fn test_foreign_builtin_binding_resolves_to_own_type() {
        let settings = TransitSettings::default();
        let rules = RuleStore::with_seed(4);
        let tram = RouteKey::new(TransportType::Tram, 6);
        let mut bindings = RouteBindings::default();
        bindings.bind(tram, Some(TransportType::Bus.builtin_rule_id()));

        let resolved = resolve_effective_rule(tram, &bindings, &rules, &settings);
        assert_eq!(resolved.origin, RuleOrigin::TypeDefault);
        assert_eq!(resolved.rule.name, "Tram");
        assert_eq!(resolved.rule.occupancy_target_pct, 40);
    }

    #[test]
    fn test_vanished_rule_falls_back_to_default() {
        let settings = TransitSettings::default();
        let mut rules = RuleStore::with_seed(3);
        let id = rules.add_rule();
        let mut bindings = RouteBindings::default();
        bindings.bind(bus(1), Some(id));
        rules.remove_rule(id);

        let resolved = resolve_effective_rule(bus(1), &bindings, &rules, &settings);
        assert_eq!(resolved.origin, RuleOrigin::TypeDefault);
        assert_eq!(resolved.rule.name, "Bus");
    }

    #[test]
    fn test_disabled_type_overrides_binding() {
        let mut settings = TransitSettings::default();
        settings.transport.get_mut(TransportType::Bus).disabled = true;
        let mut rules = RuleStore::with_seed(4);
        let id = rules.add_rule();
        let mut bindings = RouteBindings::default();
        bindings.bind(bus(1), Some(id));

        let resolved = resolve_effective_rule(bus(1), &bindings, &rules, &settings);
        assert_eq!(resolved.rule.id, RuleId::DISABLED);
        assert!(!resolved.config().is_active());
    }

    #[test]
    fn test_forget_rule_unbinds_all_routes() {
        let mut bindings = RouteBindings::default();
        let id = RuleId(0xABCD << 64);
        bindings.bind(bus(1), Some(id));
        bindings.bind(bus(2), Some(id));
        bindings.bind(bus(3), Some(RuleId::DISABLED));
        assert_eq!(bindings.forget_rule(id), 2);
        assert_eq!(bindings.len(), 1);
        bindings.bind(bus(3), None);
        assert!(bindings.is_empty());
    }

    #[test]
    fn test_legacy_binding_widens_signed_id() {
        let legacy = vec![
            StoredBinding::V1(LegacyBindingRecord {
                schema_version: 1,
                transport_type: TransportType::Tram,
                route_number: 5,
                rule_id: -1,
            }),
            StoredBinding::V1(LegacyBindingRecord {
                schema_version: 1,
                transport_type: TransportType::Tram,
                route_number: 6,
                rule_id: 2,
            }),
        ];
        let bindings = RouteBindings::load_from_bytes(&bitcode::encode(&legacy));
        let tram = |n| RouteKey::new(TransportType::Tram, n);
        assert_eq!(bindings.rule_for(tram(5)), Some(RuleId::DISABLED));
        assert_eq!(
            bindings.rule_for(tram(6)),
            Some(TransportType::Tram.builtin_rule_id())
        );
    }

    #[test]
    fn test_save_round_trip_and_empty_skip() {
        assert!(RouteBindings::default().save_to_bytes().is_none());

        let mut bindings = RouteBindings::default();
        bindings.bind(bus(9), Some(RuleId(u128::MAX - 7)));
        let bytes = bindings.save_to_bytes().expect("non-empty bindings are saved");
        assert_eq!(RouteBindings::load_from_bytes(&bytes), bindings);
    }
}
