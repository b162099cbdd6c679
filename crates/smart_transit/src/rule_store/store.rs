use std::collections::{BTreeMap, HashSet};

use bevy::prelude::*;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use super::types::{is_builtin_name, Rule, RuleChoice, RuleParams};
use crate::ids::{RuleId, TransportType};
use crate::settings::TransitSettings;

/// Registry of every rule, keyed by id.
///
/// Ids come from a ChaCha8 stream and are checked against live rules, ids
/// retired earlier in the session and the legacy 32-bit range, so an id is
/// never handed out twice.
#[derive(Resource)]
pub struct RuleStore {
    rules: BTreeMap<RuleId, Rule>,
    retired: HashSet<RuleId>,
    rng: ChaCha8Rng,
}

impl Default for RuleStore {
    fn default() -> Self {
        Self::with_seed(rand::random())
    }
}

impl RuleStore {
    /// Store with a deterministic id stream.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rules: BTreeMap::new(),
            retired: HashSet::new(),
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    fn fresh_id(&mut self) -> RuleId {
        loop {
            let candidate = RuleId(self.rng.gen());
            if candidate.is_legacy_range()
                || self.rules.contains_key(&candidate)
                || self.retired.contains(&candidate)
            {
                continue;
            }
            return candidate;
        }
    }

    /// Create an "Unnamed" rule with every numeric field zero.
    pub fn add_rule(&mut self) -> RuleId {
        let id = self.fresh_id();
        self.rules.insert(id, Rule::unnamed(id));
        id
    }

    pub fn get_rule(&self, id: RuleId) -> Option<&Rule> {
        self.rules.get(&id)
    }

    /// Lookup that never fails: unknown ids resolve to an inactive record.
    pub fn rule_or_empty(&self, id: RuleId) -> Rule {
        self.rules
            .get(&id)
            .cloned()
            .unwrap_or_else(|| Rule::empty(id, ""))
    }

    pub fn contains(&self, id: RuleId) -> bool {
        self.rules.contains_key(&id)
    }

    /// Create-or-update. Writing to an unknown id creates the rule under that
    /// id unless it was retired this session.
    pub fn set_rule(&mut self, id: RuleId, params: &RuleParams) {
        if let Some(rule) = self.rules.get_mut(&id) {
            rule.apply(params);
            return;
        }
        if self.retired.contains(&id) {
            warn!("set_rule: {id} was removed this session, not recreating it");
            return;
        }
        debug!("set_rule: creating rule {id} ('{}')", params.name);
        let mut rule = Rule::unnamed(id);
        rule.apply(params);
        self.rules.insert(id, rule);
    }

    /// Delete if present. Built-in protection is the caller's job.
    pub fn remove_rule(&mut self, id: RuleId) -> Option<Rule> {
        let removed = self.rules.remove(&id);
        if removed.is_some() {
            self.retired.insert(id);
        }
        removed
    }

    /// All rules in id order.
    pub fn list_rules(&self) -> Vec<Rule> {
        self.rules.values().cloned().collect()
    }

    /// All rules ordered by name, then id, for stable display.
    pub fn sorted_for_display(&self) -> Vec<Rule> {
        let mut rules = self.list_rules();
        rules.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        rules
    }

    /// Rules a route of `transport_type` may be bound to. A disabled type only
    /// offers "Disabled"; otherwise the type's own default plus every custom rule.
    pub fn list_applicable_rules(
        &self,
        transport_type: TransportType,
        type_disabled: bool,
    ) -> Vec<RuleChoice> {
        if type_disabled {
            let disabled = self
                .rules
                .get(&RuleId::DISABLED)
                .cloned()
                .unwrap_or_else(Rule::disabled);
            return vec![RuleChoice {
                id: disabled.id,
                name: disabled.name,
            }];
        }

        let own = transport_type.builtin_rule_id();
        let mut choices: Vec<RuleChoice> = self
            .rules
            .values()
            .filter(|r| r.id == own || !is_builtin_name(&r.name))
            .map(|r| RuleChoice {
                id: r.id,
                name: r.name.clone(),
            })
            .collect();
        // Type default first, customs by name.
        choices.sort_by(|a, b| {
            (a.id != own)
                .cmp(&(b.id != own))
                .then(a.name.cmp(&b.name))
                .then(a.id.cmp(&b.id))
        });
        choices
    }

    /// Custom rules plus the defaults of enabled types, as a rules panel shows them.
    pub fn visible_rules(&self, settings: &TransitSettings) -> Vec<Rule> {
        self.sorted_for_display()
            .into_iter()
            .filter(|r| match r.id.builtin_type() {
                Some(t) => !settings.is_type_disabled(t),
                None => r.id != RuleId::DISABLED,
            })
            .collect()
    }

    /// Create or overwrite the built-in rules from configuration. Returns
    /// whether anything changed; a second call with the same settings is a no-op.
    pub fn sync_defaults_from_config(&mut self, settings: &TransitSettings) -> bool {
        let mut changed = false;
        let wanted = TransportType::ALL
            .into_iter()
            .map(|t| Rule::builtin(t, settings.transport.get(t)))
            .chain(std::iter::once(Rule::disabled()));
        for rule in wanted {
            if self.rules.get(&rule.id) != Some(&rule) {
                self.rules.insert(rule.id, rule);
                changed = true;
            }
        }
        changed
    }

    pub fn has_all_builtins(&self) -> bool {
        self.rules.contains_key(&RuleId::DISABLED)
            && TransportType::ALL
                .into_iter()
                .all(|t| self.rules.contains_key(&t.builtin_rule_id()))
    }

    /// Rules that are not derived from configuration.
    pub fn custom_rules(&self) -> impl Iterator<Item = &Rule> {
        self.rules.values().filter(|r| !r.id.is_builtin())
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Insert a rule restored from a save, keeping its id.
    pub(crate) fn restore(&mut self, rule: Rule) {
        self.rules.insert(rule.id, rule);
    }
}
