// ---------------------------------------------------------------------------
// Rule record layout on disk
// ---------------------------------------------------------------------------
//
// Schema 1 stored a 32-bit integer id. Schema 2 stores the full 128-bit id.
// Both are kept as variants of `StoredRule` so old records decode without
// failing; a v1 id is zero-extended into the 128-bit space.

use bitcode::{Decode, Encode};

use super::store::RuleStore;
use super::types::Rule;
use crate::ids::RuleId;

pub const RULE_SCHEMA_VERSION: u32 = 2;

/// Numeric body shared by every schema version.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct RuleFields {
    pub name: String,
    pub occupancy_pct: i32,
    pub std_ticket: i32,
    pub max_ticket_inc: i32,
    pub max_ticket_dec: i32,
    pub max_veh_adj: i32,
    pub min_veh_adj: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct LegacyRuleRecord {
    pub schema_version: u32,
    pub id: u32,
    pub fields: RuleFields,
}

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct RuleRecord {
    pub schema_version: u32,
    pub id: u128,
    pub fields: RuleFields,
}

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub enum StoredRule {
    V1(LegacyRuleRecord),
    V2(RuleRecord),
}

impl StoredRule {
    pub fn from_rule(rule: &Rule) -> Self {
        StoredRule::V2(RuleRecord {
            schema_version: RULE_SCHEMA_VERSION,
            id: rule.id.0,
            fields: RuleFields {
                name: rule.name.clone(),
                occupancy_pct: rule.occupancy_target_pct,
                std_ticket: rule.standard_ticket_price,
                max_ticket_inc: rule.max_ticket_increase_pct,
                max_ticket_dec: rule.max_ticket_discount_pct,
                max_veh_adj: rule.max_vehicle_adj_pct,
                min_veh_adj: rule.min_vehicle_adj_pct,
            },
        })
    }

    pub fn schema_version(&self) -> u32 {
        match self {
            StoredRule::V1(r) => r.schema_version,
            StoredRule::V2(r) => r.schema_version,
        }
    }

    pub fn into_rule(self) -> Rule {
        let (id, fields) = match self {
            StoredRule::V1(r) => (RuleId::from_legacy(r.id), r.fields),
            StoredRule::V2(r) => (RuleId(r.id), r.fields),
        };
        Rule {
            id,
            name: fields.name,
            occupancy_target_pct: fields.occupancy_pct,
            standard_ticket_price: fields.std_ticket,
            max_ticket_increase_pct: fields.max_ticket_inc,
            max_ticket_discount_pct: fields.max_ticket_dec,
            max_vehicle_adj_pct: fields.max_veh_adj,
            min_vehicle_adj_pct: fields.min_veh_adj,
        }
    }
}

/// Custom rules only; built-ins are re-derived from settings after load.
impl crate::Saveable for RuleStore {
    const SAVE_KEY: &'static str = "transit_rules";

    fn save_to_bytes(&self) -> Option<Vec<u8>> {
        let records: Vec<StoredRule> = self.custom_rules().map(StoredRule::from_rule).collect();
        if records.is_empty() {
            return None;
        }
        Some(bitcode::encode(&records))
    }

    fn load_from_bytes(bytes: &[u8]) -> Self {
        let records: Vec<StoredRule> = crate::decode_or_warn(Self::SAVE_KEY, bytes);
        let mut store = RuleStore::default();
        for record in records {
            let rule = record.into_rule();
            if rule.id.is_builtin() {
                continue;
            }
            store.restore(rule);
        }
        store
    }
}
