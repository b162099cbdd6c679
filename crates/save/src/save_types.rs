// ---------------------------------------------------------------------------
// TransitSaveData: the top-level save payload
// ---------------------------------------------------------------------------

use std::collections::BTreeMap;

use bitcode::{Decode, Encode};
use serde::{Deserialize, Serialize};

/// Current save file version.
/// v1 = first versioned layout (`SaveableRegistry` extension map)
pub const CURRENT_SAVE_VERSION: u32 = 1;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Encode, Decode)]
pub struct TransitSaveData {
    /// Defaults to 0 for saves that predate versioning.
    #[serde(default)]
    pub version: u32,
    /// `SaveableRegistry` output, keyed by `Saveable::SAVE_KEY`.
    #[serde(default)]
    pub extensions: BTreeMap<String, Vec<u8>>,
}

impl TransitSaveData {
    pub fn new(extensions: BTreeMap<String, Vec<u8>>) -> Self {
        Self {
            version: CURRENT_SAVE_VERSION,
            extensions,
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        bitcode::encode(self)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, bitcode::Error> {
        bitcode::decode(bytes)
    }
}
