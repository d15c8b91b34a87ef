//! Serde document types mirroring the on-disk JSON shape exactly.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DtaDocument {
    pub name: String,
    pub clocks: Vec<String>,
    pub actions: Vec<String>,
    pub locations: Vec<LocationDoc>,
    pub init_location: String,
    pub transitions: Vec<TransitionDoc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationDoc {
    pub name: String,
    pub accepting: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invariant: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitionDoc {
    pub source: String,
    pub action: String,
    #[serde(default)]
    pub guard: BTreeMap<String, String>,
    #[serde(default)]
    pub reset: Vec<String>,
    pub target: String,
}
