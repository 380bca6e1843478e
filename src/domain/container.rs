use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A container as reported by the backend.
///
/// Transient value type rebuilt on every query; equality is structural,
/// including the label mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Container {
    pub name: String,
    pub id: String,
    pub status: String,
    #[serde(default)]
    pub labels: HashMap<String, String>,
}

impl Container {
    pub fn new(
        name: impl Into<String>,
        id: impl Into<String>,
        status: impl Into<String>,
        labels: HashMap<String, String>,
    ) -> Self {
        Self {
            name: name.into(),
            id: id.into(),
            status: status.into(),
            labels,
        }
    }
}
