use serde::{Deserialize, Serialize};

/// A backend network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Network {
    pub name: String,
    pub id: String,
    pub driver: String,
    pub scope: String,
}

impl Network {
    pub fn new(
        name: impl Into<String>,
        id: impl Into<String>,
        driver: impl Into<String>,
        scope: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            id: id.into(),
            driver: driver.into(),
            scope: scope.into(),
        }
    }
}
