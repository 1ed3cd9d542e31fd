use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Backend settings, passed through without interpretation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Settings(pub Value);

impl Settings {
    /// Fallback used when the settings request fails.
    pub fn empty() -> Self {
        Self(Value::Object(Map::new()))
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn into_inner(self) -> Value {
        self.0
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::empty()
    }
}
