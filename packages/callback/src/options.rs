//! Client connection options.
//!
//! Options are plain configuration and are usually parsed from JSON:
//! ```json
//! {"host": "cache.internal", "port": 6380, "db": 2, "prefix": "app:"}
//! ```
//! Missing fields take their defaults.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::Value;

/// Options a client is created or duplicated with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientOptions {
    pub host: String,
    pub port: u16,
    /// Selected database index.
    pub db: u32,
    /// Prefix applied to every key the client touches.
    pub prefix: Option<String>,
    /// Connection name.
    pub name: Option<String>,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 6379,
            db: 0,
            prefix: None,
            name: None,
        }
    }
}

impl ClientOptions {
    /// Parse options from a JSON object.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Same options with a different database selected.
    pub fn with_db(&self, db: u32) -> Self {
        Self {
            db,
            ..self.clone()
        }
    }

    /// Options rendered as a map value.
    pub fn to_value(&self) -> Value {
        let mut map = BTreeMap::new();
        map.insert("host".to_string(), Value::from(self.host.as_str()));
        map.insert("port".to_string(), Value::Integer(self.port as i64));
        map.insert("db".to_string(), Value::from(self.db));
        map.insert("prefix".to_string(), Value::from(self.prefix.clone()));
        map.insert("name".to_string(), Value::from(self.name.clone()));
        Value::Map(map)
    }
}
