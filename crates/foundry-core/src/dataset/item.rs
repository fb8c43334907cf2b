use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;
use std::sync::Arc;

use crate::error::{FoundryError, FoundryResult};

/// Provenance record for one published value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemUpdate {
    pub key: String,
    pub producer: String,
    pub published_at: DateTime<Utc>,
}

/// One unit of work in a dataset, owning a result store keyed by property name.
///
/// Publishing is safe from concurrent actions; two actions publishing the
/// same key on the same item is a caller error and simply overwrites.
#[derive(Debug)]
pub struct DatasetItem {
    id: String,
    data: RwLock<Map<String, Value>>,
    history: RwLock<Vec<ItemUpdate>>,
}

impl DatasetItem {
    pub fn new(id: impl Into<String>, data: Map<String, Value>) -> Self {
        Self {
            id: id.into(),
            data: RwLock::new(data),
            history: RwLock::new(Vec::new()),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Publish `value` under `key`, attributed to `producer`
    pub fn push<T: Serialize>(&self, key: &str, value: &T, producer: &str) -> FoundryResult<()> {
        let value = serde_json::to_value(value)?;
        self.data.write().insert(key.to_string(), value);
        self.history.write().push(ItemUpdate {
            key: key.to_string(),
            producer: producer.to_string(),
            published_at: Utc::now(),
        });
        tracing::debug!(item_id = %self.id, key, producer, "Published item value");
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.data.read().get(key).cloned()
    }

    /// Read a value and deserialize it
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> FoundryResult<Option<T>> {
        self.get(key)
            .map(|value| {
                serde_json::from_value(value).map_err(|e| {
                    FoundryError::invalid_field(key, format!("Item '{}': {}", self.id, e))
                })
            })
            .transpose()
    }

    pub fn data(&self) -> Map<String, Value> {
        self.data.read().clone()
    }

    pub fn history(&self) -> Vec<ItemUpdate> {
        self.history.read().clone()
    }

    /// Producer that last wrote `key`
    pub fn producer_of(&self, key: &str) -> Option<String> {
        self.history
            .read()
            .iter()
            .rev()
            .find(|update| update.key == key)
            .map(|update| update.producer.clone())
    }

    /// Snapshot of data plus provenance, for reports
    pub fn to_json(&self) -> Value {
        serde_json::json!({
            "id": self.id,
            "data": Value::Object(self.data()),
            "history": self.history(),
        })
    }
}

/// A named collection of items
#[derive(Debug, Clone)]
pub struct Dataset {
    pub name: String,
    pub items: Vec<Arc<DatasetItem>>,
}

impl Dataset {
    pub fn new(name: impl Into<String>, items: Vec<DatasetItem>) -> Self {
        Self {
            name: name.into(),
            items: items.into_iter().map(Arc::new).collect(),
        }
    }

    /// Parse a JSON array of objects. Each object needs an `id` (string or
    /// number); the remaining fields become the item's data.
    pub fn from_json(name: impl Into<String>, json: &str) -> FoundryResult<Self> {
        let entries: Vec<Map<String, Value>> = serde_json::from_str(json)?;
        let mut items = Vec::with_capacity(entries.len());
        for (index, mut entry) in entries.into_iter().enumerate() {
            let id = match entry.remove("id") {
                Some(Value::String(id)) => id,
                Some(Value::Number(id)) => id.to_string(),
                _ => {
                    return Err(FoundryError::invalid_field(
                        "id",
                        format!("Dataset entry {} has no string or numeric id", index),
                    ));
                }
            };
            items.push(DatasetItem::new(id, entry));
        }
        Ok(Self::new(name, items))
    }

    pub fn load(path: &Path) -> FoundryResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            FoundryError::io_with_path(format!("Failed to read dataset: {}", e), path.display().to_string())
        })?;
        let name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().to_string())
            .unwrap_or_else(|| "dataset".to_string());
        Self::from_json(name, &content)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn to_json(&self) -> Value {
        serde_json::json!({
            "name": self.name,
            "items": self.items.iter().map(|item| item.to_json()).collect::<Vec<_>>(),
        })
    }
}
