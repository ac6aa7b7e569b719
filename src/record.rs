// Vital-sign entry record

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One persisted set of vital-sign readings
///
/// Entries are immutable once created: the store only ever inserts new
/// entries or deletes existing ones. The three readings are opaque text and
/// are kept exactly as the caller supplied them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    id: Uuid,
    created_at: DateTime<Utc>,
    temperature: String,
    blood_pressure: String,
    heart_rate: String,
}

impl Entry {
    /// Create a new entry with a fresh id, stamped with the current time
    pub fn new(
        temperature: impl Into<String>,
        blood_pressure: impl Into<String>,
        heart_rate: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            created_at: Utc::now(),
            temperature: temperature.into(),
            blood_pressure: blood_pressure.into(),
            heart_rate: heart_rate.into(),
        }
    }

    /// Unique identifier for this entry
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// When this entry was created
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn temperature(&self) -> &str {
        &self.temperature
    }

    pub fn blood_pressure(&self) -> &str {
        &self.blood_pressure
    }

    pub fn heart_rate(&self) -> &str {
        &self.heart_rate
    }
}
