// Windowed summary read model and narrative insight types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use super::{AlertRecord, SystemDescriptor};

/// Traffic over the window for one interface, in MB (bytes / 1024²).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TrafficMb {
    pub sent: f64,
    pub received: f64,
}

/// Items are decoded leniently: a bare string becomes the title, non-string scalars are
/// stringified and unknown keys are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Value")]
pub struct Anomaly {
    pub title: String,
    pub description: String,
    /// "low" | "medium" | "high" as produced by the backend; not validated.
    pub severity: String,
}

impl From<Value> for Anomaly {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(fields) => Self {
                title: text_field(&fields, "title"),
                description: text_field(&fields, "description"),
                severity: text_field(&fields, "severity"),
            },
            other => Self {
                title: text(&other),
                ..Self::default()
            },
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Value")]
pub struct Recommendation {
    pub title: String,
    pub description: String,
    pub action: String,
}

impl From<Value> for Recommendation {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(fields) => Self {
                title: text_field(&fields, "title"),
                description: text_field(&fields, "description"),
                action: text_field(&fields, "action"),
            },
            other => Self {
                title: text(&other),
                ..Self::default()
            },
        }
    }
}

fn text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn text_field(fields: &Map<String, Value>, key: &str) -> String {
    fields.get(key).map(text).unwrap_or_default()
}

/// `null` or a missing key is an empty list, a lone item is a list of one, `null` items are dropped.
fn lenient_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: From<Value>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => Vec::new(),
        Value::Array(items) => items
            .into_iter()
            .filter(|item| !item.is_null())
            .map(T::from)
            .collect(),
        item => vec![T::from(item)],
    })
}

/// What an insight backend returns. Missing keys deserialize as empty lists.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Insights {
    #[serde(default, deserialize_with = "lenient_list")]
    pub anomalies: Vec<Anomaly>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub recommendations: Vec<Recommendation>,
}

/// Aggregate over a time window. Built per request, never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub system: SystemDescriptor,
    pub cpu_avg: f64,
    pub cpu_max: f64,
    pub memory_avg: f64,
    pub memory_max: f64,
    pub disk_usage_avg: BTreeMap<String, f64>,
    pub network_traffic_mb: BTreeMap<String, TrafficMb>,
    pub alerts: Vec<AlertRecord>,
    /// Present only when insights were requested and the backend answered.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anomalies: Option<Vec<Anomaly>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendations: Option<Vec<Recommendation>>,
}

impl Summary {
    pub fn apply_insights(&mut self, insights: Insights) {
        self.anomalies = Some(insights.anomalies);
        self.recommendations = Some(insights.recommendations);
    }
}
