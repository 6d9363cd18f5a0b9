//! Decoding of ECS "Task State Change" events.
//!
//! The Lambda payload is normally an EventBridge envelope with the task
//! detail nested under `detail`. A bare detail object is accepted too so
//! captured events can be replayed from disk without rewrapping them.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskStatusEvent {
    pub cluster_arn: String,
    pub task_arn: String,
    pub task_definition_arn: String,
    #[serde(default)]
    pub last_status: Option<String>,
    /// Anything other than an array is treated as no containers.
    #[serde(default, deserialize_with = "container_list")]
    pub containers: Vec<Container>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct Container {
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: Option<String>,
    /// `None` when the event carries no image or a non-string one.
    #[serde(default, deserialize_with = "lenient_string")]
    pub image: Option<String>,
}

impl Container {
    #[cfg(test)]
    pub fn with_image(image: impl Into<String>) -> Self {
        Self {
            name: None,
            image: Some(image.into()),
        }
    }

    pub fn label(&self) -> &str {
        self.name.as_deref().unwrap_or("<unnamed>")
    }
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        _ => None,
    })
}

/// Array elements, or the values of an object, each become a container.
/// Scalars and null hold no containers.
fn container_list<'de, D>(deserializer: D) -> Result<Vec<Container>, D::Error>
where
    D: Deserializer<'de>,
{
    let items: Vec<Value> = match Value::deserialize(deserializer)? {
        Value::Array(items) => items,
        Value::Object(entries) => entries.into_iter().map(|(_, item)| item).collect(),
        _ => Vec::new(),
    };
    Ok(items.into_iter().map(container_from_value).collect())
}

/// A non-object element becomes a container without an image, which the
/// registry policy rejects.
fn container_from_value(item: Value) -> Container {
    match item {
        Value::Object(_) => serde_json::from_value(item).unwrap_or_default(),
        _ => Container::default(),
    }
}

/// Extract the task detail from an invocation payload.
pub fn decode(payload: Value) -> Result<TaskStatusEvent, serde_json::Error> {
    let detail = match payload {
        Value::Object(mut envelope) => match envelope.remove("detail") {
            Some(detail) => detail,
            None => Value::Object(envelope),
        },
        other => other,
    };
    serde_json::from_value(detail)
}

pub fn decode_slice(bytes: &[u8]) -> Result<TaskStatusEvent, serde_json::Error> {
    decode(serde_json::from_slice(bytes)?)
}
