use serde::de::{Deserializer, Error as _};
use serde::Deserialize;
use serde_json::Value;
use std::path::PathBuf;

/// One clickable task: where it sits in the room, what it asks and which
/// letter of the door code it gives away.
#[derive(Debug, Clone, PartialEq)]
pub struct Question {
    pub id: String,
    pub name: String,
    pub x: i32,
    pub y: i32,
    pub image: Option<PathBuf>,
    pub scale: f32,
    pub text: String,
    pub code: String,
    pub choices: Vec<String>,
    pub correct: usize,
    pub letter: String,
}

/// Raw catalog entry as it appears in the JSON file.
#[derive(Debug, Deserialize)]
pub(super) struct QuestionRecord {
    #[serde(rename = "objekt")]
    pub id: String,
    #[serde(rename = "nimi", default)]
    pub name: Option<String>,
    #[serde(deserialize_with = "coerce_int")]
    pub x: i32,
    #[serde(deserialize_with = "coerce_int")]
    pub y: i32,
    #[serde(rename = "pilt", default)]
    pub image: Option<String>,
    #[serde(rename = "skaala", default = "default_scale", deserialize_with = "coerce_float")]
    pub scale: f32,
    #[serde(rename = "küsimus")]
    pub question: String,
    #[serde(rename = "kood", default)]
    pub code: String,
    #[serde(rename = "valikud", default)]
    pub choices: Vec<String>,
    #[serde(rename = "õige_vastus", default, deserialize_with = "coerce_index")]
    pub correct: usize,
    #[serde(rename = "täht", default, deserialize_with = "coerce_string")]
    pub letter: String,
}

fn default_scale() -> f32 {
    1.0
}

// Catalogs are hand-written, so numbers sometimes arrive as floats or strings.
fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn coerce_int<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i32, D::Error> {
    let value = Value::deserialize(deserializer)?;
    as_number(&value)
        .map(|n| n as i32)
        .ok_or_else(|| D::Error::custom(format!("expected an integer, got {}", value)))
}

fn coerce_float<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f32, D::Error> {
    let value = Value::deserialize(deserializer)?;
    as_number(&value)
        .map(|n| n as f32)
        .ok_or_else(|| D::Error::custom(format!("expected a number, got {}", value)))
}

fn coerce_index<'de, D: Deserializer<'de>>(deserializer: D) -> Result<usize, D::Error> {
    let value = Value::deserialize(deserializer)?;
    match as_number(&value) {
        Some(n) if n >= 0.0 => Ok(n as usize),
        _ => Err(D::Error::custom(format!(
            "expected a non-negative answer index, got {}",
            value
        ))),
    }
}

fn coerce_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Null => Ok(String::new()),
        other => Ok(other.to_string()),
    }
}
