//! Alarm metadata records and image correlation keys.
//!
//! The appliance sends one JSON text frame per alarm, immediately followed by
//! one binary frame holding the still image for that alarm. The text frame is
//! parsed into an [`EventRecord`], whose [`ImageName`] names the image.
//!
//! ```json
//! {"evtAlm": {"type": 9, "id": 42, "tm": "2021-05-17T10:00:00", ...}}
//! ```

use std::fmt;

use serde::Deserialize;
use serde_json::Number;

use crate::category::EventCategory;
use crate::errors::DecodeError;

/// One parsed alarm.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EventRecord {
    /// Raw event-type code.
    pub code: i64,
    /// Alarm identifier, rendered in its shortest decimal form.
    pub id: String,
    /// Appliance timestamp string, verbatim.
    pub timestamp: String,
}

#[derive(Deserialize)]
struct Envelope {
    #[serde(rename = "evtAlm")]
    alarm: Option<RawAlarm>,
}

#[derive(Deserialize)]
struct RawAlarm {
    #[serde(rename = "type")]
    kind: Option<Number>,
    id: Option<Number>,
    tm: Option<String>,
}

impl EventRecord {
    /// Parse a metadata text frame.
    pub fn parse(payload: &str) -> Result<Self, DecodeError> {
        let envelope: Envelope = serde_json::from_str(payload)?;
        let alarm = envelope.alarm.ok_or(DecodeError::MissingField("evtAlm"))?;

        let kind = alarm.kind.ok_or(DecodeError::MissingField("evtAlm.type"))?;
        let code = number_to_code(&kind).ok_or_else(|| DecodeError::InvalidField {
            field: "evtAlm.type",
            reason: format!("{kind} is not a usable event code"),
        })?;

        let id = alarm.id.ok_or(DecodeError::MissingField("evtAlm.id"))?;
        let timestamp = alarm.tm.ok_or(DecodeError::MissingField("evtAlm.tm"))?;

        Ok(Self {
            code,
            id: render_id(&id),
            timestamp,
        })
    }

    /// Category for this record's code, if the code is known.
    pub fn category(&self) -> Option<EventCategory> {
        EventCategory::from_code(self.code)
    }

    /// Name for the image frame that follows this record.
    pub fn image_name(&self) -> ImageName {
        ImageName::from_parts(&self.id, &self.timestamp)
    }
}

/// Integral codes pass through; fractional codes truncate toward zero.
#[allow(clippy::cast_possible_truncation)]
fn number_to_code(n: &Number) -> Option<i64> {
    if let Some(v) = n.as_i64() {
        return Some(v);
    }
    let f = n.as_f64()?;
    if f.is_finite() && f.abs() < 9.0e15 {
        Some(f.trunc() as i64)
    } else {
        None
    }
}

/// Shortest decimal form: `42.0` renders as `42`, `4.5` as `4.5`.
fn render_id(n: &Number) -> String {
    if let Some(v) = n.as_i64() {
        return v.to_string();
    }
    if let Some(v) = n.as_u64() {
        return v.to_string();
    }
    match n.as_f64() {
        Some(f) if f.fract() == 0.0 && f.abs() < 9.0e15 => format!("{f:.0}"),
        Some(f) => f.to_string(),
        None => n.to_string(),
    }
}

/// Correlation key naming the image that follows an [`EventRecord`].
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ImageName(String);

impl ImageName {
    /// `{id}-{timestamp}`.
    pub fn from_parts(id: &str, timestamp: &str) -> Self {
        Self(format!("{id}-{timestamp}"))
    }

    /// The name as produced from the record.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// File name under the output directory (`{name}.jpeg`).
    ///
    /// Path separators and NUL are replaced so a hostile timestamp cannot
    /// escape the output directory.
    pub fn file_name(&self) -> String {
        let safe: String = self
            .0
            .chars()
            .map(|c| match c {
                '/' | '\\' | '\0' => '_',
                other => other,
            })
            .collect();
        format!("{safe}.jpeg")
    }
}

impl fmt::Display for ImageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
