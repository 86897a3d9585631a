// Player profile: the submitted attributes and how they are decoded from JSON.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// The four fields a submission cannot do without.
pub const REQUIRED_FIELDS: [&str; 4] = ["age", "position", "weight", "height"];

/// Rugby union playing positions offered by the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Position {
    Prop,
    Hooker,
    Lock,
    Flanker,
    #[serde(rename = "Number 8")]
    Number8,
    #[serde(rename = "Scrum-half")]
    ScrumHalf,
    #[serde(rename = "Fly-half")]
    FlyHalf,
    Center,
    Wing,
    #[serde(rename = "Full-back")]
    FullBack,
}

impl Position {
    pub const ALL: [Position; 10] = [
        Position::Prop,
        Position::Hooker,
        Position::Lock,
        Position::Flanker,
        Position::Number8,
        Position::ScrumHalf,
        Position::FlyHalf,
        Position::Center,
        Position::Wing,
        Position::FullBack,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Position::Prop => "Prop",
            Position::Hooker => "Hooker",
            Position::Lock => "Lock",
            Position::Flanker => "Flanker",
            Position::Number8 => "Number 8",
            Position::ScrumHalf => "Scrum-half",
            Position::FlyHalf => "Fly-half",
            Position::Center => "Center",
            Position::Wing => "Wing",
            Position::FullBack => "Full-back",
        }
    }

    /// Whether the position plays in the pack (1-8) rather than the backline.
    pub fn is_forward(&self) -> bool {
        matches!(
            self,
            Position::Prop
                | Position::Hooker
                | Position::Lock
                | Position::Flanker
                | Position::Number8
        )
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Position {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Position::ALL
            .iter()
            .copied()
            .find(|p| p.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| format!("unknown position '{wanted}'"))
    }
}

/// A validated player submission. Lives for one request only.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerProfile {
    pub age: u32,
    pub position: Position,
    /// Kilograms.
    pub weight: f64,
    /// Centimeters.
    pub height: f64,
    pub description: String,
    /// The required fields as the client wrote them, for echoing back.
    pub submitted: SubmittedText,
}

/// Required fields in their submitted spelling (`"prop"`, `"110.0"`).
#[derive(Debug, Clone, PartialEq)]
pub struct SubmittedText {
    pub age: String,
    pub position: String,
    pub weight: String,
    pub height: String,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProfileError {
    /// At least one required field is absent or falsy.
    #[error("All fields are required")]
    MissingFields,
    #[error("{field}: {reason}")]
    InvalidField { field: &'static str, reason: String },
    #[error("request body must be a JSON object")]
    NotAnObject,
}

impl PlayerProfile {
    /// Decode and validate a submission body.
    ///
    /// Presence is checked for all required fields before any of them is
    /// decoded, so a body that is both incomplete and malformed reports
    /// [`ProfileError::MissingFields`].
    pub fn from_json(body: &Value) -> Result<Self, ProfileError> {
        let obj = body.as_object().ok_or(ProfileError::NotAnObject)?;

        if REQUIRED_FIELDS.iter().any(|f| is_falsy(obj.get(*f))) {
            return Err(ProfileError::MissingFields);
        }

        let age = decode_age(field(obj, "age"))?;
        let position = decode_position(field(obj, "position"))?;
        let weight = decode_positive("weight", field(obj, "weight"))?;
        let height = decode_positive("height", field(obj, "height"))?;
        let description = match obj.get("description") {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        };

        let submitted = SubmittedText {
            age: raw_text(field(obj, "age")),
            position: raw_text(field(obj, "position")),
            weight: raw_text(field(obj, "weight")),
            height: raw_text(field(obj, "height")),
        };

        Ok(PlayerProfile {
            age,
            position,
            weight,
            height,
            description,
            submitted,
        })
    }

    /// Build a profile from typed values; the submitted text is their canonical rendering.
    pub fn new(
        age: u32,
        position: Position,
        weight: f64,
        height: f64,
        description: impl Into<String>,
    ) -> Self {
        PlayerProfile {
            age,
            position,
            weight,
            height,
            description: description.into(),
            submitted: SubmittedText {
                age: age.to_string(),
                position: position.name().to_string(),
                weight: weight.to_string(),
                height: height.to_string(),
            },
        }
    }

    /// The description, or `None` when it is the empty string.
    pub fn description(&self) -> Option<&str> {
        (!self.description.is_empty()).then_some(self.description.as_str())
    }
}

/// Source text of a decoded field: strings without surrounding whitespace,
/// numbers with the token serde_json parsed.
fn raw_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.trim().to_string(),
        other => other.to_string(),
    }
}

static NULL: Value = Value::Null;

fn field<'a>(obj: &'a Map<String, Value>, name: &str) -> &'a Value {
    obj.get(name).unwrap_or(&NULL)
}

/// Absent, null, false, zero and the empty string all count as missing.
fn is_falsy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::Bool(b)) => !b,
        Some(Value::Number(n)) => n.as_f64() == Some(0.0),
        Some(Value::String(s)) => s.is_empty(),
        Some(Value::Array(_)) | Some(Value::Object(_)) => false,
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ProfileError {
    ProfileError::InvalidField {
        field,
        reason: reason.into(),
    }
}

fn as_number(field: &'static str, value: &Value) -> Result<f64, ProfileError> {
    let n = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match n {
        Some(n) if n.is_finite() => Ok(n),
        _ => Err(invalid(field, "expected a number")),
    }
}

fn decode_positive(field: &'static str, value: &Value) -> Result<f64, ProfileError> {
    let n = as_number(field, value)?;
    if n <= 0.0 {
        return Err(invalid(field, "must be greater than zero"));
    }
    Ok(n)
}

fn decode_age(value: &Value) -> Result<u32, ProfileError> {
    let n = decode_positive("age", value)?;
    if n.fract() != 0.0 {
        return Err(invalid("age", "must be a whole number"));
    }
    if n > f64::from(u32::MAX) {
        return Err(invalid("age", "is out of range"));
    }
    Ok(n as u32)
}

fn decode_position(value: &Value) -> Result<Position, ProfileError> {
    match value {
        Value::String(s) => s
            .parse::<Position>()
            .map_err(|e| invalid("position", e)),
        _ => Err(invalid("position", "expected a string")),
    }
}
