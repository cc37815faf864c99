pub mod panel;
pub mod recorder;

pub use panel::{AgentBlock, TracePanel};
pub use recorder::{TraceRecorder, HISTORY_LIMIT};

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use thiserror::Error;

pub const DEFAULT_TRACES_FILE: &str = "data/traces.json";

#[derive(Debug, Error)]
pub enum TraceError {
    #[error("trace payload parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("trace io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Agent histories keyed by agent identifier, iterated in identifier order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TraceDataset {
    pub agents: BTreeMap<String, AgentHistory>,
}

impl TraceDataset {
    pub fn parse(payload: &str) -> Result<Self, TraceError> {
        Ok(serde_json::from_str(payload)?)
    }

    pub fn agent(&self, agent_id: &str) -> Option<&AgentHistory> {
        self.agents.get(agent_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &AgentHistory)> {
        self.agents.iter()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentHistory {
    pub enaction: Vec<Enaction>,
    #[serde(default)]
    pub preparation: Vec<Enaction>,
    #[serde(default, flatten)]
    pub extra: HashMap<String, Value>,
}

/// One enacted interaction and the valence it carried. Encoded as a
/// two-element JSON array.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Enaction(pub InteractionKind, pub Value);

impl Enaction {
    pub fn new(kind: InteractionKind, valence: impl Into<Value>) -> Self {
        Self(kind, valence.into())
    }

    pub fn interaction(&self) -> &InteractionKind {
        &self.0
    }

    pub fn valence(&self) -> &Value {
        &self.1
    }
}

/// Reads only the first two array elements. A missing valence is `null`;
/// elements past the second are ignored.
impl<'de> Deserialize<'de> for Enaction {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Value::deserialize(deserializer)? {
            Value::Array(items) => {
                let mut items = items.into_iter();
                let kind = InteractionKind::from_value(items.next().unwrap_or(Value::Null));
                let valence = items.next().unwrap_or(Value::Null);
                Ok(Enaction(kind, valence))
            }
            other => Err(de::Error::invalid_type(
                unexpected(&other),
                &"an [interaction, valence] array",
            )),
        }
    }
}

fn unexpected(value: &Value) -> de::Unexpected<'_> {
    match value {
        Value::Null => de::Unexpected::Unit,
        Value::Bool(flag) => de::Unexpected::Bool(*flag),
        Value::Number(_) => de::Unexpected::Other("number"),
        Value::String(text) => de::Unexpected::Str(text),
        Value::Array(_) => de::Unexpected::Seq,
        Value::Object(_) => de::Unexpected::Map,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum InteractionKind {
    Bump,
    Step,
    TurnLeft,
    TurnRight,
    NoFeel,
    Feel,
    /// Any tag outside the known set. Renders without a glyph.
    Other(String),
}

impl InteractionKind {
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "Bump" => InteractionKind::Bump,
            "Step" => InteractionKind::Step,
            "Turn Left" => InteractionKind::TurnLeft,
            "Turn Right" => InteractionKind::TurnRight,
            "No Feel" => InteractionKind::NoFeel,
            "Feel" => InteractionKind::Feel,
            other => InteractionKind::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            InteractionKind::Bump => "Bump",
            InteractionKind::Step => "Step",
            InteractionKind::TurnLeft => "Turn Left",
            InteractionKind::TurnRight => "Turn Right",
            InteractionKind::NoFeel => "No Feel",
            InteractionKind::Feel => "Feel",
            InteractionKind::Other(tag) => tag,
        }
    }

    pub fn glyph(&self) -> Option<char> {
        match self {
            InteractionKind::Bump => Some('\u{21DD}'),
            InteractionKind::Step => Some('\u{2192}'),
            InteractionKind::TurnLeft => Some('\u{2B0F}'),
            InteractionKind::TurnRight => Some('\u{21B4}'),
            InteractionKind::NoFeel => Some('\u{25A1}'),
            InteractionKind::Feel => Some('\u{25A0}'),
            InteractionKind::Other(_) => None,
        }
    }

    /// Non-string tags become `Other` holding their JSON text.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::String(tag) => InteractionKind::from_tag(&tag),
            other => InteractionKind::Other(other.to_string()),
        }
    }
}

impl fmt::Display for InteractionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for InteractionKind {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for InteractionKind {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(InteractionKind::from_value(Value::deserialize(deserializer)?))
    }
}

/// 32-bit polynomial rolling hash over UTF-16 code units (`h * 31 + unit`).
pub fn hash_code(input: &str) -> i32 {
    input
        .encode_utf16()
        .fold(0i32, |acc, unit| acc.wrapping_mul(31).wrapping_add(i32::from(unit)))
}
