use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ZignError;

/// Where a recovered variable lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VarKind {
    /// Frame-pointer relative (`b`).
    BasePointer,
    /// Stack-pointer relative (`s`).
    StackPointer,
    /// Register-held argument or local (`r`).
    Register,
}

impl VarKind {
    /// One-letter tag used in the serialized token.
    pub fn tag(self) -> char {
        match self {
            VarKind::BasePointer => 'b',
            VarKind::StackPointer => 's',
            VarKind::Register => 'r',
        }
    }

    pub fn from_tag(tag: char) -> Option<Self> {
        match tag {
            'b' => Some(VarKind::BasePointer),
            's' => Some(VarKind::StackPointer),
            'r' => Some(VarKind::Register),
            _ => None,
        }
    }
}

/// Variable descriptor as stored in a signature: kind plus signed delta.
///
/// Serialized as a compact token such as `b-4`, `s12` or `r0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Variable {
    pub kind: VarKind,
    pub delta: i64,
}

impl Variable {
    pub fn new(kind: VarKind, delta: i64) -> Self {
        Self { kind, delta }
    }

    pub fn base(delta: i64) -> Self {
        Self::new(VarKind::BasePointer, delta)
    }

    pub fn stack(delta: i64) -> Self {
        Self::new(VarKind::StackPointer, delta)
    }

    pub fn register(delta: i64) -> Self {
        Self::new(VarKind::Register, delta)
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.kind.tag(), self.delta)
    }
}

impl FromStr for Variable {
    type Err = ZignError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        let mut chars = token.chars();
        let kind = chars
            .next()
            .and_then(VarKind::from_tag)
            .ok_or_else(|| ZignError::Validation(format!("unknown variable kind in `{token}`")))?;
        let delta = chars
            .as_str()
            .parse::<i64>()
            .map_err(|_| ZignError::Validation(format!("invalid variable delta in `{token}`")))?;
        Ok(Self { kind, delta })
    }
}

impl TryFrom<String> for Variable {
    type Error = ZignError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Variable> for String {
    fn from(var: Variable) -> Self {
        var.to_string()
    }
}
