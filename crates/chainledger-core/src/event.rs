//! Decoded event types.

use alloy_primitives::{B256, I256, U256};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A decoded argument value.
///
/// Addresses are already chain-qualified account ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum DecodedValue {
    Uint(U256),
    Int(I256),
    Bool(bool),
    Address(String),
    /// A 32-byte word: fixed bytes, an indexed reference-type hash, or an
    /// untyped LogNote word
    Word(B256),
    Bytes(Vec<u8>),
    Str(String),
    Array(Vec<DecodedValue>),
    Tuple(Vec<DecodedValue>),
}

impl DecodedValue {
    pub fn as_uint(&self) -> Option<U256> {
        match self {
            Self::Uint(v) => Some(*v),
            Self::Word(w) => Some(U256::from_be_bytes(w.0)),
            _ => None,
        }
    }

    pub fn as_address(&self) -> Option<&str> {
        match self {
            Self::Address(a) => Some(a.as_str()),
            _ => None,
        }
    }
}

impl fmt::Display for DecodedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uint(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Bool(v) => write!(f, "{v}"),
            Self::Address(a) => write!(f, "{a}"),
            Self::Word(w) => write!(f, "{w}"),
            Self::Bytes(b) => write!(f, "0x{}", hex::encode(b)),
            Self::Str(s) => write!(f, "{s}"),
            Self::Array(v) | Self::Tuple(v) => {
                let parts: Vec<_> = v.iter().map(|x| x.to_string()).collect();
                write!(f, "[{}]", parts.join(", "))
            }
        }
    }
}

/// One log decoded against a protocol's known signatures.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DecodedEvent {
    /// Matched event or function name; `None` when nothing matched
    pub name: Option<String>,
    /// Arguments in declaration order
    pub args: Vec<(String, DecodedValue)>,
}

impl DecodedEvent {
    /// The "no match" sentinel.
    pub fn unmatched() -> Self {
        Self::default()
    }

    pub fn is_match(&self) -> bool {
        self.name.is_some()
    }

    /// Look up an argument by name.
    pub fn arg(&self, name: &str) -> Option<&DecodedValue> {
        self.args.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }
}
