//! `LogDecoder`: decodes raw logs against one protocol's known signatures.
//!
//! Two encodings are understood:
//! - standard ABI events, where `topics[0]` is the event topic, the remaining
//!   topics are the indexed arguments and `data` holds the rest as one tuple;
//! - DSNote "LogNote" pseudo-events, where `topics[0]` starts with a
//!   *function* selector and the call arguments sit in `data` as padded
//!   words (see [`crate::note`]).
//!
//! A log that matches nothing is not an error: `decode` returns the
//! [`DecodedEvent::unmatched`] sentinel and emits a `trace!` line.

use alloy_core::dyn_abi::{DynSolType, DynSolValue};
use alloy_primitives::B256;
use chainledger_core::{
    error::ClassifyError,
    event::{DecodedEvent, DecodedValue},
    raw::RawLog,
};
use tracing::trace;

use crate::{events::EventSet, fingerprint, normalizer, note};

// ─── Signatures ──────────────────────────────────────────────────────────────

/// One declared parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct AbiParam {
    pub name: String,
    pub ty: DynSolType,
    pub indexed: bool,
}

/// How a signature shows up in a log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignatureKind {
    /// Standard event; `topics[0]` is the keccak of the signature
    Event,
    /// DSNote function call; `topics[0]` starts with the selector
    Note,
}

/// A parsed human-readable signature, e.g.
/// `"Deposit(address indexed dst, uint256 wad)"`.
#[derive(Debug, Clone, PartialEq)]
pub struct AbiSignature {
    pub kind: SignatureKind,
    pub name: String,
    pub params: Vec<AbiParam>,
    /// `"Deposit(address,uint256)"`
    pub canonical: String,
    pub topic: B256,
    pub selector: [u8; 4],
}

/// The name part of a signature: everything before `(`.
pub fn signature_name(signature: &str) -> &str {
    signature.split('(').next().unwrap_or(signature).trim()
}

impl AbiSignature {
    pub fn parse(kind: SignatureKind, signature: &str) -> Result<Self, ClassifyError> {
        let bad = |reason: &str| ClassifyError::Config(format!("signature '{signature}': {reason}"));

        let open = signature.find('(').ok_or_else(|| bad("missing '('"))?;
        let close = signature.rfind(')').ok_or_else(|| bad("missing ')'"))?;
        if close < open {
            return Err(bad("unbalanced parentheses"));
        }
        let name = signature[..open].trim();
        if name.is_empty() {
            return Err(bad("empty name"));
        }

        let mut params = Vec::new();
        for (i, raw) in split_params(&signature[open + 1..close]).into_iter().enumerate() {
            let tokens: Vec<&str> = raw.split_whitespace().collect();
            let (ty, rest) = tokens.split_first().ok_or_else(|| bad("empty parameter"))?;
            let indexed = rest.first() == Some(&"indexed");
            let param_name = if indexed { rest.get(1) } else { rest.first() };
            let ty = DynSolType::parse(ty).map_err(|e| bad(&e.to_string()))?;
            params.push(AbiParam {
                name: param_name.map_or_else(|| format!("arg{i}"), |n| n.to_string()),
                ty,
                indexed,
            });
        }

        let types: Vec<String> = params.iter().map(|p| p.ty.sol_type_name().into_owned()).collect();
        let canonical = format!("{name}({})", types.join(","));
        Ok(Self {
            kind,
            name: name.to_string(),
            topic: fingerprint::event_topic(&canonical),
            selector: fingerprint::function_selector(&canonical),
            canonical,
            params,
        })
    }

    fn matches(&self, topic0: &B256) -> bool {
        match self.kind {
            SignatureKind::Event => *topic0 == self.topic,
            SignatureKind::Note => topic0[..4] == self.selector,
        }
    }
}

/// Split a parameter list on top-level commas (tuple types nest).
fn split_params(list: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in list.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                out.push(list[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    let last = list[start..].trim();
    if !last.is_empty() || !out.is_empty() {
        out.push(last);
    }
    out
}

// ─── Decoder ─────────────────────────────────────────────────────────────────

/// Decoder for one protocol's signature set. Built once, shared read-only.
#[derive(Debug, Clone)]
pub struct LogDecoder {
    signatures: Vec<AbiSignature>,
}

impl LogDecoder {
    pub fn new<'a>(
        signatures: impl IntoIterator<Item = (SignatureKind, &'a str)>,
    ) -> Result<Self, ClassifyError> {
        let signatures = signatures
            .into_iter()
            .map(|(kind, sig)| AbiSignature::parse(kind, sig))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { signatures })
    }

    /// A decoder for every signature of a typed event set.
    pub fn for_set<E: EventSet>() -> Result<Self, ClassifyError> {
        Self::new(E::signatures().iter().copied())
    }

    pub fn signatures(&self) -> &[AbiSignature] {
        &self.signatures
    }

    /// Decode one log; never fails.
    pub fn decode(&self, chain: &str, log: &RawLog) -> DecodedEvent {
        let Some(topic0) = log.topic0() else {
            return DecodedEvent::unmatched();
        };
        for sig in self.signatures.iter().filter(|s| s.matches(topic0)) {
            let decoded = match sig.kind {
                SignatureKind::Event => decode_event(sig, chain, log),
                SignatureKind::Note => note::decode_note(sig, chain, log),
            };
            if let Some(event) = decoded {
                return event;
            }
        }
        let mismatch = ClassifyError::DecodeMismatch {
            address: log.address.to_checksum(None),
            log_index: log.log_index,
        };
        trace!("{mismatch}");
        DecodedEvent::unmatched()
    }

    /// Decode and bind to the typed event set in one step.
    pub fn decode_as<E: EventSet>(&self, chain: &str, log: &RawLog) -> Option<E> {
        E::from_decoded(&self.decode(chain, log))
    }
}

/// Standard ABI decoding of one log against one event signature.
fn decode_event(sig: &AbiSignature, chain: &str, log: &RawLog) -> Option<DecodedEvent> {
    let indexed = sig.params.iter().filter(|p| p.indexed).count();
    if log.topics.len() != indexed + 1 {
        return None;
    }

    let mut values: Vec<Option<DecodedValue>> = vec![None; sig.params.len()];

    let mut topics = log.topics.iter().skip(1);
    for (slot, param) in values.iter_mut().zip(&sig.params) {
        if param.indexed {
            let topic = topics.next()?;
            *slot = Some(decode_topic(topic, &param.ty, chain)?);
        }
    }

    let data_types: Vec<DynSolType> = sig
        .params
        .iter()
        .filter(|p| !p.indexed)
        .map(|p| p.ty.clone())
        .collect();
    if !data_types.is_empty() {
        let decoded = DynSolType::Tuple(data_types).abi_decode_params(&log.data).ok()?;
        let fields = match decoded {
            DynSolValue::Tuple(vals) => vals,
            other => vec![other],
        };
        let mut fields = fields.into_iter();
        for (slot, param) in values.iter_mut().zip(&sig.params) {
            if !param.indexed {
                *slot = Some(normalizer::normalize(fields.next()?, chain));
            }
        }
    }

    let args = sig
        .params
        .iter()
        .zip(values)
        .map(|(p, v)| v.map(|v| (p.name.clone(), v)))
        .collect::<Option<Vec<_>>>()?;
    Some(DecodedEvent {
        name: Some(sig.name.clone()),
        args,
    })
}

/// Decode one indexed topic.
///
/// Value types are padded into the 32-byte topic and decode directly.
/// Reference types (string, bytes, arrays, tuples) are stored as the keccak
/// of their encoding, so only the hash is recoverable.
fn decode_topic(topic: &B256, ty: &DynSolType, chain: &str) -> Option<DecodedValue> {
    match ty {
        DynSolType::String
        | DynSolType::Bytes
        | DynSolType::Array(_)
        | DynSolType::FixedArray(..)
        | DynSolType::Tuple(_) => Some(normalizer::word(topic)),
        _ => ty
            .abi_decode(topic.as_slice())
            .ok()
            .map(|v| normalizer::normalize(v, chain)),
    }
}
