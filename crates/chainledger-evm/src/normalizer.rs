//! Converts alloy-core `DynSolValue` → ChainLedger `DecodedValue`.
//!
//! Addresses are qualified with the chain name on the way through so every
//! decoded account compares equal to the ids used on transfers.

use alloy_core::dyn_abi::DynSolValue;
use alloy_primitives::B256;
use chainledger_core::{account::qualify, event::DecodedValue};

/// Convert a decoded `DynSolValue` into a `DecodedValue`.
pub fn normalize(val: DynSolValue, chain: &str) -> DecodedValue {
    match val {
        DynSolValue::Bool(b) => DecodedValue::Bool(b),
        DynSolValue::Int(i, _) => DecodedValue::Int(i),
        DynSolValue::Uint(u, _) => DecodedValue::Uint(u),

        DynSolValue::FixedBytes(word, size) => {
            if size == 32 {
                DecodedValue::Word(word)
            } else {
                DecodedValue::Bytes(word[..size].to_vec())
            }
        }

        DynSolValue::Bytes(b) => DecodedValue::Bytes(b),
        DynSolValue::String(s) => DecodedValue::Str(s),
        DynSolValue::Address(a) => DecodedValue::Address(qualify(chain, &a)),

        DynSolValue::Array(vals) | DynSolValue::FixedArray(vals) => {
            DecodedValue::Array(vals.into_iter().map(|v| normalize(v, chain)).collect())
        }

        DynSolValue::Tuple(fields) => {
            DecodedValue::Tuple(fields.into_iter().map(|v| normalize(v, chain)).collect())
        }

        // Function pointers fall back to bytes
        DynSolValue::Function(f) => DecodedValue::Bytes(f.to_vec()),
    }
}

/// A raw topic or word kept as-is.
pub fn word(bytes: &B256) -> DecodedValue {
    DecodedValue::Word(*bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{Address, U256};

    #[test]
    fn normalize_uint() {
        let v = normalize(DynSolValue::Uint(U256::from(42u64), 256), "Ethereum");
        assert_eq!(v, DecodedValue::Uint(U256::from(42u64)));
    }

    #[test]
    fn normalize_address_is_qualified() {
        let addr: Address = "0xc02aaa39b223fe8d0a0e5c4f27ead9083c756cc2".parse().unwrap();
        let v = normalize(DynSolValue::Address(addr), "Ethereum");
        assert_eq!(
            v,
            DecodedValue::Address("Ethereum/0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2".into())
        );
    }

    #[test]
    fn normalize_short_fixed_bytes() {
        let mut word = B256::ZERO;
        word.0[0] = 0xab;
        word.0[1] = 0xcd;
        let v = normalize(DynSolValue::FixedBytes(word, 2), "Ethereum");
        assert_eq!(v, DecodedValue::Bytes(vec![0xab, 0xcd]));
    }
}
