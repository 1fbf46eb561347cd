//! DSNote "LogNote" decoding.
//!
//! Pre-standard Maker contracts log every noted call as
//!
//! ```text
//! topics: [selector ‖ 0…, guy, foo, bar]
//! data:   wad (32) ‖ fax offset (32) ‖ fax length (32) ‖ fax = selector (4) ‖ args (32 each) ‖ padding
//! ```
//!
//! so the arguments are recovered positionally from `fax`. The decoded event
//! has `guy` (the caller) first, then one value per declared argument.

use alloy_core::dyn_abi::DynSolType;
use alloy_primitives::{Address, B256, I256, U256};
use chainledger_core::{
    account::qualify,
    event::{DecodedEvent, DecodedValue},
    raw::RawLog,
};

use crate::decoder::AbiSignature;

const WORD: usize = 32;
/// `wad`, fax offset, fax length
const HEADER: usize = 3 * WORD;
const SELECTOR: usize = 4;

/// Decode a LogNote log whose `topics[0]` already matched `sig.selector`.
pub(crate) fn decode_note(sig: &AbiSignature, chain: &str, log: &RawLog) -> Option<DecodedEvent> {
    let guy = log.topics.get(1)?;
    let body = log.data.get(HEADER + SELECTOR..)?;

    let words: Vec<&[u8]> = body.chunks_exact(WORD).take(sig.params.len()).collect();
    if words.len() < sig.params.len() {
        return None;
    }

    let mut args = Vec::with_capacity(sig.params.len() + 1);
    args.push(("guy".to_string(), DecodedValue::Address(qualify(chain, &word_address(guy.as_slice())))));
    for (param, word) in sig.params.iter().zip(words) {
        args.push((param.name.clone(), decode_word(word, &param.ty, chain)));
    }
    Some(DecodedEvent {
        name: Some(sig.name.clone()),
        args,
    })
}

fn decode_word(word: &[u8], ty: &DynSolType, chain: &str) -> DecodedValue {
    let b = B256::from_slice(word);
    match ty {
        DynSolType::Address => DecodedValue::Address(qualify(chain, &word_address(word))),
        DynSolType::Uint(_) => DecodedValue::Uint(U256::from_be_bytes(b.0)),
        DynSolType::Int(_) => DecodedValue::Int(I256::from_be_bytes(b.0)),
        DynSolType::Bool => DecodedValue::Bool(b.0[WORD - 1] != 0),
        _ if looks_like_address(word) => DecodedValue::Address(qualify(chain, &word_address(word))),
        _ => DecodedValue::Word(b),
    }
}

fn word_address(word: &[u8]) -> Address {
    Address::from_slice(&word[WORD - 20..])
}

/// Twelve zero bytes followed by a body whose high-order bytes are set,
/// i.e. a right-aligned value of at least 2^128. Small integers (CDP ids,
/// amounts) fail the second test.
///
/// Only applies to untyped words: an address whose first four bytes are
/// zero (a vanity `0x00000000…` address) stays a `Word` here. Declare the
/// argument as `address` to have it unwrapped regardless.
pub fn looks_like_address(word: &[u8]) -> bool {
    word.len() == WORD
        && word[..12].iter().all(|b| *b == 0)
        && word[12..16].iter().any(|b| *b != 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::{LogDecoder, SignatureKind};
    use crate::fingerprint;
    use alloy_primitives::Bytes;

    const TUB: &str = "0x448a5065aebb8e423f0896e6c5d525c040f59af3";
    const ME: &str = "0x1111111111111111111111111111111111111111";

    /// Build a LogNote log the way DSNote emits it.
    fn note_log(canonical: &str, args: &[B256]) -> RawLog {
        let selector = fingerprint::function_selector(canonical);
        let mut topic0 = [0u8; 32];
        topic0[..4].copy_from_slice(&selector);
        let me: Address = ME.parse().unwrap();

        let mut fax = selector.to_vec();
        for a in args {
            fax.extend_from_slice(a.as_slice());
        }
        let fax_len = fax.len();
        fax.resize(fax_len.div_ceil(WORD) * WORD, 0);

        let mut data = vec![0u8; WORD];
        data.extend_from_slice(&U256::from(64u64).to_be_bytes::<32>());
        data.extend_from_slice(&U256::from(fax_len).to_be_bytes::<32>());
        data.extend_from_slice(&fax);

        RawLog {
            address: TUB.parse().unwrap(),
            log_index: 0,
            topics: vec![
                B256::from(topic0),
                B256::left_padding_from(me.as_slice()),
                args.first().copied().unwrap_or_default(),
                args.get(1).copied().unwrap_or_default(),
            ],
            data: Bytes::from(data),
        }
    }

    fn decoder() -> LogDecoder {
        LogDecoder::new([
            (SignatureKind::Note, "lock(bytes32 cup, uint256 wad)"),
            (SignatureKind::Note, "give(bytes32 cup, bytes32 lad)"),
            (SignatureKind::Note, "shut(bytes32 cup)"),
        ])
        .unwrap()
    }

    #[test]
    fn decodes_positional_words() {
        let cup = B256::from(U256::from(42u64));
        let wad = U256::from(5_000_000_000_000_000_000u128);
        let log = note_log("lock(bytes32,uint256)", &[cup, B256::from(wad)]);

        let ev = decoder().decode("Ethereum", &log);
        assert_eq!(ev.name.as_deref(), Some("lock"));
        assert_eq!(ev.args.len(), 3);
        assert_eq!(
            ev.args[0],
            ("guy".into(), DecodedValue::Address(format!("Ethereum/{}", ME)))
        );
        assert_eq!(ev.arg("cup"), Some(&DecodedValue::Word(cup)));
        assert_eq!(ev.arg("wad"), Some(&DecodedValue::Uint(wad)));
    }

    #[test]
    fn unwraps_address_shaped_words() {
        let cup = B256::from(U256::from(7u64));
        let lad: Address = "0xc02aaa39b223fe8d0a0e5c4f27ead9083c756cc2".parse().unwrap();
        let log = note_log("give(bytes32,bytes32)", &[cup, B256::left_padding_from(lad.as_slice())]);

        let ev = decoder().decode("Ethereum", &log);
        assert_eq!(ev.name.as_deref(), Some("give"));
        assert_eq!(
            ev.arg("lad"),
            Some(&DecodedValue::Address(
                "Ethereum/0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2".into()
            ))
        );
        assert_eq!(ev.arg("cup"), Some(&DecodedValue::Word(cup)));
    }

    #[test]
    fn drops_padding_words() {
        let cup = B256::from(U256::from(3u64));
        let ev = decoder().decode("Ethereum", &note_log("shut(bytes32)", &[cup]));
        assert_eq!(ev.name.as_deref(), Some("shut"));
        assert_eq!(ev.args.len(), 2);
    }

    #[test]
    fn too_few_words_is_sentinel() {
        let cup = B256::from(U256::from(3u64));
        let mut log = note_log("lock(bytes32,uint256)", &[cup]);
        // fax holds one argument word plus padding: not enough for lock
        let len = HEADER + SELECTOR + WORD;
        log.data = Bytes::from(log.data[..len].to_vec());
        assert!(!decoder().decode("Ethereum", &log).is_match());
    }

    #[test]
    fn address_shape_heuristic() {
        assert!(!looks_like_address(B256::from(U256::from(42u64)).as_slice()));
        assert!(!looks_like_address(B256::repeat_byte(0xff).as_slice()));
        let a: Address = ME.parse().unwrap();
        assert!(looks_like_address(B256::left_padding_from(a.as_slice()).as_slice()));
    }

    #[test]
    fn leading_zero_address_is_left_as_word() {
        let vanity: Address = "0x00000000219ab540356cBB839Cbe05303d7705Fa".parse().unwrap();
        let word = B256::left_padding_from(vanity.as_slice());
        assert!(!looks_like_address(word.as_slice()));
        assert_eq!(
            decode_word(word.as_slice(), &DynSolType::FixedBytes(32), "Ethereum"),
            DecodedValue::Word(word)
        );
        assert_eq!(
            decode_word(word.as_slice(), &DynSolType::Address, "Ethereum"),
            DecodedValue::Address(qualify("Ethereum", &vanity))
        );
    }
}
