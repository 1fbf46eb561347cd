//! Event topics and function selectors.
//!
//! The topic of an EVM event is the keccak256 hash of its canonical
//! signature string, e.g.:
//!   keccak256("Transfer(address,address,uint256)")
//!   → 0xddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef
//!
//! A function selector is the first four bytes of the same hash taken over
//! the function's canonical signature. LogNote logs carry a selector (padded)
//! in topics[0] instead of an event topic.

use alloy_primitives::B256;
use tiny_keccak::{Hasher, Keccak};

fn keccak256(input: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak::v256();
    let mut output = [0u8; 32];
    hasher.update(input);
    hasher.finalize(&mut output);
    output
}

/// Topic of an event from its canonical signature `"Name(type1,type2)"`.
pub fn event_topic(canonical: &str) -> B256 {
    B256::from(keccak256(canonical.as_bytes()))
}

/// 4-byte selector of a function from its canonical signature.
pub fn function_selector(canonical: &str) -> [u8; 4] {
    let hash = keccak256(canonical.as_bytes());
    [hash[0], hash[1], hash[2], hash[3]]
}
