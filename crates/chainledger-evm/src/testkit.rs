//! Builders shared by the parser unit tests.

use alloy_primitives::{Address, Bytes, B256, U256};
use chainledger_core::{
    account::{qualify, AddressBook, AddressCategory, AddressEntry},
    chain::ChainMetadata,
    config::ToleranceConfig,
    diagnostics::Diagnostics,
    raw::{RawLog, RawTransaction, TxStatus},
    transaction::ClassifiedTransaction,
};
use chrono::DateTime;

use crate::fingerprint::event_topic;
use crate::pipeline::{ParseContext, ProtocolParser};

pub const ME: &str = "0x1111111111111111111111111111111111111111";
pub const THEM: &str = "0x2222222222222222222222222222222222222222";

pub fn address(addr: &str) -> Address {
    addr.parse().unwrap()
}

/// `"Ethereum/<checksummed>"`.
pub fn account(addr: &str) -> String {
    qualify("Ethereum", &address(addr))
}

pub fn address_word(addr: &str) -> B256 {
    B256::left_padding_from(address(addr).as_slice())
}

pub fn uint_word(v: U256) -> B256 {
    B256::from(v)
}

/// Concatenate 32-byte words into a data blob.
pub fn data(words: &[B256]) -> Bytes {
    Bytes::from(words.iter().flat_map(|w| w.0).collect::<Vec<u8>>())
}

/// `amount` as a raw integer with `decimals` places, e.g. `("2.5", 18)`.
pub fn units(amount: &str, decimals: u8) -> U256 {
    let (int, frac) = amount.split_once('.').unwrap_or((amount, ""));
    let frac = format!("{frac:0<width$}", width = decimals as usize);
    format!("{int}{frac}").parse().unwrap()
}

pub fn log(contract: &str, index: u32, event: &str, indexed: &[B256], body: &[B256]) -> RawLog {
    let mut topics = vec![event_topic(event)];
    topics.extend_from_slice(indexed);
    RawLog {
        address: address(contract),
        log_index: index,
        topics,
        data: data(body),
    }
}

pub fn raw_tx(from: &str, to: &str, value: U256, logs: Vec<RawLog>) -> RawTransaction {
    RawTransaction {
        hash: B256::repeat_byte(0xaa),
        from: address(from),
        to: Some(address(to)),
        value,
        gas_price: U256::ZERO,
        gas_used: U256::ZERO,
        nonce: 0,
        status: TxStatus::Success,
        timestamp: 0,
        logs,
        internal: vec![],
    }
}

/// Address book with `ME` tracked plus the given tokens `(address, symbol, decimals)`.
pub fn book(tokens: &[(&str, &str, u8)]) -> AddressBook {
    let mut entries = vec![AddressEntry::new(account(ME), "me", AddressCategory::SelfAccount)];
    entries.extend(tokens.iter().map(|(addr, symbol, decimals)| {
        AddressEntry::new(account(addr), *symbol, AddressCategory::Token).with_decimals(*decimals)
    }));
    AddressBook::new(entries)
}

pub fn empty_tx() -> ClassifiedTransaction {
    ClassifiedTransaction::new("0xaa", DateTime::default())
}

/// Run one parser directly, bypassing the pipeline.
pub fn run(
    parser: &dyn ProtocolParser,
    mut tx: ClassifiedTransaction,
    raw: &RawTransaction,
    book: &AddressBook,
) -> (ClassifiedTransaction, Diagnostics) {
    let chain = ChainMetadata::ethereum();
    let tolerance = ToleranceConfig::default();
    let mut diagnostics = Diagnostics::new("0xaa");
    let mut ctx = ParseContext {
        chain: &chain,
        accounts: book,
        tolerance: &tolerance,
        diagnostics: &mut diagnostics,
    };
    if parser.applies_to(raw, &ctx) {
        parser.parse(&mut tx, raw, &mut ctx).unwrap();
    }
    (tx, diagnostics)
}
