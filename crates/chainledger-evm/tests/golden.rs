//! Golden fixture integration tests.
//!
//! Each fixture under `fixtures/transactions/` carries a raw transaction,
//! the address book it is classified against and the expected
//! classification, down to every transfer's endpoints and index.

use chainledger_core::{
    account::{AddressBook, AddressEntry},
    chain::ChainMetadata,
    config::ClassifierConfig,
    raw::RawTransaction,
    transaction::Transfer,
};
use chainledger_evm::Classifier;
use serde::Deserialize;

// ─── Helpers ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Fixture {
    description: String,
    chain: String,
    address_book: Vec<AddressEntry>,
    transaction: RawTransaction,
    expected: Expected,
}

#[derive(Debug, Deserialize)]
struct Expected {
    method: String,
    sources: Vec<String>,
    apps: Vec<String>,
    transfers: Vec<Transfer>,
    /// Diagnostic kinds, in order
    #[serde(default)]
    diagnostics: Vec<String>,
}

/// The fixtures live two levels above the crate root.
fn fixture_path(name: &str) -> std::path::PathBuf {
    let mut p = std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    p.push("../../fixtures/transactions");
    p.push(name);
    p
}

fn load_fixture(name: &str) -> Fixture {
    let content = std::fs::read_to_string(fixture_path(name)).expect("fixture not found");
    serde_json::from_str(&content).expect("invalid fixture JSON")
}

fn chain_from_slug(slug: &str) -> ChainMetadata {
    match slug {
        "ethereum" => ChainMetadata::ethereum(),
        "polygon" => ChainMetadata::polygon(),
        other => panic!("unknown chain '{other}'"),
    }
}

fn check(name: &str) {
    let f = load_fixture(name);
    let chain = chain_from_slug(&f.chain);
    let book = AddressBook::new(f.address_book);
    let classifier = Classifier::new(ClassifierConfig::default()).unwrap();

    let c = classifier.classify_with_diagnostics(&f.transaction, &chain, &book);
    let t = &c.transaction;
    let ctx = &f.description;

    assert_eq!(t.hash, f.transaction.hash.to_string(), "{ctx}: hash");
    assert_eq!(t.date.timestamp(), f.transaction.timestamp, "{ctx}: date");
    assert_eq!(t.method, f.expected.method, "{ctx}: method");
    assert_eq!(t.sources, f.expected.sources, "{ctx}: sources");
    assert_eq!(t.apps, f.expected.apps, "{ctx}: apps");
    assert_eq!(t.transfers, f.expected.transfers, "{ctx}: transfers");

    let kinds: Vec<&str> = c.diagnostics.iter().map(|d| d.error.kind()).collect();
    assert_eq!(kinds, f.expected.diagnostics, "{ctx}: diagnostics");
}

// ─── Fixtures ─────────────────────────────────────────────────────────────────

#[test]
fn golden_native_transfer() {
    check("native-transfer.json");
}

#[test]
fn golden_failed_transaction() {
    check("failed-transaction.json");
}

#[test]
fn golden_weth_wrap() {
    check("weth-wrap.json");
}

#[test]
fn golden_weth_unwrap() {
    check("weth-unwrap.json");
}

#[test]
fn golden_aave_borrow_unmatched() {
    check("aave-borrow-unmatched.json");
}

#[test]
fn golden_compound_and_aave_deposit() {
    check("compound-and-aave-deposit.json");
}

#[test]
fn golden_uniswap_eth_for_usdc() {
    check("uniswap-eth-for-usdc.json");
}

#[test]
fn classification_serializes_stably() {
    let f = load_fixture("compound-and-aave-deposit.json");
    let chain = chain_from_slug(&f.chain);
    let book = AddressBook::new(f.address_book);
    let classifier = Classifier::new(ClassifierConfig::default()).unwrap();

    let first = serde_json::to_string(&classifier.classify(&f.transaction, &chain, &book)).unwrap();
    let second = serde_json::to_string(&classifier.classify(&f.transaction, &chain, &book)).unwrap();
    assert_eq!(first, second);
}
