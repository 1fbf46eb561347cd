//! Account identifiers and the address-classification capability.
//!
//! Every account in a classified transaction is a string. Real chain accounts
//! use the chain-qualified form `"<ChainName>/<0xChecksummedAddress>"`;
//! synthetic position accounts (a lending vault, a CDP, a mixer pool) use
//! `"<ChainName>/<Protocol>/<position>"` and never look like an address.

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;

use crate::error::ClassifyError;

// ─── Identifiers ──────────────────────────────────────────────────────────────

/// Chain-qualified account id for a raw address.
pub fn qualify(chain: &str, address: &Address) -> String {
    format!("{chain}/{}", address.to_checksum(None))
}

/// Synthetic sub-account id for a protocol position.
pub fn position_account(chain: &str, protocol: &str, position: &str) -> String {
    format!("{chain}/{protocol}/{position}")
}

/// Parse a bare `0x`-prefixed 20-byte hex string, any letter case.
pub fn parse_address(value: &str) -> Result<Address, ClassifyError> {
    let hex = value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .ok_or_else(|| ClassifyError::InvalidAddress { value: value.into() })?;
    if hex.len() != 40 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(ClassifyError::InvalidAddress { value: value.into() });
    }
    Address::from_str(hex).map_err(|_| ClassifyError::InvalidAddress { value: value.into() })
}

/// Split an address-shaped account id into its chain prefix and address.
/// Synthetic accounts and anything else return `None`.
pub fn split_account(account: &str) -> Option<(&str, Address)> {
    let (chain, addr) = account.split_once('/')?;
    if chain.is_empty() || addr.contains('/') {
        return None;
    }
    parse_address(addr).ok().map(|a| (chain, a))
}

pub fn is_address_shaped(account: &str) -> bool {
    split_account(account).is_some()
}

/// Rewrite an address-shaped account id into checksummed form.
/// Anything else is returned unchanged.
pub fn canonicalize_account(account: &str) -> String {
    match split_account(account) {
        Some((chain, addr)) => qualify(chain, &addr),
        None => account.to_string(),
    }
}

/// Short display form, e.g. `0xC02a..6Cc2`.
pub fn abbreviate(address: &Address) -> String {
    let full = address.to_checksum(None);
    format!("{}..{}", &full[..6], &full[full.len() - 4..])
}

// ─── Classifier capability ────────────────────────────────────────────────────

/// Address-book lookups the classifier needs. Keys are chain-qualified
/// account ids. Owned by the caller; the pipeline only reads it.
pub trait AccountClassifier: Send + Sync {
    /// Is this one of the accounts whose activity is being classified?
    fn is_self(&self, account: &str) -> bool;

    /// Is this a fungible token contract?
    fn is_token(&self, account: &str) -> bool;

    /// Display name; the ticker symbol for tokens.
    fn name(&self, account: &str) -> String;

    /// Token decimals; 18 when unknown.
    fn decimals(&self, account: &str) -> u8;
}

/// What an address-book entry describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AddressCategory {
    #[serde(rename = "self")]
    SelfAccount,
    Token,
    Other,
}

/// One address-book entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressEntry {
    /// Chain-qualified account id (any letter case)
    pub address: String,
    pub name: String,
    pub category: AddressCategory,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decimals: Option<u8>,
}

impl AddressEntry {
    pub fn new(address: impl Into<String>, name: impl Into<String>, category: AddressCategory) -> Self {
        Self {
            address: address.into(),
            name: name.into(),
            category,
            decimals: None,
        }
    }

    pub fn with_decimals(mut self, decimals: u8) -> Self {
        self.decimals = Some(decimals);
        self
    }
}

/// Immutable in-memory [`AccountClassifier`].
#[derive(Debug, Clone, Default)]
pub struct AddressBook {
    entries: HashMap<String, AddressEntry>,
}

impl AddressBook {
    pub fn new(entries: impl IntoIterator<Item = AddressEntry>) -> Self {
        let entries = entries
            .into_iter()
            .map(|e| (canonicalize_account(&e.address), e))
            .collect();
        Self { entries }
    }

    /// Load from a JSON array of entries.
    pub fn from_json_str(json: &str) -> Result<Self, ClassifyError> {
        let entries: Vec<AddressEntry> = serde_json::from_str(json)?;
        Ok(Self::new(entries))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn get(&self, account: &str) -> Option<&AddressEntry> {
        self.entries.get(&canonicalize_account(account))
    }
}

impl AccountClassifier for AddressBook {
    fn is_self(&self, account: &str) -> bool {
        self.get(account)
            .is_some_and(|e| e.category == AddressCategory::SelfAccount)
    }

    fn is_token(&self, account: &str) -> bool {
        self.get(account).is_some_and(|e| e.category == AddressCategory::Token)
    }

    fn name(&self, account: &str) -> String {
        match self.get(account) {
            Some(e) => e.name.clone(),
            None => match split_account(account) {
                Some((_, addr)) => abbreviate(&addr),
                None => account.to_string(),
            },
        }
    }

    fn decimals(&self, account: &str) -> u8 {
        self.get(account).and_then(|e| e.decimals).unwrap_or(18)
    }
}
