//! Builders shared by the integration suites.

#![allow(dead_code)]

use alloy_primitives::{Address, Bytes, B256, U256};
use chainledger_core::{
    account::{qualify, AddressBook, AddressCategory, AddressEntry},
    raw::{InternalCall, RawLog, RawTransaction, TxStatus},
};
use chainledger_evm::fingerprint::{event_topic, function_selector};

pub const ME: &str = "0x1111111111111111111111111111111111111111";
pub const THEM: &str = "0x2222222222222222222222222222222222222222";
pub const ZERO: &str = "0x0000000000000000000000000000000000000000";

pub const WETH: &str = "0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2";
pub const DAI: &str = "0x6B175474E89094C44Da98b954EedeAC495271d0F";
pub const USDC: &str = "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48";
pub const CDAI: &str = "0x5d3a536E4D6DbD6114cc1Ead35777bAB948E3643";
pub const AUSDC: &str = "0xBcca60bB61934080951369a648Fb03DF4F96263C";
pub const AAVE_POOL: &str = "0x7d2768dE32b0b80b7a3454c06BdAc94A69DDc7A9";
pub const USDC_WETH_PAIR: &str = "0xB4e16d0168e52d35CaCD2c6185b44281Ec28C9Dc";
pub const DAI_WETH_PAIR: &str = "0xA478c2975Ab1Ea89e8196811F51A7B7Ade33eB11";
pub const ROUTER: &str = "0x7a250d5630B4cF539739dF2C5dAcb4c659F2488D";
pub const TORNADO_1: &str = "0x47CE0C6eD5B0Ce3d3A51fdb1C52DC66a7c3c2936";
pub const SAI_TUB: &str = "0x448a5065aeBB8E423F0896E6c5D525C040f59af3";
pub const SAI: &str = "0x89d24A6b4CcB1B6fAA2625fE562bDD9a23260359";

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
        data: Bytes::from(body.iter().flat_map(|w| w.0).collect::<Vec<u8>>()),
    }
}

/// A DSNote anonymous log for `canonical(args..)` called by `guy`.
pub fn note(contract: &str, index: u32, guy: &str, canonical: &str, args: &[B256]) -> RawLog {
    let selector = function_selector(canonical);
    let mut topic0 = [0u8; 32];
    topic0[..4].copy_from_slice(&selector);

    let mut fax = selector.to_vec();
    args.iter().for_each(|a| fax.extend_from_slice(a.as_slice()));
    let fax_len = fax.len();
    fax.resize(fax_len.div_ceil(32) * 32, 0);

    let mut blob = vec![0u8; 32];
    blob.extend_from_slice(&U256::from(64u64).to_be_bytes::<32>());
    blob.extend_from_slice(&U256::from(fax_len).to_be_bytes::<32>());
    blob.extend_from_slice(&fax);

    RawLog {
        address: address(contract),
        log_index: index,
        topics: vec![
            B256::from(topic0),
            address_word(guy),
            args.first().copied().unwrap_or_default(),
            args.get(1).copied().unwrap_or_default(),
        ],
        data: Bytes::from(blob),
    }
}

/// ERC-20 `Transfer` log.
pub fn token_transfer(token: &str, index: u32, from: &str, to: &str, amount: U256) -> RawLog {
    log(
        token,
        index,
        "Transfer(address,address,uint256)",
        &[address_word(from), address_word(to)],
        &[uint_word(amount)],
    )
}

pub fn tx(from: &str, to: &str, value: U256, logs: Vec<RawLog>) -> RawTransaction {
    RawTransaction {
        hash: B256::repeat_byte(0x5a),
        from: address(from),
        to: Some(address(to)),
        value,
        gas_price: units("20", 9),
        gas_used: U256::from(100_000u64),
        nonce: 7,
        status: TxStatus::Success,
        timestamp: 1_600_000_000,
        logs,
        internal: vec![],
    }
}

pub fn internal(from: &str, to: &str, value: U256) -> InternalCall {
    InternalCall {
        from: address(from),
        to: address(to),
        value,
    }
}

/// `ME` tracked, plus the usual mainnet tokens.
pub fn book() -> AddressBook {
    let token = |addr: &str, symbol: &str, decimals: u8| {
        AddressEntry::new(account(addr), symbol, AddressCategory::Token).with_decimals(decimals)
    };
    AddressBook::new([
        AddressEntry::new(account(ME), "me", AddressCategory::SelfAccount),
        token(WETH, "WETH", 18),
        token(DAI, "DAI", 18),
        token(USDC, "USDC", 6),
        token(CDAI, "cDAI", 8),
        token(AUSDC, "aUSDC", 6),
        token(SAI, "SAI", 18),
    ])
}
