//! Wrapped native asset (WETH9 and its clones).
//!
//! A wrap shows up as a native transfer into the wrapper plus a `Deposit`
//! log, with no token `Transfer`; the wrapped leg is therefore spliced in
//! right next to the native one.

use alloy_primitives::{address, Address, U256};
use chainledger_core::{
    chain::ChainMetadata,
    error::ClassifyError,
    matcher::TransferQuery,
    raw::RawTransaction,
    transaction::{ClassifiedTransaction, Transfer, TransferCategory},
};
use lazy_static::lazy_static;

use super::{attribute, claim, locate, logs_at};
use crate::abi_events;
use crate::decoder::LogDecoder;
use crate::pipeline::{ParseContext, ProtocolParser};
use crate::registry::{Contract, ContractRegistry};

abi_events! {
    pub enum WethEvent {
        event Deposit = "Deposit(address indexed dst, uint256 wad)" { dst: String, wad: U256 },
        event Withdrawal = "Withdrawal(address indexed src, uint256 wad)" { src: String, wad: U256 },
    }
}

pub struct Wrapper {
    pub chain_id: u64,
    pub address: Address,
    pub symbol: &'static str,
}

impl Contract for Wrapper {
    fn chain_id(&self) -> u64 {
        self.chain_id
    }
    fn address(&self) -> Address {
        self.address
    }
}

static WRAPPERS: [Wrapper; 2] = [
    Wrapper {
        chain_id: 1,
        address: address!("C02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2"),
        symbol: "WETH",
    },
    Wrapper {
        chain_id: 137,
        address: address!("0d500B1d8E8eF31E21C99d1Db9A6444d3ADf1270"),
        symbol: "WMATIC",
    },
];

lazy_static! {
    static ref REGISTRY: ContractRegistry<Wrapper> = ContractRegistry::new(&WRAPPERS);
}

const NAME: &str = "weth";

pub struct WethParser {
    decoder: LogDecoder,
}

impl WethParser {
    pub fn new() -> Result<Self, ClassifyError> {
        Ok(Self {
            decoder: LogDecoder::for_set::<WethEvent>()?,
        })
    }
}

impl ProtocolParser for WethParser {
    fn name(&self) -> &'static str {
        NAME
    }

    fn contracts(&self, chain: &ChainMetadata) -> Vec<Address> {
        REGISTRY.addresses(chain.chain_id)
    }

    fn depends_on(&self) -> &'static [&'static str] {
        &["erc20"]
    }

    fn parse(
        &self,
        tx: &mut ClassifiedTransaction,
        raw: &RawTransaction,
        ctx: &mut ParseContext<'_>,
    ) -> Result<(), ClassifyError> {
        let contracts = self.contracts(ctx.chain);
        let native = ctx.chain.fee_asset.clone();

        for log in logs_at(raw, &contracts) {
            let Some(wrapper) = REGISTRY.get(ctx.chain.chain_id, &log.address) else {
                continue;
            };
            let Some(event) = self.decoder.decode_as::<WethEvent>(&ctx.chain.name, log) else {
                continue;
            };
            let contract = ctx.account(&log.address);

            match event {
                WethEvent::Deposit { dst, wad } => {
                    if !ctx.is_self(&dst) {
                        continue;
                    }
                    let Some(quantity) = ctx.amount(NAME, wad, 18) else { continue };
                    attribute(tx, "Weth", NAME);
                    tx.set_method("Trade");

                    let query = TransferQuery::asset(&native)
                        .quantity(quantity)
                        .tolerance(ctx.tolerance.default)
                        .from_account(&dst);
                    let Some(pos) = locate(tx, &query) else {
                        ctx.unmatched(NAME, "Deposit", &native, quantity);
                        continue;
                    };
                    let anchor = claim(tx, pos, TransferCategory::SwapOut).index;
                    let index = tx.index_after(anchor);
                    tx.transfers.push(Transfer::new(
                        wrapper.symbol,
                        TransferCategory::SwapIn,
                        contract,
                        dst,
                        quantity,
                        index,
                    ));
                }
                WethEvent::Withdrawal { src, wad } => {
                    if !ctx.is_self(&src) {
                        continue;
                    }
                    let Some(quantity) = ctx.amount(NAME, wad, 18) else { continue };
                    attribute(tx, "Weth", NAME);
                    tx.set_method("Trade");

                    let query = TransferQuery::asset(&native)
                        .quantity(quantity)
                        .tolerance(ctx.tolerance.default)
                        .to_account(&src);
                    let Some(pos) = locate(tx, &query) else {
                        ctx.unmatched(NAME, "Withdrawal", &native, quantity);
                        continue;
                    };
                    let anchor = claim(tx, pos, TransferCategory::SwapIn).index;
                    let index = tx.index_before(anchor);
                    tx.transfers.push(Transfer::new(
                        wrapper.symbol,
                        TransferCategory::SwapOut,
                        src,
                        contract,
                        quantity,
                        index,
                    ));
                }
            }
        }
        Ok(())
    }
}
