//! Uniswap V2 style pairs (Uniswap on Ethereum, Quickswap on Polygon).
//!
//! A `Swap` reports raw in/out amounts for the pair's two tokens. The input
//! leg is whatever the tracked sender paid (native ETH counts as WETH), the
//! output leg whatever the tracked recipient got, or the sender when a router
//! received the output and forwarded it. Intermediate hops of a routed trade
//! find neither and are skipped.

use alloy_primitives::{address, Address, U256};
use chainledger_core::{
    chain::ChainMetadata,
    error::ClassifyError,
    matcher::TransferQuery,
    raw::RawTransaction,
    transaction::{ClassifiedTransaction, TransferCategory},
};
use lazy_static::lazy_static;
use rust_decimal::Decimal;
use tracing::debug;

use super::{attribute, claim, locate, logs_at};
use crate::abi_events;
use crate::decoder::LogDecoder;
use crate::pipeline::{ParseContext, ProtocolParser};
use crate::registry::{Contract, ContractRegistry};

abi_events! {
    pub enum PairEvent {
        event Swap = "Swap(address indexed sender, uint256 amount0In, uint256 amount1In, uint256 amount0Out, uint256 amount1Out, address indexed to)" {
            sender: String,
            amount0_in: U256,
            amount1_in: U256,
            amount0_out: U256,
            amount1_out: U256,
            to: String
        },
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dex {
    Uniswap,
    Quickswap,
}

impl Dex {
    fn app(self) -> &'static str {
        match self {
            Self::Uniswap => "Uniswap",
            Self::Quickswap => "Quickswap",
        }
    }

    fn source(self) -> &'static str {
        match self {
            Self::Uniswap => "uniswap-v2",
            Self::Quickswap => "quickswap",
        }
    }
}

/// One side of a pair: symbol and decimals.
pub type PairToken = (&'static str, u8);

pub struct Pair {
    pub chain_id: u64,
    pub address: Address,
    pub dex: Dex,
    pub token0: PairToken,
    pub token1: PairToken,
}

impl Contract for Pair {
    fn chain_id(&self) -> u64 {
        self.chain_id
    }
    fn address(&self) -> Address {
        self.address
    }
}

static PAIRS: [Pair; 4] = [
    Pair {
        chain_id: 1,
        address: address!("B4e16d0168e52d35CaCD2c6185b44281Ec28C9Dc"),
        dex: Dex::Uniswap,
        token0: ("USDC", 6),
        token1: ("WETH", 18),
    },
    Pair {
        chain_id: 1,
        address: address!("A478c2975Ab1Ea89e8196811F51A7B7Ade33eB11"),
        dex: Dex::Uniswap,
        token0: ("DAI", 18),
        token1: ("WETH", 18),
    },
    Pair {
        chain_id: 1,
        address: address!("0d4a11d5EEaaC28EC3F61d100daF4d40471f1852"),
        dex: Dex::Uniswap,
        token0: ("WETH", 18),
        token1: ("USDT", 6),
    },
    Pair {
        chain_id: 137,
        address: address!("6e7a5FAFcec6BB1e78bAE2A1F0B612012BF14827"),
        dex: Dex::Quickswap,
        token0: ("WMATIC", 18),
        token1: ("USDC", 6),
    },
];

lazy_static! {
    static ref REGISTRY: ContractRegistry<Pair> = ContractRegistry::new(&PAIRS);
}

const NAME: &str = "uniswap";

pub struct UniswapParser {
    decoder: LogDecoder,
}

impl UniswapParser {
    pub fn new() -> Result<Self, ClassifyError> {
        Ok(Self {
            decoder: LogDecoder::for_set::<PairEvent>()?,
        })
    }
}

/// The non-zero side of an in/out pair of amounts.
fn side(pair: &Pair, amount0: U256, amount1: U256) -> Option<(PairToken, U256)> {
    if !amount0.is_zero() {
        Some((pair.token0, amount0))
    } else if !amount1.is_zero() {
        Some((pair.token1, amount1))
    } else {
        None
    }
}

impl ProtocolParser for UniswapParser {
    fn name(&self) -> &'static str {
        NAME
    }

    fn contracts(&self, chain: &ChainMetadata) -> Vec<Address> {
        REGISTRY.addresses(chain.chain_id)
    }

    fn depends_on(&self) -> &'static [&'static str] {
        &["erc20", "weth"]
    }

    fn parse(
        &self,
        tx: &mut ClassifiedTransaction,
        raw: &RawTransaction,
        ctx: &mut ParseContext<'_>,
    ) -> Result<(), ClassifyError> {
        let contracts = self.contracts(ctx.chain);
        let tolerance = ctx.tolerance.default;
        let sender = ctx.account(&raw.from);
        let sender_self = ctx.is_self(&sender);

        let mut concerned = false;
        let mut matched = 0usize;
        let mut missed: Vec<(&'static str, Decimal)> = vec![];

        for log in logs_at(raw, &contracts) {
            let Some(pair) = REGISTRY.get(ctx.chain.chain_id, &log.address) else {
                continue;
            };
            let Some(event) = self.decoder.decode_as::<PairEvent>(&ctx.chain.name, log) else {
                continue;
            };
            let PairEvent::Swap { amount0_in, amount1_in, amount0_out, amount1_out, to, .. } = event;

            let recipient_self = ctx.is_self(&to);
            if !sender_self && !recipient_self {
                continue;
            }
            concerned = true;
            attribute(tx, pair.dex.app(), pair.dex.source());
            tx.set_method("Trade");

            if let (true, Some(((symbol, decimals), raw_in))) = (sender_self, side(pair, amount0_in, amount1_in)) {
                let Some(q) = ctx.amount(NAME, raw_in, decimals) else { continue };
                let query = TransferQuery::close_to(symbol)
                    .quantity(q)
                    .tolerance(tolerance)
                    .from_account(&sender);
                match locate(tx, &query) {
                    Some(pos) => {
                        claim(tx, pos, TransferCategory::SwapOut);
                        matched += 1;
                    }
                    None => {
                        debug!(parser = NAME, tx = %tx.hash, symbol, %q, "no input leg for swap hop");
                        missed.push((symbol, q));
                    }
                }
            }

            // A router that unwraps the output pays the tx sender, not the pair's `to`.
            let payee = if recipient_self { &to } else { &sender };
            if let Some(((symbol, decimals), raw_out)) = side(pair, amount0_out, amount1_out) {
                let Some(q) = ctx.amount(NAME, raw_out, decimals) else { continue };
                let query = TransferQuery::close_to(symbol)
                    .quantity(q)
                    .tolerance(tolerance)
                    .to_account(payee);
                match locate(tx, &query) {
                    Some(pos) => {
                        claim(tx, pos, TransferCategory::SwapIn);
                        matched += 1;
                    }
                    None => {
                        debug!(parser = NAME, tx = %tx.hash, symbol, %q, "no output leg for swap hop");
                        missed.push((symbol, q));
                    }
                }
            }
        }

        if concerned && matched == 0 {
            for (symbol, q) in missed {
                ctx.unmatched(NAME, "Swap", symbol, q);
            }
        }
        Ok(())
    }
}
