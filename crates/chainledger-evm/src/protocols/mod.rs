//! Protocol parsers, in pipeline order.
//!
//! | # | parser     | depends on     |
//! |---|------------|----------------|
//! | 1 | `erc20`    |                |
//! | 2 | `weth`     | erc20          |
//! | 3 | `maker`    | erc20, weth    |
//! | 4 | `compound` | erc20          |
//! | 5 | `aave`     | erc20          |
//! | 6 | `uniswap`  | erc20, weth    |
//! | 7 | `tornado`  |                |
//!
//! Later parsers look for transfers the earlier ones produced (token
//! transfers from `erc20`) or expect them already claimed (wraps from
//! `weth`), hence the dependencies.

pub mod aave;
pub mod compound;
pub mod erc20;
pub mod maker;
pub mod tornado;
pub mod uniswap;
pub mod weth;

use alloy_primitives::Address;
use chainledger_core::{
    error::ClassifyError,
    matcher::{find_transfer, TransferQuery},
    raw::{RawLog, RawTransaction},
    transaction::{ClassifiedTransaction, Transfer, TransferCategory},
};

use crate::pipeline::ProtocolParser;

pub use aave::AaveParser;
pub use compound::CompoundParser;
pub use erc20::Erc20Parser;
pub use maker::MakerParser;
pub use tornado::TornadoParser;
pub use uniswap::UniswapParser;
pub use weth::WethParser;

/// The built-in parsers in their fixed order.
pub fn standard_parsers() -> Result<Vec<Box<dyn ProtocolParser>>, ClassifyError> {
    Ok(vec![
        Box::new(Erc20Parser::new()?),
        Box::new(WethParser::new()?),
        Box::new(MakerParser::new()?),
        Box::new(CompoundParser::new()?),
        Box::new(AaveParser::new()?),
        Box::new(UniswapParser::new()?),
        Box::new(TornadoParser::new()?),
    ])
}

// ─── Shared helpers ──────────────────────────────────────────────────────────

/// Logs emitted by any of `contracts`, in log order.
pub(crate) fn logs_at<'a>(
    raw: &'a RawTransaction,
    contracts: &'a [Address],
) -> impl Iterator<Item = &'a RawLog> + 'a {
    raw.logs.iter().filter(move |log| contracts.contains(&log.address))
}

/// Position of the first unclaimed transfer matching `query`.
pub(crate) fn locate(tx: &ClassifiedTransaction, query: &TransferQuery) -> Option<usize> {
    find_transfer(&tx.transfers, query).position()
}

/// Give a matched transfer its semantic category.
pub(crate) fn claim(
    tx: &mut ClassifiedTransaction,
    position: usize,
    category: TransferCategory,
) -> &mut Transfer {
    let transfer = &mut tx.transfers[position];
    transfer.category = category;
    transfer
}

/// Record the protocol that recognised something in this transaction.
pub(crate) fn attribute(tx: &mut ClassifiedTransaction, app: &str, source: &str) {
    tx.add_app(app);
    tx.add_source(source);
}

/// The address part of a chain-qualified account id.
pub(crate) fn bare(account: &str) -> &str {
    account.rsplit_once('/').map_or(account, |(_, address)| address)
}
