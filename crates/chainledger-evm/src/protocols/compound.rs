//! Compound v2 money markets.
//!
//! A `Mint` at a cToken pairs two legs on different scales: the underlying
//! paid in (underlying decimals) and the cTokens received (always 8
//! decimals). When the cToken leg is visible the pair is a swap; otherwise
//! the underlying is booked as a deposit into a per-owner position account.

use alloy_primitives::{address, Address, U256};
use chainledger_core::{
    chain::ChainMetadata,
    error::ClassifyError,
    matcher::TransferQuery,
    raw::RawTransaction,
    transaction::{ClassifiedTransaction, TransferCategory},
};
use lazy_static::lazy_static;

use super::{attribute, bare, claim, locate, logs_at};
use crate::abi_events;
use crate::decoder::LogDecoder;
use crate::pipeline::{ParseContext, ProtocolParser};
use crate::registry::{Contract, ContractRegistry};

abi_events! {
    pub enum CTokenEvent {
        event Mint = "Mint(address minter, uint256 mintAmount, uint256 mintTokens)" {
            minter: String, mint_amount: U256, mint_tokens: U256
        },
        event Redeem = "Redeem(address redeemer, uint256 redeemAmount, uint256 redeemTokens)" {
            redeemer: String, redeem_amount: U256, redeem_tokens: U256
        },
        event Borrow = "Borrow(address borrower, uint256 borrowAmount, uint256 accountBorrows, uint256 totalBorrows)" {
            borrower: String, borrow_amount: U256, account_borrows: U256, total_borrows: U256
        },
        event RepayBorrow = "RepayBorrow(address payer, address borrower, uint256 repayAmount, uint256 accountBorrows, uint256 totalBorrows)" {
            payer: String, borrower: String, repay_amount: U256, account_borrows: U256, total_borrows: U256
        },
    }
}

const CTOKEN_DECIMALS: u8 = 8;

pub struct CToken {
    pub chain_id: u64,
    pub address: Address,
    pub symbol: &'static str,
    /// `None` for the native asset
    pub underlying: Option<&'static str>,
    pub underlying_decimals: u8,
}

impl CToken {
    fn underlying_symbol(&self, chain: &ChainMetadata) -> String {
        self.underlying
            .map_or_else(|| chain.fee_asset.clone(), str::to_string)
    }
}

impl Contract for CToken {
    fn chain_id(&self) -> u64 {
        self.chain_id
    }
    fn address(&self) -> Address {
        self.address
    }
}

static CTOKENS: [CToken; 3] = [
    CToken {
        chain_id: 1,
        address: address!("4Ddc2D193948926D02f9B1fE9e1daa0718270ED5"),
        symbol: "cETH",
        underlying: None,
        underlying_decimals: 18,
    },
    CToken {
        chain_id: 1,
        address: address!("5d3a536E4D6DbD6114cc1Ead35777bAB948E3643"),
        symbol: "cDAI",
        underlying: Some("DAI"),
        underlying_decimals: 18,
    },
    CToken {
        chain_id: 1,
        address: address!("39AA39c021dfbaE8faC545936693aC917d5E7563"),
        symbol: "cUSDC",
        underlying: Some("USDC"),
        underlying_decimals: 6,
    },
];

lazy_static! {
    static ref REGISTRY: ContractRegistry<CToken> = ContractRegistry::new(&CTOKENS);
}

const NAME: &str = "compound";

pub struct CompoundParser {
    decoder: LogDecoder,
}

impl CompoundParser {
    pub fn new() -> Result<Self, ClassifyError> {
        Ok(Self {
            decoder: LogDecoder::for_set::<CTokenEvent>()?,
        })
    }
}

impl ProtocolParser for CompoundParser {
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
        let tolerance = ctx.tolerance.default;

        for log in logs_at(raw, &contracts) {
            let Some(ctoken) = REGISTRY.get(ctx.chain.chain_id, &log.address) else {
                continue;
            };
            let Some(event) = self.decoder.decode_as::<CTokenEvent>(&ctx.chain.name, log) else {
                continue;
            };
            let underlying = ctoken.underlying_symbol(ctx.chain);

            match event {
                CTokenEvent::Mint { minter, mint_amount, mint_tokens } => {
                    if !ctx.is_self(&minter) {
                        continue;
                    }
                    attribute(tx, "Compound", NAME);
                    tx.set_method("Deposit");
                    let Some(paid) = ctx.amount(NAME, mint_amount, ctoken.underlying_decimals) else {
                        continue;
                    };
                    let Some(minted) = ctx.amount(NAME, mint_tokens, CTOKEN_DECIMALS) else {
                        continue;
                    };

                    let payment = TransferQuery::asset(&underlying)
                        .quantity(paid)
                        .tolerance(tolerance)
                        .from_account(&minter);
                    let Some(out) = locate(tx, &payment) else {
                        ctx.unmatched(NAME, "Mint", &underlying, paid);
                        continue;
                    };
                    let receipt = TransferQuery::asset(ctoken.symbol)
                        .quantity(minted)
                        .tolerance(tolerance)
                        .to_account(&minter);
                    match locate(tx, &receipt) {
                        Some(inn) => {
                            claim(tx, out, TransferCategory::SwapOut);
                            claim(tx, inn, TransferCategory::SwapIn);
                        }
                        None => {
                            let position = ctx.position("Compound", &format!("{}/{}", ctoken.symbol, bare(&minter)));
                            claim(tx, out, TransferCategory::Deposit).to = position;
                        }
                    }
                }
                CTokenEvent::Redeem { redeemer, redeem_amount, redeem_tokens } => {
                    if !ctx.is_self(&redeemer) {
                        continue;
                    }
                    attribute(tx, "Compound", NAME);
                    tx.set_method("Withdraw");
                    let Some(received) = ctx.amount(NAME, redeem_amount, ctoken.underlying_decimals) else {
                        continue;
                    };
                    let Some(burned) = ctx.amount(NAME, redeem_tokens, CTOKEN_DECIMALS) else {
                        continue;
                    };

                    let proceeds = TransferQuery::asset(&underlying)
                        .quantity(received)
                        .tolerance(tolerance)
                        .to_account(&redeemer);
                    let Some(inn) = locate(tx, &proceeds) else {
                        ctx.unmatched(NAME, "Redeem", &underlying, received);
                        continue;
                    };
                    let receipt = TransferQuery::asset(ctoken.symbol)
                        .quantity(burned)
                        .tolerance(tolerance)
                        .from_account(&redeemer);
                    match locate(tx, &receipt) {
                        Some(out) => {
                            claim(tx, out, TransferCategory::SwapOut);
                            claim(tx, inn, TransferCategory::SwapIn);
                        }
                        None => {
                            let position = ctx.position("Compound", &format!("{}/{}", ctoken.symbol, bare(&redeemer)));
                            claim(tx, inn, TransferCategory::Withdraw).from = position;
                        }
                    }
                }
                CTokenEvent::Borrow { borrower, borrow_amount, .. } => {
                    if !ctx.is_self(&borrower) {
                        continue;
                    }
                    attribute(tx, "Compound", NAME);
                    tx.set_method("Borrow");
                    let Some(q) = ctx.amount(NAME, borrow_amount, ctoken.underlying_decimals) else {
                        continue;
                    };
                    let query = TransferQuery::asset(&underlying)
                        .quantity(q)
                        .tolerance(tolerance)
                        .to_account(&borrower);
                    let debt = ctx.position("Compound", &format!("debt-{underlying}/{}", bare(&borrower)));
                    match locate(tx, &query) {
                        Some(pos) => claim(tx, pos, TransferCategory::Borrow).from = debt,
                        None => ctx.unmatched(NAME, "Borrow", &underlying, q),
                    }
                }
                CTokenEvent::RepayBorrow { payer, borrower, repay_amount, .. } => {
                    if !ctx.is_self(&payer) {
                        continue;
                    }
                    attribute(tx, "Compound", NAME);
                    tx.set_method("Repay");
                    let Some(q) = ctx.amount(NAME, repay_amount, ctoken.underlying_decimals) else {
                        continue;
                    };
                    let query = TransferQuery::asset(&underlying)
                        .quantity(q)
                        .tolerance(tolerance)
                        .from_account(&payer);
                    let debt = ctx.position("Compound", &format!("debt-{underlying}/{}", bare(&borrower)));
                    match locate(tx, &query) {
                        Some(pos) => claim(tx, pos, TransferCategory::Repay).to = debt,
                        None => ctx.unmatched(NAME, "RepayBorrow", &underlying, q),
                    }
                }
            }
        }
        Ok(())
    }
}
