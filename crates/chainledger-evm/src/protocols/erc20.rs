//! Fungible token movements.
//!
//! Turns `Transfer` (and DSToken `Mint`/`Burn`) logs of any contract the
//! classifier knows as a token into transfers at index `1 + logIndex`. Every
//! later parser works on top of these.

use alloy_primitives::{Address, U256};
use chainledger_core::{
    chain::ChainMetadata,
    error::ClassifyError,
    raw::{RawLog, RawTransaction},
    transaction::{ClassifiedTransaction, Transfer, TransferCategory, LOG_INDEX_OFFSET},
};

use crate::abi_events;
use crate::decoder::LogDecoder;
use crate::pipeline::{ParseContext, ProtocolParser};

abi_events! {
    /// ERC-20 and DSToken events.
    pub enum TokenEvent {
        event Transfer = "Transfer(address indexed from, address indexed to, uint256 value)" {
            from: String, to: String, value: U256
        },
        event Approval = "Approval(address indexed owner, address indexed spender, uint256 value)" {
            owner: String, spender: String, value: U256
        },
        event Mint = "Mint(address indexed guy, uint256 wad)" { guy: String, wad: U256 },
        event Burn = "Burn(address indexed guy, uint256 wad)" { guy: String, wad: U256 },
    }
}

const NAME: &str = "erc20";

pub struct Erc20Parser {
    decoder: LogDecoder,
}

impl Erc20Parser {
    pub fn new() -> Result<Self, ClassifyError> {
        Ok(Self {
            decoder: LogDecoder::for_set::<TokenEvent>()?,
        })
    }

    fn is_token_log(log: &RawLog, ctx: &ParseContext<'_>) -> bool {
        ctx.accounts.is_token(&ctx.account(&log.address))
    }
}

impl ProtocolParser for Erc20Parser {
    fn name(&self) -> &'static str {
        NAME
    }

    /// Token contracts come from the classifier, not a registry.
    fn contracts(&self, _chain: &ChainMetadata) -> Vec<Address> {
        vec![]
    }

    fn applies_to(&self, raw: &RawTransaction, ctx: &ParseContext<'_>) -> bool {
        raw.logs.iter().any(|log| Self::is_token_log(log, ctx))
    }

    fn parse(
        &self,
        tx: &mut ClassifiedTransaction,
        raw: &RawTransaction,
        ctx: &mut ParseContext<'_>,
    ) -> Result<(), ClassifyError> {
        let zero = ctx.account(&Address::ZERO);

        let token_logs: Vec<&RawLog> =
            raw.logs.iter().filter(|log| Self::is_token_log(log, ctx)).collect();
        for log in token_logs {
            let Some(event) = self.decoder.decode_as::<TokenEvent>(&ctx.chain.name, log) else {
                continue;
            };
            let (from, to, raw_amount) = match event {
                TokenEvent::Transfer { from, to, value } => (from, to, value),
                TokenEvent::Mint { guy, wad } => (zero.clone(), guy, wad),
                TokenEvent::Burn { guy, wad } => (guy, zero.clone(), wad),
                TokenEvent::Approval { owner, .. } => {
                    if ctx.is_self(&owner) && tx.method == "Unknown" {
                        tx.set_method("Approval");
                    }
                    continue;
                }
            };

            let (from_self, to_self) = (ctx.is_self(&from), ctx.is_self(&to));
            if !from_self && !to_self {
                continue;
            }

            let token = ctx.account(&log.address);
            let decimals = ctx.accounts.decimals(&token);
            let Some(quantity) = ctx.amount(NAME, raw_amount, decimals) else {
                continue;
            };
            tx.transfers.push(Transfer::new(
                ctx.accounts.name(&token),
                TransferCategory::from_endpoints(from_self, to_self),
                from,
                to,
                quantity,
                LOG_INDEX_OFFSET + log.log_index as f64,
            ));
            if tx.method == "Unknown" {
                tx.set_method("Transfer");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fingerprint::event_topic;
    use alloy_primitives::{Bytes, B256};
    use chainledger_core::{
        account::{AddressBook, AddressCategory, AddressEntry},
        config::ToleranceConfig,
        diagnostics::Diagnostics,
        raw::TxStatus,
    };
    use chrono::DateTime;
    use rust_decimal_macros::dec;

    const DAI: &str = "0x6B175474E89094C44Da98b954EedeAC495271d0F";
    const ME: &str = "0x1111111111111111111111111111111111111111";
    const THEM: &str = "0x2222222222222222222222222222222222222222";

    fn topic(addr: &str) -> B256 {
        B256::left_padding_from(addr.parse::<Address>().unwrap().as_slice())
    }

    fn log(index: u32, topics: Vec<B256>, amount: u128) -> RawLog {
        RawLog {
            address: DAI.parse().unwrap(),
            log_index: index,
            topics,
            data: Bytes::from(U256::from(amount).to_be_bytes::<32>().to_vec()),
        }
    }

    fn raw(logs: Vec<RawLog>) -> RawTransaction {
        RawTransaction {
            hash: B256::ZERO,
            from: ME.parse().unwrap(),
            to: Some(DAI.parse().unwrap()),
            value: U256::ZERO,
            gas_price: U256::ZERO,
            gas_used: U256::ZERO,
            nonce: 0,
            status: TxStatus::Success,
            timestamp: 0,
            logs,
            internal: vec![],
        }
    }

    fn book() -> AddressBook {
        AddressBook::new([
            AddressEntry::new(format!("Ethereum/{ME}"), "me", AddressCategory::SelfAccount),
            AddressEntry::new(format!("Ethereum/{DAI}"), "DAI", AddressCategory::Token).with_decimals(18),
        ])
    }

    fn parse(raw: &RawTransaction) -> ClassifiedTransaction {
        let chain = ChainMetadata::ethereum();
        let book = book();
        let tolerance = ToleranceConfig::default();
        let mut diagnostics = Diagnostics::new("t");
        let mut ctx = ParseContext {
            chain: &chain,
            accounts: &book,
            tolerance: &tolerance,
            diagnostics: &mut diagnostics,
        };
        let parser = Erc20Parser::new().unwrap();
        let mut tx = ClassifiedTransaction::new("t", DateTime::default());
        assert!(parser.applies_to(raw, &ctx));
        parser.parse(&mut tx, raw, &mut ctx).unwrap();
        tx
    }

    #[test]
    fn tracked_transfer_becomes_expense() {
        let transfer = log(
            4,
            vec![
                event_topic("Transfer(address,address,uint256)"),
                topic(ME),
                topic(THEM),
            ],
            25_000_000_000_000_000_000,
        );
        let tx = parse(&raw(vec![transfer]));
        assert_eq!(tx.transfers.len(), 1);
        let t = &tx.transfers[0];
        assert_eq!(t.asset, "DAI");
        assert_eq!(t.category, TransferCategory::Expense);
        assert_eq!(t.quantity, dec!(25));
        assert_eq!(t.index, 5.0);
        assert_eq!(tx.method, "Transfer");
        assert!(tx.sources.is_empty());
    }

    #[test]
    fn untracked_transfer_is_ignored() {
        let transfer = log(
            0,
            vec![
                event_topic("Transfer(address,address,uint256)"),
                topic(THEM),
                topic(THEM),
            ],
            1,
        );
        assert!(parse(&raw(vec![transfer])).transfers.is_empty());
    }

    #[test]
    fn mint_comes_from_zero_address() {
        let mint = log(0, vec![event_topic("Mint(address,uint256)"), topic(ME)], 10u128.pow(18));
        let tx = parse(&raw(vec![mint]));
        assert_eq!(
            tx.transfers[0].from,
            "Ethereum/0x0000000000000000000000000000000000000000"
        );
        assert_eq!(tx.transfers[0].category, TransferCategory::Income);
    }

    #[test]
    fn approval_sets_method_only() {
        let approval = log(
            0,
            vec![
                event_topic("Approval(address,address,uint256)"),
                topic(ME),
                topic(THEM),
            ],
            1,
        );
        let tx = parse(&raw(vec![approval]));
        assert!(tx.transfers.is_empty());
        assert_eq!(tx.method, "Approval");
    }
}
