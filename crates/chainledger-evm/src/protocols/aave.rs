//! Aave v2 lending pools.
//!
//! Pool events name the reserve (the underlying token) but the receipt is an
//! aToken minted or burned at a different contract. Both legs are paired
//! through the derivative closeness relation (aDAI ≈ DAI, amWETH ≈ WETH).
//! Reserve symbols and decimals come from the account classifier.

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
    pub enum PoolEvent {
        event Deposit = "Deposit(address indexed reserve, address user, address indexed onBehalfOf, uint256 amount, uint16 indexed referral)" {
            reserve: String, user: String, on_behalf_of: String, amount: U256, referral: U256
        },
        event Withdraw = "Withdraw(address indexed reserve, address indexed user, address indexed to, uint256 amount)" {
            reserve: String, user: String, to: String, amount: U256
        },
        event Borrow = "Borrow(address indexed reserve, address user, address indexed onBehalfOf, uint256 amount, uint256 borrowRateMode, uint256 borrowRate, uint16 indexed referral)" {
            reserve: String, user: String, on_behalf_of: String, amount: U256,
            rate_mode: U256, rate: U256, referral: U256
        },
        event Repay = "Repay(address indexed reserve, address indexed user, address indexed repayer, uint256 amount)" {
            reserve: String, user: String, repayer: String, amount: U256
        },
    }
}

pub struct LendingPool {
    pub chain_id: u64,
    pub address: Address,
}

impl Contract for LendingPool {
    fn chain_id(&self) -> u64 {
        self.chain_id
    }
    fn address(&self) -> Address {
        self.address
    }
}

static POOLS: [LendingPool; 2] = [
    LendingPool {
        chain_id: 1,
        address: address!("7d2768dE32b0b80b7a3454c06BdAc94A69DDc7A9"),
    },
    LendingPool {
        chain_id: 137,
        address: address!("8dFf5E27EA6b7AC08EbFdf9eB090F32ee9a30fcf"),
    },
];

lazy_static! {
    static ref REGISTRY: ContractRegistry<LendingPool> = ContractRegistry::new(&POOLS);
}

const NAME: &str = "aave";

pub struct AaveParser {
    decoder: LogDecoder,
}

impl AaveParser {
    pub fn new() -> Result<Self, ClassifyError> {
        Ok(Self {
            decoder: LogDecoder::for_set::<PoolEvent>()?,
        })
    }
}

impl ProtocolParser for AaveParser {
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
        let sender = ctx.account(&raw.from);

        for log in logs_at(raw, &contracts) {
            let Some(event) = self.decoder.decode_as::<PoolEvent>(&ctx.chain.name, log) else {
                continue;
            };

            match event {
                PoolEvent::Deposit { reserve, user, on_behalf_of, amount, .. } => {
                    if !ctx.is_self(&user) && !ctx.is_self(&on_behalf_of) {
                        continue;
                    }
                    attribute(tx, "Aave", NAME);
                    tx.set_method("Deposit");
                    let symbol = ctx.accounts.name(&reserve);
                    let decimals = ctx.accounts.decimals(&reserve);
                    let Some(q) = ctx.amount(NAME, amount, decimals) else {
                        continue;
                    };

                    // The reserve leaves whichever tracked party funded it.
                    let payers = [user.as_str(), on_behalf_of.as_str(), sender.as_str()];
                    let found = payers.into_iter().filter(|payer| ctx.is_self(payer)).find_map(|payer| {
                        let payment = TransferQuery::close_to(&symbol)
                            .quantity(q)
                            .tolerance(tolerance)
                            .from_account(payer);
                        locate(tx, &payment)
                    });
                    let Some(out) = found else {
                        ctx.unmatched(NAME, "Deposit", &symbol, q);
                        continue;
                    };
                    let receipt = TransferQuery::derivative_of(&symbol)
                        .quantity(q)
                        .tolerance(tolerance)
                        .to_account(&on_behalf_of);
                    match locate(tx, &receipt) {
                        Some(inn) => {
                            claim(tx, out, TransferCategory::SwapOut);
                            claim(tx, inn, TransferCategory::SwapIn);
                        }
                        None => {
                            let position = ctx.position("Aave", &format!("a{symbol}/{}", bare(&on_behalf_of)));
                            claim(tx, out, TransferCategory::Deposit).to = position;
                        }
                    }
                }
                PoolEvent::Withdraw { reserve, user, to, amount } => {
                    if !ctx.is_self(&to) && !ctx.is_self(&user) {
                        continue;
                    }
                    attribute(tx, "Aave", NAME);
                    tx.set_method("Withdraw");
                    let symbol = ctx.accounts.name(&reserve);
                    let decimals = ctx.accounts.decimals(&reserve);
                    let Some(q) = ctx.amount(NAME, amount, decimals) else {
                        continue;
                    };

                    let proceeds = TransferQuery::close_to(&symbol)
                        .quantity(q)
                        .tolerance(tolerance)
                        .to_account(&to);
                    let Some(inn) = locate(tx, &proceeds) else {
                        ctx.unmatched(NAME, "Withdraw", &symbol, q);
                        continue;
                    };
                    let receipt = TransferQuery::derivative_of(&symbol)
                        .quantity(q)
                        .tolerance(tolerance)
                        .from_account(&user);
                    match locate(tx, &receipt) {
                        Some(out) => {
                            claim(tx, out, TransferCategory::SwapOut);
                            claim(tx, inn, TransferCategory::SwapIn);
                        }
                        None => {
                            let position = ctx.position("Aave", &format!("a{symbol}/{}", bare(&user)));
                            claim(tx, inn, TransferCategory::Withdraw).from = position;
                        }
                    }
                }
                PoolEvent::Borrow { reserve, user, on_behalf_of, amount, .. } => {
                    if !ctx.is_self(&user) && !ctx.is_self(&on_behalf_of) {
                        continue;
                    }
                    attribute(tx, "Aave", NAME);
                    tx.set_method("Borrow");
                    let symbol = ctx.accounts.name(&reserve);
                    let decimals = ctx.accounts.decimals(&reserve);
                    let Some(q) = ctx.amount(NAME, amount, decimals) else {
                        continue;
                    };
                    let query = TransferQuery::close_to(&symbol)
                        .quantity(q)
                        .tolerance(tolerance)
                        .to_account(&user);
                    let debt = ctx.position("Aave", &format!("debt-{symbol}/{}", bare(&on_behalf_of)));
                    match locate(tx, &query) {
                        Some(pos) => claim(tx, pos, TransferCategory::Borrow).from = debt,
                        None => ctx.unmatched(NAME, "Borrow", &symbol, q),
                    }
                }
                PoolEvent::Repay { reserve, user, repayer, amount } => {
                    if !ctx.is_self(&repayer) && !ctx.is_self(&user) {
                        continue;
                    }
                    attribute(tx, "Aave", NAME);
                    tx.set_method("Repay");
                    let symbol = ctx.accounts.name(&reserve);
                    let decimals = ctx.accounts.decimals(&reserve);
                    let Some(q) = ctx.amount(NAME, amount, decimals) else {
                        continue;
                    };
                    let query = TransferQuery::close_to(&symbol)
                        .quantity(q)
                        .tolerance(tolerance)
                        .from_account(&repayer);
                    let debt = ctx.position("Aave", &format!("debt-{symbol}/{}", bare(&user)));
                    match locate(tx, &query) {
                        Some(pos) => claim(tx, pos, TransferCategory::Repay).to = debt,
                        None => ctx.unmatched(NAME, "Repay", &symbol, q),
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::*;
    use chainledger_core::transaction::Transfer;
    use rust_decimal_macros::dec;

    const POOL: &str = "0x7d2768dE32b0b80b7a3454c06BdAc94A69DDc7A9";
    const DAI: &str = "0x6B175474E89094C44Da98b954EedeAC495271d0F";
    const ADAI: &str = "0x028171bCA77440897B824Ca71D1c56caC55b68A3";
    const ZERO: &str = "0x0000000000000000000000000000000000000000";

    fn deposit(amount: U256) -> RawTransaction {
        raw_tx(
            ME,
            POOL,
            U256::ZERO,
            vec![log(
                POOL,
                5,
                "Deposit(address,address,address,uint256,uint16)",
                &[address_word(DAI), address_word(ME), uint_word(U256::ZERO)],
                &[address_word(ME), uint_word(amount)],
            )],
        )
    }

    fn tokens() -> chainledger_core::account::AddressBook {
        book(&[(DAI, "DAI", 18), (ADAI, "aDAI", 18)])
    }

    #[test]
    fn deposit_pairs_reserve_with_atoken() {
        let mut tx = empty_tx();
        tx.transfers.push(Transfer::new("DAI", TransferCategory::Expense, account(ME), account(ADAI), dec!(250), 3.0));
        tx.transfers.push(Transfer::new("aDAI", TransferCategory::Income, account(ZERO), account(ME), dec!(250), 4.0));

        let (tx, diagnostics) = run(&AaveParser::new().unwrap(), tx, &deposit(units("250", 18)), &tokens());
        assert!(diagnostics.is_empty());
        assert_eq!(tx.transfers[0].category, TransferCategory::SwapOut);
        assert_eq!(tx.transfers[1].category, TransferCategory::SwapIn);
        assert_eq!(tx.apps, vec!["Aave"]);
    }

    #[test]
    fn deposit_without_atoken_uses_position() {
        let mut tx = empty_tx();
        tx.transfers.push(Transfer::new("DAI", TransferCategory::Expense, account(ME), account(ADAI), dec!(250), 3.0));

        let (tx, _) = run(&AaveParser::new().unwrap(), tx, &deposit(units("250", 18)), &tokens());
        assert_eq!(tx.transfers[0].category, TransferCategory::Deposit);
        assert_eq!(tx.transfers[0].to, format!("Ethereum/Aave/aDAI/{ME}"));
    }

    #[test]
    fn deposit_on_behalf_of_tracked_account() {
        const HELPER: &str = "0x4444444444444444444444444444444444444444";
        let raw = raw_tx(
            ME,
            HELPER,
            U256::ZERO,
            vec![log(
                POOL,
                5,
                "Deposit(address,address,address,uint256,uint16)",
                &[address_word(DAI), address_word(ME), uint_word(U256::ZERO)],
                &[address_word(HELPER), uint_word(units("250", 18))],
            )],
        );
        let mut tx = empty_tx();
        tx.transfers.push(Transfer::new("DAI", TransferCategory::Expense, account(ME), account(HELPER), dec!(250), 3.0));
        tx.transfers.push(Transfer::new("aDAI", TransferCategory::Income, account(ZERO), account(ME), dec!(250), 4.0));

        let (tx, diagnostics) = run(&AaveParser::new().unwrap(), tx, &raw, &tokens());
        assert!(diagnostics.is_empty());
        assert_eq!(tx.sources, vec!["aave"]);
        assert_eq!(tx.method, "Deposit");
        assert_eq!(tx.transfers[0].category, TransferCategory::SwapOut);
        assert_eq!(tx.transfers[1].category, TransferCategory::SwapIn);
    }

    fn withdraw(amount: U256) -> RawTransaction {
        raw_tx(
            ME,
            POOL,
            U256::ZERO,
            vec![log(
                POOL,
                5,
                "Withdraw(address,address,address,uint256)",
                &[address_word(DAI), address_word(ME), address_word(ME)],
                &[uint_word(amount)],
            )],
        )
    }

    #[test]
    fn withdraw_pairs_atoken_burn_with_reserve() {
        let mut tx = empty_tx();
        tx.transfers.push(Transfer::new("aDAI", TransferCategory::Expense, account(ME), account(ZERO), dec!(250), 3.0));
        tx.transfers.push(Transfer::new("DAI", TransferCategory::Income, account(ADAI), account(ME), dec!(250), 4.0));

        let (tx, diagnostics) = run(&AaveParser::new().unwrap(), tx, &withdraw(units("250", 18)), &tokens());
        assert!(diagnostics.is_empty());
        assert_eq!(tx.method, "Withdraw");
        assert_eq!(tx.transfers[0].category, TransferCategory::SwapOut);
        assert_eq!(tx.transfers[1].category, TransferCategory::SwapIn);
    }

    #[test]
    fn withdraw_without_atoken_uses_position() {
        let mut tx = empty_tx();
        tx.transfers.push(Transfer::new("DAI", TransferCategory::Income, account(ADAI), account(ME), dec!(250), 4.0));

        let (tx, _) = run(&AaveParser::new().unwrap(), tx, &withdraw(units("250", 18)), &tokens());
        assert_eq!(tx.method, "Withdraw");
        assert_eq!(tx.transfers[0].category, TransferCategory::Withdraw);
        assert_eq!(tx.transfers[0].from, format!("Ethereum/Aave/aDAI/{ME}"));
    }

    #[test]
    fn repay_rebinds_to_debt_account() {
        let raw = raw_tx(
            ME,
            POOL,
            U256::ZERO,
            vec![log(
                POOL,
                7,
                "Repay(address,address,address,uint256)",
                &[address_word(DAI), address_word(ME), address_word(ME)],
                &[uint_word(units("40", 18))],
            )],
        );
        let mut tx = empty_tx();
        tx.transfers.push(Transfer::new("DAI", TransferCategory::Expense, account(ME), account(ADAI), dec!(40), 6.0));

        let (tx, diagnostics) = run(&AaveParser::new().unwrap(), tx, &raw, &tokens());
        assert!(diagnostics.is_empty());
        assert_eq!(tx.method, "Repay");
        assert_eq!(tx.transfers[0].category, TransferCategory::Repay);
        assert_eq!(tx.transfers[0].to, format!("Ethereum/Aave/debt-DAI/{ME}"));
    }

    #[test]
    fn unmatched_borrow_degrades() {
        let raw = raw_tx(
            ME,
            POOL,
            U256::ZERO,
            vec![log(
                POOL,
                2,
                "Borrow(address,address,address,uint256,uint256,uint256,uint16)",
                &[address_word(DAI), address_word(ME), uint_word(U256::ZERO)],
                &[address_word(ME), uint_word(units("100", 18)), uint_word(U256::from(2u64)), uint_word(U256::ZERO)],
            )],
        );
        let (tx, diagnostics) = run(&AaveParser::new().unwrap(), empty_tx(), &raw, &tokens());
        assert_eq!(tx.method, "Borrow");
        assert!(tx.transfers.is_empty());
        assert_eq!(diagnostics.entries()[0].error.kind(), "unmatched_transfer");
    }
}
