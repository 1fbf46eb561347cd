//! Tornado Cash fixed-denomination ETH pools.
//!
//! Deposits move the native asset into a pool position; withdrawals move the
//! denomination minus the relayer fee back out to the recipient.

use alloy_primitives::{address, Address, B256, U256};
use chainledger_core::{
    chain::ChainMetadata,
    error::ClassifyError,
    matcher::TransferQuery,
    raw::RawTransaction,
    transaction::{ClassifiedTransaction, TransferCategory},
};
use lazy_static::lazy_static;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::{attribute, claim, locate, logs_at};
use crate::abi_events;
use crate::decoder::LogDecoder;
use crate::pipeline::{ParseContext, ProtocolParser};
use crate::registry::{Contract, ContractRegistry};

abi_events! {
    pub enum MixerEvent {
        event Deposit = "Deposit(bytes32 indexed commitment, uint32 leafIndex, uint256 timestamp)" {
            commitment: B256, leaf_index: U256, timestamp: U256
        },
        event Withdrawal = "Withdrawal(address to, bytes32 nullifierHash, address indexed relayer, uint256 fee)" {
            to: String, nullifier_hash: B256, relayer: String, fee: U256
        },
    }
}

pub struct Mixer {
    pub chain_id: u64,
    pub address: Address,
    pub denomination: Decimal,
}

impl Contract for Mixer {
    fn chain_id(&self) -> u64 {
        self.chain_id
    }
    fn address(&self) -> Address {
        self.address
    }
}

static MIXERS: [Mixer; 4] = [
    Mixer {
        chain_id: 1,
        address: address!("12D66f87A04A9E220743712cE6d9bB1B5616B8Fc"),
        denomination: dec!(0.1),
    },
    Mixer {
        chain_id: 1,
        address: address!("47CE0C6eD5B0Ce3d3A51fdb1C52DC66a7c3c2936"),
        denomination: dec!(1),
    },
    Mixer {
        chain_id: 1,
        address: address!("910Cbd523D972eb0a6f4cAe4618aD62622b39DbF"),
        denomination: dec!(10),
    },
    Mixer {
        chain_id: 1,
        address: address!("A160cdAB225685dA1d56aa342Ad8841c3b53f291"),
        denomination: dec!(100),
    },
];

lazy_static! {
    static ref REGISTRY: ContractRegistry<Mixer> = ContractRegistry::new(&MIXERS);
}

const NAME: &str = "tornado";

pub struct TornadoParser {
    decoder: LogDecoder,
}

impl TornadoParser {
    pub fn new() -> Result<Self, ClassifyError> {
        Ok(Self {
            decoder: LogDecoder::for_set::<MixerEvent>()?,
        })
    }
}

impl ProtocolParser for TornadoParser {
    fn name(&self) -> &'static str {
        NAME
    }

    fn contracts(&self, chain: &ChainMetadata) -> Vec<Address> {
        REGISTRY.addresses(chain.chain_id)
    }

    fn parse(
        &self,
        tx: &mut ClassifiedTransaction,
        raw: &RawTransaction,
        ctx: &mut ParseContext<'_>,
    ) -> Result<(), ClassifyError> {
        let contracts = self.contracts(ctx.chain);
        let native = ctx.chain.fee_asset.clone();
        let sender = ctx.account(&raw.from);

        for log in logs_at(raw, &contracts) {
            let Some(mixer) = REGISTRY.get(ctx.chain.chain_id, &log.address) else {
                continue;
            };
            let Some(event) = self.decoder.decode_as::<MixerEvent>(&ctx.chain.name, log) else {
                continue;
            };
            let pool = ctx.position("Tornado", &format!("{native}-{}", mixer.denomination.normalize()));

            match event {
                MixerEvent::Deposit { .. } => {
                    if !ctx.is_self(&sender) {
                        continue;
                    }
                    attribute(tx, "Tornado", NAME);
                    tx.set_method("Deposit");
                    let query = TransferQuery::asset(&native)
                        .quantity(mixer.denomination)
                        .tolerance(ctx.tolerance.default)
                        .from_account(&sender);
                    match locate(tx, &query) {
                        Some(pos) => claim(tx, pos, TransferCategory::Deposit).to = pool,
                        None => ctx.unmatched(NAME, "Deposit", &native, mixer.denomination),
                    }
                }
                MixerEvent::Withdrawal { to, fee, .. } => {
                    if !ctx.is_self(&to) {
                        continue;
                    }
                    attribute(tx, "Tornado", NAME);
                    tx.set_method("Withdraw");
                    let Some(fee) = ctx.amount(NAME, fee, 18) else { continue };
                    let received = mixer.denomination - fee;
                    let query = TransferQuery::asset(&native)
                        .quantity(received)
                        .tolerance(ctx.tolerance.default)
                        .to_account(&to);
                    match locate(tx, &query) {
                        Some(pos) => claim(tx, pos, TransferCategory::Withdraw).from = pool,
                        None => ctx.unmatched(NAME, "Withdrawal", &native, received),
                    }
                }
            }
        }
        Ok(())
    }
}
