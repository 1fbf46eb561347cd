//! Single-collateral Maker (SAI Tub).
//!
//! The Tub predates standard events: apart from `LogNewCup` every action is
//! a DSNote LogNote, so the parser switches on the noted function name. The
//! token legs themselves come from `erc20` (WETH/PETH transfers, DSToken
//! `Mint`/`Burn` of PETH and SAI).

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

use super::{attribute, claim, locate, logs_at};
use crate::abi_events;
use crate::decoder::LogDecoder;
use crate::pipeline::{ParseContext, ProtocolParser};
use crate::registry::{Contract, ContractRegistry};

abi_events! {
    pub enum TubEvent {
        event NewCup = "LogNewCup(address indexed lad, bytes32 cup)" { lad: String, cup: B256 },
        note Open = "open()" { guy: String },
        note Join = "join(uint256 wad)" { guy: String, wad: U256 },
        note Exit = "exit(uint256 wad)" { guy: String, wad: U256 },
        note Lock = "lock(bytes32 cup, uint256 wad)" { guy: String, cup: B256, wad: U256 },
        note Free = "free(bytes32 cup, uint256 wad)" { guy: String, cup: B256, wad: U256 },
        note Draw = "draw(bytes32 cup, uint256 wad)" { guy: String, cup: B256, wad: U256 },
        note Wipe = "wipe(bytes32 cup, uint256 wad)" { guy: String, cup: B256, wad: U256 },
        note Shut = "shut(bytes32 cup)" { guy: String, cup: B256 },
        note Give = "give(bytes32 cup, address lad)" { guy: String, cup: B256, lad: String },
    }
}

pub struct Tub {
    pub chain_id: u64,
    pub address: Address,
    /// Collateral token
    pub gem: &'static str,
    /// Pooled collateral token
    pub skr: &'static str,
    /// Stablecoin
    pub sai: &'static str,
}

impl Contract for Tub {
    fn chain_id(&self) -> u64 {
        self.chain_id
    }
    fn address(&self) -> Address {
        self.address
    }
}

static TUBS: [Tub; 1] = [Tub {
    chain_id: 1,
    address: address!("448a5065aeBB8E423F0896E6c5D525C040f59af3"),
    gem: "WETH",
    skr: "PETH",
    sai: "SAI",
}];

lazy_static! {
    static ref REGISTRY: ContractRegistry<Tub> = ContractRegistry::new(&TUBS);
}

const NAME: &str = "maker";

pub struct MakerParser {
    decoder: LogDecoder,
}

impl MakerParser {
    pub fn new() -> Result<Self, ClassifyError> {
        Ok(Self {
            decoder: LogDecoder::for_set::<TubEvent>()?,
        })
    }
}

fn cup_id(cup: &B256) -> String {
    format!("CDP-{}", U256::from_be_bytes(cup.0))
}

/// Which endpoint of a matched transfer moves to the CDP account.
enum Rebind {
    From,
    To,
}

/// One leg of an action: find `asset ≈ quantity` moving from/to `owner`.
struct Leg<'a> {
    asset: &'a str,
    outgoing: bool,
    category: TransferCategory,
    tolerance: Decimal,
}

impl MakerParser {
    /// Claim one leg; returns whether it was found.
    fn claim_leg(
        tx: &mut ClassifiedTransaction,
        ctx: &mut ParseContext<'_>,
        event: &str,
        owner: &str,
        quantity: Decimal,
        leg: Leg<'_>,
        rebind: Option<(Rebind, &str)>,
    ) -> bool {
        let query = TransferQuery::asset(leg.asset)
            .quantity(quantity)
            .tolerance(leg.tolerance);
        let query = if leg.outgoing {
            query.from_account(owner)
        } else {
            query.to_account(owner)
        };
        let Some(pos) = locate(tx, &query) else {
            ctx.unmatched(NAME, event, leg.asset, quantity);
            return false;
        };
        let transfer = claim(tx, pos, leg.category);
        match rebind {
            Some((Rebind::From, account)) => transfer.from = account.to_string(),
            Some((Rebind::To, account)) => transfer.to = account.to_string(),
            None => {}
        }
        true
    }
}

impl ProtocolParser for MakerParser {
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
        let normal = ctx.tolerance.default;
        let wide = ctx.tolerance.wide;

        for log in logs_at(raw, &contracts) {
            let Some(tub) = REGISTRY.get(ctx.chain.chain_id, &log.address) else {
                continue;
            };
            let Some(event) = self.decoder.decode_as::<TubEvent>(&ctx.chain.name, log) else {
                continue;
            };

            let (owner, method) = match &event {
                TubEvent::NewCup { lad, .. } => (lad, "Open CDP"),
                TubEvent::Open { guy } => (guy, "Open CDP"),
                TubEvent::Join { guy, .. } | TubEvent::Exit { guy, .. } => (guy, "Trade"),
                TubEvent::Lock { guy, .. } => (guy, "Deposit"),
                TubEvent::Free { guy, .. } => (guy, "Withdraw"),
                TubEvent::Draw { guy, .. } => (guy, "Borrow"),
                TubEvent::Wipe { guy, .. } => (guy, "Repay"),
                TubEvent::Shut { guy, .. } => (guy, "Close CDP"),
                TubEvent::Give { guy, .. } => (guy, "Give CDP"),
            };
            if !ctx.is_self(owner) {
                continue;
            }
            let owner = owner.clone();
            attribute(tx, "Maker", NAME);
            tx.set_method(method);

            match event {
                TubEvent::NewCup { .. }
                | TubEvent::Open { .. }
                | TubEvent::Shut { .. }
                | TubEvent::Give { .. } => {}

                TubEvent::Join { wad, .. } => {
                    let Some(q) = ctx.amount(NAME, wad, 18) else { continue };
                    let gem = Leg { asset: tub.gem, outgoing: true, category: TransferCategory::SwapOut, tolerance: wide };
                    let skr = Leg { asset: tub.skr, outgoing: false, category: TransferCategory::SwapIn, tolerance: wide };
                    Self::claim_leg(tx, ctx, "join", &owner, q, gem, None);
                    Self::claim_leg(tx, ctx, "join", &owner, q, skr, None);
                }
                TubEvent::Exit { wad, .. } => {
                    let Some(q) = ctx.amount(NAME, wad, 18) else { continue };
                    let skr = Leg { asset: tub.skr, outgoing: true, category: TransferCategory::SwapOut, tolerance: wide };
                    let gem = Leg { asset: tub.gem, outgoing: false, category: TransferCategory::SwapIn, tolerance: wide };
                    Self::claim_leg(tx, ctx, "exit", &owner, q, skr, None);
                    Self::claim_leg(tx, ctx, "exit", &owner, q, gem, None);
                }
                TubEvent::Lock { cup, wad, .. } => {
                    let Some(q) = ctx.amount(NAME, wad, 18) else { continue };
                    let cdp = ctx.position("Maker", &cup_id(&cup));
                    let leg = Leg { asset: tub.skr, outgoing: true, category: TransferCategory::Deposit, tolerance: normal };
                    Self::claim_leg(tx, ctx, "lock", &owner, q, leg, Some((Rebind::To, &cdp)));
                }
                TubEvent::Free { cup, wad, .. } => {
                    let Some(q) = ctx.amount(NAME, wad, 18) else { continue };
                    let cdp = ctx.position("Maker", &cup_id(&cup));
                    let leg = Leg { asset: tub.skr, outgoing: false, category: TransferCategory::Withdraw, tolerance: normal };
                    Self::claim_leg(tx, ctx, "free", &owner, q, leg, Some((Rebind::From, &cdp)));
                }
                TubEvent::Draw { cup, wad, .. } => {
                    let Some(q) = ctx.amount(NAME, wad, 18) else { continue };
                    let cdp = ctx.position("Maker", &cup_id(&cup));
                    let leg = Leg { asset: tub.sai, outgoing: false, category: TransferCategory::Borrow, tolerance: normal };
                    Self::claim_leg(tx, ctx, "draw", &owner, q, leg, Some((Rebind::From, &cdp)));
                }
                TubEvent::Wipe { cup, wad, .. } => {
                    let Some(q) = ctx.amount(NAME, wad, 18) else { continue };
                    let cdp = ctx.position("Maker", &cup_id(&cup));
                    let leg = Leg { asset: tub.sai, outgoing: true, category: TransferCategory::Repay, tolerance: normal };
                    Self::claim_leg(tx, ctx, "wipe", &owner, q, leg, Some((Rebind::To, &cdp)));
                }
            }
        }
        Ok(())
    }
}
