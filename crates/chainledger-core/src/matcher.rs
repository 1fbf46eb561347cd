//! Transfer matcher.
//!
//! Reconciles a decoded protocol event (semantically exact, sometimes off by
//! rounding) with the transfers already present on the transaction (exact
//! quantities, no semantics). A transfer is a candidate only while its
//! category is still one of the simple-rule categories; once a parser moves
//! it elsewhere it is claimed and invisible to later searches.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::amount::within_tolerance;
use crate::transaction::{Transfer, TransferCategory};

/// Relative tolerance for ordinary amount matches.
pub const DEFAULT_TOLERANCE: Decimal = dec!(0.01);
/// Relative tolerance for lossy derivative-token conversions.
pub const WIDE_TOLERANCE: Decimal = dec!(0.1);

/// Prefixes protocols put in front of an underlying symbol for their
/// derivative tokens, longest first.
const DERIVATIVE_PREFIXES: [&str; 7] = ["yv", "am", "a", "c", "i", "y", "W"];

fn strip_derivative(asset: &str) -> &str {
    let mut current = asset;
    loop {
        let stripped = DERIVATIVE_PREFIXES
            .iter()
            .find_map(|p| current.strip_prefix(p).filter(|rest| !rest.is_empty()));
        match stripped {
            Some(rest) => current = rest,
            None => return current,
        }
    }
}

/// Whether two symbols denote the same asset or a derivative and its
/// underlying (WETH ≈ ETH, aDAI ≈ DAI, cUSDC ≈ USDC).
pub fn assets_are_close(a: &str, b: &str) -> bool {
    a == b || strip_derivative(a) == strip_derivative(b)
}

/// Which assets a query accepts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetFilter {
    Exact(String),
    Close(String),
    /// Close to the given symbol but not equal to it; finds the derivative
    /// side of a wrap without re-finding the underlying.
    DerivativeOf(String),
}

impl AssetFilter {
    pub fn accepts(&self, asset: &str) -> bool {
        match self {
            Self::Exact(s) => asset == s,
            Self::Close(s) => assets_are_close(asset, s),
            Self::DerivativeOf(s) => asset != s && assets_are_close(asset, s),
        }
    }
}

/// A parameterised search over a transaction's transfers.
#[derive(Debug, Clone)]
pub struct TransferQuery {
    asset: AssetFilter,
    quantity: Option<Decimal>,
    tolerance: Decimal,
    from: Option<String>,
    to: Option<String>,
    categories: Vec<TransferCategory>,
}

impl TransferQuery {
    fn with_filter(asset: AssetFilter) -> Self {
        Self {
            asset,
            quantity: None,
            tolerance: DEFAULT_TOLERANCE,
            from: None,
            to: None,
            categories: TransferCategory::SIMPLE.to_vec(),
        }
    }

    /// Match this exact symbol.
    pub fn asset(symbol: impl Into<String>) -> Self {
        Self::with_filter(AssetFilter::Exact(symbol.into()))
    }

    /// Match this symbol or any derivative/underlying of it.
    pub fn close_to(symbol: impl Into<String>) -> Self {
        Self::with_filter(AssetFilter::Close(symbol.into()))
    }

    /// Match a derivative of this symbol, excluding the symbol itself.
    pub fn derivative_of(symbol: impl Into<String>) -> Self {
        Self::with_filter(AssetFilter::DerivativeOf(symbol.into()))
    }

    /// Require the quantity to equal `target` within the tolerance.
    pub fn quantity(mut self, target: Decimal) -> Self {
        self.quantity = Some(target);
        self
    }

    pub fn tolerance(mut self, tolerance: Decimal) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn from_account(mut self, account: impl Into<String>) -> Self {
        self.from = Some(account.into());
        self
    }

    pub fn to_account(mut self, account: impl Into<String>) -> Self {
        self.to = Some(account.into());
        self
    }

    /// Replace the set of categories a candidate may currently have.
    pub fn categories(mut self, categories: &[TransferCategory]) -> Self {
        self.categories = categories.to_vec();
        self
    }

    pub fn matches(&self, transfer: &Transfer) -> bool {
        self.categories.contains(&transfer.category)
            && self.asset.accepts(&transfer.asset)
            && self.from.as_deref().map_or(true, |f| transfer.from == f)
            && self.to.as_deref().map_or(true, |t| transfer.to == t)
            && self
                .quantity
                .map_or(true, |q| within_tolerance(transfer.quantity, q, self.tolerance))
    }
}

/// Outcome of a search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchResult {
    /// Position of the matched transfer in the slice
    Found(usize),
    NotFound,
}

impl MatchResult {
    pub fn position(self) -> Option<usize> {
        match self {
            Self::Found(i) => Some(i),
            Self::NotFound => None,
        }
    }

    pub fn is_found(self) -> bool {
        matches!(self, Self::Found(_))
    }
}

/// Find the first matching transfer in index order (ties by position).
pub fn find_transfer(transfers: &[Transfer], query: &TransferQuery) -> MatchResult {
    transfers
        .iter()
        .enumerate()
        .filter(|(_, t)| query.matches(t))
        .min_by(|(ia, a), (ib, b)| a.index.total_cmp(&b.index).then(ia.cmp(ib)))
        .map_or(MatchResult::NotFound, |(i, _)| MatchResult::Found(i))
}
