//! Record model — typed views over the two wire shapes of a pair
//!
//! The `update_pulse_v2` room streams pairs as positional arrays, while the
//! `/pulse` endpoint returns the same pairs as camelCase objects. Both are
//! exposed through the [`Record`] trait so a single evaluator can judge
//! either one. Views borrow the decoded value and never copy it.

mod funding;
mod object;
mod positional;
mod schema;

#[cfg(test)]
pub(crate) mod fixtures;

pub use funding::Funding;
pub use object::ObjectRecord;
pub use positional::PositionalRecord;
pub use schema::PositionalSchema;

use serde_json::Value;
use std::fmt;

/// Named semantic fields of a pair, independent of physical encoding
///
/// Not every field exists in both encodings; a field with no offset (or no
/// key) in a given encoding always resolves to absent there.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    PairAddress,
    TokenAddress,
    DevAddress,
    TokenName,
    TokenTicker,
    TokenImage,
    TokenDecimals,
    Protocol,
    ProtocolDetails,
    Website,
    Twitter,
    Telegram,
    Discord,
    Top10HoldersPercent,
    DevHoldsPercent,
    SnipersHoldPercent,
    InsidersHoldPercent,
    BundlersHoldPercent,
    VolumeSol,
    MarketCapSol,
    FeesSol,
    LiquiditySol,
    LiquidityToken,
    NumTxns,
    NumBuys,
    NumSells,
    BondingCurvePercent,
    Supply,
    NumHolders,
    NumTradingBotUsers,
    MigratedDate,
    Extra,
    MigratedTokens,
    FirstMintDate,
    TwitterHandleHistory,
    DexPaid,
    DevWalletFunding,
    KolCount,
    DevTokens,
    /// Object encoding only
    DevPairCount,
    /// Object encoding only
    MigrationCount,
    /// Object encoding only
    CreatedAt,
    /// Object encoding only
    OpenTrading,
}

impl Field {
    /// Key of this field in the object encoding
    pub fn key(self) -> Option<&'static str> {
        let key = match self {
            Field::PairAddress => "pairAddress",
            Field::TokenAddress => "tokenAddress",
            Field::DevAddress => "devAddress",
            Field::TokenName => "tokenName",
            Field::TokenTicker => "tokenTicker",
            Field::TokenImage => "tokenImage",
            Field::TokenDecimals => "tokenDecimals",
            Field::Protocol => "protocol",
            Field::ProtocolDetails => "protocolDetails",
            Field::Website => "website",
            Field::Twitter => "twitter",
            Field::Telegram => "telegram",
            Field::Discord => "discord",
            Field::Top10HoldersPercent => "top10HoldersPercent",
            Field::DevHoldsPercent => "devHoldsPercent",
            Field::SnipersHoldPercent => "snipersHoldPercent",
            Field::InsidersHoldPercent => "insidersHoldPercent",
            Field::BundlersHoldPercent => "bundlersHoldPercent",
            Field::VolumeSol => "volumeSol",
            Field::MarketCapSol => "marketCapSol",
            Field::FeesSol => "feesSol",
            Field::LiquiditySol => "liquiditySol",
            Field::LiquidityToken => "liquidityToken",
            Field::NumTxns => "numTxns",
            Field::NumBuys => "numBuys",
            Field::NumSells => "numSells",
            Field::BondingCurvePercent => "bondingCurvePercent",
            Field::Supply => "supply",
            Field::NumHolders => "numHolders",
            Field::NumTradingBotUsers => "numTradingBotUsers",
            Field::Extra => "extra",
            Field::TwitterHandleHistory => "twitterHandleHistory",
            Field::DexPaid => "dexPaid",
            Field::DevWalletFunding => "devWalletFunding",
            Field::KolCount => "kolCount",
            Field::DevPairCount => "devPairCount",
            Field::MigrationCount => "migrationCount",
            Field::CreatedAt => "createdAt",
            Field::OpenTrading => "openTrading",
            Field::MigratedDate
            | Field::MigratedTokens
            | Field::FirstMintDate
            | Field::DevTokens => return None,
        };
        Some(key)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Read-only accessor surface shared by both record encodings
///
/// Implementors only provide [`Record::get`]; every other accessor is a
/// projection over it. `None` always means "absent on the wire", never a
/// substituted default.
pub trait Record {
    /// Raw value of a field, if present and not `null`
    fn get(&self, field: Field) -> Option<&Value>;

    /// String projection of a field
    fn str_field(&self, field: Field) -> Option<&str> {
        self.get(field).and_then(Value::as_str)
    }

    /// Floating point projection of a field
    fn f64_field(&self, field: Field) -> Option<f64> {
        self.get(field).and_then(Value::as_f64)
    }

    /// Unsigned integer projection of a field
    fn u64_field(&self, field: Field) -> Option<u64> {
        self.get(field).and_then(Value::as_u64)
    }

    /// Developer (creator) address
    fn dev_address(&self) -> Option<&str> {
        self.str_field(Field::DevAddress)
    }

    /// Funding descriptor of the developer wallet, if one is known
    fn funding(&self) -> Option<Funding<'_>> {
        self.get(Field::DevWalletFunding).and_then(Funding::from_value)
    }

    /// Address of the wallet that funded the developer wallet
    fn funding_wallet_address(&self) -> Option<&str> {
        self.funding().and_then(|f| f.funding_wallet_address())
    }

    fn market_cap_sol(&self) -> Option<f64> {
        self.f64_field(Field::MarketCapSol)
    }

    fn num_holders(&self) -> Option<u64> {
        self.u64_field(Field::NumHolders)
    }
}

/// Treat JSON `null` as absent
pub(crate) fn non_null(value: &Value) -> Option<&Value> {
    if value.is_null() {
        None
    } else {
        Some(value)
    }
}
