use super::non_null;
use serde_json::{Map, Value};

/// Borrowed view over a developer-wallet funding descriptor
///
/// The same object shape appears at offset 39 of a positional record and
/// under `devWalletFunding` of an object record.
#[derive(Debug, Clone, Copy)]
pub struct Funding<'a> {
    fields: &'a Map<String, Value>,
}

impl<'a> Funding<'a> {
    /// View a decoded descriptor
    ///
    /// Returns `None` when no funding is known (`null`, or not an object),
    /// which is distinct from a known descriptor without an address.
    pub fn from_value(value: &'a Value) -> Option<Self> {
        value.as_object().map(|fields| Self { fields })
    }

    /// Funded developer wallet
    pub fn wallet_address(&self) -> Option<&'a str> {
        self.str("walletAddress")
    }

    /// Wallet the funds came from; may be `Some("")` on the wire
    pub fn funding_wallet_address(&self) -> Option<&'a str> {
        self.str("fundingWalletAddress")
    }

    pub fn signature(&self) -> Option<&'a str> {
        self.str("signature")
    }

    pub fn amount_sol(&self) -> Option<f64> {
        self.get("amountSol").and_then(Value::as_f64)
    }

    pub fn funded_at(&self) -> Option<&'a str> {
        self.str("fundedAt")
    }

    /// Any other descriptor key
    pub fn get(&self, key: &str) -> Option<&'a Value> {
        self.fields.get(key).and_then(non_null)
    }

    fn str(&self, key: &str) -> Option<&'a str> {
        self.get(key).and_then(Value::as_str)
    }
}
