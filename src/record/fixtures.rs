//! Record builders shared by unit tests

use super::PositionalSchema;
use serde_json::{json, Value};

/// Full-length `update_pulse_v2` element with the given identity fields
pub(crate) fn pulse_item(dev: &str, funder: Option<&str>) -> Value {
    let mut slots = vec![Value::Null; PositionalSchema::PULSE_V2.min_len];
    slots[0] = json!(format!("pair-{}", dev));
    slots[1] = json!(format!("token-{}", dev));
    slots[2] = json!(dev);
    slots[3] = json!("Token");
    slots[19] = json!(42.5);
    slots[28] = json!(120);
    if let Some(funder) = funder {
        slots[39] = json!({
            "walletAddress": dev,
            "fundingWalletAddress": funder,
            "signature": "sig",
            "amountSol": 3.0,
            "fundedAt": "2025-06-01T12:00:00Z"
        });
    }
    Value::Array(slots)
}

/// `/pulse` entry with the given identity fields
pub(crate) fn pulse_entry(dev: &str, funder: Option<&str>) -> Value {
    let mut entry = json!({
        "pairAddress": format!("pair-{}", dev),
        "tokenAddress": format!("token-{}", dev),
        "devAddress": dev,
        "tokenName": "Token",
        "marketCapSol": 42.5,
        "numHolders": 120
    });
    if let Some(funder) = funder {
        entry["devWalletFunding"] = json!({
            "walletAddress": dev,
            "fundingWalletAddress": funder,
            "amountSol": 3.0
        });
    }
    entry
}
