//! Positional schema — versioned field-to-offset table
//!
//! The `update_pulse_v2` stream carries each pair as a bare JSON array. The
//! meaning of every slot is fixed by the upstream protocol version, so the
//! mapping lives in one table instead of being scattered as raw indices.

use super::Field;
use crate::error::{FilterError, Result};
use std::collections::HashSet;

/// Field-to-offset mapping for one version of the positional protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionalSchema {
    /// Upstream protocol version
    pub version: u32,

    /// Minimum array length a record must have
    ///
    /// Covers the highest documented slot, including slots whose meaning is
    /// unknown and that therefore have no named field.
    pub min_len: usize,

    /// Named fields and their offsets
    pub fields: &'static [(Field, usize)],
}

impl PositionalSchema {
    /// Layout of the `update_pulse_v2` room
    pub const PULSE_V2: PositionalSchema = PositionalSchema {
        version: 2,
        min_len: 43,
        fields: &[
            (Field::PairAddress, 0),
            (Field::TokenAddress, 1),
            (Field::DevAddress, 2),
            (Field::TokenName, 3),
            (Field::TokenTicker, 4),
            (Field::TokenImage, 5),
            (Field::TokenDecimals, 6),
            (Field::Protocol, 7),
            (Field::ProtocolDetails, 8),
            (Field::Website, 9),
            (Field::Twitter, 10),
            (Field::Telegram, 11),
            (Field::Discord, 12),
            (Field::Top10HoldersPercent, 13),
            (Field::DevHoldsPercent, 14),
            (Field::SnipersHoldPercent, 15),
            (Field::InsidersHoldPercent, 16),
            (Field::BundlersHoldPercent, 17),
            (Field::VolumeSol, 18),
            (Field::MarketCapSol, 19),
            (Field::FeesSol, 20),
            (Field::LiquiditySol, 21),
            (Field::LiquidityToken, 22),
            (Field::NumTxns, 23),
            (Field::NumBuys, 24),
            (Field::NumSells, 25),
            (Field::BondingCurvePercent, 26),
            (Field::Supply, 27),
            (Field::NumHolders, 28),
            (Field::NumTradingBotUsers, 29),
            (Field::MigratedDate, 30),
            (Field::Extra, 31),
            // 32: unknown
            (Field::MigratedTokens, 33),
            (Field::FirstMintDate, 34),
            // 35: unknown
            (Field::TwitterHandleHistory, 36),
            // 37: unknown
            (Field::DexPaid, 38),
            (Field::DevWalletFunding, 39),
            (Field::KolCount, 40),
            (Field::DevTokens, 41),
            // 42: unknown
        ],
    };

    /// Offset of a field, if this version encodes it
    pub fn offset(&self, field: Field) -> Option<usize> {
        self.fields
            .iter()
            .find(|(f, _)| *f == field)
            .map(|(_, offset)| *offset)
    }

    /// Check the table is self-consistent
    ///
    /// Every offset must be below `min_len`, and neither fields nor offsets
    /// may repeat.
    pub fn validate(&self) -> Result<()> {
        if self.fields.is_empty() {
            return Err(self.invalid("schema has no fields".to_string()));
        }

        let mut fields = HashSet::new();
        let mut offsets = HashSet::new();
        for (field, offset) in self.fields {
            if *offset >= self.min_len {
                return Err(self.invalid(format!(
                    "offset {} of {} is beyond minimum length {}",
                    offset, field, self.min_len
                )));
            }
            if !fields.insert(*field) {
                return Err(self.invalid(format!("field {} mapped twice", field)));
            }
            if !offsets.insert(*offset) {
                return Err(self.invalid(format!("offset {} mapped twice", offset)));
            }
        }

        Ok(())
    }

    fn invalid(&self, reason: String) -> FilterError {
        FilterError::Schema {
            version: self.version,
            reason,
        }
    }
}

impl Default for PositionalSchema {
    fn default() -> Self {
        Self::PULSE_V2
    }
}
