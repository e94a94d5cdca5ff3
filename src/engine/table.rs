//! Denomination table for the five bill types.

use crate::config::{validate_bill_types, ConfigError};
use crate::protocol::Recognition;
use serde::{Deserialize, Serialize};
use stillwater::validation::Validation;

/// Number of bill types the peripheral distinguishes.
pub const BILL_TYPE_COUNT: usize = 5;

/// Maps `BillType1..BillType5` to monetary denominations.
///
/// ```rust
/// use ict104::engine::BillTypeTable;
///
/// let table = BillTypeTable::try_from_slice(&[100, 500, 1000, 5000, 10000]).unwrap();
/// assert_eq!(table.amount_for(0x42), Some(1000));
/// assert_eq!(table.amount_for(0x81), None);
///
/// assert!(BillTypeTable::try_from_slice(&[100, 500]).is_err());
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct BillTypeTable([i64; BILL_TYPE_COUNT]);

impl BillTypeTable {
    pub fn new(values: [i64; BILL_TYPE_COUNT]) -> Self {
        Self(values)
    }

    /// Build a table from exactly five non-negative denominations.
    pub fn try_from_slice(values: &[i64]) -> Result<Self, ConfigError> {
        match validate_bill_types(values) {
            Validation::Success(_) => {
                let mut table = [0; BILL_TYPE_COUNT];
                table.copy_from_slice(values);
                Ok(Self(table))
            }
            Validation::Failure(violations) => Err(ConfigError::Invalid(
                violations.iter().cloned().collect(),
            )),
        }
    }

    /// Denomination at table index `index`.
    pub fn get(&self, index: usize) -> Option<i64> {
        self.0.get(index).copied()
    }

    /// Denomination for a bill type byte.
    pub fn amount_for(&self, bill_type: u8) -> Option<i64> {
        Recognition::bill_index(bill_type).and_then(|index| self.get(index))
    }

    pub fn values(&self) -> &[i64; BILL_TYPE_COUNT] {
        &self.0
    }
}
