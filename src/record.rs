//! Plain serialized shapes of a filter and of a cascade.
//!
//! Only `data` and `hashFuncCount` are needed to rebuild a filter. The other
//! fields are diagnostics some producers attach and are carried through
//! untouched.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::FilterError;

/// Serialized form of a single [`BitFilter`](crate::BitFilter).
///
/// The two required fields are optional at the serde level so that a record
/// missing them is reported as [`FilterError::MissingFilterData`] or
/// [`FilterError::MissingHashFuncCount`] rather than a generic parse error.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Vec<u8>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash_func_count: Option<u32>,
    /// capacity the filter was sized for
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elements: Option<u64>,
    /// false positive rate the filter was sized for
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fp_rate: Option<f64>,
    /// position in a cascade
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<u32>,
}

impl FilterRecord {
    /// Interpret an arbitrary JSON value as a filter record.
    pub fn from_value(value: Value) -> Result<Self, FilterError> {
        if !value.is_object() {
            return Err(FilterError::UnrecognizedArgument);
        }
        Ok(serde_json::from_value(value)?)
    }

    pub fn from_json(json: &str) -> Result<Self, FilterError> {
        let value: Value = serde_json::from_str(json)?;
        Self::from_value(value)
    }
}

/// Serialized form of a [`FilterCascade`](crate::FilterCascade): levels in evaluation order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CascadeRecord {
    pub filters: Vec<FilterRecord>,
}
