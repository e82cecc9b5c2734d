//! Hash records - typed structs stored as flat string field maps.
//!
//! Records are written with `ToString` per field and read back with `FromStr`,
//! which is what a hash structure in the store holds.
//!
//! ## Example
//!
//! ```ignore
//! use restaurant_kv::HashRecord;
//!
//! #[derive(Clone, HashRecord)]
//! #[record(collection = "reviews")]
//! struct Review {
//!     pub id: String,
//!     pub rating: u8,
//! }
//!
//! let fields = review.to_fields();
//! let back = Review::from_fields(&fields.into_iter().collect())?;
//! ```

use std::collections::HashMap;
use std::str::FromStr;

use thiserror::Error;

/// Trait for types stored as a hash of string fields.
pub trait HashRecord: Sized + Clone + Send + Sync {
    /// The collection name for this record type (e.g. "restaurants").
    const COLLECTION: &'static str;

    /// Returns the unique identifier for this record instance.
    fn id(&self) -> &str;

    /// Flatten into `(field, value)` pairs.
    fn to_fields(&self) -> Vec<(String, String)>;

    /// Rebuild from a stored field map.
    fn from_fields(fields: &HashMap<String, String>) -> Result<Self, RecordError>;
}

/// Error raised when a stored hash cannot be mapped back into a record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    #[error("{collection} record is missing field `{field}`")]
    MissingField {
        collection: &'static str,
        field: &'static str,
    },
    #[error("{collection} record has invalid `{field}` value {value:?}")]
    InvalidField {
        collection: &'static str,
        field: &'static str,
        value: String,
    },
}

/// Parse one field out of a stored hash. Used by the `HashRecord` derive.
#[doc(hidden)]
pub fn parse_field<T: FromStr>(
    collection: &'static str,
    fields: &HashMap<String, String>,
    field: &'static str,
) -> Result<T, RecordError> {
    let raw = fields
        .get(field)
        .ok_or(RecordError::MissingField { collection, field })?;

    raw.parse().map_err(|_| RecordError::InvalidField {
        collection,
        field,
        value: raw.clone(),
    })
}
