//! Composite identifiers.
//!
//! Multi-part logical keys (catalog id, database, table, partition values)
//! are packed into one opaque string that serves as the resource handle.

mod codec;
mod ids;
mod kinds;

pub use codec::{FIELD_SEPARATOR, VALUE_SEPARATOR, decode, encode, join_values, split_values};
pub use ids::{CompositeId, DatabaseId, PartitionId, PartitionIndexId, TableId};
pub use kinds::IdentifierKind;
