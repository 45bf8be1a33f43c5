//! Typed composite identifiers for catalog resources.
//!
//! These strings are the durable handles callers persist, so their
//! layouts must not change.

use std::fmt;
use std::str::FromStr;

use crate::error::IdentifierError;

use super::codec::{decode, encode, join_values, split_values};

/// A resource key with a fixed positional layout.
pub trait CompositeId: Sized {
    /// Human-readable layout, used in error messages.
    const FORMAT: &'static str;

    /// Number of top-level fields.
    const ARITY: usize;

    /// Returns the top-level fields in order.
    fn to_fields(&self) -> Vec<String>;

    /// Builds the key from exactly [`Self::ARITY`] fields.
    fn from_fields(fields: Vec<String>) -> Self;

    /// Encodes the key.
    fn encode(&self) -> String {
        encode(&self.to_fields())
    }

    /// Decodes a key, checking its arity.
    ///
    /// # Errors
    ///
    /// Returns [`IdentifierError::Malformed`] if the arity does not match.
    fn decode(id: &str) -> Result<Self, IdentifierError> {
        let fields = decode(id, Self::ARITY).map_err(|_| IdentifierError::Malformed {
            id: id.to_string(),
            expected: Self::FORMAT.to_string(),
        })?;
        Ok(Self::from_fields(fields))
    }
}

macro_rules! impl_string_conversions {
    ($ty:ty) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.encode())
            }
        }

        impl FromStr for $ty {
            type Err = IdentifierError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::decode(s)
            }
        }
    };
}

/// Identifier of a catalog database.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DatabaseId {
    /// Catalog (account) identifier.
    pub catalog_id: String,
    /// Database name.
    pub database: String,
}

impl DatabaseId {
    /// Creates a database identifier.
    #[must_use]
    pub fn new(catalog_id: impl Into<String>, database: impl Into<String>) -> Self {
        Self {
            catalog_id: catalog_id.into(),
            database: database.into(),
        }
    }
}

impl CompositeId for DatabaseId {
    const FORMAT: &'static str = "catalog-id:database-name";
    const ARITY: usize = 2;

    fn to_fields(&self) -> Vec<String> {
        vec![self.catalog_id.clone(), self.database.clone()]
    }

    fn from_fields(fields: Vec<String>) -> Self {
        let mut fields = fields.into_iter();
        Self {
            catalog_id: fields.next().unwrap_or_default(),
            database: fields.next().unwrap_or_default(),
        }
    }
}

impl_string_conversions!(DatabaseId);

/// Identifier of a catalog table.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableId {
    /// Catalog (account) identifier.
    pub catalog_id: String,
    /// Database name.
    pub database: String,
    /// Table name.
    pub table: String,
}

impl TableId {
    /// Creates a table identifier.
    #[must_use]
    pub fn new(
        catalog_id: impl Into<String>,
        database: impl Into<String>,
        table: impl Into<String>,
    ) -> Self {
        Self {
            catalog_id: catalog_id.into(),
            database: database.into(),
            table: table.into(),
        }
    }
}

impl CompositeId for TableId {
    const FORMAT: &'static str = "catalog-id:database-name:table-name";
    const ARITY: usize = 3;

    fn to_fields(&self) -> Vec<String> {
        vec![
            self.catalog_id.clone(),
            self.database.clone(),
            self.table.clone(),
        ]
    }

    fn from_fields(fields: Vec<String>) -> Self {
        let mut fields = fields.into_iter();
        Self {
            catalog_id: fields.next().unwrap_or_default(),
            database: fields.next().unwrap_or_default(),
            table: fields.next().unwrap_or_default(),
        }
    }
}

impl_string_conversions!(TableId);

/// Identifier of a table partition.
///
/// Values must not contain `#`. A single empty value encodes the same as
/// no values, so `[""]` decodes back as an empty list;
/// [`IdentifierKind::encode`](super::IdentifierKind::encode) rejects it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PartitionId {
    /// Owning table.
    pub table: TableId,
    /// Partition key values, in key order.
    pub values: Vec<String>,
}

impl PartitionId {
    /// Creates a partition identifier.
    #[must_use]
    pub fn new<I>(table: TableId, values: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        Self {
            table,
            values: values.into_iter().map(Into::into).collect(),
        }
    }
}

impl CompositeId for PartitionId {
    const FORMAT: &'static str = "catalog-id:database-name:table-name:value1#value2";
    const ARITY: usize = 4;

    fn to_fields(&self) -> Vec<String> {
        let mut fields = self.table.to_fields();
        fields.push(join_values(&self.values));
        fields
    }

    fn from_fields(mut fields: Vec<String>) -> Self {
        let values = fields.pop().map(|v| split_values(&v)).unwrap_or_default();
        Self {
            table: TableId::from_fields(fields),
            values,
        }
    }
}

impl_string_conversions!(PartitionId);

/// Identifier of a partition index.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PartitionIndexId {
    /// Owning table.
    pub table: TableId,
    /// Index name.
    pub index: String,
}

impl PartitionIndexId {
    /// Creates a partition index identifier.
    #[must_use]
    pub fn new(table: TableId, index: impl Into<String>) -> Self {
        Self {
            table,
            index: index.into(),
        }
    }
}

impl CompositeId for PartitionIndexId {
    const FORMAT: &'static str = "catalog-id:database-name:table-name:index-name";
    const ARITY: usize = 4;

    fn to_fields(&self) -> Vec<String> {
        let mut fields = self.table.to_fields();
        fields.push(self.index.clone());
        fields
    }

    fn from_fields(mut fields: Vec<String>) -> Self {
        let index = fields.pop().unwrap_or_default();
        Self {
            table: TableId::from_fields(fields),
            index,
        }
    }
}

impl_string_conversions!(PartitionIndexId);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_id() {
        let id = TableId::new("111122223333", "my_db", "my_table");
        assert_eq!(id.to_string(), "111122223333:my_db:my_table");

        let parsed: TableId = "111122223333:my_db:my_table".parse().expect("valid id");
        assert_eq!(parsed, id);
    }

    #[test]
    fn test_table_id_rejects_other_kinds() {
        let err = TableId::decode("111122223333:my_db").unwrap_err();
        assert_eq!(
            err,
            IdentifierError::Malformed {
                id: String::from("111122223333:my_db"),
                expected: String::from("catalog-id:database-name:table-name"),
            }
        );

        assert!(TableId::decode("1:db:tbl:idx").is_err());
        assert!(DatabaseId::decode("1:db:tbl").is_err());
    }

    #[test]
    fn test_database_id() {
        let id = DatabaseId::new("123", "analytics");
        assert_eq!(id.encode(), "123:analytics");
        assert_eq!(DatabaseId::decode("123:analytics").expect("valid id"), id);
    }

    #[test]
    fn test_partition_id() {
        let id = PartitionId::new(TableId::new("123", "db", "events"), ["2024", "01"]);
        assert_eq!(id.to_string(), "123:db:events:2024#01");

        let parsed = PartitionId::decode("123:db:events:2024#01").expect("valid id");
        assert_eq!(parsed.table.table, "events");
        assert_eq!(parsed.values, vec!["2024", "01"]);
        assert_eq!(parsed, id);
    }

    #[test]
    fn test_partition_id_lone_empty_value_decodes_as_no_values() {
        let id = PartitionId::new(TableId::new("c", "d", "t"), [""]);
        assert_eq!(id.encode(), "c:d:t:");
        assert!(PartitionId::decode("c:d:t:").expect("valid id").values.is_empty());
    }

    #[test]
    fn test_partition_id_single_value() {
        let parsed: PartitionId = "123:db:events:us-east-1".parse().expect("valid id");
        assert_eq!(parsed.values, vec!["us-east-1"]);
    }

    #[test]
    fn test_partition_values_never_split_fields() {
        // A `#` inside the table slot stays part of the table name.
        let parsed = PartitionId::decode("123:db:ev#ents:a#b").expect("valid id");
        assert_eq!(parsed.table.table, "ev#ents");
        assert_eq!(parsed.values, vec!["a", "b"]);

        assert!(PartitionId::decode("123:db:events").is_err());
    }

    #[test]
    fn test_partition_index_id() {
        let id = PartitionIndexId::new(TableId::new("123", "db", "events"), "by_day");
        assert_eq!(id.to_string(), "123:db:events:by_day");
        assert_eq!(
            PartitionIndexId::decode("123:db:events:by_day").expect("valid id"),
            id
        );
    }
}
