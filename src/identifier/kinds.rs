//! Runtime selection of an identifier layout.

use std::fmt;
use std::str::FromStr;

use crate::error::{ConfigError, IdentifierError};

use super::codec::{FIELD_SEPARATOR, VALUE_SEPARATOR};
use super::ids::{CompositeId, DatabaseId, PartitionId, PartitionIndexId, TableId};

/// Identifier layouts known to the codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentifierKind {
    /// `catalog-id:database-name`
    Database,
    /// `catalog-id:database-name:table-name`
    Table,
    /// `catalog-id:database-name:table-name:value1#value2`
    Partition,
    /// `catalog-id:database-name:table-name:index-name`
    PartitionIndex,
}

impl IdentifierKind {
    /// All layouts.
    pub const ALL: [Self; 4] = [
        Self::Database,
        Self::Table,
        Self::Partition,
        Self::PartitionIndex,
    ];

    /// Layout description.
    #[must_use]
    pub const fn format(self) -> &'static str {
        match self {
            Self::Database => DatabaseId::FORMAT,
            Self::Table => TableId::FORMAT,
            Self::Partition => PartitionId::FORMAT,
            Self::PartitionIndex => PartitionIndexId::FORMAT,
        }
    }

    /// Names of the logical fields, in order.
    #[must_use]
    pub const fn field_names(self) -> &'static [&'static str] {
        match self {
            Self::Database => &["catalog_id", "database"],
            Self::Table => &["catalog_id", "database", "table"],
            Self::Partition => &["catalog_id", "database", "table", "values"],
            Self::PartitionIndex => &["catalog_id", "database", "table", "index"],
        }
    }

    /// Encodes logical fields. For partitions every field after the table
    /// name is a partition value.
    ///
    /// # Errors
    ///
    /// Returns an error if the number of fields does not fit the layout,
    /// or if a field would not decode back to itself: a field containing
    /// `:`, a partition value containing `#`, or a lone empty partition
    /// value.
    pub fn encode(self, fields: &[String]) -> Result<String, IdentifierError> {
        let malformed = || IdentifierError::Malformed {
            id: fields.join(" "),
            expected: self.format().to_string(),
        };

        Self::check_separator(fields, FIELD_SEPARATOR)?;

        match self {
            Self::Partition => {
                let [catalog_id, database, table, values @ ..] = fields else {
                    return Err(malformed());
                };
                Self::check_separator(values, VALUE_SEPARATOR)?;
                if matches!(values, [only] if only.is_empty()) {
                    return Err(IdentifierError::EmptyPartitionValue);
                }
                Ok(PartitionId::new(
                    TableId::new(catalog_id.as_str(), database.as_str(), table.as_str()),
                    values.iter().map(String::as_str),
                )
                .encode())
            }
            Self::Database => {
                Self::check_len(fields, DatabaseId::ARITY).ok_or_else(malformed)?;
                Ok(DatabaseId::from_fields(fields.to_vec()).encode())
            }
            Self::Table => {
                Self::check_len(fields, TableId::ARITY).ok_or_else(malformed)?;
                Ok(TableId::from_fields(fields.to_vec()).encode())
            }
            Self::PartitionIndex => {
                Self::check_len(fields, PartitionIndexId::ARITY).ok_or_else(malformed)?;
                Ok(PartitionIndexId::from_fields(fields.to_vec()).encode())
            }
        }
    }

    /// Decodes an identifier into named logical fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the identifier does not match the layout.
    pub fn decode(self, id: &str) -> Result<Vec<(&'static str, String)>, IdentifierError> {
        let values = match self {
            Self::Database => DatabaseId::decode(id)?.to_fields(),
            Self::Table => TableId::decode(id)?.to_fields(),
            Self::PartitionIndex => PartitionIndexId::decode(id)?.to_fields(),
            Self::Partition => {
                let partition = PartitionId::decode(id)?;
                let mut fields = partition.table.to_fields();
                fields.push(partition.values.join(", "));
                fields
            }
        };

        Ok(self.field_names().iter().copied().zip(values).collect())
    }

    fn check_separator(fields: &[String], separator: char) -> Result<(), IdentifierError> {
        match fields.iter().find(|field| field.contains(separator)) {
            Some(field) => Err(IdentifierError::ReservedSeparator {
                field: field.clone(),
                separator,
            }),
            None => Ok(()),
        }
    }

    fn check_len(fields: &[String], arity: usize) -> Option<()> {
        (fields.len() == arity).then_some(())
    }
}

impl fmt::Display for IdentifierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Database => write!(f, "database"),
            Self::Table => write!(f, "table"),
            Self::Partition => write!(f, "partition"),
            Self::PartitionIndex => write!(f, "partition-index"),
        }
    }
}

impl FromStr for IdentifierKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.to_string() == s.to_lowercase().replace('_', "-"))
            .ok_or_else(|| ConfigError::UnknownKind {
                name: s.to_string(),
            })
    }
}
