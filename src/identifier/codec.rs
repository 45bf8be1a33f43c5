//! Positional encoding of multi-part resource keys.
//!
//! Fields are joined with [`FIELD_SEPARATOR`]. A list-valued field (such
//! as partition values) is joined with [`VALUE_SEPARATOR`] and stored as
//! the last positional field. Fields must not contain `:`; that is
//! enforced by the layer that produces them, not here.

use crate::error::IdentifierError;

/// Separator between top-level fields.
pub const FIELD_SEPARATOR: char = ':';

/// Separator between values of a list field.
pub const VALUE_SEPARATOR: char = '#';

/// Joins fields into an identifier.
#[must_use]
pub fn encode<S: AsRef<str>>(fields: &[S]) -> String {
    join(fields, FIELD_SEPARATOR)
}

/// Splits an identifier into exactly `arity` fields.
///
/// Empty fields keep their position: `"a::c"` decodes to `["a", "", "c"]`.
///
/// # Errors
///
/// Returns [`IdentifierError::Malformed`] if the number of fields differs
/// from `arity`.
pub fn decode(id: &str, arity: usize) -> Result<Vec<String>, IdentifierError> {
    let fields: Vec<String> = id.split(FIELD_SEPARATOR).map(String::from).collect();

    if fields.len() != arity {
        return Err(IdentifierError::Malformed {
            id: id.to_string(),
            expected: format!(
                "{arity} '{FIELD_SEPARATOR}'-separated fields, found {}",
                fields.len()
            ),
        });
    }

    Ok(fields)
}

/// Joins list values into a single field.
#[must_use]
pub fn join_values<S: AsRef<str>>(values: &[S]) -> String {
    join(values, VALUE_SEPARATOR)
}

/// Splits a list field into its values. An empty field is an empty list.
#[must_use]
pub fn split_values(field: &str) -> Vec<String> {
    if field.is_empty() {
        return Vec::new();
    }
    field.split(VALUE_SEPARATOR).map(String::from).collect()
}

fn join<S: AsRef<str>>(parts: &[S], separator: char) -> String {
    let mut out = String::new();
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            out.push(separator);
        }
        out.push_str(part.as_ref());
    }
    out
}
