//! Query result classification.

use serde_json::Value;

use super::error::UnitError;
use super::unit::{Mapping, Query};

/// The accepted forms of a query result.
#[derive(Debug, PartialEq)]
pub enum QueryShape<'a> {
    /// One page named after the unit.
    Single(&'a Mapping),
    /// One page per element, named `1`, `2`, ...
    List(Vec<&'a Mapping>),
    /// One page per element, named by the element's `key` value.
    Keyed(Vec<&'a Mapping>, &'a str),
}

/// Classify `query`, rejecting anything that is not one of the three shapes.
///
/// A key selector next to a single mapping has nothing to select and is
/// ignored.
pub fn classify(query: &Query) -> Result<QueryShape<'_>, UnitError> {
    match &query.data {
        Value::Object(map) => {
            if let Some(key) = &query.key {
                crate::debug!("resolve"; "key `{}` ignored for single-mapping query", key);
            }
            Ok(QueryShape::Single(map))
        }
        Value::Array(items) => {
            let mut maps = Vec::with_capacity(items.len());
            for (i, item) in items.iter().enumerate() {
                match item {
                    Value::Object(map) => maps.push(map),
                    other => {
                        return Err(UnitError::InvalidQueryShape {
                            found: format!(
                                "a list with {} at position {}",
                                describe(other),
                                i + 1
                            ),
                        });
                    }
                }
            }
            Ok(match &query.key {
                Some(key) => QueryShape::Keyed(maps, key),
                None => QueryShape::List(maps),
            })
        }
        other => Err(UnitError::InvalidQueryShape {
            found: describe(other).to_string(),
        }),
    }
}

fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "a mapping",
    }
}
