//! Deep merge for `extends` composition.

use serde_json::Value;

use super::unit::Mapping;

/// Merge `add` into `base`.
///
/// Nested mappings merge recursively, arrays concatenate (base first), and
/// any other conflict is won by `add`.
pub fn merge_mappings(base: &mut Mapping, add: Mapping) {
    for (key, value) in add {
        match (base.get_mut(&key), value) {
            (Some(Value::Object(left)), Value::Object(right)) => merge_mappings(left, right),
            (Some(Value::Array(left)), Value::Array(right)) => left.extend(right),
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}
