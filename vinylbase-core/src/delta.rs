// src/delta.rs
// Delta - partial-update specification (field set / field increment)

use serde_json::Value;

/// One partial-update operation
#[derive(Debug, Clone, PartialEq)]
enum DeltaOp {
    /// Overwrite a field with a value
    Set { field: String, value: Value },
    /// Increment a numeric field
    Inc { field: String, by: Value },
}

/// A partial-update specification
///
/// Ordered list of field-set and field-increment operations, applied in
/// the order they were added.
///
/// # Examples
///
/// ```
/// use vinylbase_core::Delta;
///
/// let delta = Delta::new().set("artist", "Rammstein").inc("year", 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Delta {
    ops: Vec<DeltaOp>,
}

impl Delta {
    pub fn new() -> Self {
        Delta { ops: Vec::new() }
    }

    /// Overwrite `field` with `value`
    pub fn set(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.ops.push(DeltaOp::Set {
            field: field.into(),
            value: value.into(),
        });
        self
    }

    /// Increment `field` by `by`
    ///
    /// Integer arithmetic is preserved when both sides are integers,
    /// otherwise f64 arithmetic is used. Incrementing a missing or
    /// non-numeric field is a no-op.
    pub fn inc(mut self, field: impl Into<String>, by: impl Into<Value>) -> Self {
        self.ops.push(DeltaOp::Inc {
            field: field.into(),
            by: by.into(),
        });
        self
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Apply the delta to a record - returns whether the record changed
    pub fn apply(&self, doc: &mut Value) -> bool {
        let Value::Object(map) = doc else {
            return false;
        };

        let mut was_modified = false;
        for op in &self.ops {
            match op {
                DeltaOp::Set { field, value } => {
                    map.insert(field.clone(), value.clone());
                    was_modified = true;
                }
                DeltaOp::Inc { field, by } => {
                    if let Some(current) = map.get(field) {
                        // Try int first to preserve integer types
                        if let (Some(curr_int), Some(inc_int)) = (current.as_i64(), by.as_i64()) {
                            map.insert(field.clone(), Value::from(curr_int + inc_int));
                            was_modified = true;
                        } else if let (Some(curr_num), Some(inc_num)) =
                            (current.as_f64(), by.as_f64())
                        {
                            map.insert(field.clone(), Value::from(curr_num + inc_num));
                            was_modified = true;
                        }
                    }
                }
            }
        }

        was_modified
    }
}
