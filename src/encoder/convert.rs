use crate::SELF_LOG_TARGET;
use crate::domain::{PropertyValue, Scalar};
use serde_json::{Map, Number, Value};
use tracing::debug;

/// Converts a property tree into a plain JSON value.
pub fn to_json(value: &PropertyValue) -> Value {
    match value {
        PropertyValue::Scalar(scalar) => scalar_to_json(scalar),
        PropertyValue::Sequence(items) => Value::Array(items.iter().map(to_json).collect()),
        PropertyValue::Mapping(entries) => {
            let mut object = Map::with_capacity(entries.len());
            for (key, value) in entries {
                object.insert(key.key_string(), to_json(value));
            }
            Value::Object(object)
        }
        PropertyValue::Structure(fields) => {
            let mut object = Map::with_capacity(fields.len());
            for (name, value) in fields {
                object.insert(name.clone(), to_json(value));
            }
            Value::Object(object)
        }
    }
}

pub fn scalar_to_json(scalar: &Scalar) -> Value {
    match scalar {
        Scalar::Null => Value::Null,
        Scalar::Bool(b) => Value::Bool(*b),
        Scalar::I64(n) => Value::from(*n),
        Scalar::U64(n) => Value::from(*n),
        Scalar::I128(n) => {
            if let Ok(small) = i64::try_from(*n) {
                Value::from(small)
            } else if let Ok(unsigned) = u64::try_from(*n) {
                Value::from(unsigned)
            } else {
                degrade(scalar, "integer out of 64-bit range")
            }
        }
        Scalar::F64(n) => match Number::from_f64(*n) {
            Some(number) => Value::Number(number),
            None => degrade(scalar, "non-finite float"),
        },
        Scalar::String(s) | Scalar::Label(s) => Value::String(s.clone()),
    }
}

// JSON has no representation for the value; fall back to its text.
fn degrade(scalar: &Scalar, reason: &str) -> Value {
    debug!(target: SELF_LOG_TARGET, value = %scalar, reason, "Encoding property value as text");
    Value::String(scalar.to_string())
}
