use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// A primitive property value.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Null,
    Bool(bool),
    I64(i64),
    U64(u64),
    /// Wide integers; encoded as a number only when they fit in 64 bits.
    I128(i128),
    F64(f64),
    String(String),
    /// An enumerated value, carried by its label.
    Label(String),
}

impl Scalar {
    /// String form used when the scalar is a mapping key.
    pub fn key_string(&self) -> String {
        match self {
            Scalar::String(s) | Scalar::Label(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Null => f.write_str("null"),
            Scalar::Bool(b) => write!(f, "{b}"),
            Scalar::I64(n) => write!(f, "{n}"),
            Scalar::U64(n) => write!(f, "{n}"),
            Scalar::I128(n) => write!(f, "{n}"),
            Scalar::F64(n) => write!(f, "{n}"),
            Scalar::String(s) | Scalar::Label(s) => f.write_str(s),
        }
    }
}

/// A property value attached to an event.
///
/// The tree is owned, so it cannot contain cycles; depth is unbounded.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Scalar(Scalar),
    Sequence(Vec<PropertyValue>),
    Mapping(Vec<(Scalar, PropertyValue)>),
    Structure(Vec<(String, PropertyValue)>),
}

impl PropertyValue {
    pub fn null() -> Self {
        PropertyValue::Scalar(Scalar::Null)
    }

    pub fn label(label: impl Into<String>) -> Self {
        PropertyValue::Scalar(Scalar::Label(label.into()))
    }

    pub fn structure<I, K>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, PropertyValue)>,
        K: Into<String>,
    {
        PropertyValue::Structure(fields.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    pub fn mapping<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, PropertyValue)>,
        K: Into<Scalar>,
    {
        PropertyValue::Mapping(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::Scalar(Scalar::String(s)) => Some(s),
            _ => None,
        }
    }
}

macro_rules! scalar_from {
    ($($ty:ty => $variant:ident as $conv:ty),* $(,)?) => {
        $(
            impl From<$ty> for Scalar {
                fn from(value: $ty) -> Self {
                    Scalar::$variant(<$conv>::from(value))
                }
            }

            impl From<$ty> for PropertyValue {
                fn from(value: $ty) -> Self {
                    PropertyValue::Scalar(Scalar::from(value))
                }
            }
        )*
    };
}

scalar_from! {
    bool => Bool as bool,
    i8 => I64 as i64,
    i16 => I64 as i64,
    i32 => I64 as i64,
    i64 => I64 as i64,
    u8 => U64 as u64,
    u16 => U64 as u64,
    u32 => U64 as u64,
    u64 => U64 as u64,
    i128 => I128 as i128,
    f32 => F64 as f64,
    f64 => F64 as f64,
    String => String as String,
    &str => String as String,
}

impl From<usize> for Scalar {
    fn from(value: usize) -> Self {
        Scalar::U64(value as u64)
    }
}

impl From<usize> for PropertyValue {
    fn from(value: usize) -> Self {
        PropertyValue::Scalar(Scalar::from(value))
    }
}

impl From<Scalar> for PropertyValue {
    fn from(value: Scalar) -> Self {
        PropertyValue::Scalar(value)
    }
}

impl<T: Into<PropertyValue>> From<Option<T>> for PropertyValue {
    fn from(value: Option<T>) -> Self {
        value.map_or_else(PropertyValue::null, Into::into)
    }
}

impl<T: Into<PropertyValue>> From<Vec<T>> for PropertyValue {
    fn from(values: Vec<T>) -> Self {
        PropertyValue::Sequence(values.into_iter().map(Into::into).collect())
    }
}

impl<K: Into<Scalar>, V: Into<PropertyValue>> From<BTreeMap<K, V>> for PropertyValue {
    fn from(map: BTreeMap<K, V>) -> Self {
        PropertyValue::Mapping(map.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl<K: Into<Scalar>, V: Into<PropertyValue>> From<HashMap<K, V>> for PropertyValue {
    fn from(map: HashMap<K, V>) -> Self {
        PropertyValue::Mapping(map.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}
