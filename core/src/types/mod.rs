//! Request and result types for the three Kaizen products.
//!
//! # Design
//! Request types serialize to the exact wire body, omitting unset optional
//! members. Result types deserialize leniently: unknown fields are ignored
//! and missing fields take their defaults, so additive server changes never
//! break a caller.

/// Closed string enum with its wire spelling. Parsing an unknown value is a
/// local `Validation` error on `$field`.
macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        $name:ident, field = $field:literal {
            $($variant:ident => $wire:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord,
            serde::Serialize, serde::Deserialize,
        )]
        pub enum $name {
            $(
                #[serde(rename = $wire)]
                $variant,
            )+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $wire,)+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = crate::error::KaizenError;

            fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                match s {
                    $($wire => Ok($name::$variant),)+
                    other => Err(crate::error::KaizenError::validation(
                        $field,
                        format!(
                            "unsupported value '{}', expected one of: {}",
                            other,
                            [$($wire),+].join(", ")
                        ),
                    )),
                }
            }
        }
    };
}

pub mod akuma;
pub mod enzan;
pub mod sozo;

/// One result row: column name to JSON value.
pub type Row = serde_json::Map<String, serde_json::Value>;

/// Reject blank required strings before a request is sent.
pub(crate) fn require(field: &str, value: &str) -> crate::error::Result<()> {
    if value.trim().is_empty() {
        return Err(crate::error::KaizenError::validation(field, "is required"));
    }
    Ok(())
}

/// Deserializers for auxiliary result members. A wrong-typed value becomes
/// `None` (or zero) instead of failing the whole response.
pub(crate) mod lenient {
    use std::collections::BTreeMap;

    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    fn as_number(value: &Value) -> Option<f64> {
        let number = match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        };
        number.filter(|f: &f64| f.is_finite())
    }

    fn as_count(value: &Value) -> Option<u64> {
        match value {
            Value::Number(n) => n.as_u64().or_else(|| {
                n.as_f64()
                    .filter(|f| f.is_finite() && *f >= 0.0)
                    .map(|f| f.round() as u64)
            }),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn opt_number<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
        Ok(as_number(&Value::deserialize(d)?))
    }

    pub fn number<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
        Ok(opt_number(d)?.unwrap_or_default())
    }

    pub fn opt_count<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u64>, D::Error> {
        Ok(as_count(&Value::deserialize(d)?))
    }

    pub fn count<'de, D: Deserializer<'de>>(d: D) -> Result<u64, D::Error> {
        Ok(opt_count(d)?.unwrap_or_default())
    }

    /// Label to count; entries whose count is not a number are skipped.
    pub fn opt_counts<'de, D>(d: D) -> Result<Option<BTreeMap<String, u64>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Value::deserialize(d)? {
            Value::Object(map) => Some(
                map.iter()
                    .filter_map(|(label, n)| as_count(n).map(|n| (label.clone(), n)))
                    .collect(),
            ),
            _ => None,
        })
    }

    /// Any JSON scalar except `null`; arrays and objects are dropped.
    pub fn opt_scalar<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Value>, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::Null | Value::Array(_) | Value::Object(_) => None,
            scalar => Some(scalar),
        })
    }

    /// A string member; anything else becomes `"unknown"`.
    pub fn type_name<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::String(s) => s,
            _ => "unknown".to_string(),
        })
    }

}
