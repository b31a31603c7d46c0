//! Lenient field deserializers shared by the response models.

use serde::de::{self, Deserialize, Deserializer};
use serde_json::Value;

/// `null` reads as an empty collection.
pub(crate) fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Counts arrive as JSON numbers of either kind; `10.0` is accepted as `10`.
pub(crate) fn whole_u64<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => {
            if let Some(v) = n.as_u64() {
                return Ok(Some(v));
            }
            match n.as_f64() {
                Some(f) if f.fract() == 0.0 && f >= 0.0 && f <= u64::MAX as f64 => {
                    Ok(Some(f as u64))
                }
                _ => Err(de::Error::custom(format!(
                    "expected a non-negative whole number, found {}",
                    n
                ))),
            }
        }
        Some(other) => Err(de::Error::custom(format!(
            "expected a whole number, found {}",
            other
        ))),
    }
}

/// Signed variant of [`whole_u64`], used for bucket keys and intervals.
pub(crate) fn whole_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => {
            if let Some(v) = n.as_i64() {
                return Ok(Some(v));
            }
            match n.as_f64() {
                Some(f) if f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64 => {
                    Ok(Some(f as i64))
                }
                _ => Err(de::Error::custom(format!(
                    "expected a whole number, found {}",
                    n
                ))),
            }
        }
        Some(other) => Err(de::Error::custom(format!(
            "expected a whole number, found {}",
            other
        ))),
    }
}
