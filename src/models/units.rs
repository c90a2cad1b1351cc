use serde::{de, Deserialize, Deserializer, Serializer};
use serde_with::{DeserializeAs, SerializeAs};
use std::fmt::Display;
use std::str::FromStr;

/// `serde_as` adapter for integer token amounts and raw prices.
///
/// Amounts are written as decimal strings because they overflow JSON numbers;
/// on input both strings and plain `u64` numbers are accepted.
pub struct TokenUnits;

impl<T: Display> SerializeAs<T> for TokenUnits {
    fn serialize_as<S>(source: &T, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(source)
    }
}

impl<'de, T> DeserializeAs<'de, T> for TokenUnits
where
    T: FromStr,
    T::Err: Display,
{
    fn deserialize_as<D>(deserializer: D) -> Result<T, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Q {
            Str(String),
            Num(u64),
        }
        let text = match Q::deserialize(deserializer)? {
            Q::Str(s) => s,
            Q::Num(n) => n.to_string(),
        };
        text.trim().parse().map_err(de::Error::custom)
    }
}
