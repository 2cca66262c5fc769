use serde::{Deserialize, Deserializer};

/// Deserializes a field that distinguishes "absent" from "explicitly null".
/// Use together with `#[serde(default)]`: an omitted field stays `None`,
/// `null` becomes `Some(None)`, and a value becomes `Some(Some(v))`.
pub fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
