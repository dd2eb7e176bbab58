//! The AWS Query wire form is a flat mapping with dotted, 1-based indexed
//! keys, e.g. `Filter.1.Name=instance-type&Filter.1.Value.1=t2.micro`.
//! [`QueryMap`] holds the percent-decoded pairs; [`FromQuery`] rebuilds
//! nested values out of them.

use std::collections::BTreeMap;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use chrono::{DateTime, Utc};
use thiserror::Error;

/// A decoding failure. Surfaced to clients as `InvalidParameter`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// A parameter value could not be parsed as the declared type.
    #[error("invalid value for parameter {key}: {reason}")]
    InvalidValue {
        /// The full dotted key of the offending parameter.
        key: String,
        /// Why the value was rejected.
        reason: String,
    },
}

impl DecodeError {
    fn invalid(key: &str, reason: impl Into<String>) -> Self {
        DecodeError::InvalidValue {
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}

/// The percent-decoded flat parameter map of one request.
///
/// Keys are stored sorted so that subtree probes (`contains_tree`,
/// `max_index`) are range scans rather than full walks. Duplicate keys
/// keep the last value, matching `url.Values`-style form parsing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryMap {
    pairs: BTreeMap<String, String>,
}

impl QueryMap {
    /// Decodes a raw `application/x-www-form-urlencoded` payload
    /// (`+` means space, `%XX` escapes on both sides).
    pub fn parse(raw: &str) -> QueryMap {
        let mut pairs = BTreeMap::new();
        for (k, v) in form_urlencoded::parse(raw.as_bytes()) {
            pairs.insert(k.into_owned(), v.into_owned());
        }
        QueryMap { pairs }
    }

    /// Inserts an already-decoded pair.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.pairs.insert(key.into(), value.into());
    }

    /// Looks up an exact key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs.get(key).map(String::as_str)
    }

    /// True iff the key exists verbatim or any `key.` descendant exists.
    pub fn contains_tree(&self, key: &str) -> bool {
        if self.pairs.contains_key(key) {
            return true;
        }
        let prefix = format!("{key}.");
        self.pairs
            .range(prefix.clone()..)
            .next()
            .is_some_and(|(k, _)| k.starts_with(&prefix))
    }

    /// The highest 1-based index observed directly under `key`, or 0 when
    /// no indexed descendant exists. `Item.3.Name` contributes 3 to
    /// `max_index("Item")`.
    pub fn max_index(&self, key: &str) -> usize {
        let prefix = format!("{key}.");
        let mut max = 0;
        for (k, _) in self.pairs.range(prefix.clone()..) {
            if !k.starts_with(&prefix) {
                break;
            }
            let rest = &k[prefix.len()..];
            let segment = rest.split('.').next().unwrap_or(rest);
            if let Ok(i) = segment.parse::<usize>() {
                max = max.max(i);
            }
        }
        max
    }

    /// Iterates over all decoded pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of decoded pairs.
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// True when no pairs were decoded.
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

/// A byte blob parameter. Decoding attempts base64 first and falls back to
/// the raw bytes, so clients may send either form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Blob(pub Vec<u8>);

impl Blob {
    /// The blob rendered as standard base64.
    pub fn to_base64(&self) -> String {
        BASE64.encode(&self.0)
    }
}

impl From<Vec<u8>> for Blob {
    fn from(bytes: Vec<u8>) -> Self {
        Blob(bytes)
    }
}

impl serde::Serialize for Blob {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_base64())
    }
}

impl<'de> serde::Deserialize<'de> for Blob {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        BASE64
            .decode(s.as_bytes())
            .map(Blob)
            .map_err(serde::de::Error::custom)
    }
}

/// Rebuilds `Self` from the flat map at the given dotted key.
///
/// Returns `Ok(None)` when the key is absent in every spelling, so that
/// optional fields stay unset and list gaps fall back to defaults.
pub trait FromQuery: Sized {
    /// Parse the value rooted at `key`. An empty `key` addresses the top
    /// level of the map.
    fn from_query(q: &QueryMap, key: &str) -> Result<Option<Self>, DecodeError>;
}

impl FromQuery for String {
    fn from_query(q: &QueryMap, key: &str) -> Result<Option<Self>, DecodeError> {
        Ok(q.get(key).map(str::to_string))
    }
}

impl FromQuery for i64 {
    fn from_query(q: &QueryMap, key: &str) -> Result<Option<Self>, DecodeError> {
        match q.get(key) {
            None => Ok(None),
            Some(raw) => raw
                .parse::<i64>()
                .map(Some)
                .map_err(|_| DecodeError::invalid(key, format!("{raw:?} is not an integer"))),
        }
    }
}

impl FromQuery for bool {
    fn from_query(q: &QueryMap, key: &str) -> Result<Option<Self>, DecodeError> {
        match q.get(key) {
            None => Ok(None),
            Some("true") | Some("1") => Ok(Some(true)),
            Some("false") | Some("0") => Ok(Some(false)),
            Some(raw) => Err(DecodeError::invalid(
                key,
                format!("{raw:?} is not a boolean"),
            )),
        }
    }
}

impl FromQuery for Blob {
    fn from_query(q: &QueryMap, key: &str) -> Result<Option<Self>, DecodeError> {
        Ok(q.get(key).map(|raw| {
            // Base64 first; on failure the raw bytes are taken verbatim.
            match BASE64.decode(raw.as_bytes()) {
                Ok(bytes) => Blob(bytes),
                Err(_) => Blob(raw.as_bytes().to_vec()),
            }
        }))
    }
}

impl FromQuery for DateTime<Utc> {
    fn from_query(q: &QueryMap, key: &str) -> Result<Option<Self>, DecodeError> {
        match q.get(key) {
            None => Ok(None),
            Some(raw) => DateTime::parse_from_rfc3339(raw)
                .map(|dt| Some(dt.with_timezone(&Utc)))
                .map_err(|_| DecodeError::invalid(key, format!("{raw:?} is not a timestamp"))),
        }
    }
}

impl<T: FromQuery> FromQuery for Option<T> {
    fn from_query(q: &QueryMap, key: &str) -> Result<Option<Self>, DecodeError> {
        Ok(Some(T::from_query(q, key)?))
    }
}

impl<T: FromQuery + Default> FromQuery for Vec<T> {
    fn from_query(q: &QueryMap, key: &str) -> Result<Option<Self>, DecodeError> {
        let max = q.max_index(key);
        if max == 0 {
            return Ok(None);
        }
        // Dense 1-based sequence up to the highest observed index; gaps
        // become zero values.
        let mut out = Vec::with_capacity(max);
        for i in 1..=max {
            let elem_key = format!("{key}.{i}");
            out.push(T::from_query(q, &elem_key)?.unwrap_or_default());
        }
        Ok(Some(out))
    }
}

/// Joins a parent prefix and a field name into a full dotted key.
pub fn join_key(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}.{name}")
    }
}

/// Resolves the key a field was sent under, consulting in order the wire
/// name verbatim, each location-name hint verbatim, and the title-cased
/// form of each hint (AWS mixes camelCase and TitleCase for the same field
/// across actions). Returns the first spelling present in the map.
pub fn field_key(q: &QueryMap, prefix: &str, names: &[&str]) -> Option<String> {
    for name in names {
        let full = join_key(prefix, name);
        if q.contains_tree(&full) {
            return Some(full);
        }
    }
    for name in &names[1..] {
        let full = join_key(prefix, &title_case(name));
        if q.contains_tree(&full) {
            return Some(full);
        }
    }
    None
}

fn title_case(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
        None => String::new(),
    }
}

/// The typed decode entry point: parses a whole input shape from the
/// request's parameter map.
pub fn decode_args<T: FromQuery + Default>(q: &QueryMap) -> Result<T, DecodeError> {
    Ok(T::from_query(q, "")?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_percent_decodes_both_sides() {
        let q = QueryMap::parse("Key%2EName=a+b%3Dc&Plain=1");
        assert_eq!(q.get("Key.Name"), Some("a b=c"));
        assert_eq!(q.get("Plain"), Some("1"));
    }

    #[test]
    fn scalar_lookup_and_absence() {
        let mut q = QueryMap::default();
        q.insert("Name", "alice");
        assert_eq!(String::from_query(&q, "Name").unwrap(), Some("alice".into()));
        assert_eq!(String::from_query(&q, "Missing").unwrap(), None);
    }

    #[test]
    fn integer_rejects_garbage() {
        let mut q = QueryMap::default();
        q.insert("Count", "12x");
        let err = i64::from_query(&q, "Count").unwrap_err();
        assert!(matches!(err, DecodeError::InvalidValue { ref key, .. } if key == "Count"));
    }

    #[test]
    fn bool_accepts_four_lexical_forms_only() {
        let mut q = QueryMap::default();
        for (raw, want) in [("true", true), ("1", true), ("false", false), ("0", false)] {
            q.insert("Flag", raw);
            assert_eq!(bool::from_query(&q, "Flag").unwrap(), Some(want));
        }
        q.insert("Flag", "yes");
        assert!(bool::from_query(&q, "Flag").is_err());
    }

    #[test]
    fn blob_base64_with_raw_fallback() {
        let mut q = QueryMap::default();
        q.insert("Data", BASE64.encode(b"hello"));
        assert_eq!(Blob::from_query(&q, "Data").unwrap().unwrap().0, b"hello");
        q.insert("Data", "not/valid base64!");
        assert_eq!(
            Blob::from_query(&q, "Data").unwrap().unwrap().0,
            b"not/valid base64!"
        );
    }

    #[test]
    fn list_gap_fills_with_zero_values() {
        let mut q = QueryMap::default();
        q.insert("Item.1", "a");
        q.insert("Item.3", "c");
        let items = Vec::<String>::from_query(&q, "Item").unwrap().unwrap();
        assert_eq!(items, vec!["a".to_string(), String::new(), "c".to_string()]);
    }

    #[test]
    fn list_of_empty_strings_keeps_length() {
        let mut q = QueryMap::default();
        for i in 1..=4 {
            q.insert(format!("Item.{i}"), "");
        }
        let items = Vec::<String>::from_query(&q, "Item").unwrap().unwrap();
        assert_eq!(items.len(), 4);
        assert!(items.iter().all(String::is_empty));
    }

    #[test]
    fn field_key_prefers_wire_name_then_hint_then_titlecased_hint() {
        let mut q = QueryMap::default();
        q.insert("instanceId", "i-1");
        assert_eq!(
            field_key(&q, "", &["InstanceId", "instanceId"]),
            Some("instanceId".to_string())
        );

        let mut q = QueryMap::default();
        q.insert("TagSet.1.Key", "Name");
        assert_eq!(
            field_key(&q, "", &["Tags", "tagSet"]),
            Some("TagSet".to_string())
        );
    }

    #[test]
    fn max_index_ignores_non_numeric_segments() {
        let mut q = QueryMap::default();
        q.insert("Filter.1.Name", "a");
        q.insert("Filter.2.Value.1", "b");
        q.insert("Filter.Name", "not-indexed");
        assert_eq!(q.max_index("Filter"), 2);
    }
}
