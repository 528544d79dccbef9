//! Utility functions

use serde::{Deserialize, Deserializer};
use time::OffsetDateTime;

/// Extract header value as string
pub fn header_str(headers: &http::HeaderMap, name: &str) -> Option<String> {
    headers.get(name)?.to_str().ok().map(|s| s.to_string())
}

/// Generate a new request ID
pub fn generate_request_id() -> String {
    format!("sdk-{}", uuid::Uuid::new_v4())
}

/// URL encode a path segment
pub fn encode_path(s: &str) -> String {
    use percent_encoding::{AsciiSet, CONTROLS};

    const SEGMENT: &AsciiSet = &CONTROLS
        .add(b' ')
        .add(b'"')
        .add(b'<')
        .add(b'>')
        .add(b'`')
        .add(b'#')
        .add(b'?')
        .add(b'{')
        .add(b'}')
        .add(b'/')
        .add(b'\\')
        .add(b'%');

    percent_encoding::utf8_percent_encode(s, SEGMENT).to_string()
}

/// URL encode a query parameter value
pub fn encode_query(s: &str) -> String {
    percent_encoding::utf8_percent_encode(s, percent_encoding::NON_ALPHANUMERIC).to_string()
}

/// Append `key=value` pairs to a URL, skipping absent values
pub fn with_query(mut url: String, params: &[(&str, Option<&str>)]) -> String {
    let parts: Vec<String> = params
        .iter()
        .filter_map(|(k, v)| v.map(|v| format!("{}={}", k, encode_query(v))))
        .collect();
    if !parts.is_empty() {
        url.push(if url.contains('?') { '&' } else { '?' });
        url.push_str(&parts.join("&"));
    }
    url
}

/// Parse the timestamps Password Safe emits
///
/// RFC 3339 is tried first; the API also returns offset-less values such as
/// `2024-05-01T10:30:00` or `2024-05-01T10:30:00.123`, which are taken as UTC.
pub fn parse_timestamp(s: &str) -> Option<OffsetDateTime> {
    use time::format_description::well_known::Rfc3339;
    use time::macros::format_description;
    use time::PrimitiveDateTime;

    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = OffsetDateTime::parse(s, &Rfc3339) {
        return Some(dt);
    }
    let naive = format_description!(
        "[year]-[month]-[day]T[hour]:[minute]:[second][optional [.[subsecond]]]"
    );
    PrimitiveDateTime::parse(s, naive)
        .ok()
        .map(PrimitiveDateTime::assume_utc)
}

/// Deserialize an optional timestamp, treating unparseable values as absent
pub(crate) fn de_opt_timestamp<'de, D>(deserializer: D) -> Result<Option<OffsetDateTime>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(parse_timestamp))
}

#[derive(Deserialize)]
#[serde(untagged)]
enum FlexibleId {
    Num(u64),
    Text(String),
}

/// Deserialize a numeric id the API may send as a number or a string
pub(crate) fn de_flexible_id<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<FlexibleId>::deserialize(deserializer)? {
        None => Ok(0),
        Some(FlexibleId::Num(n)) => Ok(n),
        Some(FlexibleId::Text(s)) if s.trim().is_empty() => Ok(0),
        Some(FlexibleId::Text(s)) => s
            .trim()
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("invalid id: {}", s))),
    }
}

/// Deserialize `null` as the type's default
pub(crate) fn de_null_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_path() {
        assert_eq!(encode_path("hello world"), "hello%20world");
        assert_eq!(encode_path("test/path"), "test%2Fpath");
        assert_eq!(encode_path("CORP\\admin"), "CORP%5Cadmin");
        assert_eq!(encode_path("50"), "50");
    }

    #[test]
    fn test_with_query() {
        let url = with_query(
            "https://h/ManagedAccounts".to_string(),
            &[("systemId", Some("12")), ("accountName", None)],
        );
        assert_eq!(url, "https://h/ManagedAccounts?systemId=12");

        let url = with_query(
            "https://h/ManagedAccounts".to_string(),
            &[("accountname", Some("CORP\\svc sql")), ("type", Some("domainlinked"))],
        );
        assert_eq!(
            url,
            "https://h/ManagedAccounts?accountname=CORP%5Csvc%20sql&type=domainlinked"
        );

        let url = with_query("https://h/Requests".to_string(), &[("state", None)]);
        assert_eq!(url, "https://h/Requests");
    }

    #[test]
    fn test_parse_timestamp() {
        let dt = parse_timestamp("2024-05-01T10:30:00Z").unwrap();
        assert_eq!(dt.hour(), 10);

        let dt = parse_timestamp("2024-05-01T10:30:00").unwrap();
        assert_eq!(dt.offset(), time::UtcOffset::UTC);
        assert_eq!(dt.minute(), 30);

        let dt = parse_timestamp("2024-05-01T10:30:00.123").unwrap();
        assert_eq!(dt.second(), 0);

        assert!(parse_timestamp("").is_none());
        assert!(parse_timestamp("yesterday").is_none());
    }

    #[test]
    fn test_flexible_id() {
        #[derive(Deserialize)]
        struct Holder {
            #[serde(deserialize_with = "de_flexible_id", default)]
            id: u64,
        }

        let h: Holder = serde_json::from_str(r#"{"id": 42}"#).unwrap();
        assert_eq!(h.id, 42);
        let h: Holder = serde_json::from_str(r#"{"id": "42"}"#).unwrap();
        assert_eq!(h.id, 42);
        let h: Holder = serde_json::from_str(r#"{"id": null}"#).unwrap();
        assert_eq!(h.id, 0);
        let h: Holder = serde_json::from_str(r#"{}"#).unwrap();
        assert_eq!(h.id, 0);
        assert!(serde_json::from_str::<Holder>(r#"{"id": "abc"}"#).is_err());
    }

    #[test]
    fn test_generate_request_id() {
        let id = generate_request_id();
        assert!(id.starts_with("sdk-"));
        assert_ne!(id, generate_request_id());
    }
}
