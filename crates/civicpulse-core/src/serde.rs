use serde::{Deserialize, Deserializer};
use uuid::Uuid;

/// Deserializes an optional UUID from a query-string value, treating an
/// empty string as absent.
pub fn deserialize_optional_uuid<'de, D>(deserializer: D) -> Result<Option<Uuid>, D::Error>
where
    D: Deserializer<'de>,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    match s {
        Some(s) if s.is_empty() => Ok(None),
        Some(s) => Uuid::parse_str(&s)
            .map(Some)
            .map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Params {
        #[serde(default, deserialize_with = "deserialize_optional_uuid")]
        municipality_id: Option<Uuid>,
    }

    #[test]
    fn parses_valid_uuid() {
        let p: Params = serde_json::from_str(
            r#"{"municipality_id":"6f2b2c3a-0000-4000-8000-000000000001"}"#,
        )
        .unwrap();
        assert!(p.municipality_id.is_some());
    }

    #[test]
    fn empty_string_is_none() {
        let p: Params = serde_json::from_str(r#"{"municipality_id":""}"#).unwrap();
        assert!(p.municipality_id.is_none());
    }

    #[test]
    fn invalid_uuid_is_an_error() {
        assert!(serde_json::from_str::<Params>(r#"{"municipality_id":"nope"}"#).is_err());
    }
}
