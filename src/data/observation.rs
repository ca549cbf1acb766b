//! Strict parsing of the provider's conditions response
//!
//! The provider wraps everything of interest in a `current_observation`
//! object. Parsing is strict: every required field must be present with the
//! right type, or the whole parse fails with the offending key path. A
//! partially populated observation would silently render misleading weather
//! text, so there is no default filling.

use serde::Serialize;
use serde_json::Value;

use crate::error::FetchError;

/// Key path reported for a document-level JSON decode failure
const ROOT_PATH: &str = "(root)";

/// A successfully parsed weather observation
///
/// All four fields are required; their presence is guaranteed by
/// [`parse_observation`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeatherObservation {
    /// Full human-readable location name, e.g. "San Francisco, CA"
    pub location_full_name: String,
    /// Weather condition text, e.g. "Clear"
    pub condition_text: String,
    /// Temperature in Celsius, as reported by the provider
    pub temperature_celsius: String,
    /// URL of the condition icon, taken verbatim from the response
    pub icon_url: String,
}

/// Decodes a raw conditions payload into a [`WeatherObservation`]
///
/// Navigates `current_observation` → `display_location.full`, `icon_url`,
/// `weather`, `temp_c`. Any missing key, wrong type, or top-level decode
/// failure yields a `Parse` error carrying the offending key path.
pub fn parse_observation(bytes: &[u8]) -> Result<WeatherObservation, FetchError> {
    let root: Value =
        serde_json::from_slice(bytes).map_err(|_| FetchError::parse(ROOT_PATH))?;

    let current = object_field(&root, "current_observation")?;
    let display_location = object_member(current, "current_observation", "display_location")?;

    let location_full_name = string_member(
        display_location,
        "current_observation.display_location",
        "full",
    )?;
    let icon_url = string_member(current, "current_observation", "icon_url")?;
    let condition_text = string_member(current, "current_observation", "weather")?;
    let temperature_celsius = string_member(current, "current_observation", "temp_c")?;

    Ok(WeatherObservation {
        location_full_name,
        condition_text,
        temperature_celsius,
        icon_url,
    })
}

/// Looks up a top-level key that must be a JSON object
fn object_field<'a>(root: &'a Value, key: &str) -> Result<&'a Value, FetchError> {
    root.get(key)
        .filter(|value| value.is_object())
        .ok_or_else(|| FetchError::parse(key))
}

/// Looks up a nested key that must be a JSON object
fn object_member<'a>(parent: &'a Value, path: &str, key: &str) -> Result<&'a Value, FetchError> {
    parent
        .get(key)
        .filter(|value| value.is_object())
        .ok_or_else(|| FetchError::parse(format!("{path}.{key}")))
}

/// Looks up a nested key that must be a JSON string
fn string_member(parent: &Value, path: &str, key: &str) -> Result<String, FetchError> {
    parent
        .get(key)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| FetchError::parse(format!("{path}.{key}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID_RESPONSE: &str = r#"{
        "current_observation": {
            "display_location": { "full": "San Francisco, CA" },
            "icon_url": "http://x/i.png",
            "weather": "Clear",
            "temp_c": "18"
        }
    }"#;

    fn parse_err_path(bytes: &[u8]) -> String {
        match parse_observation(bytes) {
            Err(FetchError::Parse { path }) => path,
            other => panic!("Expected Parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_valid_response() {
        let observation = parse_observation(VALID_RESPONSE.as_bytes())
            .expect("Failed to parse valid response");

        assert_eq!(observation.location_full_name, "San Francisco, CA");
        assert_eq!(observation.condition_text, "Clear");
        assert_eq!(observation.temperature_celsius, "18");
        assert_eq!(observation.icon_url, "http://x/i.png");
    }

    #[test]
    fn test_parse_ignores_unknown_fields() {
        let with_extras = r#"{
            "response": { "version": "0.1" },
            "current_observation": {
                "display_location": { "full": "Helsinki, Finland", "city": "Helsinki" },
                "icon_url": "http://icons/clear.gif",
                "weather": "Overcast",
                "temp_c": "-3",
                "relative_humidity": "81%"
            }
        }"#;

        let observation =
            parse_observation(with_extras.as_bytes()).expect("Failed to parse response");
        assert_eq!(observation.location_full_name, "Helsinki, Finland");
        assert_eq!(observation.temperature_celsius, "-3");
    }

    #[test]
    fn test_parse_missing_icon_url() {
        let missing_icon = r#"{
            "current_observation": {
                "display_location": { "full": "San Francisco, CA" },
                "weather": "Clear",
                "temp_c": "18"
            }
        }"#;

        assert_eq!(
            parse_err_path(missing_icon.as_bytes()),
            "current_observation.icon_url"
        );
    }

    #[test]
    fn test_parse_missing_current_observation() {
        assert_eq!(parse_err_path(b"{}"), "current_observation");
    }

    #[test]
    fn test_parse_missing_display_location_full() {
        let missing_full = r#"{
            "current_observation": {
                "display_location": {},
                "icon_url": "http://x/i.png",
                "weather": "Clear",
                "temp_c": "18"
            }
        }"#;

        assert_eq!(
            parse_err_path(missing_full.as_bytes()),
            "current_observation.display_location.full"
        );
    }

    #[test]
    fn test_parse_display_location_wrong_type() {
        let not_an_object = r#"{
            "current_observation": {
                "display_location": "San Francisco, CA",
                "icon_url": "http://x/i.png",
                "weather": "Clear",
                "temp_c": "18"
            }
        }"#;

        assert_eq!(
            parse_err_path(not_an_object.as_bytes()),
            "current_observation.display_location"
        );
    }

    #[test]
    fn test_parse_temp_c_wrong_type_is_strict() {
        // The provider contract types temp_c as a string; a bare number is
        // a wrong-type parse failure, not something to coerce.
        let numeric_temp = r#"{
            "current_observation": {
                "display_location": { "full": "San Francisco, CA" },
                "icon_url": "http://x/i.png",
                "weather": "Clear",
                "temp_c": 18
            }
        }"#;

        assert_eq!(
            parse_err_path(numeric_temp.as_bytes()),
            "current_observation.temp_c"
        );
    }

    #[test]
    fn test_parse_malformed_json() {
        assert_eq!(parse_err_path(b"{ not json"), ROOT_PATH);
    }

    #[test]
    fn test_parse_empty_body() {
        assert_eq!(parse_err_path(b""), ROOT_PATH);
    }
}
