//! State and district normalization
//!
//! Upstream sources disagree on how states and districts are spelled:
//! two-letter codes, full names in any case, numeric FIPS codes, districts
//! with or without zero padding, and districts as JSON strings or numbers.
//! Everything is funnelled through these pure helpers before comparison.

use serde::{Deserialize, Deserializer};

/// FIPS code → USPS code
const FIPS_TO_STATE: &[(&str, &str)] = &[
    ("01", "AL"), ("02", "AK"), ("04", "AZ"), ("05", "AR"), ("06", "CA"),
    ("08", "CO"), ("09", "CT"), ("10", "DE"), ("11", "DC"), ("12", "FL"),
    ("13", "GA"), ("15", "HI"), ("16", "ID"), ("17", "IL"), ("18", "IN"),
    ("19", "IA"), ("20", "KS"), ("21", "KY"), ("22", "LA"), ("23", "ME"),
    ("24", "MD"), ("25", "MA"), ("26", "MI"), ("27", "MN"), ("28", "MS"),
    ("29", "MO"), ("30", "MT"), ("31", "NE"), ("32", "NV"), ("33", "NH"),
    ("34", "NJ"), ("35", "NM"), ("36", "NY"), ("37", "NC"), ("38", "ND"),
    ("39", "OH"), ("40", "OK"), ("41", "OR"), ("42", "PA"), ("44", "RI"),
    ("45", "SC"), ("46", "SD"), ("47", "TN"), ("48", "TX"), ("49", "UT"),
    ("50", "VT"), ("51", "VA"), ("53", "WA"), ("54", "WV"), ("55", "WI"),
    ("56", "WY"), ("60", "AS"), ("66", "GU"), ("69", "MP"), ("72", "PR"),
    ("78", "VI"),
];

/// Lower-cased, punctuation-free full name → USPS code
const STATE_NAMES: &[(&str, &str)] = &[
    ("alabama", "AL"), ("alaska", "AK"), ("arizona", "AZ"), ("arkansas", "AR"),
    ("california", "CA"), ("colorado", "CO"), ("connecticut", "CT"),
    ("delaware", "DE"), ("district of columbia", "DC"), ("florida", "FL"),
    ("georgia", "GA"), ("hawaii", "HI"), ("idaho", "ID"), ("illinois", "IL"),
    ("indiana", "IN"), ("iowa", "IA"), ("kansas", "KS"), ("kentucky", "KY"),
    ("louisiana", "LA"), ("maine", "ME"), ("maryland", "MD"),
    ("massachusetts", "MA"), ("michigan", "MI"), ("minnesota", "MN"),
    ("mississippi", "MS"), ("missouri", "MO"), ("montana", "MT"),
    ("nebraska", "NE"), ("nevada", "NV"), ("new hampshire", "NH"),
    ("new jersey", "NJ"), ("new mexico", "NM"), ("new york", "NY"),
    ("north carolina", "NC"), ("north dakota", "ND"), ("ohio", "OH"),
    ("oklahoma", "OK"), ("oregon", "OR"), ("pennsylvania", "PA"),
    ("rhode island", "RI"), ("south carolina", "SC"), ("south dakota", "SD"),
    ("tennessee", "TN"), ("texas", "TX"), ("utah", "UT"), ("vermont", "VT"),
    ("virginia", "VA"), ("washington", "WA"), ("west virginia", "WV"),
    ("wisconsin", "WI"), ("wyoming", "WY"), ("american samoa", "AS"),
    ("guam", "GU"), ("northern mariana islands", "MP"), ("puerto rico", "PR"),
    ("virgin islands", "VI"), ("us virgin islands", "VI"),
    ("united states virgin islands", "VI"),
];

/// Canonical two-letter code for a state given as a code or a full name.
///
/// Returns `None` for anything that is not a known state or territory.
pub fn normalize_state_to_code(raw: &str) -> Option<&'static str> {
    let without_dots: String = raw.chars().filter(|c| *c != '.').collect();
    let cleaned = without_dots
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_ascii_lowercase();

    if cleaned.len() == 2 {
        return FIPS_TO_STATE
            .iter()
            .map(|(_, code)| *code)
            .find(|code| code.eq_ignore_ascii_case(&cleaned));
    }

    STATE_NAMES
        .iter()
        .find(|(name, _)| *name == cleaned)
        .map(|(_, code)| *code)
}

/// Canonical district form used for every comparison: "05" and "5" both
/// become "5"; an all-zero district (at-large) becomes "0".
pub fn strip_leading_zeros(district: &str) -> String {
    let trimmed = district.trim();
    let stripped = trimmed.trim_start_matches('0');
    if stripped.is_empty() && !trimmed.is_empty() {
        "0".to_string()
    } else {
        stripped.to_string()
    }
}

/// True when two district labels denote the same district
pub fn same_district(a: &str, b: &str) -> bool {
    strip_leading_zeros(a) == strip_leading_zeros(b)
}

/// Zero-pad a numeric district to two digits; non-numeric labels pass through
pub fn pad_district(raw: &str) -> String {
    let trimmed = raw.trim();
    if !trimmed.is_empty() && trimmed.chars().all(|c| c.is_ascii_digit()) {
        format!("{:0>2}", trimmed)
    } else {
        trimmed.to_string()
    }
}

/// Two-digit form of a state FIPS code
pub fn pad_fips(raw: &str) -> String {
    format!("{:0>2}", raw.trim())
}

/// USPS code for a numeric state FIPS code ("6" or "06")
pub fn state_for_fips(fips: &str) -> Option<&'static str> {
    let padded = pad_fips(fips);
    FIPS_TO_STATE
        .iter()
        .find(|(code, _)| *code == padded)
        .map(|(_, state)| *state)
}

/// Render a loose JSON scalar as a trimmed, non-empty string
pub fn loose_string(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        serde_json::Value::Number(n) => Some(
            n.as_i64()
                .map(|i| i.to_string())
                .unwrap_or_else(|| n.to_string()),
        ),
        _ => None,
    }
}

/// Serde adapter for fields that arrive as either a string or a number
pub fn de_opt_loose_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(loose_string))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_code_passthrough() {
        assert_eq!(normalize_state_to_code("IL"), Some("IL"));
        assert_eq!(normalize_state_to_code("il"), Some("IL"));
        assert_eq!(normalize_state_to_code(" Ca "), Some("CA"));
    }

    #[test]
    fn test_state_full_names() {
        assert_eq!(normalize_state_to_code("Illinois"), Some("IL"));
        assert_eq!(normalize_state_to_code("ILLINOIS"), Some("IL"));
        assert_eq!(normalize_state_to_code("new   york"), Some("NY"));
        assert_eq!(normalize_state_to_code("District of Columbia"), Some("DC"));
        assert_eq!(normalize_state_to_code("D.C."), Some("DC"));
        assert_eq!(normalize_state_to_code("U.S. Virgin Islands"), Some("VI"));
    }

    #[test]
    fn test_state_unknown() {
        assert_eq!(normalize_state_to_code("ZZ"), None);
        assert_eq!(normalize_state_to_code(""), None);
        assert_eq!(normalize_state_to_code("Atlantis"), None);
    }

    #[test]
    fn test_strip_leading_zeros() {
        assert_eq!(strip_leading_zeros("05"), "5");
        assert_eq!(strip_leading_zeros("5"), "5");
        assert_eq!(strip_leading_zeros("10"), "10");
        assert_eq!(strip_leading_zeros("00"), "0");
        assert_eq!(strip_leading_zeros("0"), "0");
        assert_eq!(strip_leading_zeros(" 007 "), "7");
        assert_eq!(strip_leading_zeros(""), "");
        assert!(same_district("05", "5"));
        assert!(!same_district("15", "5"));
    }

    #[test]
    fn test_pad_district() {
        assert_eq!(pad_district("5"), "05");
        assert_eq!(pad_district("13"), "13");
        assert_eq!(pad_district("At Large"), "At Large");
    }

    #[test]
    fn test_fips_lookup() {
        assert_eq!(state_for_fips("17"), Some("IL"));
        assert_eq!(state_for_fips("6"), Some("CA"));
        assert_eq!(state_for_fips("72"), Some("PR"));
        assert_eq!(state_for_fips("03"), None);
        assert_eq!(state_for_fips("99"), None);
    }

    #[test]
    fn test_loose_string_deserialization() {
        #[derive(Deserialize)]
        struct Probe {
            #[serde(default, deserialize_with = "de_opt_loose_string")]
            district: Option<String>,
        }

        let numeric: Probe = serde_json::from_str(r#"{"district": 5}"#).unwrap();
        assert_eq!(numeric.district.as_deref(), Some("5"));
        let text: Probe = serde_json::from_str(r#"{"district": " 05 "}"#).unwrap();
        assert_eq!(text.district.as_deref(), Some("05"));
        let null: Probe = serde_json::from_str(r#"{"district": null}"#).unwrap();
        assert_eq!(null.district, None);
        let missing: Probe = serde_json::from_str(r#"{}"#).unwrap();
        assert_eq!(missing.district, None);
    }
}
