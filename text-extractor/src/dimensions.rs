//! Classification and parsing of dimension strings like `12'6" x 11'8"`.

use regex::Regex;
use std::sync::LazyLock;

// Accepted shapes: plain "12x14", feet/inches `12'6" x 11'8"`, and the
// same with spaces inside a side. Separator may be x, X or ×.
static DIMENSION_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        Regex::new(r#"^\s*\d+(\.\d+)?\s*[x×X]\s*\d+(\.\d+)?\s*$"#).unwrap(),
        Regex::new(r#"^\s*\d+'?\d*"?\s*[x×X]\s*\d+'?\d*"?\s*$"#).unwrap(),
        Regex::new(r#"^\s*\d+'\s*\d*"?\s*[x×X]\s*\d+'\s*\d*"?\s*$"#).unwrap(),
    ]
});

static SEPARATOR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s*[x×X]\s*").unwrap());
static FEET: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d+)'").unwrap());
static INCHES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"(\d+)""#).unwrap());

/// Error for text that looked like a dimension but would not parse.
/// Local to one fragment; never aborts the extraction pass.
#[derive(Debug)]
pub struct DimensionParseError {
    pub text: String,
    pub reason: String,
}

impl std::fmt::Display for DimensionParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "cannot parse dimension {:?}: {}", self.text, self.reason)
    }
}

impl std::error::Error for DimensionParseError {}

/// Does this OCR fragment look like a room-dimension callout?
pub fn is_dimension(text: &str) -> bool {
    DIMENSION_PATTERNS.iter().any(|p| p.is_match(text))
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// One side of a dimension string, in feet. `12'6"` is feet plus
/// inches/12; a side with neither marker is read as a plain number of
/// feet.
pub fn parse_feet_inches(value: &str) -> Result<f64, DimensionParseError> {
    let value = value.trim();

    let feet_match = FEET.captures(value);
    let inches_match = INCHES.captures(value);

    if feet_match.is_none() && inches_match.is_none() {
        return value.parse::<f64>().map(round2).map_err(|e| DimensionParseError {
            text: value.to_string(),
            reason: e.to_string(),
        });
    }

    let mut feet = 0u32;
    let mut inches = 0u32;

    if let Some(caps) = feet_match {
        feet = caps[1].parse().map_err(|_| DimensionParseError {
            text: value.to_string(),
            reason: "feet component out of range".to_string(),
        })?;
    }
    if let Some(caps) = inches_match {
        inches = caps[1].parse().map_err(|_| DimensionParseError {
            text: value.to_string(),
            reason: "inches component out of range".to_string(),
        })?;
    }

    Ok(round2(f64::from(feet) + f64::from(inches) / 12.0))
}

/// Split a dimension string on its separator and parse both sides,
/// left side first as written.
pub fn parse_dimension_text(text: &str) -> Result<(f64, f64), DimensionParseError> {
    let parts: Vec<&str> = SEPARATOR.split(text.trim()).collect();
    if parts.len() != 2 {
        return Err(DimensionParseError {
            text: text.to_string(),
            reason: format!("expected 2 sides, found {}", parts.len()),
        });
    }
    let width = parse_feet_inches(parts[0])?;
    let height = parse_feet_inches(parts[1])?;
    Ok((width, height))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_dimension_shapes() {
        assert!(is_dimension("3x4"));
        assert!(is_dimension("12 x 14"));
        assert!(is_dimension("12.5×14.25"));
        assert!(is_dimension("12'6\" x 11'8\""));
        assert!(is_dimension("12' 6\" X 11' 8\""));
    }

    #[test]
    fn rejects_non_dimensions() {
        assert!(!is_dimension("Bedroom"));
        assert!(!is_dimension("Scale 1:100"));
        assert!(!is_dimension("3x4x5"));
        assert!(!is_dimension(""));
    }

    #[test]
    fn parses_feet_and_inches() {
        let (w, h) = parse_dimension_text("12'6\" x 11'8\"").unwrap();
        assert!((w - 12.5).abs() < 0.01);
        assert!((h - 11.67).abs() < 0.01);
    }

    #[test]
    fn parses_plain_numbers_as_feet() {
        let (w, h) = parse_dimension_text("3x4").unwrap();
        assert_eq!((w, h), (3.0, 4.0));

        let (w, h) = parse_dimension_text(" 12.5 × 14 ").unwrap();
        assert_eq!((w, h), (12.5, 14.0));
    }

    #[test]
    fn sides_keep_written_order() {
        let (w, h) = parse_dimension_text("20'x 10'").unwrap();
        assert_eq!(w, 20.0);
        assert_eq!(h, 10.0);
    }

    #[test]
    fn feet_only_and_inches_only_sides() {
        assert_eq!(parse_feet_inches("12'").unwrap(), 12.0);
        assert_eq!(parse_feet_inches("6\"").unwrap(), 0.5);
    }

    #[test]
    fn oversized_feet_component_is_an_error() {
        let err = parse_dimension_text("99999999999999999999' x 10'").unwrap_err();
        assert!(err.reason.contains("feet"));
    }

    #[test]
    fn wrong_side_count_is_an_error() {
        assert!(parse_dimension_text("12").is_err());
    }
}
