//! Degrees/minutes/seconds to decimal-degree conversion.

use std::str::FromStr;

use geohub_types::GeoPoint;
use tracing::debug;

/// One term of a DMS coordinate as stored in image metadata.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DmsComponent {
    Number(f64),
    Fraction { numerator: f64, denominator: f64 },
}

impl DmsComponent {
    /// Numeric value of the term. A fraction with a zero denominator is `0`.
    pub fn value(&self) -> f64 {
        match *self {
            Self::Number(n) => n,
            Self::Fraction { denominator, .. } if denominator == 0.0 => 0.0,
            Self::Fraction {
                numerator,
                denominator,
            } => numerator / denominator,
        }
    }
}

impl From<f64> for DmsComponent {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl FromStr for DmsComponent {
    type Err = String;

    /// Parses `"44.5"` as a number and `"4488/100"` as a fraction.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s.split_once('/') {
            Some((num, den)) => {
                let numerator = num.trim().parse::<f64>().map_err(|e| e.to_string())?;
                let denominator = den.trim().parse::<f64>().map_err(|e| e.to_string())?;
                Ok(Self::Fraction {
                    numerator,
                    denominator,
                })
            }
            None => s.parse::<f64>().map(Self::Number).map_err(|e| e.to_string()),
        }
    }
}

/// Parse a whitespace- or comma-separated list of DMS terms.
///
/// Tokens that are not numbers or fractions (unit words, hemisphere letters)
/// are skipped.
pub fn parse_dms_list(s: &str) -> Vec<DmsComponent> {
    s.split(|c: char| c.is_whitespace() || c == ',')
        .filter(|t| !t.is_empty())
        .filter_map(|t| t.parse().ok())
        .collect()
}

/// Convert `[degrees, minutes, seconds]` to decimal degrees.
///
/// Returns `0` when fewer than three terms are present. A reference starting
/// with `S` or `W` (case-insensitive) negates the result.
pub fn dms_to_decimal(components: &[DmsComponent], reference: &str) -> f64 {
    if components.len() < 3 {
        return 0.0;
    }
    let degrees = components[0].value();
    let minutes = components[1].value();
    let seconds = components[2].value();
    let dd = degrees + minutes / 60.0 + seconds / 3600.0;

    match reference.trim().chars().next().map(|c| c.to_ascii_uppercase()) {
        Some('S') | Some('W') => -dd,
        _ => dd,
    }
}

/// Raw GPS tags read from an image.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GpsTags {
    pub latitude: Vec<DmsComponent>,
    pub latitude_ref: String,
    pub longitude: Vec<DmsComponent>,
    pub longitude_ref: String,
}

/// Resolve raw tags to a position.
///
/// `None` when tags are absent, either axis is incomplete, the result is not
/// finite, or it lands exactly on `(0, 0)`.
pub fn resolve_position(tags: Option<&GpsTags>) -> Option<GeoPoint> {
    let tags = tags?;
    if tags.latitude.len() < 3 || tags.longitude.len() < 3 {
        debug!("incomplete GPS block");
        return None;
    }

    let point = GeoPoint::new(
        dms_to_decimal(&tags.latitude, &tags.latitude_ref),
        dms_to_decimal(&tags.longitude, &tags.longitude_ref),
    );
    if !point.lat.is_finite() || !point.lng.is_finite() {
        debug!(?point, "non-finite GPS position");
        return None;
    }
    if point.is_null_island() {
        debug!("GPS position at (0, 0), treated as missing");
        return None;
    }
    Some(point)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn n(v: f64) -> DmsComponent {
        DmsComponent::Number(v)
    }

    fn frac(numerator: f64, denominator: f64) -> DmsComponent {
        DmsComponent::Fraction {
            numerator,
            denominator,
        }
    }

    // -----------------------------------------------------------------------
    // Conversion
    // -----------------------------------------------------------------------

    #[test]
    fn south_reference_negates() {
        assert_eq!(dms_to_decimal(&[n(10.0), n(30.0), n(0.0)], "S"), -10.5);
        assert_eq!(dms_to_decimal(&[n(10.0), n(30.0), n(0.0)], "N"), 10.5);
    }

    #[test]
    fn zero_stays_zero() {
        assert_eq!(dms_to_decimal(&[n(0.0), n(0.0), n(0.0)], "N"), 0.0);
    }

    #[test]
    fn west_reference_accepts_long_form() {
        let dd = dms_to_decimal(&[n(43.0), n(10.0), n(55.92)], "West");
        assert!((dd + 43.182_2).abs() < 1e-6);
    }

    #[test]
    fn fractions_and_numbers_convert_alike() {
        let plain = dms_to_decimal(&[n(22.0), n(53.0), n(44.88)], "S");
        let fractional = dms_to_decimal(&[frac(22.0, 1.0), frac(53.0, 1.0), frac(4488.0, 100.0)], "S");
        assert!((plain - fractional).abs() < 1e-12);
    }

    #[test]
    fn zero_denominator_is_zero() {
        assert_eq!(frac(5.0, 0.0).value(), 0.0);
        assert_eq!(dms_to_decimal(&[n(10.0), frac(1.0, 0.0), n(0.0)], "N"), 10.0);
    }

    #[test]
    fn too_few_components_is_zero() {
        assert_eq!(dms_to_decimal(&[n(10.0), n(30.0)], "S"), 0.0);
        assert_eq!(dms_to_decimal(&[], "N"), 0.0);
    }

    // -----------------------------------------------------------------------
    // Parsing
    // -----------------------------------------------------------------------

    #[test]
    fn parses_mixed_lists() {
        assert_eq!(
            parse_dms_list("22 53 4488/100"),
            vec![n(22.0), n(53.0), frac(4488.0, 100.0)]
        );
        assert_eq!(parse_dms_list("22, 53, 44.88 S"), vec![n(22.0), n(53.0), n(44.88)]);
        assert!(parse_dms_list("garbage").is_empty());
    }

    // -----------------------------------------------------------------------
    // Position resolution
    // -----------------------------------------------------------------------

    #[test]
    fn null_island_is_no_position() {
        let tags = GpsTags {
            latitude: vec![n(0.0), n(0.0), n(0.0)],
            latitude_ref: "S".into(),
            longitude: vec![n(0.0), n(0.0), n(0.0)],
            longitude_ref: "W".into(),
        };
        assert_eq!(resolve_position(Some(&tags)), None);
    }

    #[test]
    fn resolves_southern_western_position() {
        let tags = GpsTags {
            latitude: vec![n(22.0), n(53.0), n(44.88)],
            latitude_ref: "S".into(),
            longitude: vec![n(43.0), n(10.0), n(55.92)],
            longitude_ref: "W".into(),
        };
        let point = resolve_position(Some(&tags)).unwrap();
        assert!((point.lat + 22.8958).abs() < 1e-4);
        assert!((point.lng + 43.1822).abs() < 1e-4);
    }

    #[test]
    fn missing_or_partial_tags_are_no_position() {
        assert_eq!(resolve_position(None), None);
        let partial = GpsTags {
            latitude: vec![n(22.0), n(53.0), n(44.88)],
            latitude_ref: "S".into(),
            ..Default::default()
        };
        assert_eq!(resolve_position(Some(&partial)), None);
    }
}
