//! Lab findings and the per-document finding set.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::document::ExtractedText;

/// Measured value relative to its reference range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FindingStatus {
    Low,
    High,
    Normal,
}

impl FindingStatus {
    /// LOW below the range, HIGH above it, NORMAL otherwise (bounds inclusive).
    pub fn classify(value: f64, low: f64, high: f64) -> Self {
        if value < low {
            Self::Low
        } else if value > high {
            Self::High
        } else {
            Self::Normal
        }
    }

    pub fn is_abnormal(&self) -> bool {
        !matches!(self, Self::Normal)
    }
}

impl fmt::Display for FindingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => write!(f, "LOW"),
            Self::High => write!(f, "HIGH"),
            Self::Normal => write!(f, "NORMAL"),
        }
    }
}

/// One detected measurement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabFinding {
    pub test_name: String,
    pub measured_value: f64,
    pub unit: String,
    pub reference_low: f64,
    pub reference_high: f64,
    pub status: FindingStatus,
}

impl LabFinding {
    /// Build a finding with its status derived from the range.
    pub fn new(
        test_name: impl Into<String>,
        measured_value: f64,
        unit: impl Into<String>,
        reference_low: f64,
        reference_high: f64,
    ) -> Self {
        Self {
            test_name: test_name.into(),
            measured_value,
            unit: unit.into(),
            reference_low,
            reference_high,
            status: FindingStatus::classify(measured_value, reference_low, reference_high),
        }
    }

    /// Human-readable line, e.g.
    /// `Glucose (140.0 mg/dL) is **HIGH** (Normal: 70.0-110.0 mg/dL)`.
    pub fn formatted(&self) -> String {
        format!(
            "{} ({} {}) is **{}** (Normal: {}-{} {})",
            self.test_name,
            render_number(self.measured_value),
            self.unit,
            self.status,
            render_number(self.reference_low),
            render_number(self.reference_high),
            self.unit
        )
    }
}

/// Shortest round-trip decimal form. Plain notation keeps a trailing `.0`;
/// exponents below -4 or from 16 up switch to `d.ddde±XX`.
fn render_number(value: f64) -> String {
    if value.is_nan() {
        return "nan".into();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf".into() } else { "-inf".into() };
    }

    let sci = format!("{:e}", value);
    let (mantissa, exponent) = match sci.split_once('e') {
        Some(parts) => parts,
        None => return sci,
    };
    let exponent: i32 = exponent.parse().unwrap_or(0);
    let (sign, mantissa) = match mantissa.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", mantissa),
    };
    let digits: String = mantissa.chars().filter(|c| *c != '.').collect();

    if !(-4..16).contains(&exponent) {
        let exp_sign = if exponent < 0 { '-' } else { '+' };
        return format!("{}{}e{}{:02}", sign, mantissa, exp_sign, exponent.abs());
    }

    let body = if exponent < 0 {
        format!("0.{}{}", "0".repeat((-exponent - 1) as usize), digits)
    } else {
        let point = exponent as usize + 1;
        if digits.len() <= point {
            format!("{}{}.0", digits, "0".repeat(point - digits.len()))
        } else {
            format!("{}.{}", &digits[..point], &digits[point..])
        }
    };
    format!("{}{}", sign, body)
}

/// Extracted text plus the abnormal findings detected in it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FindingSet {
    pub extracted_text: ExtractedText,
    pub findings: Vec<LabFinding>,
}

impl FindingSet {
    pub fn formatted_findings(&self) -> Vec<String> {
        self.findings.iter().map(LabFinding::formatted).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_bounds_are_normal() {
        assert_eq!(FindingStatus::classify(70.0, 70.0, 110.0), FindingStatus::Normal);
        assert_eq!(FindingStatus::classify(110.0, 70.0, 110.0), FindingStatus::Normal);
        assert_eq!(FindingStatus::classify(69.9, 70.0, 110.0), FindingStatus::Low);
        assert_eq!(FindingStatus::classify(110.1, 70.0, 110.0), FindingStatus::High);
    }

    #[test]
    fn test_formatted_line() {
        let finding = LabFinding::new("Glucose", 140.0, "mg/dL", 70.0, 110.0);
        assert_eq!(
            finding.formatted(),
            "Glucose (140.0 mg/dL) is **HIGH** (Normal: 70.0-110.0 mg/dL)"
        );

        let finding = LabFinding::new("Hemoglobin", 9.5, "g/dL", 12.0, 16.5);
        assert_eq!(
            finding.formatted(),
            "Hemoglobin (9.5 g/dL) is **LOW** (Normal: 12.0-16.5 g/dL)"
        );
    }

    #[test]
    fn test_render_number_notation() {
        assert_eq!(render_number(140.0), "140.0");
        assert_eq!(render_number(13.5), "13.5");
        assert_eq!(render_number(0.0001), "0.0001");
        assert_eq!(render_number(0.00001), "1e-05");
        assert_eq!(render_number(2e16), "2e+16");
        assert_eq!(render_number(1.5e16), "1.5e+16");
        assert_eq!(render_number(1234567890123456.0), "1234567890123456.0");
        assert_eq!(render_number(-0.25), "-0.25");
        assert_eq!(render_number(0.0), "0.0");
    }

    #[test]
    fn test_formatted_tiny_value_uses_exponent() {
        let finding = LabFinding::new("Ferritin", 0.00001, "ng", 1.0, 2.0);
        assert_eq!(
            finding.formatted(),
            "Ferritin (1e-05 ng) is **LOW** (Normal: 1.0-2.0 ng)"
        );
    }

    #[test]
    fn test_serializes_camel_case() {
        let finding = LabFinding::new("TSH", 6.2, "mIU/L", 0.4, 4.0);
        let json = serde_json::to_value(&finding).unwrap();
        assert_eq!(json["testName"], "TSH");
        assert_eq!(json["status"], "HIGH");
        assert_eq!(json["referenceHigh"], 4.0);
    }
}
