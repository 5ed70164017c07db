//! Report rendering.
//!
//! Values are rendered for direct pasting into a spreadsheet, so the
//! decimal point is swapped for a configurable separator.

pub mod generator;

pub use generator::*;

/// Render a value in shortest round-trip form with the given decimal separator.
///
/// Integral values keep one fractional digit (`3` renders as `3.0`).
pub fn format_value(value: f64, separator: &str) -> String {
    let text = if value.is_nan() {
        "nan".to_string()
    } else if value.is_infinite() {
        let sign = if value > 0.0 { "" } else { "-" };
        format!("{}inf", sign)
    } else if value.fract() == 0.0 {
        format!("{:.1}", value)
    } else {
        format!("{}", value)
    };

    text.replace('.', separator)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_integral_values() {
        assert_eq!(format_value(1.0, ","), "1,0");
        assert_eq!(format_value(-12.0, ","), "-12,0");
        assert_eq!(format_value(0.0, ","), "0,0");
    }

    #[test]
    fn test_format_large_integral_values() {
        assert_eq!(format_value(1e16, ","), "10000000000000000,0");
        assert_eq!(format_value(-2e17, ","), "-200000000000000000,0");
    }

    #[test]
    fn test_format_fractional_values() {
        assert_eq!(format_value(2.5, ","), "2,5");
        assert_eq!(format_value(0.1, ","), "0,1");
        assert_eq!(format_value(-1.25, ","), "-1,25");
    }

    #[test]
    fn test_format_keeps_separator_choice() {
        assert_eq!(format_value(2.5, "."), "2.5");
        assert_eq!(format_value(3.0, ";"), "3;0");
    }

    #[test]
    fn test_format_non_finite() {
        assert_eq!(format_value(f64::NAN, ","), "nan");
        assert_eq!(format_value(f64::INFINITY, ","), "inf");
        assert_eq!(format_value(f64::NEG_INFINITY, ","), "-inf");
    }
}
