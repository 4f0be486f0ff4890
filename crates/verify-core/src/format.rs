//! Display formatting for bound data values
//!
//! Mirrors how the report pages print numbers: comma thousands separators,
//! whole numbers without decimals, everything else with two.

use serde_json::Value;

/// How a bound value is rendered (`data-format` attribute)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DataFormat {
    #[default]
    Plain,
    Number,
    Currency,
    Percent,
}

impl DataFormat {
    /// Parse the attribute value; unknown formats fall back to plain
    pub fn parse(attr: Option<&str>) -> Self {
        match attr.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
            Some("number") => DataFormat::Number,
            Some("currency") => DataFormat::Currency,
            Some("percent") | Some("percentage") => DataFormat::Percent,
            _ => DataFormat::Plain,
        }
    }
}

/// Insert comma separators into a run of ASCII digits
fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Format with separators and a fixed number of decimals
pub fn format_amount(value: f64, decimals: usize) -> String {
    let formatted = format!("{:.*}", decimals, value.abs());
    let (int_part, frac_part) = match formatted.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (formatted.as_str(), None),
    };

    let mut out = String::new();
    if value < 0.0 && formatted.chars().any(|c| c != '0' && c != '.') {
        out.push('-');
    }
    out.push_str(&group_thousands(int_part));
    if let Some(frac) = frac_part {
        out.push('.');
        out.push_str(frac);
    }
    out
}

/// Whole numbers without decimals, anything else with two
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 {
        format_amount(value, 0)
    } else {
        format_amount(value, 2)
    }
}

/// Currency amounts print like other numbers; the unit lives in the page
pub fn format_currency(value: f64) -> String {
    format_number(value)
}

/// Percentages keep their natural precision
pub fn format_percent(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{:.0}%", value)
    } else {
        format!("{}%", value)
    }
}

/// Render a JSON value for display; containers have no text form
pub fn format_value(value: &Value, format: DataFormat) -> Option<String> {
    match value {
        Value::Number(n) => {
            let v = n.as_f64()?;
            Some(match format {
                DataFormat::Plain => n.to_string(),
                DataFormat::Number => format_number(v),
                DataFormat::Currency => format_currency(v),
                DataFormat::Percent => format_percent(v),
            })
        }
        Value::String(s) => match format {
            DataFormat::Plain => Some(s.clone()),
            _ => match s.replace(',', "").trim().parse::<f64>() {
                Ok(v) => format_value(&Value::from(v), format),
                Err(_) => Some(s.clone()),
            },
        },
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_group_thousands() {
        assert_eq!(format_amount(62985.0, 0), "62,985");
        assert_eq!(format_amount(1234567.891, 2), "1,234,567.89");
        assert_eq!(format_amount(999.0, 0), "999");
        assert_eq!(format_amount(0.0, 0), "0");
    }

    #[test]
    fn test_negative_amounts() {
        assert_eq!(format_amount(-1234.5, 2), "-1,234.50");
        assert_eq!(format_amount(-0.001, 2), "0.00");
    }

    #[test]
    fn test_format_number_whole_vs_fractional() {
        assert_eq!(format_number(10300.0), "10,300");
        assert_eq!(format_number(62985.5), "62,985.50");
    }

    #[test]
    fn test_format_percent() {
        assert_eq!(format_percent(75.0), "75%");
        assert_eq!(format_percent(75.5), "75.5%");
        assert_eq!(format_percent(1e20), "100000000000000000000%");
    }

    #[test]
    fn test_parse_format_attribute() {
        assert_eq!(DataFormat::parse(Some("currency")), DataFormat::Currency);
        assert_eq!(DataFormat::parse(Some(" Percent ")), DataFormat::Percent);
        assert_eq!(DataFormat::parse(Some("number")), DataFormat::Number);
        assert_eq!(DataFormat::parse(Some("bogus")), DataFormat::Plain);
        assert_eq!(DataFormat::parse(None), DataFormat::Plain);
    }

    #[test]
    fn test_format_json_values() {
        assert_eq!(
            format_value(&json!(62985.5), DataFormat::Currency).as_deref(),
            Some("62,985.50")
        );
        assert_eq!(
            format_value(&json!(426), DataFormat::Plain).as_deref(),
            Some("426")
        );
        assert_eq!(
            format_value(&json!("10300"), DataFormat::Currency).as_deref(),
            Some("10,300")
        );
        assert_eq!(
            format_value(&json!("Lisbon"), DataFormat::Currency).as_deref(),
            Some("Lisbon")
        );
        assert_eq!(format_value(&json!([1, 2]), DataFormat::Plain), None);
        assert_eq!(format_value(&Value::Null, DataFormat::Plain), None);
    }
}
