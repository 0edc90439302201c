use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::str::FromStr;

/// Parses a form amount ("150", "150.5", "150,55") into centavos.
/// Rejects negatives and anything finer than two decimal places.
pub fn parse_centavos(input: &str) -> Option<i64> {
    let normalized = input.trim().replace(',', ".");
    let valor = Decimal::from_str(&normalized).ok()?;
    if valor.is_sign_negative() || valor.scale() > 2 {
        return None;
    }
    (valor * Decimal::ONE_HUNDRED).to_i64()
}

/// Fixed two decimal places, as shown on screen and in the PDF ("150.00").
pub fn format_reais(centavos: i64) -> String {
    format!("{}.{:02}", centavos / 100, centavos % 100)
}

/// Float-style rendering for the CSV export: trailing zeros trimmed but never
/// below one decimal place ("150.0", "150.5", "150.55").
pub fn format_float(centavos: i64) -> String {
    let frac = centavos % 100;
    if frac == 0 {
        format!("{}.0", centavos / 100)
    } else if frac % 10 == 0 {
        format!("{}.{}", centavos / 100, frac / 10)
    } else {
        format!("{}.{:02}", centavos / 100, frac)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_whole_and_fractional_amounts() {
        assert_eq!(parse_centavos("150"), Some(15000));
        assert_eq!(parse_centavos("150.5"), Some(15050));
        assert_eq!(parse_centavos("150,55"), Some(15055));
        assert_eq!(parse_centavos(" 0 "), Some(0));
    }

    #[test]
    fn rejects_invalid_amounts() {
        assert_eq!(parse_centavos("-5"), None);
        assert_eq!(parse_centavos("1.234"), None);
        assert_eq!(parse_centavos("abc"), None);
        assert_eq!(parse_centavos(""), None);
    }

    #[test]
    fn formats_fixed_point() {
        assert_eq!(format_reais(15000), "150.00");
        assert_eq!(format_reais(15055), "150.55");
        assert_eq!(format_reais(5), "0.05");
    }

    #[test]
    fn formats_float_style() {
        assert_eq!(format_float(15000), "150.0");
        assert_eq!(format_float(15050), "150.5");
        assert_eq!(format_float(15055), "150.55");
    }
}
