//! Number rendering helpers shared by the codec and the upload path.

/// Fixed-point rendering (`{:.N}`), no grouping.
pub fn fixed(value: f64, decimals: usize) -> String {
    format!("{:.*}", decimals, value)
}

/// Fixed-point rendering with `,` thousands separators (`1234.5` -> `1,234.50`).
pub fn grouped(value: f64, decimals: usize) -> String {
    let rendered = fixed(value, decimals);
    let (sign, unsigned) = match rendered.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", rendered.as_str()),
    };
    let (int_part, frac_part) = match unsigned.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (unsigned, None),
    };

    let mut out = String::with_capacity(rendered.len() + int_part.len() / 3);
    out.push_str(sign);
    for (i, c) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    if let Some(frac) = frac_part {
        out.push('.');
        out.push_str(frac);
    }
    out
}

/// Percent rendering of a fraction: multiplies by 100 and appends `%`
/// (`0.123` at one decimal -> `12.3%`).
pub fn percent_of_fraction(value: f64, decimals: usize) -> String {
    format!("{}%", fixed(value * 100.0, decimals))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grouped() {
        assert_eq!(grouped(1234.5, 2), "1,234.50");
        assert_eq!(grouped(999.0, 0), "999");
        assert_eq!(grouped(1_000_000.0, 0), "1,000,000");
        assert_eq!(grouped(-98765.4321, 1), "-98,765.4");
        assert_eq!(grouped(0.5, 3), "0.500");
    }

    #[test]
    fn test_percent_of_fraction() {
        assert_eq!(percent_of_fraction(0.123, 1), "12.3%");
        assert_eq!(percent_of_fraction(1.0, 1), "100.0%");
    }
}
