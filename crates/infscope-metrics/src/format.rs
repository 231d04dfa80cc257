/// Renders a count rounded to a whole number with `,` thousands separators.
#[must_use]
pub fn format_count(value: f64) -> String {
    let rounded = value.round();
    let negative = rounded < 0.0;
    let digits = format!("{:.0}", rounded.abs());

    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    if negative {
        out.insert(0, '-');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn groups_thousands() {
        assert_eq!(format_count(2_100.0), "2,100");
        assert_eq!(format_count(2_000_000.0), "2,000,000");
        assert_eq!(format_count(999.0), "999");
    }

    #[test]
    fn rounds_to_whole_number() {
        assert_eq!(format_count(1_234.5), "1,235");
        assert_eq!(format_count(0.4), "0");
    }

    #[test]
    fn keeps_sign() {
        assert_eq!(format_count(-12_345.0), "-12,345");
    }
}
