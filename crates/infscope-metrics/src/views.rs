//! View-count parsing and averaging.

use crate::settings::MetricsSettings;

/// Parses a human-readable count such as `"1.2k"`, `"3M views"` or `"12,400"`.
///
/// Returns `None` for anything that does not reduce to a finite number.
#[must_use]
pub fn parse_count(raw: &str) -> Option<f64> {
    let mut s = raw.trim().to_lowercase();
    if let Some(stripped) = s.strip_suffix("views") {
        s = stripped.trim_end().to_string();
    }
    s.retain(|c| c != ',' && !c.is_whitespace());

    let (number, multiplier) = if let Some(n) = s.strip_suffix('k') {
        (n, 1_000.0)
    } else if let Some(n) = s.strip_suffix('m') {
        (n, 1_000_000.0)
    } else {
        (s.as_str(), 1.0)
    };

    let value = number.parse::<f64>().ok()? * multiplier;
    value.is_finite().then_some(value)
}

/// Mean of the parseable view counts in `items`.
///
/// Items whose count is missing or unparseable are left out of both the sum
/// and the divisor. Returns `None` when no item parses.
pub fn average_views<T, F>(items: &[T], views: F) -> Option<f64>
where
    F: Fn(&T) -> Option<&str>,
{
    let mut total = 0.0;
    let mut counted = 0_u32;
    for item in items {
        if let Some(value) = views(item).and_then(parse_count) {
            total += value;
            counted += 1;
        }
    }
    (counted > 0).then(|| total / f64::from(counted))
}

/// Average views scaled by the configured reach multiplier.
#[must_use]
pub fn estimated_reach(average: Option<f64>, settings: &MetricsSettings) -> Option<f64> {
    average.map(|v| v * settings.reach_multiplier)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Post {
        views: Option<&'static str>,
    }

    fn posts(values: &[Option<&'static str>]) -> Vec<Post> {
        values.iter().map(|v| Post { views: *v }).collect()
    }

    #[test]
    fn parse_count_suffixes() {
        assert_eq!(parse_count("1.2k"), Some(1_200.0));
        assert_eq!(parse_count("3K"), Some(3_000.0));
        assert_eq!(parse_count("2m"), Some(2_000_000.0));
        assert_eq!(parse_count("845"), Some(845.0));
    }

    #[test]
    fn parse_count_strips_separators_and_label() {
        assert_eq!(parse_count("12,400 views"), Some(12_400.0));
        assert_eq!(parse_count(" 1.5M views "), Some(1_500_000.0));
    }

    #[test]
    fn parse_count_rejects_garbage() {
        assert_eq!(parse_count(""), None);
        assert_eq!(parse_count("N/A"), None);
        assert_eq!(parse_count("k"), None);
        assert_eq!(parse_count("inf"), None);
    }

    #[test]
    fn average_of_mixed_suffixes() {
        let items = posts(&[Some("1.2k"), Some("3k")]);
        let avg = average_views(&items, |p| p.views).unwrap();
        assert_eq!(avg.round(), 2_100.0);
    }

    #[test]
    fn average_of_single_million() {
        let items = posts(&[Some("2m")]);
        assert_eq!(average_views(&items, |p| p.views), Some(2_000_000.0));
    }

    #[test]
    fn average_of_nothing_is_unknown() {
        let items: Vec<Post> = Vec::new();
        assert_eq!(average_views(&items, |p| p.views), None);
    }

    #[test]
    fn unparseable_items_do_not_dilute_average() {
        let items = posts(&[Some("100"), None, Some("oops"), Some("300")]);
        assert_eq!(average_views(&items, |p| p.views), Some(200.0));
    }

    #[test]
    fn reach_doubles_and_propagates_unknown() {
        let settings = MetricsSettings::default();
        assert_eq!(estimated_reach(Some(2_100.0), &settings), Some(4_200.0));
        assert_eq!(estimated_reach(None, &settings), None);

        let tripled = MetricsSettings::default().with_reach_multiplier(3.0);
        assert_eq!(estimated_reach(Some(10.0), &tripled), Some(30.0));
    }
}
