//! Tunable heuristics used by the aggregator.

/// Reach is estimated as this multiple of average views.
pub const DEFAULT_REACH_MULTIPLIER: f64 = 2.0;

/// Lowercase substrings that flag a post or video as branded content.
///
/// Matching is a plain substring test, so short entries such as `"ad"` also
/// match inside longer words.
pub const DEFAULT_BRANDED_KEYWORDS: &[&str] = &[
    "sponsored",
    "ad",
    "branded",
    "collab",
    "partnership",
    "paid",
    "promotion",
    "sponsor",
    "brand",
    "product",
];

#[derive(Debug, Clone, PartialEq)]
pub struct MetricsSettings {
    pub reach_multiplier: f64,
    /// Stored lowercase.
    pub branded_keywords: Vec<String>,
}

impl Default for MetricsSettings {
    fn default() -> Self {
        Self {
            reach_multiplier: DEFAULT_REACH_MULTIPLIER,
            branded_keywords: DEFAULT_BRANDED_KEYWORDS
                .iter()
                .map(|k| (*k).to_string())
                .collect(),
        }
    }
}

impl MetricsSettings {
    #[must_use]
    pub fn with_reach_multiplier(mut self, multiplier: f64) -> Self {
        self.reach_multiplier = multiplier;
        self
    }

    /// Replaces the keyword list. Keywords are lowercased and blanks dropped.
    #[must_use]
    pub fn with_branded_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.branded_keywords = keywords
            .into_iter()
            .map(|k| k.as_ref().trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_carries_ten_keywords_and_double_reach() {
        let settings = MetricsSettings::default();
        assert_eq!(settings.branded_keywords.len(), 10);
        assert!((settings.reach_multiplier - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn custom_keywords_are_normalised() {
        let settings = MetricsSettings::default().with_branded_keywords(["  #AD ", "", "Gifted"]);
        assert_eq!(settings.branded_keywords, vec!["#ad", "gifted"]);
    }
}
