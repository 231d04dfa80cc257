use std::sync::LazyLock;

use regex::Regex;

/// Ordered location cues; the first one that matches wins.
static LOCATION_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"📍\s*([^,\n]+)",
        r"(?i)\blocation:\s*([^,\n]+)",
        r"(?i)\bbased in\s*([^,\n]+)",
        r"(?i)\bfrom\s*([^,\n]+)",
        r"(?i)\bliving in\s*([^,\n]+)",
        r"🌍\s*([^,\n]+)",
        r"🌎\s*([^,\n]+)",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid regex"))
    .collect()
});

/// Pulls a free-text location out of a profile bio.
///
/// The captured text stops at the first comma or newline and is cut again at
/// the first `.`, `,` or `;`. Returns `None` when no cue matches or the
/// capture is blank.
#[must_use]
pub fn extract_location(bio: &str) -> Option<String> {
    if bio.trim().is_empty() {
        return None;
    }
    LOCATION_PATTERNS.iter().find_map(|re| {
        let captured = re.captures(bio)?.get(1)?.as_str().trim();
        let cut = captured
            .split(['.', ',', ';'])
            .next()
            .unwrap_or_default()
            .trim();
        (!cut.is_empty()).then(|| cut.to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pin_emoji_truncates_at_comma() {
        assert_eq!(extract_location("📍 Austin, TX").as_deref(), Some("Austin"));
    }

    #[test]
    fn prefixes_are_case_insensitive() {
        assert_eq!(
            extract_location("LOCATION: Lisbon\nfilm + coffee").as_deref(),
            Some("Lisbon")
        );
        assert_eq!(
            extract_location("dog mom. based in Denver; hiking").as_deref(),
            Some("Denver")
        );
        assert_eq!(
            extract_location("Living in Tokyo. DM for collabs").as_deref(),
            Some("Tokyo")
        );
    }

    #[test]
    fn earlier_pattern_wins() {
        let bio = "From Ohio\n📍 Brooklyn, NY";
        assert_eq!(extract_location(bio).as_deref(), Some("Brooklyn"));
    }

    #[test]
    fn globe_emoji_is_last_resort() {
        assert_eq!(extract_location("🌍 Nairobi").as_deref(), Some("Nairobi"));
    }

    #[test]
    fn from_needs_a_word_boundary() {
        assert_eq!(extract_location("wherefrom nowhere"), None);
    }

    #[test]
    fn no_cue_is_unknown() {
        assert_eq!(extract_location(""), None);
        assert_eq!(extract_location("coffee, cats and code"), None);
    }
}
