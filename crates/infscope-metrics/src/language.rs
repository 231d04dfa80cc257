//! Content-language resolution.
//!
//! Platform-declared metadata wins; otherwise the text itself is classified
//! with `whatlang`.

use whatlang::Lang;

/// Text shorter than this (in characters, after trimming) is not classified.
const MIN_DETECTION_CHARS: usize = 20;

/// Language metadata a platform declares for a channel or profile.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LanguageHint<'a> {
    pub default_language: Option<&'a str>,
    pub default_audio_language: Option<&'a str>,
}

/// Resolves the content language of `text`.
///
/// Declared languages are returned as their primary subtag (`en-US` becomes
/// `en`). Detected languages are returned as a display name when known and as
/// the ISO 639-1 code otherwise (`nl`, `tr`).
#[must_use]
pub fn detect_language(text: &str, hint: Option<LanguageHint<'_>>) -> Option<String> {
    if let Some(hint) = hint {
        let declared = [hint.default_language, hint.default_audio_language]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|tag| !tag.is_empty());
        if let Some(tag) = declared {
            return tag.split('-').next().map(str::to_string);
        }
    }

    let text = text.trim();
    if text.chars().count() < MIN_DETECTION_CHARS {
        return None;
    }

    let info = whatlang::detect(text)?;
    let code = iso_639_1(info.lang());
    Some(display_name(code).map_or_else(|| code.to_string(), str::to_string))
}

/// ISO 639-3 codes `whatlang` reports, paired with their ISO 639-1 form.
const ISO_639_3_TO_1: &[(&str, &str)] = &[
    ("epo", "eo"),
    ("eng", "en"),
    ("rus", "ru"),
    ("cmn", "zh-cn"),
    ("spa", "es"),
    ("por", "pt"),
    ("ita", "it"),
    ("ben", "bn"),
    ("fra", "fr"),
    ("deu", "de"),
    ("ukr", "uk"),
    ("kat", "ka"),
    ("ara", "ar"),
    ("hin", "hi"),
    ("jpn", "ja"),
    ("heb", "he"),
    ("yid", "yi"),
    ("pol", "pl"),
    ("amh", "am"),
    ("jav", "jv"),
    ("kor", "ko"),
    ("nob", "no"),
    ("dan", "da"),
    ("swe", "sv"),
    ("fin", "fi"),
    ("tur", "tr"),
    ("nld", "nl"),
    ("hun", "hu"),
    ("ces", "cs"),
    ("ell", "el"),
    ("bul", "bg"),
    ("bel", "be"),
    ("mar", "mr"),
    ("kan", "kn"),
    ("ron", "ro"),
    ("slv", "sl"),
    ("hrv", "hr"),
    ("srp", "sr"),
    ("mkd", "mk"),
    ("lit", "lt"),
    ("lav", "lv"),
    ("est", "et"),
    ("tam", "ta"),
    ("vie", "vi"),
    ("urd", "ur"),
    ("tha", "th"),
    ("guj", "gu"),
    ("uzb", "uz"),
    ("pan", "pa"),
    ("aze", "az"),
    ("ind", "id"),
    ("tel", "te"),
    ("pes", "fa"),
    ("mal", "ml"),
    ("ori", "or"),
    ("mya", "my"),
    ("nep", "ne"),
    ("sin", "si"),
    ("khm", "km"),
    ("tuk", "tk"),
    ("aka", "ak"),
    ("zul", "zu"),
    ("sna", "sn"),
    ("afr", "af"),
    ("lat", "la"),
    ("slk", "sk"),
    ("cat", "ca"),
    ("tgl", "tl"),
    ("hye", "hy"),
];

fn iso_639_1(lang: Lang) -> &'static str {
    let code = lang.code();
    ISO_639_3_TO_1
        .iter()
        .find(|(three, _)| *three == code)
        .map_or(code, |&(_, two)| two)
}

fn display_name(code: &str) -> Option<&'static str> {
    match code {
        "en" => Some("English"),
        "es" => Some("Spanish"),
        "fr" => Some("French"),
        "de" => Some("German"),
        "it" => Some("Italian"),
        "pt" => Some("Portuguese"),
        "ru" => Some("Russian"),
        "ja" => Some("Japanese"),
        "ko" => Some("Korean"),
        "zh-cn" => Some("Chinese"),
        "hi" => Some("Hindi"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_text_is_unknown() {
        assert_eq!(detect_language("", None), None);
        assert_eq!(detect_language("    ", None), None);
    }

    #[test]
    fn short_text_is_unknown() {
        assert_eq!(detect_language("hello you!", None), None);
    }

    #[test]
    fn declared_language_is_normalised() {
        let hint = LanguageHint {
            default_language: Some("en-US"),
            default_audio_language: Some("fr"),
        };
        assert_eq!(detect_language("", Some(hint)).as_deref(), Some("en"));
    }

    #[test]
    fn audio_language_used_when_default_missing() {
        let hint = LanguageHint {
            default_language: Some(" "),
            default_audio_language: Some("pt-BR"),
        };
        assert_eq!(detect_language("", Some(hint)).as_deref(), Some("pt"));
    }

    #[test]
    fn empty_hint_falls_back_to_text() {
        let hint = LanguageHint::default();
        assert_eq!(detect_language("short", Some(hint)), None);
    }

    #[test]
    fn english_bio_is_detected() {
        let bio = "Travel photographer sharing stories from the road, \
                   the people I meet and the food I cannot stop eating.";
        assert_eq!(detect_language(bio, None).as_deref(), Some("English"));
    }

    #[test]
    fn spanish_bio_is_detected() {
        let bio = "Cocinera y viajera. Comparto recetas tradicionales de mi abuela \
                   y los mercados que visito cada semana en la ciudad.";
        assert_eq!(detect_language(bio, None).as_deref(), Some("Spanish"));
    }

    #[test]
    fn display_table_covers_mapped_codes() {
        assert_eq!(display_name("zh-cn"), Some("Chinese"));
        assert_eq!(display_name("nl"), None);
        assert_eq!(iso_639_1(Lang::Deu), "de");
        assert_eq!(iso_639_1(Lang::Cmn), "zh-cn");
    }

    #[test]
    fn unmapped_languages_use_two_letter_codes() {
        assert_eq!(iso_639_1(Lang::Nld), "nl");
        assert_eq!(iso_639_1(Lang::Tur), "tr");
        assert_eq!(iso_639_1(Lang::Nob), "no");
        assert_eq!(iso_639_1(Lang::Pes), "fa");
    }

    #[test]
    fn dutch_bio_reports_iso_code() {
        let bio = "Ik woon al jaren in Amsterdam en fotografeer graag de grachten, \
                   de fietsen en de mensen die elke dag langs mijn huis lopen. \
                   Het is niet altijd makkelijk, maar het is wel heel mooi.";
        assert_eq!(detect_language(bio, None).as_deref(), Some("nl"));
    }

    #[test]
    fn every_detectable_language_has_two_letter_code() {
        for lang in Lang::all() {
            let code = iso_639_1(*lang);
            assert!(code.len() == 2 || code == "zh-cn", "{lang:?} -> {code}");
        }
    }
}
