//! Keyword-based detection of sponsored content.

use crate::settings::MetricsSettings;
use crate::views::average_views;

/// `true` when any of `fields` contains one of the configured keywords.
#[must_use]
pub fn is_branded(fields: &[&str], settings: &MetricsSettings) -> bool {
    fields.iter().any(|field| {
        let lowered = field.to_lowercase();
        settings
            .branded_keywords
            .iter()
            .any(|kw| lowered.contains(kw.as_str()))
    })
}

/// Items whose text fields mark them as branded, in input order.
///
/// `text_fields` returns the fields to inspect for one item, e.g. the alt text
/// of a post or the title and description of a video.
pub fn branded_subset<'a, T, F>(
    items: &'a [T],
    text_fields: F,
    settings: &MetricsSettings,
) -> Vec<&'a T>
where
    F: Fn(&T) -> Vec<&str>,
{
    items
        .iter()
        .filter(|item| is_branded(&text_fields(*item), settings))
        .collect()
}

/// [`average_views`] over the [`branded_subset`] of `items`.
pub fn branded_average_views<T, F, V>(
    items: &[T],
    text_fields: F,
    views: V,
    settings: &MetricsSettings,
) -> Option<f64>
where
    F: Fn(&T) -> Vec<&str>,
    V: Fn(&T) -> Option<&str>,
{
    let subset = branded_subset(items, text_fields, settings);
    average_views(&subset, |item| views(*item))
}
