//! Turns fetched records into rendered report rows.

use infscope_core::{Platform, ReportRow, NOT_AVAILABLE, UNKNOWN};
use infscope_metrics::{
    average_views, branded_average_views, detect_language, estimated_reach, extract_location,
    format_count, parse_count, LanguageHint, MetricsSettings,
};
use infscope_scraper::{PostRecord, ProfileRecord};
use infscope_youtube::{ChannelRecord, VideoRecord};

pub(crate) fn instagram_row(
    handle: &str,
    record: &ProfileRecord,
    metrics: &MetricsSettings,
) -> ReportRow {
    let avg_views = average_views(&record.posts, post_views);
    let branded = branded_average_views(
        &record.posts,
        |p| p.alt_text.as_deref().into_iter().collect(),
        post_views,
        metrics,
    );

    ReportRow {
        platform: Platform::Instagram,
        handle: handle.to_string(),
        audience: record
            .followers
            .as_deref()
            .map_or_else(|| NOT_AVAILABLE.to_string(), follower_count),
        location: extract_location(&record.bio).unwrap_or_else(|| UNKNOWN.to_string()),
        language: detect_language(&record.bio, None).unwrap_or_else(|| UNKNOWN.to_string()),
        avg_views: render(avg_views),
        avg_reach: render(estimated_reach(avg_views, metrics)),
        avg_branded_views: render(branded),
    }
}

pub(crate) fn youtube_row(
    handle: &str,
    channel: &ChannelRecord,
    metrics: &MetricsSettings,
) -> ReportRow {
    let videos = &channel.recent_videos;
    let branded = branded_average_views(
        videos,
        |v| vec![v.snippet.title.as_str(), v.snippet.description.as_str()],
        video_views,
        metrics,
    );
    let snippet = &channel.snippet;
    let hint = LanguageHint {
        default_language: snippet.default_language.as_deref(),
        default_audio_language: snippet.default_audio_language.as_deref(),
    };

    ReportRow {
        platform: Platform::Youtube,
        handle: handle.to_string(),
        audience: channel
            .subscriber_count
            .as_deref()
            .map_or_else(|| NOT_AVAILABLE.to_string(), follower_count),
        location: snippet
            .country
            .clone()
            .unwrap_or_else(|| UNKNOWN.to_string()),
        language: detect_language(&snippet.description, Some(hint))
            .unwrap_or_else(|| UNKNOWN.to_string()),
        avg_views: render(average_views(videos, video_views)),
        // The Data API exposes no reach figure.
        avg_reach: NOT_AVAILABLE.to_string(),
        avg_branded_views: render(branded),
    }
}

fn post_views(post: &PostRecord) -> Option<&str> {
    post.view_count.as_deref()
}

fn video_views(video: &VideoRecord) -> Option<&str> {
    video.statistics.view_count.as_deref()
}

fn render(value: Option<f64>) -> String {
    value.map_or_else(|| NOT_AVAILABLE.to_string(), format_count)
}

/// `"12.3K followers"` becomes `"12,300"`; text that does not parse is kept as shown.
fn follower_count(raw: &str) -> String {
    let trimmed = raw.trim();
    let count = trimmed
        .to_lowercase()
        .strip_suffix("followers")
        .map_or_else(|| trimmed.to_string(), |c| c.trim().to_string());
    parse_count(&count).map_or_else(|| trimmed.to_string(), format_count)
}

#[cfg(test)]
mod tests {
    use infscope_core::PLACEHOLDER;
    use infscope_youtube::{ChannelSnippet, VideoSnippet, VideoStatistics};

    use super::*;

    fn post(alt: &str, views: Option<&str>) -> PostRecord {
        PostRecord {
            url: None,
            alt_text: Some(alt.to_string()),
            view_count: views.map(str::to_string),
        }
    }

    fn video(title: &str, description: &str, views: Option<&str>) -> VideoRecord {
        VideoRecord {
            id: title.to_string(),
            snippet: VideoSnippet {
                title: title.to_string(),
                description: description.to_string(),
                tags: Vec::new(),
            },
            statistics: VideoStatistics {
                view_count: views.map(str::to_string),
                ..VideoStatistics::default()
            },
        }
    }

    #[test]
    fn instagram_row_aggregates_posts() {
        let record = ProfileRecord {
            followers: Some("12.3K followers".to_string()),
            bio: "📍 Austin, TX. Brewing coffee and sharing recipes every single day".to_string(),
            posts: vec![
                post("Sponsored by Acme grinders", Some("1.2k views")),
                post("morning pour over", Some("3,000 views")),
                post("latte art", None),
            ],
        };
        let row = instagram_row("coffeeguy", &record, &MetricsSettings::default());

        assert_eq!(row.platform, Platform::Instagram);
        assert_eq!(row.audience, "12,300");
        assert_eq!(row.location, "Austin");
        assert_eq!(row.language, "English");
        assert_eq!(row.avg_views, "2,100");
        assert_eq!(row.avg_reach, "4,200");
        assert_eq!(row.avg_branded_views, "1,200");
    }

    #[test]
    fn instagram_row_without_data_renders_placeholders() {
        let record = ProfileRecord::default();
        let cells = instagram_row("ghost", &record, &MetricsSettings::default()).into_cells();
        assert_eq!(
            cells,
            vec![
                "Instagram",
                "ghost",
                NOT_AVAILABLE,
                UNKNOWN,
                UNKNOWN,
                NOT_AVAILABLE,
                NOT_AVAILABLE,
                NOT_AVAILABLE,
                PLACEHOLDER,
                PLACEHOLDER,
                PLACEHOLDER,
            ]
        );
    }

    #[test]
    fn reach_follows_configured_multiplier() {
        let record = ProfileRecord {
            posts: vec![post("x", Some("1000"))],
            ..ProfileRecord::default()
        };
        let metrics = MetricsSettings::default().with_reach_multiplier(3.0);
        assert_eq!(instagram_row("h", &record, &metrics).avg_reach, "3,000");
    }

    #[test]
    fn youtube_row_uses_channel_metadata() {
        let channel = ChannelRecord {
            channel_id: "UC123".to_string(),
            subscriber_count: Some("48200".to_string()),
            snippet: ChannelSnippet {
                title: "Coffee Guy".to_string(),
                description: "short".to_string(),
                country: Some("US".to_string()),
                default_language: Some("en-US".to_string()),
                ..ChannelSnippet::default()
            },
            recent_videos: vec![
                video("V60 guide", "", Some("3000")),
                video("Grinder review", "Paid partnership with Acme", Some("1200")),
            ],
        };
        let row = youtube_row("coffeeguy", &channel, &MetricsSettings::default());

        assert_eq!(row.platform, Platform::Youtube);
        assert_eq!(row.audience, "48,200");
        assert_eq!(row.location, "US");
        assert_eq!(row.language, "en");
        assert_eq!(row.avg_views, "2,100");
        assert_eq!(row.avg_reach, NOT_AVAILABLE);
        assert_eq!(row.avg_branded_views, "1,200");
    }

    #[test]
    fn youtube_row_skips_missing_view_counts() {
        let channel = ChannelRecord {
            channel_id: "UC1".to_string(),
            subscriber_count: None,
            snippet: ChannelSnippet::default(),
            recent_videos: vec![video("a", "", None), video("b", "", Some("500"))],
        };
        let row = youtube_row("h", &channel, &MetricsSettings::default());
        assert_eq!(row.audience, NOT_AVAILABLE);
        assert_eq!(row.location, UNKNOWN);
        assert_eq!(row.language, UNKNOWN);
        assert_eq!(row.avg_views, "500");
        assert_eq!(row.avg_branded_views, NOT_AVAILABLE);
    }

    #[test]
    fn follower_count_strips_label() {
        assert_eq!(follower_count("1,234 followers"), "1,234");
        assert_eq!(follower_count("2M Followers"), "2,000,000");
        assert_eq!(follower_count("lots"), "lots");
    }
}
