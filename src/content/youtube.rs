//! YouTube URL helpers for course previews and library thumbnails.

use serde::{Deserialize, Serialize};
use url::Url;
use utoipa::ToSchema;

const THUMBNAIL_BASE: &str = "https://img.youtube.com/vi";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ThumbnailQuality {
    /// `hqdefault.jpg`, always present.
    #[default]
    #[serde(rename = "hq", alias = "high")]
    High,
    /// `maxresdefault.jpg`, only present for HD uploads.
    Max,
}

impl ThumbnailQuality {
    const fn file_name(self) -> &'static str {
        match self {
            Self::High => "hqdefault.jpg",
            Self::Max => "maxresdefault.jpg",
        }
    }
}

/// Extract the video id from `youtube.com/watch?v=`, `/shorts/`, `/embed/`
/// and `youtu.be/` links. Returns `None` for anything else, including
/// strings that do not parse as absolute URLs.
#[must_use]
pub fn extract_video_id(youtube_url: Option<&str>) -> Option<String> {
    let parsed = Url::parse(youtube_url?).ok()?;
    let host = parsed.host_str()?;
    let host = host.strip_prefix("www.").unwrap_or(host);
    let path = parsed.path();

    let video_id = if host.contains("youtube.com") {
        if let Some(rest) = path.strip_prefix("/shorts/") {
            first_segment(rest)
        } else if let Some(rest) = path.strip_prefix("/embed/") {
            first_segment(rest)
        } else {
            parsed
                .query_pairs()
                .find(|(name, _)| name == "v")
                .map(|(_, value)| value.into_owned())
                .unwrap_or_default()
        }
    } else if host.contains("youtu.be") {
        first_segment(path.strip_prefix('/').unwrap_or(path))
    } else {
        String::new()
    };

    if video_id.is_empty() {
        None
    } else {
        Some(video_id)
    }
}

/// Thumbnail image URL for a YouTube link, or `None` when no id can be extracted.
#[must_use]
pub fn thumbnail_url(youtube_url: Option<&str>, quality: ThumbnailQuality) -> Option<String> {
    let video_id = extract_video_id(youtube_url)?;
    Some(format!(
        "{THUMBNAIL_BASE}/{video_id}/{}",
        quality.file_name()
    ))
}

fn first_segment(rest: &str) -> String {
    rest.split(['/', '?', '#', '&'])
        .next()
        .unwrap_or_default()
        .to_string()
}
