//! YouTube URL helpers
//!
//! Video links are summarized natively by the backend, so they must be
//! recognized before any content fetch and normalized to the canonical
//! `watch?v=` form the backend accepts.

use url::Url;

const YOUTUBE_HOSTS: [&str; 4] = [
    "youtube.com",
    "www.youtube.com",
    "m.youtube.com",
    "music.youtube.com",
];

/// Check if `url` points to a YouTube video
pub fn is_youtube_url(url: &str) -> bool {
    video_id(url).is_some()
}

/// Normalize a YouTube video URL to `https://www.youtube.com/watch?v={id}`.
///
/// Returns the input unchanged when no video id can be found.
pub fn normalize_youtube_url(url: &str) -> String {
    match video_id(url) {
        Some(id) => format!("https://www.youtube.com/watch?v={}", id),
        None => url.to_string(),
    }
}

fn video_id(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?.to_lowercase();

    let id = if host == "youtu.be" {
        parsed.path_segments()?.next().map(str::to_string)
    } else if YOUTUBE_HOSTS.contains(&host.as_str()) {
        let mut segments = parsed.path_segments()?;
        match segments.next() {
            Some("watch") => parsed
                .query_pairs()
                .find(|(k, _)| k == "v")
                .map(|(_, v)| v.into_owned()),
            Some("shorts") | Some("embed") | Some("live") | Some("v") => {
                segments.next().map(str::to_string)
            }
            _ => None,
        }
    } else {
        None
    };

    id.filter(|id| !id.is_empty())
}
