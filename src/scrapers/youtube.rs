//! YouTube uploads adapter.
//!
//! Two Data API calls per whitelisted channel: resolve the channel's uploads
//! playlist, then take its latest items and keep the keyword matches. The
//! API key is the same Google key the Gemini calls use.

use super::ScanError;
use crate::models::VideoItem;
use crate::utils::mentions_keyword;
use serde::Deserialize;
use tracing::{info, instrument};

/// Uploads taken per channel.
const MAX_RESULTS: usize = 5;

/// Description length kept for feed display.
const DESCRIPTION_CHARS: usize = 150;

#[derive(Debug, Deserialize)]
struct ChannelListResponse {
    #[serde(default)]
    items: Vec<ChannelItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChannelItem {
    content_details: ContentDetails,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ContentDetails {
    related_playlists: RelatedPlaylists,
}

#[derive(Debug, Deserialize)]
struct RelatedPlaylists {
    uploads: String,
}

#[derive(Debug, Deserialize)]
struct PlaylistItemsResponse {
    #[serde(default)]
    items: Vec<PlaylistItem>,
}

#[derive(Debug, Deserialize)]
struct PlaylistItem {
    snippet: Snippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Snippet {
    title: String,
    #[serde(default)]
    description: String,
    channel_title: String,
    published_at: String,
    resource_id: ResourceId,
    #[serde(default)]
    thumbnails: Thumbnails,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResourceId {
    video_id: String,
}

#[derive(Debug, Default, Deserialize)]
struct Thumbnails {
    #[serde(default)]
    high: Option<Thumbnail>,
}

#[derive(Debug, Deserialize)]
struct Thumbnail {
    url: String,
}

/// Fetch a channel's latest uploads that mention the beat.
#[instrument(level = "info", skip_all, fields(channel_id = %channel_id))]
pub async fn fetch_channel_uploads(
    http: &reqwest::Client,
    api_key: &str,
    channel_id: &str,
) -> Result<Vec<VideoItem>, ScanError> {
    let channel_url = format!(
        "https://www.googleapis.com/youtube/v3/channels?id={}&part=contentDetails&key={}",
        urlencoding::encode(channel_id),
        api_key
    );
    let channels: ChannelListResponse = http
        .get(&channel_url)
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;
    let uploads_id = channels
        .items
        .into_iter()
        .next()
        .map(|c| c.content_details.related_playlists.uploads)
        .ok_or_else(|| ScanError::Shape(format!("channel {} not found", channel_id)))?;

    let playlist_url = format!(
        "https://www.googleapis.com/youtube/v3/playlistItems?playlistId={}&part=snippet&maxResults={}&key={}",
        urlencoding::encode(&uploads_id),
        MAX_RESULTS,
        api_key
    );
    let playlist: PlaylistItemsResponse = http
        .get(&playlist_url)
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    let videos: Vec<VideoItem> = playlist
        .items
        .into_iter()
        .filter_map(|item| {
            let snippet = item.snippet;
            if !mentions_keyword(&format!("{} {}", snippet.title, snippet.description)) {
                return None;
            }
            Some(VideoItem {
                url: format!("https://www.youtube.com/watch?v={}", snippet.resource_id.video_id),
                thumbnail: snippet
                    .thumbnails
                    .high
                    .map(|t| t.url)
                    .unwrap_or_default(),
                channel: snippet.channel_title,
                description: snippet.description.chars().take(DESCRIPTION_CHARS).collect(),
                title: snippet.title,
                publishedAt: snippet.published_at,
            })
        })
        .collect();

    info!(count = videos.len(), "Channel uploads fetched");
    Ok(videos)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_response_resolves_uploads_playlist() {
        let json = r#"{
            "items": [
                {"contentDetails": {"relatedPlaylists": {"uploads": "UU123abc"}}}
            ]
        }"#;
        let parsed: ChannelListResponse = serde_json::from_str(json).unwrap();
        assert_eq!(
            parsed.items[0].content_details.related_playlists.uploads,
            "UU123abc"
        );
    }

    #[test]
    fn test_playlist_response_parses_snippet() {
        let json = r#"{
            "items": [{
                "snippet": {
                    "title": "OpenClaw deep dive",
                    "description": "All about openclaw internals",
                    "channelTitle": "Claw Channel",
                    "publishedAt": "2026-01-10T00:00:00Z",
                    "resourceId": {"videoId": "abc123"},
                    "thumbnails": {"high": {"url": "https://i.ytimg.com/vi/abc123/hq.jpg"}}
                }
            }]
        }"#;
        let parsed: PlaylistItemsResponse = serde_json::from_str(json).unwrap();
        let snippet = &parsed.items[0].snippet;
        assert_eq!(snippet.resource_id.video_id, "abc123");
        assert_eq!(snippet.channel_title, "Claw Channel");
    }

    #[test]
    fn test_playlist_snippet_tolerates_missing_thumbnails() {
        let json = r#"{
            "items": [{
                "snippet": {
                    "title": "t",
                    "channelTitle": "c",
                    "publishedAt": "2026-01-10T00:00:00Z",
                    "resourceId": {"videoId": "v"}
                }
            }]
        }"#;
        let parsed: PlaylistItemsResponse = serde_json::from_str(json).unwrap();
        assert!(parsed.items[0].snippet.thumbnails.high.is_none());
    }
}
