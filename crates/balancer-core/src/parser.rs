//! Video URL parsing and validation.

use std::sync::OnceLock;

use regex::Regex;
use url::Url;

use crate::error::{BalancerError, BalancerResult};
use crate::models::ParsedVideoUrl;

static SERVER_LABEL_REGEX: OnceLock<Regex> = OnceLock::new();
static VIDEO_PATH_REGEX: OnceLock<Regex> = OnceLock::new();

fn server_label_regex() -> &'static Regex {
    SERVER_LABEL_REGEX
        .get_or_init(|| Regex::new(r"^([a-zA-Z0-9]+)\.").expect("server label regex is valid"))
}

fn video_path_regex() -> &'static Regex {
    VIDEO_PATH_REGEX
        .get_or_init(|| Regex::new(r"^/video/\d+/[a-zA-Z0-9_-]").expect("video path regex is valid"))
}

/// Extract the routing-relevant fields from a video URL.
///
/// Expected shape: `http://s1.origin-cluster/video/1488/xcg2djHckad.m3u8`.
/// The leading hostname label becomes the server name; the path must look
/// like `/video/<id>/<filename>`. Query strings and fragments are ignored
/// here — the caller keeps the original string for the origin fallback.
///
/// Deterministic, no side effects.
pub fn parse_video_url(video_url: &str) -> BalancerResult<ParsedVideoUrl> {
    let parsed = Url::parse(video_url)
        .map_err(|err| BalancerError::InvalidUrl(format!("{video_url}: {err}")))?;

    let hostname = parsed
        .host_str()
        .ok_or_else(|| BalancerError::InvalidUrl(format!("{video_url}: missing hostname")))?;

    let captures = server_label_regex().captures(hostname).ok_or_else(|| {
        BalancerError::InvalidUrl(format!("invalid server format in hostname: {hostname}"))
    })?;
    let server = captures[1].to_string();

    let path = parsed.path();
    if path.is_empty() || !path.starts_with('/') {
        return Err(BalancerError::InvalidUrl(format!("{video_url}: invalid path")));
    }
    if !video_path_regex().is_match(path) {
        return Err(BalancerError::InvalidUrl(format!(
            "path does not match expected video format: {path}"
        )));
    }

    Ok(ParsedVideoUrl {
        server,
        path: path.to_string(),
        hostname: hostname.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_well_formed_video_url() {
        let parsed = parse_video_url("http://s1.origin-cluster/video/1488/xcg2djHckad.m3u8")
            .expect("URL should parse");
        assert_eq!(parsed.server, "s1");
        assert_eq!(parsed.path, "/video/1488/xcg2djHckad.m3u8");
        assert_eq!(parsed.hostname, "s1.origin-cluster");
    }

    #[test]
    fn query_and_fragment_are_ignored() {
        let parsed = parse_video_url("http://s2.cluster.local/video/7/clip.m3u8?token=abc#t=30")
            .expect("URL should parse");
        assert_eq!(parsed.server, "s2");
        assert_eq!(parsed.path, "/video/7/clip.m3u8");
    }

    #[test]
    fn rejects_hostname_without_dotted_label() {
        let err = parse_video_url("http://localhost/video/1/a.m3u8").unwrap_err();
        assert!(matches!(err, BalancerError::InvalidUrl(_)), "got {err:?}");
    }

    #[test]
    fn rejects_relative_and_garbage_input() {
        assert!(parse_video_url("/video/1/a.m3u8").is_err());
        assert!(parse_video_url("not a url at all").is_err());
    }

    #[test]
    fn rejects_path_outside_video_prefix() {
        let err = parse_video_url("http://s1.origin-cluster/stream/1488/a.m3u8").unwrap_err();
        assert!(matches!(err, BalancerError::InvalidUrl(_)));
    }

    #[test]
    fn rejects_path_without_filename_start() {
        // `/video/123/` has no filename character after the id segment
        assert!(parse_video_url("http://s1.origin-cluster/video/123/").is_err());
    }

    #[test]
    fn rejects_non_numeric_video_id() {
        assert!(parse_video_url("http://s1.origin-cluster/video/abc/a.m3u8").is_err());
    }
}
