use std::{
    hash::{DefaultHasher, Hash, Hasher},
    path::{Path, PathBuf},
};

use crate::parsers::Platform;

/// Get the cache directory for a given source URL
pub fn get_cache_dir(url: &str) -> PathBuf {
    let mut hasher = DefaultHasher::new();
    url.hash(&mut hasher);
    let url_hash = hasher.finish();
    let cache_dir = get_root_cache_dir();

    cache_dir.join(url_hash.to_string())
}

pub fn get_root_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join("chatclip")
}

/// Get the path a chat download is written to
pub fn get_chat_path(cache_dir: &Path, platform: Platform) -> PathBuf {
    match platform {
        Platform::Youtube => cache_dir.join("stream.live_chat.json"),
        Platform::Twitch => cache_dir.join("twitch_chat.json"),
    }
}

/// Find a chat log in the cache directory. yt-dlp names the replay after
/// its output template; TwitchDownloaderCLI writes exactly where asked.
pub fn find_chat_in_cache(cache_dir: &Path, platform: Platform) -> Option<PathBuf> {
    let expected = get_chat_path(cache_dir, platform);
    if expected.is_file() {
        return Some(expected);
    }
    match platform {
        Platform::Youtube => find_by_suffix(cache_dir, ".live_chat.json"),
        Platform::Twitch => None,
    }
}

/// Find English captions in the cache directory
pub fn find_transcript_in_cache(cache_dir: &Path) -> Option<PathBuf> {
    find_by_suffix(cache_dir, ".en.vtt").or_else(|| find_by_suffix(cache_dir, ".vtt"))
}

fn find_by_suffix(cache_dir: &Path, suffix: &str) -> Option<PathBuf> {
    let Ok(entries) = std::fs::read_dir(cache_dir) else {
        return None;
    };

    let mut matches: Vec<PathBuf> = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| {
            path.file_name()
                .map(|name| name.to_string_lossy().ends_with(suffix))
                .unwrap_or(false)
        })
        .collect();
    matches.sort();
    matches.into_iter().next()
}

/// Get the path for a cached report file (detector and boundary aware)
pub fn get_report_path(cache_dir: &Path, detector: &str, boundary: &str) -> PathBuf {
    cache_dir.join(format!("report_{}_{}.json", detector, boundary))
}

pub fn get_clips_dir(cache_dir: &Path) -> PathBuf {
    cache_dir.join("clips")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_dir_is_stable_per_url() {
        let a = get_cache_dir("https://www.youtube.com/watch?v=abc");
        let b = get_cache_dir("https://www.youtube.com/watch?v=abc");
        let c = get_cache_dir("https://www.twitch.tv/videos/123");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a.starts_with(get_root_cache_dir()));
    }

    #[test]
    fn finds_downloaded_artifacts_by_suffix() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(find_chat_in_cache(dir.path(), Platform::Youtube), None);

        std::fs::write(dir.path().join("abc123.live_chat.json"), "").unwrap();
        std::fs::write(dir.path().join("abc123.en.vtt"), "WEBVTT").unwrap();
        std::fs::write(dir.path().join("abc123.de.vtt"), "WEBVTT").unwrap();

        assert_eq!(
            find_chat_in_cache(dir.path(), Platform::Youtube),
            Some(dir.path().join("abc123.live_chat.json"))
        );
        assert_eq!(find_chat_in_cache(dir.path(), Platform::Twitch), None);
        assert_eq!(
            find_transcript_in_cache(dir.path()),
            Some(dir.path().join("abc123.en.vtt"))
        );
    }

    #[test]
    fn twitch_lookup_ignores_youtube_replays() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("stream.live_chat.json"), "").unwrap();
        std::fs::write(dir.path().join("other_chat.json"), "").unwrap();
        assert_eq!(find_chat_in_cache(dir.path(), Platform::Twitch), None);

        std::fs::write(get_chat_path(dir.path(), Platform::Twitch), "{}").unwrap();
        assert_eq!(
            find_chat_in_cache(dir.path(), Platform::Twitch),
            Some(dir.path().join("twitch_chat.json"))
        );
        assert_eq!(
            find_chat_in_cache(dir.path(), Platform::Youtube),
            Some(dir.path().join("stream.live_chat.json"))
        );
    }

    #[test]
    fn report_path_names_strategy() {
        let path = get_report_path(Path::new("/c"), "mad", "dynamic");
        assert_eq!(path, PathBuf::from("/c/report_mad_dynamic.json"));
    }
}
