//! Wrappers around the external tools that acquire chat, captions and video.

use std::{
    path::{Path, PathBuf},
    sync::LazyLock,
};

use regex::Regex;
use tokio::{fs, process::Command};
use tracing::{debug, warn};

use crate::{
    error::{ChatclipError, Result},
    parsers::Platform,
    types::TimeRange,
};

const CLIP_FORMAT: &str = "bestvideo[ext=mp4]+bestaudio[ext=m4a]/best[ext=mp4]/best";

static TWITCH_VOD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"twitch\.tv/videos/(\d+)").unwrap());

/// Guess the platform from a URL. Bare numeric ids are Twitch VODs.
pub fn detect_platform(source: &str) -> Platform {
    if source.contains("twitch.tv") || twitch_vod_id(source).is_some() {
        Platform::Twitch
    } else {
        Platform::Youtube
    }
}

pub fn twitch_vod_id(source: &str) -> Option<String> {
    if !source.is_empty() && source.chars().all(|c| c.is_ascii_digit()) {
        return Some(source.to_string());
    }
    TWITCH_VOD
        .captures(source)
        .map(|caps| caps[1].to_string())
}

/// A URL yt-dlp can fetch video from. Bare VOD ids become Twitch links.
pub fn video_url(source: &str) -> String {
    if !source.is_empty() && source.chars().all(|c| c.is_ascii_digit()) {
        format!("https://www.twitch.tv/videos/{source}")
    } else {
        source.to_string()
    }
}

fn stderr_of(output: &std::process::Output) -> String {
    String::from_utf8_lossy(&output.stderr).trim().to_string()
}

/// Download the live chat replay and English captions using yt-dlp,
/// skipping the video itself.
pub async fn download_chat_and_subs(url: &str, cache_dir: &Path) -> Result<()> {
    let output_template = cache_dir.join("stream");
    let output = Command::new("yt-dlp")
        .arg(url)
        .arg("--skip-download")
        .arg("--write-subs")
        .arg("--write-auto-subs")
        .arg("--sub-langs")
        .arg("en,live_chat")
        .arg("--quiet")
        .arg("-o")
        .arg(&output_template)
        .output()
        .await?;

    if !output.status.success() {
        return Err(ChatclipError::DownloadFailed {
            url: url.to_string(),
            reason: stderr_of(&output),
        });
    }
    Ok(())
}

/// Download a Twitch VOD's chat using TwitchDownloaderCLI
pub async fn download_twitch_chat(vod_id: &str, output_path: &Path) -> Result<()> {
    let output = Command::new("TwitchDownloaderCLI")
        .arg("chatdownload")
        .arg("--id")
        .arg(vod_id)
        .arg("-o")
        .arg(output_path)
        .output()
        .await?;

    if !output.status.success() || !output_path.exists() {
        return Err(ChatclipError::DownloadFailed {
            url: vod_id.to_string(),
            reason: stderr_of(&output),
        });
    }
    Ok(())
}

/// Download only `range` of the video, cutting on forced keyframes
pub async fn download_clip(url: &str, range: &TimeRange, output_stem: &Path) -> Result<PathBuf> {
    let mut template = output_stem.as_os_str().to_owned();
    template.push(".%(ext)s");

    let output = Command::new("yt-dlp")
        .arg(url)
        .arg("--print")
        .arg("after_move:filepath")
        .arg("-f")
        .arg(CLIP_FORMAT)
        .arg("--download-sections")
        .arg(format!(
            "*{:.3}-{:.3}",
            range.start_seconds, range.end_seconds
        ))
        .arg("--force-keyframes-at-cuts")
        .arg("-o")
        .arg(&template)
        .output()
        .await?;

    if !output.status.success() {
        return Err(ChatclipError::DownloadFailed {
            url: url.to_string(),
            reason: stderr_of(&output),
        });
    }

    let stdout_str = String::from_utf8_lossy(output.stdout.as_slice());
    printed_filepath(&stdout_str).ok_or_else(|| ChatclipError::DownloadFailed {
        url: url.to_string(),
        reason: "yt-dlp did not report a downloaded file".to_string(),
    })
}

/// Last non-empty line of `--print after_move:filepath` output.
fn printed_filepath(stdout: &str) -> Option<PathBuf> {
    stdout
        .lines()
        .map(str::trim)
        .rev()
        .find(|line| !line.is_empty())
        .map(PathBuf::from)
}

/// Parse an ffprobe rate such as `30000/1001` or `60`
pub fn parse_frame_rate(raw: &str) -> Option<f64> {
    let raw = raw.trim();
    let fps = match raw.split_once('/') {
        Some((num, den)) => {
            let num: f64 = num.trim().parse().ok()?;
            let den: f64 = den.trim().parse().ok()?;
            if den == 0.0 {
                return None;
            }
            num / den
        }
        None => raw.parse().ok()?,
    };
    (fps.is_finite() && fps > 0.0).then_some(fps)
}

/// Read the average frame rate of the first video stream using ffprobe
pub async fn probe_frame_rate(video_path: &Path) -> Result<f64> {
    let output = Command::new("ffprobe")
        .arg("-v")
        .arg("error")
        .arg("-select_streams")
        .arg("v:0")
        .arg("-show_entries")
        .arg("stream=avg_frame_rate")
        .arg("-of")
        .arg("default=noprint_wrappers=1:nokey=1")
        .arg(video_path)
        .output()
        .await?;

    if !output.status.success() {
        return Err(ChatclipError::ProbeFailed {
            path: video_path.to_path_buf(),
            reason: stderr_of(&output),
        });
    }

    let stdout_str = String::from_utf8_lossy(output.stdout.as_slice());
    let raw = stdout_str.trim();
    let fps = parse_frame_rate(raw).ok_or_else(|| ChatclipError::ProbeFailed {
        path: video_path.to_path_buf(),
        reason: format!("unreadable frame rate {raw:?}"),
    })?;
    debug!(path = %video_path.display(), fps, "probed frame rate");
    Ok(fps)
}

/// Re-encode a raw clip to constant frame rate H.264 with AAC audio using
/// ffmpeg. The raw input is removed once the output is written.
pub async fn normalize_clip(input_path: &Path, output_path: &Path, fps: f64) -> Result<()> {
    let output = Command::new("ffmpeg")
        .arg("-y")
        .arg("-i")
        .arg(input_path)
        .arg("-r")
        .arg(format!("{fps}"))
        .arg("-c:v")
        .arg("libx264")
        .arg("-crf")
        .arg("18")
        .arg("-preset")
        .arg("fast")
        .arg("-c:a")
        .arg("aac")
        .arg("-ar")
        .arg("48000")
        .arg(output_path)
        .output()
        .await?;

    if !output.status.success() {
        return Err(ChatclipError::TranscodeFailed {
            path: input_path.to_path_buf(),
            reason: stderr_of(&output),
        });
    }

    if let Err(e) = fs::remove_file(input_path).await {
        warn!(path = %input_path.display(), error = %e, "could not remove raw clip");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_rates_from_ffprobe() {
        assert_eq!(parse_frame_rate("60/1"), Some(60.0));
        assert_eq!(parse_frame_rate("25"), Some(25.0));
        let ntsc = parse_frame_rate("30000/1001\n").unwrap();
        assert!((ntsc - 29.97).abs() < 0.001);
        assert_eq!(parse_frame_rate("0/0"), None);
        assert_eq!(parse_frame_rate("N/A"), None);
        assert_eq!(parse_frame_rate(""), None);
    }

    #[test]
    fn platform_from_source() {
        assert_eq!(
            detect_platform("https://www.twitch.tv/videos/2222"),
            Platform::Twitch
        );
        assert_eq!(detect_platform("2222"), Platform::Twitch);
        assert_eq!(
            detect_platform("https://www.youtube.com/watch?v=x"),
            Platform::Youtube
        );
    }

    #[test]
    fn clip_path_comes_from_last_printed_line() {
        assert_eq!(
            printed_filepath("[info] merging\n/cache/clips/raw_clip_001.mp4\n\n"),
            Some(PathBuf::from("/cache/clips/raw_clip_001.mp4"))
        );
        assert_eq!(printed_filepath(""), None);
        assert_eq!(printed_filepath("  \n\n"), None);
    }

    #[test]
    fn bare_vod_id_becomes_twitch_url() {
        assert_eq!(video_url("2222"), "https://www.twitch.tv/videos/2222");
        assert_eq!(
            video_url("https://www.youtube.com/watch?v=x"),
            "https://www.youtube.com/watch?v=x"
        );
    }

    #[test]
    fn vod_id_extraction() {
        assert_eq!(
            twitch_vod_id("https://www.twitch.tv/videos/123456?t=1h"),
            Some("123456".to_string())
        );
        assert_eq!(twitch_vod_id("987"), Some("987".to_string()));
        assert_eq!(twitch_vod_id("https://www.twitch.tv/somechannel"), None);
    }
}
