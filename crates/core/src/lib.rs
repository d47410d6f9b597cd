//! Chatclip Core Library
//!
//! Finds livestream highlights from chat activity: bucketizes chat, scores
//! sentiment, flags anomalous buckets, grows them into clip windows and
//! merges the result. Also parses chat/caption exports and writes reports
//! and editor hand-off files.

pub mod bucket;
pub mod cache;
pub mod config;
pub mod detect;
pub mod error;
pub mod expand;
pub mod export;
pub mod fetch;
pub mod format;
pub mod merge;
pub mod parsers;
pub mod pipeline;
pub mod report;
pub mod sentiment;
pub mod stats;
pub mod transcript;
pub mod types;

// Re-export commonly used items at crate root
pub use bucket::Bucketizer;
pub use cache::{
    find_chat_in_cache, find_transcript_in_cache, get_cache_dir, get_chat_path, get_clips_dir,
    get_report_path,
};
pub use config::{AnalysisConfig, BoundaryMode, DetectorKind, TextReplacement};
pub use detect::{MadPeakDetector, SignalDetector, ZScoreDetector, build_detector};
pub use error::{ChatclipError, Result};
pub use expand::BoundaryExpander;
pub use export::{render_edl, render_srt_markers, save_edl, save_srt_markers};
pub use fetch::{
    detect_platform, download_chat_and_subs, download_clip, download_twitch_chat, normalize_clip,
    probe_frame_rate, twitch_vod_id, video_url,
};
pub use format::{format_report_html, format_report_readable, format_timestamp};
pub use merge::merge_ranges;
pub use parsers::{Platform, load_chat, parse_chat};
pub use pipeline::{HighlightPipeline, process};
pub use report::{HighlightReport, load_report, save_report};
pub use sentiment::{PolarityModel, SentimentScorer, VaderModel};
pub use transcript::{apply_text_replacements, parse_vtt, segments_overlapping};
pub use types::{
    Bucket, BucketSeries, ChatEvent, Highlights, Peak, ReplacementCount, TimeRange,
    TranscriptSegment,
};
