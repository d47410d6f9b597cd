use std::{
    io::{self, Write},
    path::{Path, PathBuf},
    time::{Duration, Instant},
};

use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::fs;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use chatclip_core::{
    AnalysisConfig, BoundaryMode, DetectorKind, HighlightPipeline, HighlightReport, Platform,
    TimeRange, TranscriptSegment, apply_text_replacements, detect_platform,
    download_chat_and_subs, download_clip, download_twitch_chat, find_chat_in_cache,
    find_transcript_in_cache, format_report_html, format_report_readable, get_cache_dir,
    get_chat_path, get_clips_dir, get_report_path, load_chat, load_report, normalize_clip,
    parse_vtt, probe_frame_rate, save_edl, save_report, save_srt_markers, twitch_vod_id,
    video_url,
};

const DEFAULT_FPS: f64 = 30.0;

fn format_duration(d: Duration) -> String {
    let secs = d.as_secs_f64();
    if secs < 60.0 {
        format!("{:.1}s", secs)
    } else {
        format!("{:.0}m {:.0}s", (secs / 60.0).floor(), secs % 60.0)
    }
}

/// CLI wrapper for Platform enum (needed for clap ValueEnum)
#[derive(Clone, Copy, ValueEnum)]
enum CliPlatform {
    Youtube,
    Twitch,
}

impl From<CliPlatform> for Platform {
    fn from(cli: CliPlatform) -> Self {
        match cli {
            CliPlatform::Youtube => Platform::Youtube,
            CliPlatform::Twitch => Platform::Twitch,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum CliDetector {
    Zscore,
    Mad,
}

impl From<CliDetector> for DetectorKind {
    fn from(cli: CliDetector) -> Self {
        match cli {
            CliDetector::Zscore => DetectorKind::ZScore,
            CliDetector::Mad => DetectorKind::Mad,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum CliBoundary {
    Fixed,
    Dynamic,
}

impl From<CliBoundary> for BoundaryMode {
    fn from(cli: CliBoundary) -> Self {
        match cli {
            CliBoundary::Fixed => BoundaryMode::Fixed,
            CliBoundary::Dynamic => BoundaryMode::Dynamic,
        }
    }
}

#[derive(Parser)]
#[command(name = "chatclip")]
#[command(about = "Find highlight moments in livestream chat replays and export them as clips")]
struct Cli {
    /// Stream URL, Twitch VOD id, or a local chat export
    source: String,

    /// Chat platform. Guessed from the source when omitted.
    #[arg(short, long)]
    platform: Option<CliPlatform>,

    /// WebVTT captions used for report excerpts
    #[arg(short, long)]
    transcript: Option<PathBuf>,

    /// Peak detection strategy
    #[arg(short, long)]
    detector: Option<CliDetector>,

    /// Boundary strategy. Defaults to the detector's pairing.
    #[arg(short, long)]
    boundary: Option<CliBoundary>,

    /// TOML file with analysis settings
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[arg(long)]
    z_threshold: Option<f64>,

    #[arg(long)]
    mad_multiplier: Option<f64>,

    /// Merge highlights closer than this many seconds
    #[arg(long)]
    merge_gap: Option<f64>,

    /// Write a CMX 3600 EDL
    #[arg(long)]
    edl: Option<PathBuf>,

    /// Write an SRT file with one marker per highlight
    #[arg(long)]
    srt: Option<PathBuf>,

    /// Write the report as a standalone HTML page
    #[arg(long)]
    html: Option<PathBuf>,

    /// Frame rate for the EDL. Probed from --video when omitted.
    #[arg(long)]
    fps: Option<f64>,

    /// Local copy of the stream video, referenced by the EDL
    #[arg(long)]
    video: Option<PathBuf>,

    /// Download and normalize each highlight as a clip
    #[arg(long)]
    clips: bool,

    /// Print the report as JSON. Progress goes to stderr.
    #[arg(long)]
    json: bool,

    /// Force re-processing even if cached files exist
    #[arg(short, long)]
    force: bool,

    /// Debug logging on stderr
    #[arg(short, long)]
    verbose: bool,
}

fn create_spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
            .template("{spinner:.cyan} {msg}")
            .unwrap(),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

fn init_logging(verbose: bool) -> Result<()> {
    let default_level = if verbose { "debug" } else { "warn" };
    let env_filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(default_level))?;

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .compact(),
        )
        .try_init()?;
    Ok(())
}

async fn load_config(cli: &Cli) -> Result<AnalysisConfig> {
    let mut config = match &cli.config {
        Some(path) => AnalysisConfig::load(path)
            .await
            .with_context(|| format!("reading {}", path.display()))?,
        None => AnalysisConfig::default(),
    };
    if let Some(detector) = cli.detector {
        config.detector = detector.into();
    }
    if let Some(boundary) = cli.boundary {
        config.boundary = Some(boundary.into());
    }
    if let Some(z) = cli.z_threshold {
        config.z_threshold = z;
    }
    if let Some(m) = cli.mad_multiplier {
        config.mad_threshold_multiplier = m;
    }
    if let Some(gap) = cli.merge_gap {
        config.merge_gap_threshold_seconds = Some(gap);
    }
    config.validate()?;
    Ok(config)
}

fn done(msg: &str, started: Instant) -> String {
    format!(
        "{} {} {}",
        style("✓").green().bold(),
        msg,
        style(format!("[{}]", format_duration(started.elapsed()))).dim()
    )
}

/// Progress lines share stdout with the readable report, but must stay off
/// it when stdout carries JSON.
fn write_status(
    out: &mut impl Write,
    err: &mut impl Write,
    json: bool,
    line: &str,
) -> io::Result<()> {
    if json {
        writeln!(err, "{line}")
    } else {
        writeln!(out, "{line}")
    }
}

fn status(json: bool, line: &str) {
    let _ = write_status(&mut io::stdout(), &mut io::stderr(), json, line);
}

fn cached(json: bool, msg: &str) {
    status(
        json,
        &format!(
            "{} {} {}",
            style("✓").green().bold(),
            msg,
            style("(cached)").dim()
        ),
    );
}

/// Resolves the chat export to a local file, downloading it if needed.
async fn acquire_chat(cli: &Cli, platform: Platform, cache_dir: &Path) -> Result<PathBuf> {
    let local = Path::new(&cli.source);
    if local.is_file() {
        return Ok(local.to_path_buf());
    }

    if !cli.force {
        if let Some(path) = find_chat_in_cache(cache_dir, platform) {
            cached(cli.json, "Chat downloaded");
            return Ok(path);
        }
    }

    let step_start = Instant::now();
    let spinner = create_spinner(&format!("Downloading {} chat...", platform.name()));
    let path = match platform {
        Platform::Youtube => {
            download_chat_and_subs(&cli.source, cache_dir).await?;
            find_chat_in_cache(cache_dir, platform)
                .with_context(|| format!("no live chat replay for {}", cli.source))?
        }
        Platform::Twitch => {
            let Some(vod_id) = twitch_vod_id(&cli.source) else {
                bail!("cannot find a Twitch VOD id in {}", cli.source);
            };
            let path = get_chat_path(cache_dir, platform);
            download_twitch_chat(&vod_id, &path).await?;
            path
        }
    };
    spinner.finish_with_message(done("Chat downloaded", step_start));
    Ok(path)
}

async fn load_transcript(cli: &Cli, cache_dir: &Path) -> Result<Option<Vec<TranscriptSegment>>> {
    let path = match &cli.transcript {
        Some(path) => Some(path.clone()),
        None => find_transcript_in_cache(cache_dir),
    };
    let Some(path) = path else {
        return Ok(None);
    };
    let content = fs::read_to_string(&path)
        .await
        .with_context(|| format!("reading {}", path.display()))?;
    Ok(Some(parse_vtt(&content)))
}

async fn resolve_fps(cli: &Cli) -> Result<f64> {
    if let Some(fps) = cli.fps {
        if !(fps > 0.0) {
            bail!("--fps must be positive, got {fps}");
        }
        return Ok(fps);
    }
    match &cli.video {
        Some(video) => Ok(probe_frame_rate(video).await?),
        None => {
            tracing::warn!("no --fps or --video given, assuming {DEFAULT_FPS} fps");
            Ok(DEFAULT_FPS)
        }
    }
}

async fn export_clips(
    url: &str,
    ranges: &[TimeRange],
    clips_dir: &Path,
    fps: f64,
) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(clips_dir).await?;
    let mut clips = Vec::new();
    for (i, range) in ranges.iter().enumerate() {
        let step_start = Instant::now();
        let spinner = create_spinner(&format!(
            "Downloading clip {}/{}...",
            i + 1,
            ranges.len()
        ));
        let raw_stem = clips_dir.join(format!("raw_clip_{:03}", i + 1));
        let raw = match download_clip(url, range, &raw_stem).await {
            Ok(raw) => raw,
            Err(e) => {
                spinner.finish_with_message(format!(
                    "{} Clip {} failed: {}",
                    style("✗").red().bold(),
                    i + 1,
                    e
                ));
                continue;
            }
        };
        let output = clips_dir.join(format!("highlight_{:03}.mp4", i + 1));
        normalize_clip(&raw, &output, fps).await?;
        spinner.finish_with_message(done(
            &format!("Clip {}: {}", i + 1, style(output.display()).dim()),
            step_start,
        ));
        clips.push(output);
    }
    Ok(clips)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose)?;

    let config = match load_config(&cli).await {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{} {:#}", style("Error:").red().bold(), e);
            std::process::exit(1);
        }
    };

    let local_source = Path::new(&cli.source).is_file();
    let platform: Platform = match cli.platform {
        Some(p) => p.into(),
        None if local_source && cli.source.ends_with(".live_chat.json") => Platform::Youtube,
        None if local_source => Platform::Twitch,
        None => detect_platform(&cli.source),
    };

    // Setup cache directory
    let cache_dir = get_cache_dir(&cli.source);
    fs::create_dir_all(&cache_dir).await?;

    if !cli.json {
        println!(
            "\n{}  {}\n",
            style("chatclip").cyan().bold(),
            style("Highlight Finder").dim()
        );
        println!("{}", style("─".repeat(60)).dim());
    }

    let total_start = Instant::now();

    // Step 1: Chat
    let chat_path = acquire_chat(&cli, platform, &cache_dir).await?;

    // Step 2: Analyze (check cache with detector+boundary)
    let report_path = get_report_path(
        &cache_dir,
        config.detector.name(),
        config.boundary_mode().name(),
    );
    let tuned = cli.config.is_some()
        || cli.z_threshold.is_some()
        || cli.mad_multiplier.is_some()
        || cli.merge_gap.is_some()
        || cli.transcript.is_some();
    let reuse_report = !cli.force && !tuned && !local_source && report_path.exists();
    let report = if reuse_report {
        let report = load_report(&report_path).await?;
        cached(
            cli.json,
            &format!("Analyzed: {} highlights", report.highlights.len()),
        );
        report
    } else {
        let step_start = Instant::now();
        let spinner = create_spinner("Analyzing chat...");
        let events = load_chat(&chat_path, platform).await?;
        let mut transcript = load_transcript(&cli, &cache_dir).await?;
        let replaced = match transcript.as_deref_mut() {
            Some(segments) => apply_text_replacements(segments, &config.replacements)?,
            None => Vec::new(),
        };
        if !replaced.is_empty() {
            tracing::info!(
                rules = replaced.len(),
                "applied text replacements to transcript"
            );
        }
        let pipeline = HighlightPipeline::new(config.clone())?;
        let highlights = pipeline.process(&events)?;
        let report = HighlightReport::build(
            &cli.source,
            &config,
            &events,
            &highlights,
            transcript.as_deref(),
        )
        .with_replacements(replaced);
        save_report(&report, &report_path).await?;
        spinner.finish_with_message(done(
            &format!(
                "Analyzed {} messages: {} highlights ({} / {})",
                events.len(),
                report.highlights.len(),
                style(config.detector.name()).yellow(),
                style(config.boundary_mode().name()).yellow()
            ),
            step_start,
        ));
        report
    };
    let ranges = report.ranges();

    // Step 3: Exports
    if cli.edl.is_some() || cli.clips {
        let fps = resolve_fps(&cli).await?;
        if let Some(edl_path) = &cli.edl {
            save_edl(edl_path, "Highlights", &ranges, fps, cli.video.as_deref()).await?;
            status(
                cli.json,
                &format!(
                    "{} EDL at {:.3} fps: {}",
                    style("✓").green().bold(),
                    fps,
                    style(edl_path.display()).cyan()
                ),
            );
        }
        if cli.clips {
            if local_source {
                eprintln!(
                    "{} --clips needs a stream URL as source",
                    style("Warning:").yellow().bold()
                );
            } else {
                export_clips(
                    &video_url(&cli.source),
                    &ranges,
                    &get_clips_dir(&cache_dir),
                    fps,
                )
                .await?;
            }
        }
    }
    if let Some(srt_path) = &cli.srt {
        save_srt_markers(srt_path, &ranges).await?;
        status(
            cli.json,
            &format!(
                "{} Markers: {}",
                style("✓").green().bold(),
                style(srt_path.display()).cyan()
            ),
        );
    }
    if let Some(html_path) = &cli.html {
        fs::write(html_path, format_report_html(&report, &config))
            .await
            .with_context(|| format!("writing {}", html_path.display()))?;
        status(
            cli.json,
            &format!(
                "{} HTML report: {}",
                style("✓").green().bold(),
                style(html_path.display()).cyan()
            ),
        );
    }

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!(
        "\n{} {}\n",
        style("Total time:").dim(),
        style(format_duration(total_start.elapsed())).cyan().bold()
    );
    println!(
        "{} {}\n",
        style("Saved:").dim(),
        style(report_path.display()).cyan()
    );
    println!("{}", style("─".repeat(60)).dim());

    // Human-readable output
    let readable = format_report_readable(&report);
    println!("{}", readable);

    Ok(())
}
