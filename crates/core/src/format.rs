use std::fmt::Write;

use crate::{
    config::{AnalysisConfig, DetectorKind},
    report::HighlightReport,
};

const EXCERPT_PREVIEW_CHARS: usize = 300;

const HTML_STYLE: &str = "
body { font-family: -apple-system, 'Segoe UI', Roboto, sans-serif; line-height: 1.6; color: #333; background: #f4f4f4; margin: 0; }
main { max-width: 1000px; margin: 0 auto; padding: 20px; background: white; }
nav a { margin-right: 12px; }
.metrics { display: grid; grid-template-columns: repeat(auto-fit, minmax(150px, 1fr)); gap: 12px; }
.metric { background: #f8f9fa; padding: 16px; border-radius: 8px; text-align: center; }
.metric-value { display: block; font-size: 24px; font-weight: bold; color: #007bff; }
.highlight { background: #f8f9fa; padding: 16px; border-radius: 8px; margin-bottom: 12px; border: 1px solid #dee2e6; }
.highlight-time { font-weight: bold; color: #007bff; }
.transcript { font-family: monospace; white-space: pre-wrap; font-size: 12px; }
table { width: 100%; border-collapse: collapse; }
th, td { padding: 8px; text-align: left; border-bottom: 1px solid #dee2e6; }
";

/// Format seconds as HH:MM:SS timestamp
pub fn format_timestamp(seconds: f64) -> String {
    let total = seconds.max(0.0) as u64;
    format!(
        "{:02}:{:02}:{:02}",
        total / 3600,
        (total % 3600) / 60,
        total % 60
    )
}

/// Format a duration as `1m 30s` style text
pub fn format_duration(seconds: f64) -> String {
    let total = seconds.max(0.0).round() as u64;
    match (total / 60, total % 60) {
        (0, secs) => format!("{secs}s"),
        (mins, 0) => format!("{mins}m"),
        (mins, secs) => format!("{mins}m {secs}s"),
    }
}

pub fn format_report_readable(report: &HighlightReport) -> String {
    let mut output = String::new();
    output.push_str(&format!("# Highlights: {}\n\n", report.source));
    output.push_str(&format!(
        "**Detector:** {} | **Boundaries:** {} | **Messages:** {}\n\n",
        report.detector, report.boundary, report.total_messages
    ));
    if !report.text_replacements.is_empty() {
        let rules = report
            .text_replacements
            .iter()
            .map(|r| format!("{} → {} ×{}", r.from, r.to, r.count))
            .collect::<Vec<_>>()
            .join(", ");
        output.push_str(&format!("**Text replacements:** {}\n\n", rules));
    }

    if report.highlights.is_empty() {
        output.push_str("No highlights detected.\n");
        return output;
    }

    for entry in &report.highlights {
        let start = format_timestamp(entry.start_seconds);
        let end = format_timestamp(entry.end_seconds);
        output.push_str(&format!(
            "## #{} [{}–{}] ({})\n\n",
            entry.index,
            start,
            end,
            format_duration(entry.duration_seconds)
        ));
        output.push_str(&format!(
            "• {} messages, {} paid\n",
            entry.message_count, entry.paid_count
        ));
        if !entry.peak_seconds.is_empty() {
            let peaks = entry
                .peak_seconds
                .iter()
                .map(|&s| format_timestamp(s))
                .collect::<Vec<_>>()
                .join(", ");
            output.push_str(&format!("• Peaks: {}\n", peaks));
        }
        if let Some(top) = &entry.top_message {
            output.push_str(&format!("• Chat: \"{}\" ×{}\n", top.text, top.count));
        }
        if let Some(text) = &entry.transcript_excerpt {
            output.push_str(&format!("\n> {}\n", text));
        }
        output.push('\n');
    }

    output
}

/// Self-contained HTML page: summary metrics, one card per highlight,
/// transcript statistics and the settings the run used.
pub fn format_report_html(report: &HighlightReport, config: &AnalysisConfig) -> String {
    let mut html = String::new();
    let title = escape_html(&report.source);
    let _ = write!(
        html,
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"UTF-8\">\n\
         <title>Highlights - {title}</title>\n<style>{HTML_STYLE}</style>\n</head>\n<body>\n<main>\n\
         <h1>Highlights: {title}</h1>\n\
         <nav><a href=\"#summary\">Summary</a><a href=\"#highlights\">Highlights</a>\
         <a href=\"#transcript\">Transcript</a><a href=\"#configuration\">Configuration</a></nav>\n"
    );

    let total: f64 = report.highlights.iter().map(|h| h.duration_seconds).sum();
    let average = if report.highlights.is_empty() {
        0.0
    } else {
        total / report.highlights.len() as f64
    };
    html.push_str("<section id=\"summary\">\n<h2>Summary</h2>\n<div class=\"metrics\">\n");
    for (label, value) in [
        ("Highlights", report.highlights.len().to_string()),
        ("Total duration", format_duration(total)),
        ("Average duration", format_duration(average)),
        ("Chat messages", report.total_messages.to_string()),
        ("Transcript segments", report.transcript_segments.to_string()),
        ("Text replacements", report.total_replacements().to_string()),
    ] {
        let _ = writeln!(
            html,
            "<div class=\"metric\"><span class=\"metric-value\">{value}</span>{label}</div>"
        );
    }
    html.push_str("</div>\n</section>\n");

    html.push_str("<section id=\"highlights\">\n<h2>Highlights</h2>\n");
    if report.highlights.is_empty() {
        html.push_str("<p>No highlights detected.</p>\n");
    }
    for entry in &report.highlights {
        let _ = writeln!(
            html,
            "<div class=\"highlight\" data-highlight-id=\"{}\">\n\
             <span class=\"highlight-time\">Clip {}: {} - {}</span> ({})",
            entry.index,
            entry.index,
            format_timestamp(entry.start_seconds),
            format_timestamp(entry.end_seconds),
            format_duration(entry.duration_seconds)
        );
        let _ = writeln!(
            html,
            "<p>{} messages, {} paid</p>",
            entry.message_count, entry.paid_count
        );
        if let Some(top) = &entry.top_message {
            let _ = writeln!(
                html,
                "<p>Chat: \"{}\" &times;{}</p>",
                escape_html(&top.text),
                top.count
            );
        }
        let excerpt = match &entry.transcript_excerpt {
            Some(text) => escape_html(&preview(text, EXCERPT_PREVIEW_CHARS)),
            None => "No transcript available".to_string(),
        };
        let _ = writeln!(html, "<div class=\"transcript\">{excerpt}</div>\n</div>");
    }
    html.push_str("</section>\n");

    html.push_str("<section id=\"transcript\">\n<h2>Transcript</h2>\n");
    if report.transcript_segments == 0 {
        html.push_str("<p>No transcript data available.</p>\n");
    } else {
        let _ = writeln!(
            html,
            "<p>Segments: {}</p>\n<p>Words: {}</p>\n<p>Average words per segment: {:.1}</p>",
            report.transcript_segments,
            report.transcript_words,
            report.transcript_words as f64 / report.transcript_segments as f64
        );
    }
    if !report.text_replacements.is_empty() {
        html.push_str("<table>\n<tr><th>Replaced</th><th>With</th><th>Count</th></tr>\n");
        for r in &report.text_replacements {
            let _ = writeln!(
                html,
                "<tr><td>{}</td><td>{}</td><td>{}</td></tr>",
                escape_html(&r.from),
                escape_html(&r.to),
                r.count
            );
        }
        html.push_str("</table>\n");
    }
    html.push_str("</section>\n");

    html.push_str("<section id=\"configuration\">\n<h2>Configuration</h2>\n<table>\n");
    html.push_str("<tr><th>Setting</th><th>Value</th></tr>\n");
    for (key, value) in settings_rows(config) {
        let _ = writeln!(
            html,
            "<tr><td><strong>{key}</strong></td><td>{}</td></tr>",
            escape_html(&value)
        );
    }
    html.push_str("</table>\n</section>\n</main>\n</body>\n</html>\n");
    html
}

fn settings_rows(config: &AnalysisConfig) -> Vec<(&'static str, String)> {
    let mut rows = vec![
        ("Detector", config.detector.name().to_string()),
        ("Boundaries", config.boundary_mode().name().to_string()),
        ("Merge gap", format!("{}s", config.merge_gap())),
    ];
    match config.detector {
        DetectorKind::ZScore => {
            rows.push(("Bucket width", format!("{}s", config.bucket_width_seconds)));
            rows.push((
                "Rolling window",
                format!("{} minutes", config.rolling_window_minutes),
            ));
            rows.push(("Z threshold", config.z_threshold.to_string()));
        }
        DetectorKind::Mad => {
            rows.push(("Activity weight", config.activity_weight.to_string()));
            rows.push(("Sentiment weight", config.sentiment_weight.to_string()));
            rows.push(("MAD multiplier", config.mad_threshold_multiplier.to_string()));
        }
    }
    rows.push(("Text replacements", config.replacements.len().to_string()));
    rows
}

fn preview(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(max_chars).collect();
    cut.push_str("...");
    cut
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
