//! Plain-text output for the `history`, `stats` and `show` commands.

use chrono::{DateTime, Local};
use serde::Serialize;
use std::io;
use std::time::Duration;
use time_humanize::{Accuracy, HumanTime, Tense};

use crate::metrics::Sample;
use crate::storage::{Stats, StoredSession};
use crate::target::Mode;
use crate::ui::charting::{self, ChartOptions, DataPoint};

const RULE: &str = "────────────────────────────────────────";
const SPARKLINE_WIDTH: usize = 40;
/// WPM difference between the 7 and 30 day averages that counts as a trend
const TREND_THRESHOLD: f64 = 2.0;

pub fn format_duration(d: Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m", secs / 3600, (secs % 3600) / 60)
    }
}

pub fn relative_date(then: DateTime<Local>, now: DateTime<Local>) -> String {
    let elapsed = (now - then).to_std().unwrap_or_default();
    HumanTime::from(elapsed).to_text_en(Accuracy::Rough, Tense::Past)
}

fn empty_history(mode: Option<Mode>) -> String {
    let mut lines = vec!["No typing tests recorded yet.".to_string()];
    if let Some(mode) = mode {
        lines.push(format!("(filtered by mode: {mode})"));
    }
    lines.push("Run 'mtype test' to start your first test!".to_string());
    lines.join("\n")
}

/// Newest-first table of sessions followed by a WPM sparkline
pub fn history_table(
    sessions: &[StoredSession],
    mode: Option<Mode>,
    now: DateTime<Local>,
) -> String {
    if sessions.is_empty() {
        return empty_history(mode);
    }

    let mut lines = vec![
        format!(
            "{:<5} {:<16} {:<6} {:>6} {:>6} {:>7}  {}",
            "ID", "When", "Mode", "WPM", "Raw", "Acc", "Time"
        ),
        format!("{RULE}{RULE}"),
    ];
    lines.extend(sessions.iter().map(|s| {
        format!(
            "{:<5} {:<16} {:<6} {:>6.1} {:>6.1} {:>6.1}%  {}",
            s.id,
            relative_date(s.started_at, now),
            s.mode.to_string(),
            s.wpm,
            s.raw_wpm,
            s.accuracy,
            format_duration(s.duration()),
        )
    }));

    let trend: Vec<DataPoint> = sessions
        .iter()
        .rev()
        .enumerate()
        .map(|(i, s)| DataPoint::new(i as u64, s.wpm))
        .collect();
    lines.push(String::new());
    lines.push(format!(
        "Trend: {}",
        charting::sparkline(&trend, SPARKLINE_WIDTH)
    ));

    let mut footer = format!("Showing {} most recent tests", sessions.len());
    if let Some(mode) = mode {
        footer.push_str(&format!(" (mode: {mode})"));
    }
    lines.push(footer);
    lines.push("Use 'mtype show <id>' to see details of a specific test.".to_string());
    lines.join("\n")
}

#[derive(Debug, Serialize)]
struct HistoryRecord<'a> {
    id: i64,
    started_at: String,
    mode: String,
    wpm: f64,
    raw_wpm: f64,
    accuracy: f64,
    duration_ms: u64,
    correct_chars: usize,
    total_typed: usize,
    quote_id: Option<&'a str>,
}

/// Same rows as the history table, as CSV with a header
pub fn write_history_csv<W: io::Write>(
    sessions: &[StoredSession],
    writer: W,
) -> Result<(), csv::Error> {
    let mut wtr = csv::Writer::from_writer(writer);
    for s in sessions {
        wtr.serialize(HistoryRecord {
            id: s.id,
            started_at: s.started_at.to_rfc3339(),
            mode: s.mode.to_string(),
            wpm: s.wpm,
            raw_wpm: s.raw_wpm,
            accuracy: s.accuracy,
            duration_ms: s.duration_ms,
            correct_chars: s.correct_chars,
            total_typed: s.total_typed,
            quote_id: s.quote_id.as_deref(),
        })?;
    }
    wtr.flush()?;
    Ok(())
}

fn trend_line(stats: &Stats) -> Option<String> {
    if stats.last_7_days_avg_wpm <= 0.0 || stats.last_30_days_avg_wpm <= 0.0 {
        return None;
    }
    let diff = stats.last_7_days_avg_wpm - stats.last_30_days_avg_wpm;
    Some(if diff > TREND_THRESHOLD {
        format!("Trend:            ↑ Improving (+{diff:.1} WPM)")
    } else if diff < -TREND_THRESHOLD {
        format!("Trend:            ↓ Declining ({diff:.1} WPM)")
    } else {
        "Trend:            → Stable".to_string()
    })
}

pub fn stats_report(stats: &Stats) -> String {
    if stats.total_tests == 0 {
        return empty_history(None);
    }

    let mut lines = vec![
        "Overall".to_string(),
        RULE.to_string(),
        format!("Total Tests:      {}", stats.total_tests),
        format!("Total Time:       {}", format_duration(stats.total_time)),
        format!("Average WPM:      {:.1}", stats.average_wpm),
        format!("Best WPM:         {:.1}", stats.best_wpm),
        format!("Average Accuracy: {:.1}%", stats.average_accuracy),
        String::new(),
        "Recent Trends".to_string(),
        RULE.to_string(),
        format!("Last 7 days avg:  {:.1} WPM", stats.last_7_days_avg_wpm),
        format!("Last 30 days avg: {:.1} WPM", stats.last_30_days_avg_wpm),
    ];
    lines.extend(trend_line(stats));

    if !stats.per_mode.is_empty() {
        lines.push(String::new());
        lines.push("By Mode".to_string());
        lines.push(RULE.to_string());
        for (mode, m) in &stats.per_mode {
            lines.push(format!("{mode}:"));
            lines.push(format!(
                "  Tests: {} | Avg: {:.1} WPM | Best: {:.1} WPM",
                m.test_count, m.average_wpm, m.best_wpm
            ));
        }
    }
    lines.join("\n")
}

/// Details of one stored session with its dual speed chart
pub fn session_report(session: &StoredSession, samples: &[Sample]) -> String {
    let mut lines = vec![
        format!("Session #{}", session.id),
        String::new(),
        "Details".to_string(),
        RULE.to_string(),
        format!(
            "Date:       {}",
            session.started_at.format("%Y-%m-%d %H:%M:%S")
        ),
        format!("Mode:       {}", session.mode),
    ];
    match session.mode {
        Mode::Timer => lines.push(format!("Duration:   {} seconds", session.seconds)),
        Mode::Words => lines.push(format!("Word count: {} words", session.words)),
        Mode::Quote => {
            if let Some(id) = &session.quote_id {
                lines.push(format!("Quote ID:   {id}"));
            }
        }
    }

    lines.extend([
        String::new(),
        "Results".to_string(),
        RULE.to_string(),
        format!("WPM:        {:.1}", session.wpm),
        format!("Raw WPM:    {:.1}", session.raw_wpm),
        format!("Accuracy:   {:.1}%", session.accuracy),
        format!("Time:       {}", format_duration(session.duration())),
        format!(
            "Characters: {}/{} correct",
            session.correct_chars, session.total_typed
        ),
    ]);

    if !samples.is_empty() {
        lines.push(String::new());
        lines.push("Speed over time".to_string());
        lines.push(RULE.to_string());
        let chart = charting::render_samples(samples, &ChartOptions::with_size(60, 10));
        lines.extend(chart.lines().map(str::to_string));
    }
    lines.join("\n")
}
