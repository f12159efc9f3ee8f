use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Standard typing-test convention: one "word" is five characters.
pub const CHARS_PER_WORD: f64 = 5.0;

/// Lower bound on elapsed minutes when dividing, so ultra-short sessions stay finite.
pub const MIN_ELAPSED_MINUTES: f64 = 0.001;

pub const DEFAULT_SAMPLE_INTERVAL: Duration = Duration::from_millis(500);

/// Live WPM is held at zero for the first second to hide the startup spike.
const LIVE_WPM_WARMUP: Duration = Duration::from_secs(1);

/// Point-in-time speed measurement
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub elapsed_ms: u64,
    pub wpm: f64,
    pub raw_wpm: f64,
}

impl Sample {
    pub fn new(elapsed_ms: u64, wpm: f64, raw_wpm: f64) -> Self {
        Self {
            elapsed_ms,
            wpm,
            raw_wpm,
        }
    }

    pub fn zero() -> Self {
        Self::new(0, 0.0, 0.0)
    }
}

pub fn elapsed_minutes(elapsed: Duration) -> f64 {
    (elapsed.as_secs_f64() / 60.0).max(MIN_ELAPSED_MINUTES)
}

/// Net WPM: only correctly typed characters count
pub fn net_wpm(correct_chars: usize, elapsed: Duration) -> f64 {
    (correct_chars as f64 / CHARS_PER_WORD) / elapsed_minutes(elapsed)
}

/// Raw WPM: every typed character counts, mistakes included
pub fn raw_wpm(total_typed: usize, elapsed: Duration) -> f64 {
    (total_typed as f64 / CHARS_PER_WORD) / elapsed_minutes(elapsed)
}

/// Percentage of typed characters that are correct; 0 when nothing was typed
pub fn accuracy(correct_chars: usize, total_typed: usize) -> f64 {
    if total_typed == 0 {
        return 0.0;
    }
    correct_chars as f64 / total_typed as f64 * 100.0
}

/// Keystroke counters plus a time series of speed samples.
///
/// The tracker never reads the clock itself: every time-dependent call takes
/// `now`, which keeps it deterministic under test and lets the caller poll at
/// any cadence. Whether a sample is due is decided here, not by the caller.
#[derive(Debug, Clone)]
pub struct MetricsTracker {
    samples: Vec<Sample>,
    started_at: Option<Instant>,
    last_sample_at: Option<Instant>,
    sample_interval: Duration,
    total_typed: usize,
    correct_chars: usize,
    finalized: bool,
}

impl Default for MetricsTracker {
    fn default() -> Self {
        Self::new(DEFAULT_SAMPLE_INTERVAL)
    }
}

impl MetricsTracker {
    pub fn new(sample_interval: Duration) -> Self {
        Self {
            samples: Vec::new(),
            started_at: None,
            last_sample_at: None,
            sample_interval,
            total_typed: 0,
            correct_chars: 0,
            finalized: false,
        }
    }

    /// Anchor the clock and record the t=0 sample. Repeated calls are ignored.
    pub fn start(&mut self, now: Instant) {
        if self.started_at.is_some() {
            return;
        }
        self.started_at = Some(now);
        self.last_sample_at = Some(now);
        self.samples.push(Sample::zero());
    }

    pub fn record_keystroke(&mut self, correct: bool) {
        self.total_typed += 1;
        if correct {
            self.correct_chars += 1;
        }
    }

    /// Undo one keystroke; counters never go below zero
    pub fn retract_keystroke(&mut self, was_correct: bool) {
        self.total_typed = self.total_typed.saturating_sub(1);
        if was_correct {
            self.correct_chars = self.correct_chars.saturating_sub(1);
        }
    }

    /// Append a sample if at least one interval has passed since the last one.
    /// Returns whether a sample was taken.
    pub fn maybe_sample(&mut self, now: Instant) -> bool {
        if self.finalized {
            return false;
        }
        let Some(last) = self.last_sample_at else {
            return false;
        };
        if now.saturating_duration_since(last) >= self.sample_interval {
            self.take_sample(now);
            return true;
        }
        false
    }

    /// Record the closing sample at exactly `end`, even inside a sampling gap.
    /// Only the first call has an effect.
    pub fn finalize(&mut self, end: Instant) {
        if self.finalized || self.started_at.is_none() {
            return;
        }
        self.take_sample(end);
        self.finalized = true;
    }

    fn take_sample(&mut self, at: Instant) {
        let elapsed = self.elapsed(at);
        let mut sample = self.sample_for(elapsed);
        // keep the series monotonic if a caller hands us an older instant
        if let Some(prev) = self.samples.last() {
            sample.elapsed_ms = sample.elapsed_ms.max(prev.elapsed_ms);
        }
        self.samples.push(sample);
        self.last_sample_at = Some(at);
    }

    fn sample_for(&self, elapsed: Duration) -> Sample {
        Sample::new(
            elapsed.as_millis() as u64,
            net_wpm(self.correct_chars, elapsed),
            raw_wpm(self.total_typed, elapsed),
        )
    }

    pub fn elapsed(&self, now: Instant) -> Duration {
        match self.started_at {
            Some(start) => now.saturating_duration_since(start),
            None => Duration::ZERO,
        }
    }

    /// Net WPM for the status line
    pub fn live_wpm(&self, elapsed: Duration) -> f64 {
        if self.started_at.is_none() || elapsed < LIVE_WPM_WARMUP {
            return 0.0;
        }
        net_wpm(self.correct_chars, elapsed)
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn total_typed(&self) -> usize {
        self.total_typed
    }

    pub fn correct_chars(&self) -> usize {
        self.correct_chars
    }
}
