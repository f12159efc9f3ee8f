use crate::input::Key;
use crate::metrics::{self, MetricsTracker, Sample, DEFAULT_SAMPLE_INTERVAL};
use crate::target::{Mode, Target, TargetMetadata};
use chrono::{DateTime, Local};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("target text must not be empty")]
    EmptyTarget,
    #[error("timer mode needs a positive duration")]
    ZeroDuration,
}

/// Per-character verdict for the target text
#[derive(Clone, Debug, Copy, PartialEq, Eq)]
pub enum CharVerdict {
    Unattempted,
    Correct,
    Incorrect,
}

#[derive(Clone, Debug, Copy, PartialEq, Eq)]
pub enum Phase {
    NotStarted,
    Running,
    Finished,
    Aborted,
}

impl Phase {
    pub fn is_terminal(self) -> bool {
        matches!(self, Phase::Finished | Phase::Aborted)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    pub time_limit: Option<Duration>,
    pub sample_interval: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            time_limit: None,
            sample_interval: DEFAULT_SAMPLE_INTERVAL,
        }
    }
}

impl SessionConfig {
    /// Derive the time limit from the target: only timer targets get one
    pub fn for_target(target: &Target) -> Self {
        let time_limit = match target.mode {
            Mode::Timer => Some(Duration::from_secs(target.metadata.seconds)),
            Mode::Words | Mode::Quote => None,
        };
        Self {
            time_limit,
            ..Self::default()
        }
    }

    pub fn with_sample_interval(mut self, interval: Duration) -> Self {
        self.sample_interval = interval;
        self
    }
}

#[derive(Debug, Clone)]
struct SessionState {
    target: Target,
    target_chars: Vec<char>,
    typed_chars: Vec<char>,
    verdicts: Vec<CharVerdict>,
    started_at: Option<Instant>,
    started_wall: Option<DateTime<Local>>,
    ended_at: Option<Instant>,
    phase: Phase,
}

/// Read-only copy of the session handed to presentation after every event
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub mode: Mode,
    pub metadata: TargetMetadata,
    pub target: Vec<char>,
    pub typed: Vec<char>,
    pub verdicts: Vec<CharVerdict>,
    pub phase: Phase,
    pub elapsed: Duration,
    pub live_wpm: f64,
    pub time_limit: Option<Duration>,
    pub total_typed: usize,
    pub correct_chars: usize,
}

impl SessionSnapshot {
    pub fn remaining(&self) -> Option<Duration> {
        self.time_limit
            .map(|limit| limit.saturating_sub(self.elapsed))
    }

    /// Completion percentage, capped at 100
    pub fn progress(&self) -> f64 {
        if self.target.is_empty() {
            return 0.0;
        }
        (self.typed.len() as f64 / self.target.len() as f64 * 100.0).min(100.0)
    }

    pub fn cursor(&self) -> usize {
        self.typed.len()
    }
}

/// Final, immutable record of a completed (or aborted) session
#[derive(Debug, Clone, PartialEq)]
pub struct SessionResult {
    pub mode: Mode,
    pub started_at: DateTime<Local>,
    pub duration: Duration,
    pub target_len: usize,
    pub total_typed: usize,
    pub correct_chars: usize,
    pub wpm: f64,
    pub raw_wpm: f64,
    pub accuracy: f64,
    pub samples: Vec<Sample>,
    pub metadata: TargetMetadata,
}

impl SessionResult {
    pub fn incorrect_chars(&self) -> usize {
        self.total_typed.saturating_sub(self.correct_chars)
    }
}

/// How a session ended. Aborted sessions keep their partial numbers but get
/// no summary and are not stored.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionOutcome {
    Finished(SessionResult),
    Aborted(SessionResult),
}

impl SessionOutcome {
    pub fn result(&self) -> &SessionResult {
        match self {
            SessionOutcome::Finished(result) | SessionOutcome::Aborted(result) => result,
        }
    }

    pub fn is_finished(&self) -> bool {
        matches!(self, SessionOutcome::Finished(_))
    }
}

/// The typing state machine.
///
/// `NotStarted -> Running -> Finished | Aborted`. Every mutation checks the
/// current phase first, so events arriving after a terminal phase are
/// ignored rather than corrupting a result that may already be read.
#[derive(Debug, Clone)]
pub struct SessionEngine {
    state: SessionState,
    metrics: MetricsTracker,
    config: SessionConfig,
}

impl SessionEngine {
    pub fn new(target: Target, config: SessionConfig) -> Result<Self, SessionError> {
        if target.text.is_empty() {
            return Err(SessionError::EmptyTarget);
        }
        if config.time_limit == Some(Duration::ZERO) {
            return Err(SessionError::ZeroDuration);
        }

        let target_chars: Vec<char> = target.text.chars().collect();
        let verdicts = vec![CharVerdict::Unattempted; target_chars.len()];

        Ok(Self {
            state: SessionState {
                typed_chars: Vec::with_capacity(target_chars.len()),
                target,
                target_chars,
                verdicts,
                started_at: None,
                started_wall: None,
                ended_at: None,
                phase: Phase::NotStarted,
            },
            metrics: MetricsTracker::new(config.sample_interval),
            config,
        })
    }

    /// Engine with the time limit taken from the target
    pub fn for_target(target: Target) -> Result<Self, SessionError> {
        let config = SessionConfig::for_target(&target);
        Self::new(target, config)
    }

    /// Apply one decoded key event
    pub fn handle_key(&mut self, key: Key, now: Instant) {
        match key {
            Key::Rune(c) => self.handle_rune(c, now),
            Key::Backspace => self.handle_backspace(now),
            Key::Escape | Key::Abort => self.abort(now),
            Key::Enter | Key::Unknown => {}
        }
    }

    pub fn handle_rune(&mut self, c: char, now: Instant) {
        if !self.accept_input(now) {
            return;
        }

        let idx = self.state.typed_chars.len();
        // typing never outruns the target, in timer mode too
        if idx < self.state.target_chars.len() {
            let correct = c == self.state.target_chars[idx];
            self.state.typed_chars.push(c);
            self.state.verdicts[idx] = if correct {
                CharVerdict::Correct
            } else {
                CharVerdict::Incorrect
            };
            self.metrics.record_keystroke(correct);
        }

        self.after_input(now);
    }

    pub fn handle_backspace(&mut self, now: Instant) {
        if !self.accept_input(now) {
            return;
        }

        if self.state.typed_chars.pop().is_some() {
            let idx = self.state.typed_chars.len();
            let was_correct = self.state.verdicts[idx] == CharVerdict::Correct;
            self.state.verdicts[idx] = CharVerdict::Unattempted;
            self.metrics.retract_keystroke(was_correct);
        }

        self.after_input(now);
    }

    /// Periodic tick: let the tracker decide whether a sample is due
    pub fn tick(&mut self, now: Instant) {
        if self.state.phase == Phase::Running {
            self.metrics.maybe_sample(now);
        }
    }

    /// Duration timer fired. Only meaningful for a running timed session.
    pub fn expire(&mut self, now: Instant) {
        if self.state.phase == Phase::Running && self.config.time_limit.is_some() {
            debug!(target: "session", "time_limit_reached");
            self.finish(now);
        }
    }

    pub fn finish(&mut self, now: Instant) {
        if self.state.phase != Phase::Running {
            return;
        }
        self.end(Phase::Finished, now);
        info!(
            target: "session",
            typed = self.state.typed_chars.len(),
            correct = self.metrics.correct_chars(),
            "session_finished"
        );
    }

    pub fn abort(&mut self, now: Instant) {
        if self.state.phase.is_terminal() {
            return;
        }
        self.end(Phase::Aborted, now);
        info!(target: "session", "session_aborted");
    }

    fn end(&mut self, phase: Phase, now: Instant) {
        self.state.phase = phase;
        self.state.ended_at = Some(now);
        self.metrics.finalize(now);
    }

    fn start(&mut self, now: Instant) {
        self.state.phase = Phase::Running;
        self.state.started_at = Some(now);
        self.state.started_wall = Some(Local::now());
        self.metrics.start(now);
        info!(
            target: "session",
            mode = %self.state.target.mode,
            target_len = self.state.target_chars.len(),
            time_limit_ms = self.config.time_limit.map(|d| d.as_millis() as u64),
            "session_started"
        );
    }

    /// Start on the first accepted keystroke; refuse input once terminal
    fn accept_input(&mut self, now: Instant) -> bool {
        match self.state.phase {
            Phase::NotStarted => {
                self.start(now);
                true
            }
            Phase::Running => true,
            Phase::Finished | Phase::Aborted => false,
        }
    }

    fn after_input(&mut self, now: Instant) {
        if self.state.target.mode != Mode::Timer
            && self.state.typed_chars.len() >= self.state.target_chars.len()
        {
            self.finish(now);
        }
        if self.state.phase == Phase::Running {
            self.metrics.maybe_sample(now);
        }
    }

    /// When the timer should fire, while a timed session is running
    pub fn deadline(&self) -> Option<Instant> {
        match (self.state.phase, self.state.started_at, self.config.time_limit) {
            (Phase::Running, Some(start), Some(limit)) => Some(start + limit),
            _ => None,
        }
    }

    pub fn elapsed(&self, now: Instant) -> Duration {
        match (self.state.started_at, self.state.ended_at) {
            (Some(start), Some(end)) => end.saturating_duration_since(start),
            (Some(start), None) => now.saturating_duration_since(start),
            (None, _) => Duration::ZERO,
        }
    }

    pub fn snapshot(&self, now: Instant) -> SessionSnapshot {
        let elapsed = self.elapsed(now);
        SessionSnapshot {
            mode: self.state.target.mode,
            metadata: self.state.target.metadata.clone(),
            target: self.state.target_chars.clone(),
            typed: self.state.typed_chars.clone(),
            verdicts: self.state.verdicts.clone(),
            phase: self.state.phase,
            elapsed,
            live_wpm: self.metrics.live_wpm(elapsed),
            time_limit: self.config.time_limit,
            total_typed: self.metrics.total_typed(),
            correct_chars: self.metrics.correct_chars(),
        }
    }

    /// Final numbers; `None` until the session has reached a terminal phase.
    ///
    /// The closing sample was appended when the session ended, so calling
    /// this repeatedly always yields the same value.
    pub fn result(&self) -> Option<SessionResult> {
        if !self.state.phase.is_terminal() {
            return None;
        }

        let duration = match (self.state.started_at, self.state.ended_at) {
            (Some(start), Some(end)) => end.saturating_duration_since(start),
            _ => Duration::ZERO,
        };
        let total_typed = self.metrics.total_typed();
        let correct_chars = self.metrics.correct_chars();

        Some(SessionResult {
            mode: self.state.target.mode,
            started_at: self.state.started_wall.unwrap_or_else(Local::now),
            duration,
            target_len: self.state.target_chars.len(),
            total_typed,
            correct_chars,
            wpm: metrics::net_wpm(correct_chars, duration),
            raw_wpm: metrics::raw_wpm(total_typed, duration),
            accuracy: metrics::accuracy(correct_chars, total_typed),
            samples: self.metrics.samples().to_vec(),
            metadata: self.state.target.metadata.clone(),
        })
    }

    pub fn outcome(&self) -> Option<SessionOutcome> {
        let result = self.result()?;
        Some(match self.state.phase {
            Phase::Aborted => SessionOutcome::Aborted(result),
            _ => SessionOutcome::Finished(result),
        })
    }

    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    pub fn target(&self) -> &Target {
        &self.state.target
    }

    pub fn typed(&self) -> &[char] {
        &self.state.typed_chars
    }

    pub fn verdicts(&self) -> &[CharVerdict] {
        &self.state.verdicts
    }

    pub fn metrics(&self) -> &MetricsTracker {
        &self.metrics
    }
}
