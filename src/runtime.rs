use std::io;
use std::time::{Duration, Instant};

use crossbeam_channel::{never, select, tick, Receiver, RecvTimeoutError};
use tracing::{debug, info, warn};

use crate::input::{InputError, InputSource, Key};
use crate::session::{SessionEngine, SessionOutcome, SessionSnapshot};

/// Cadence of the refresh/sampling tick
pub const TICK_RATE: Duration = Duration::from_millis(200);
const COUNTDOWN_STEP: Duration = Duration::from_secs(1);

/// Unified event type consumed by the control loop
#[derive(Debug)]
pub enum LoopEvent {
    Key(Key),
    InputFailed(InputError),
    TimerExpired,
    Tick,
}

/// Configurable ticker interface
pub trait Ticker: Send + Sync + 'static {
    fn interval(&self) -> Duration;
}

/// Fixed interval ticker
#[derive(Clone, Copy, Debug)]
pub struct FixedTicker {
    interval: Duration,
}

impl FixedTicker {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

impl Default for FixedTicker {
    fn default() -> Self {
        Self::new(TICK_RATE)
    }
}

impl Ticker for FixedTicker {
    fn interval(&self) -> Duration {
        self.interval
    }
}

/// Receives a snapshot after every processed event
pub trait Presenter {
    fn present(&mut self, snapshot: &SessionSnapshot) -> io::Result<()>;
}

impl<F> Presenter for F
where
    F: FnMut(&SessionSnapshot) -> io::Result<()>,
{
    fn present(&mut self, snapshot: &SessionSnapshot) -> io::Result<()> {
        self(snapshot)
    }
}

/// One-shot duration timer. Disarming swaps in a channel that never fires,
/// so a timer from a session that already ended cannot be observed.
struct SessionTimer {
    rx: Receiver<Instant>,
    armed: bool,
}

impl SessionTimer {
    fn disarmed() -> Self {
        Self {
            rx: never(),
            armed: false,
        }
    }

    fn sync(&mut self, deadline: Option<Instant>) {
        match deadline {
            Some(at) if !self.armed => {
                debug!(target: "runtime", "timer_armed");
                self.rx = crossbeam_channel::at(at);
                self.armed = true;
            }
            None if self.armed => {
                debug!(target: "runtime", "timer_disarmed");
                self.rx = never();
                self.armed = false;
            }
            _ => {}
        }
    }
}

/// The control loop.
///
/// Input, the duration timer and the sampling tick are independent producers;
/// the runner is their single consumer and the only holder of `&mut
/// SessionEngine`. Each event is applied and presented before the next one is
/// selected, so a presenter never sees a half-applied update.
pub struct Runner<I: InputSource, T: Ticker> {
    input: I,
    ticker: T,
}

impl<I: InputSource, T: Ticker> Runner<I, T> {
    pub fn new(input: I, ticker: T) -> Self {
        Self { input, ticker }
    }

    pub fn input(&self) -> &I {
        &self.input
    }

    /// Count down from `seconds`, calling `draw` once per second.
    ///
    /// Keys typed meanwhile are swallowed. Returns `false` when the user
    /// cancels with Esc or Ctrl+C, or the input source fails.
    pub fn countdown<F>(&self, seconds: u64, mut draw: F) -> io::Result<bool>
    where
        F: FnMut(u64) -> io::Result<()>,
    {
        for remaining in (1..=seconds).rev() {
            draw(remaining)?;
            let deadline = Instant::now() + COUNTDOWN_STEP;
            loop {
                match self.input.receiver().recv_deadline(deadline) {
                    Ok(Ok(Key::Escape | Key::Abort)) => {
                        info!(target: "runtime", remaining, "countdown_cancelled");
                        return Ok(false);
                    }
                    Ok(Ok(_)) => {}
                    Ok(Err(err)) => {
                        warn!(target: "runtime", error = %err, "input_failed_during_countdown");
                        return Ok(false);
                    }
                    Err(RecvTimeoutError::Disconnected) => return Ok(false),
                    Err(RecvTimeoutError::Timeout) => break,
                }
            }
        }
        Ok(true)
    }

    /// Blocks until any source produces an event.
    /// A closed input channel is reported as a failure, never as silence.
    pub fn step(&self, timer: &Receiver<Instant>, ticks: &Receiver<Instant>) -> LoopEvent {
        select! {
            recv(self.input.receiver()) -> msg => match msg {
                Ok(Ok(key)) => LoopEvent::Key(key),
                Ok(Err(err)) => LoopEvent::InputFailed(err),
                Err(_) => LoopEvent::InputFailed(InputError::Closed),
            },
            recv(timer) -> _ => LoopEvent::TimerExpired,
            recv(ticks) -> _ => LoopEvent::Tick,
        }
    }

    /// Drive `engine` until it reaches a terminal phase
    pub fn run<P: Presenter>(
        &self,
        engine: &mut SessionEngine,
        presenter: &mut P,
    ) -> io::Result<SessionOutcome> {
        let ticks = tick(self.ticker.interval());
        let mut timer = SessionTimer::disarmed();

        timer.sync(engine.deadline());
        presenter.present(&engine.snapshot(Instant::now()))?;

        loop {
            if let Some(outcome) = engine.outcome() {
                return Ok(outcome);
            }

            let event = self.step(&timer.rx, &ticks);
            let now = Instant::now();
            match event {
                LoopEvent::Key(key) => engine.handle_key(key, now),
                LoopEvent::TimerExpired => engine.expire(now),
                LoopEvent::Tick => engine.tick(now),
                LoopEvent::InputFailed(err) => {
                    warn!(target: "runtime", error = %err, "input_failed_aborting");
                    engine.abort(now);
                }
            }

            timer.sync(engine.deadline());
            presenter.present(&engine.snapshot(now))?;
        }
    }
}
