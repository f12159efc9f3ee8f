//! Glue between configuration, prompt generation, the session and its sinks.

use std::path::PathBuf;
use tracing::{info, warn};

use crate::cli::TestArgs;
use crate::config::{Config, ConfigError};
use crate::session::{SessionOutcome, SessionResult};
use crate::storage::{ResultSink, StorageError};
use crate::target::{Mode, Target};
use crate::text::{GeneratorOptions, TextError, TextGenerator};
use crate::ui::charting::{self, ChartOptions};
use crate::ui::ViewOptions;

const MAX_CHART_WIDTH: u16 = 70;
const CHART_SIDE_MARGIN: u16 = 4;

/// Everything one `mtype test` run needs, after merging flags over config
#[derive(Debug, Clone, PartialEq)]
pub struct TestSettings {
    pub mode: Mode,
    pub seconds: u64,
    pub words: usize,
    pub quote_id: Option<String>,
    pub countdown: u64,
    pub chart: bool,
    pub view: ViewOptions,
    pub generator: GeneratorOptions,
}

impl TestSettings {
    /// Flags win over the config file. A quote id without an explicit mode
    /// selects quote mode.
    pub fn resolve(config: &Config, args: &TestArgs) -> Result<Self, ConfigError> {
        let implied = args.quote_id.as_ref().map(|_| Mode::Quote);
        let merged = Config {
            mode: args.mode.or(implied).unwrap_or(config.mode),
            seconds: args.seconds.unwrap_or(config.seconds),
            words: args.words.unwrap_or(config.words),
            countdown: args.countdown.unwrap_or(config.countdown),
            no_color: args.no_color || config.no_color,
            wrap: args.wrap.unwrap_or(config.wrap),
            chart: args.chart_override().unwrap_or(config.chart),
            words_file: pick(&args.words_file, &config.words_file),
            quotes_file: pick(&args.quotes_file, &config.quotes_file),
        };
        merged.validate()?;

        Ok(Self {
            mode: merged.mode,
            seconds: merged.seconds,
            words: merged.words,
            quote_id: args.quote_id.clone(),
            countdown: merged.countdown,
            chart: merged.chart,
            view: ViewOptions {
                no_color: merged.no_color,
                wrap: merged.wrap,
            },
            generator: GeneratorOptions {
                words_file: merged.words_file,
                quotes_file: merged.quotes_file,
                seed: args.seed,
            },
        })
    }

    pub fn build_target(&self, generator: &mut TextGenerator) -> Result<Target, TextError> {
        generator.for_mode(self.mode, self.words, self.seconds, self.quote_id.as_deref())
    }
}

fn pick(flag: &Option<PathBuf>, config: &Option<PathBuf>) -> Option<PathBuf> {
    flag.clone().or_else(|| config.clone())
}

/// Dual WPM/raw chart for the summary screen; needs at least two samples
pub fn completion_chart(result: &SessionResult, enabled: bool, term_width: u16) -> Option<String> {
    if !enabled || result.samples.len() < 2 {
        return None;
    }
    let width = term_width
        .saturating_sub(CHART_SIDE_MARGIN)
        .min(MAX_CHART_WIDTH);
    let opts = ChartOptions::with_size(usize::from(width), ChartOptions::default().height);
    Some(charting::render_samples(&result.samples, &opts))
}

/// Hand a finished result to the sink. Aborted sessions are never stored.
pub fn record_outcome<S: ResultSink + ?Sized>(
    sink: &mut S,
    outcome: &SessionOutcome,
) -> Result<Option<i64>, StorageError> {
    let SessionOutcome::Finished(result) = outcome else {
        info!(target: "app", "session_aborted_not_saved");
        return Ok(None);
    };
    match sink.save(result) {
        Ok(id) => Ok(Some(id)),
        Err(err) => {
            warn!(target: "app", error = %err, "session_save_failed");
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::Sample;
    use crate::storage::MemorySink;
    use crate::target::TargetMetadata;
    use assert_matches::assert_matches;
    use chrono::Local;
    use std::time::Duration;

    fn result(samples: Vec<Sample>) -> SessionResult {
        SessionResult {
            mode: Mode::Words,
            started_at: Local::now(),
            duration: Duration::from_secs(10),
            target_len: 20,
            total_typed: 20,
            correct_chars: 20,
            wpm: 24.0,
            raw_wpm: 24.0,
            accuracy: 100.0,
            samples,
            metadata: TargetMetadata::default(),
        }
    }

    #[test]
    fn defaults_come_from_config() {
        let settings = TestSettings::resolve(&Config::default(), &TestArgs::default()).unwrap();
        assert_eq!(settings.mode, Mode::Words);
        assert_eq!(settings.words, 25);
        assert_eq!(settings.seconds, 30);
        assert_eq!(settings.countdown, 3);
        assert!(settings.chart);
        assert_eq!(settings.view, ViewOptions::default());
        assert_eq!(settings.generator.seed, None);
    }

    #[test]
    fn flags_override_config() {
        let config = Config {
            mode: Mode::Timer,
            no_color: false,
            words_file: Some(PathBuf::from("cfg-words.txt")),
            ..Config::default()
        };
        let args = TestArgs {
            mode: Some(Mode::Words),
            words: Some(5),
            no_color: true,
            no_chart: true,
            wrap: Some(40),
            words_file: Some(PathBuf::from("flag-words.txt")),
            seed: Some(11),
            ..TestArgs::default()
        };
        let settings = TestSettings::resolve(&config, &args).unwrap();
        assert_eq!(settings.mode, Mode::Words);
        assert_eq!(settings.words, 5);
        assert!(!settings.chart);
        assert_eq!(
            settings.view,
            ViewOptions {
                no_color: true,
                wrap: 40
            }
        );
        assert_eq!(
            settings.generator.words_file,
            Some(PathBuf::from("flag-words.txt"))
        );
        assert_eq!(settings.generator.seed, Some(11));
    }

    #[test]
    fn quote_id_implies_quote_mode() {
        let args = TestArgs {
            quote_id: Some("q002".to_string()),
            ..TestArgs::default()
        };
        let settings = TestSettings::resolve(&Config::default(), &args).unwrap();
        assert_eq!(settings.mode, Mode::Quote);

        let mut generator = TextGenerator::new(&settings.generator).unwrap();
        let target = settings.build_target(&mut generator).unwrap();
        assert_eq!(target.metadata.quote_id.as_deref(), Some("q002"));
    }

    #[test]
    fn zero_values_are_config_errors() {
        let args = TestArgs {
            seconds: Some(0),
            ..TestArgs::default()
        };
        assert_matches!(
            TestSettings::resolve(&Config::default(), &args),
            Err(ConfigError::ZeroSeconds)
        );
    }

    #[test]
    fn chart_needs_two_samples_and_opt_in() {
        let single = result(vec![Sample::zero()]);
        assert!(completion_chart(&single, true, 100).is_none());

        let two = result(vec![Sample::zero(), Sample::new(10_000, 24.0, 24.0)]);
        assert!(completion_chart(&two, false, 100).is_none());
        let chart = completion_chart(&two, true, 100).unwrap();
        let widest = chart.lines().map(|l| l.chars().count()).max().unwrap();
        assert!(widest <= usize::from(MAX_CHART_WIDTH));
        assert!(widest > 60);
    }

    #[test]
    fn only_finished_sessions_are_recorded() {
        let mut sink = MemorySink::default();
        let finished = SessionOutcome::Finished(result(vec![Sample::zero()]));
        let aborted = SessionOutcome::Aborted(result(vec![Sample::zero()]));

        assert_eq!(record_outcome(&mut sink, &aborted).unwrap(), None);
        assert_eq!(record_outcome(&mut sink, &finished).unwrap(), Some(1));
        assert_eq!(sink.results.len(), 1);
    }
}
