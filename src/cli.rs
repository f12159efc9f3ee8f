use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::target::Mode;

/// terminal typing test with live speed metrics and a speed chart
#[derive(Parser, Debug, Clone)]
#[clap(
    name = "mtype",
    version,
    about,
    args_conflicts_with_subcommands = true,
    long_about = "A terminal typing test with timer, word-count and quote modes. Shows live WPM while you type, a speed chart when you finish, and keeps a local history of your results."
)]
pub struct Cli {
    /// path to an alternative config file
    #[clap(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[clap(subcommand)]
    pub command: Option<Command>,

    /// options for the default `test` command
    #[clap(flatten)]
    pub test: TestArgs,
}

impl Cli {
    /// The command to run; a bare `mtype` starts a test
    pub fn selected_command(&self) -> Command {
        self.command
            .clone()
            .unwrap_or_else(|| Command::Test(self.test.clone()))
    }
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// start a typing test (default)
    Test(TestArgs),
    /// list recent tests
    History(HistoryArgs),
    /// aggregate statistics over all tests
    Stats,
    /// details and speed chart of one test
    Show(ShowArgs),
}

/// Overrides for one test; anything left unset comes from the config file
#[derive(Args, Debug, Clone, Default, PartialEq)]
pub struct TestArgs {
    /// test mode: timer, words or quote
    #[clap(short = 'm', long)]
    pub mode: Option<Mode>,

    /// duration in seconds (timer mode)
    #[clap(short = 's', long)]
    pub seconds: Option<u64>,

    /// number of words (words mode)
    #[clap(short = 'w', long)]
    pub words: Option<usize>,

    /// specific quote to type; implies quote mode
    #[clap(long)]
    pub quote_id: Option<String>,

    /// custom quotes file (JSON array of {id, text, source})
    #[clap(long, value_name = "PATH")]
    pub quotes_file: Option<PathBuf>,

    /// custom word list (whitespace separated)
    #[clap(long, value_name = "PATH")]
    pub words_file: Option<PathBuf>,

    /// countdown seconds before the test starts
    #[clap(long)]
    pub countdown: Option<u64>,

    /// random seed for reproducible prompts
    #[clap(long)]
    pub seed: Option<u64>,

    /// disable colors
    #[clap(long)]
    pub no_color: bool,

    /// wrap the prompt at this column (0 for terminal width)
    #[clap(long)]
    pub wrap: Option<u16>,

    /// show the speed chart at the end
    #[clap(long, overrides_with = "no_chart")]
    pub chart: bool,

    /// hide the speed chart at the end
    #[clap(long, overrides_with = "chart")]
    pub no_chart: bool,
}

impl TestArgs {
    /// Explicit chart choice, if any; the last flag given wins
    pub fn chart_override(&self) -> Option<bool> {
        match (self.chart, self.no_chart) {
            (_, true) => Some(false),
            (true, false) => Some(true),
            (false, false) => None,
        }
    }
}

#[derive(Args, Debug, Clone, PartialEq)]
pub struct HistoryArgs {
    /// number of sessions to show
    #[clap(short = 'n', long, default_value_t = 20)]
    pub limit: usize,

    /// only show one mode
    #[clap(short = 'm', long)]
    pub mode: Option<Mode>,

    /// print CSV instead of a table
    #[clap(long)]
    pub csv: bool,
}

#[derive(Args, Debug, Clone, PartialEq)]
pub struct ShowArgs {
    /// session id as listed by `history`
    pub id: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn bare_invocation_runs_default_test() {
        let cli = Cli::try_parse_from(["mtype"]).unwrap();
        assert_eq!(cli.selected_command(), Command::Test(TestArgs::default()));
    }

    #[test]
    fn top_level_flags_feed_default_test() {
        let cli = Cli::try_parse_from(["mtype", "--mode", "timer", "-s", "60"]).unwrap();
        assert_matches!(cli.selected_command(), Command::Test(args) => {
            assert_eq!(args.mode, Some(Mode::Timer));
            assert_eq!(args.seconds, Some(60));
        });
    }

    #[test]
    fn test_subcommand_flags() {
        let cli = Cli::try_parse_from([
            "mtype",
            "test",
            "--mode",
            "quote",
            "--quote-id",
            "q003",
            "--seed",
            "7",
            "--no-color",
            "--wrap",
            "60",
            "--countdown",
            "0",
        ])
        .unwrap();
        assert_matches!(cli.selected_command(), Command::Test(args) => {
            assert_eq!(args.mode, Some(Mode::Quote));
            assert_eq!(args.quote_id.as_deref(), Some("q003"));
            assert_eq!(args.seed, Some(7));
            assert!(args.no_color);
            assert_eq!(args.wrap, Some(60));
            assert_eq!(args.countdown, Some(0));
        });
    }

    #[test]
    fn unknown_mode_is_rejected() {
        assert!(Cli::try_parse_from(["mtype", "test", "--mode", "marathon"]).is_err());
    }

    #[test]
    fn chart_flags_last_one_wins() {
        let parse = |args: &[&str]| match Cli::try_parse_from(args).unwrap().selected_command() {
            Command::Test(t) => t.chart_override(),
            other => panic!("unexpected {other:?}"),
        };
        assert_eq!(parse(&["mtype"]), None);
        assert_eq!(parse(&["mtype", "--chart"]), Some(true));
        assert_eq!(parse(&["mtype", "--no-chart"]), Some(false));
        assert_eq!(parse(&["mtype", "--no-chart", "--chart"]), Some(true));
        assert_eq!(parse(&["mtype", "--chart", "--no-chart"]), Some(false));
    }

    #[test]
    fn history_and_show() {
        let cli = Cli::try_parse_from(["mtype", "history", "-n", "5", "--mode", "words"]).unwrap();
        assert_eq!(
            cli.selected_command(),
            Command::History(HistoryArgs {
                limit: 5,
                mode: Some(Mode::Words),
                csv: false,
            })
        );

        let cli = Cli::try_parse_from(["mtype", "show", "12"]).unwrap();
        assert_eq!(cli.selected_command(), Command::Show(ShowArgs { id: 12 }));
        assert!(Cli::try_parse_from(["mtype", "show"]).is_err());
    }

    #[test]
    fn global_config_path() {
        let cli = Cli::try_parse_from(["mtype", "stats", "--config", "/tmp/c.json"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/c.json")));
        assert_eq!(cli.selected_command(), Command::Stats);
    }
}
