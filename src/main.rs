use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    error::Error,
    fmt::Display,
    io::{self, stdin},
    time::Instant,
};
use tracing::{info, warn};

use mtype::{
    app::{self, TestSettings},
    cli::{Cli, Command, HistoryArgs, ShowArgs, TestArgs},
    config::{Config, ConfigStore, FileConfigStore},
    input::{CrosstermInputSource, InputSource},
    report,
    runtime::{FixedTicker, Runner},
    session::{SessionEngine, SessionOutcome},
    storage::SessionStore,
    telemetry,
    text::TextGenerator,
    ui::TerminalPresenter,
};

fn main() -> Result<(), Box<dyn Error>> {
    telemetry::init_tracing();
    let cli = Cli::parse();

    let store = match &cli.config {
        Some(path) => FileConfigStore::with_path(path),
        None => FileConfigStore::new(),
    };
    let config = load_config(&store);

    match cli.selected_command() {
        Command::Test(args) => run_test(&config, &args),
        Command::History(args) => history(&args),
        Command::Stats => stats(),
        Command::Show(args) => show(&args),
    }
}

/// Load the config, writing the defaults out on first run
fn load_config(store: &FileConfigStore) -> Config {
    let config = store.load();
    if !store.path().exists() {
        if let Err(err) = store.save(&config) {
            warn!(target: "config", error = %err, "config_write_failed");
        }
    }
    config
}

fn run_test(config: &Config, args: &TestArgs) -> Result<(), Box<dyn Error>> {
    let settings = TestSettings::resolve(config, args).unwrap_or_else(|err| invalid_value(err));
    let target = TextGenerator::new(&settings.generator)
        .and_then(|mut generator| settings.build_target(&mut generator))
        .unwrap_or_else(|err| invalid_value(err));
    info!(target: "app", mode = %target.mode, chars = target.char_len(), "target_ready");
    let mut engine = SessionEngine::for_target(target)?;

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let outcome = start_tui(&mut terminal, &settings, &mut engine);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen,)?;
    terminal.show_cursor()?;

    let outcome = outcome?;
    if let SessionOutcome::Finished(result) = &outcome {
        println!(
            "{:.1} wpm  {:.1} raw  {:.1}% accuracy",
            result.wpm, result.raw_wpm, result.accuracy
        );
        match SessionStore::open_default() {
            Ok(mut store) => {
                if let Err(err) = app::record_outcome(&mut store, &outcome) {
                    eprintln!("warning: could not save result: {err}");
                }
            }
            Err(err) => {
                warn!(target: "app", error = %err, "store_open_failed");
                eprintln!("warning: could not open history database: {err}");
            }
        }
    }
    Ok(())
}

/// Report a bad option the way clap reports parse errors, then exit
fn invalid_value(err: impl Display) -> ! {
    let mut cmd = Cli::command();
    cmd.error(ErrorKind::InvalidValue, err.to_string()).exit()
}

fn start_tui<B: Backend>(
    terminal: &mut Terminal<B>,
    settings: &TestSettings,
    engine: &mut SessionEngine,
) -> Result<SessionOutcome, Box<dyn Error>> {
    let input = CrosstermInputSource::spawn()?;
    let runner = Runner::new(input, FixedTicker::default());
    let mut presenter = TerminalPresenter::new(terminal, settings.view);

    if !runner.countdown(settings.countdown, |remaining| presenter.countdown_frame(remaining))? {
        engine.abort(Instant::now());
    }

    // returns at once when the countdown was cancelled
    let outcome = runner.run(engine, &mut presenter)?;

    if let SessionOutcome::Finished(result) = &outcome {
        let chart = app::completion_chart(result, settings.chart, presenter.width()?);
        presenter.summary(result, chart.as_deref())?;
        let _ = runner.input().receiver().recv();
    }
    Ok(outcome)
}

fn history(args: &HistoryArgs) -> Result<(), Box<dyn Error>> {
    let store = SessionStore::open_default()?;
    let sessions = store.list_sessions(args.limit, args.mode)?;
    if args.csv {
        report::write_history_csv(&sessions, io::stdout())?;
    } else {
        println!(
            "{}",
            report::history_table(&sessions, args.mode, chrono::Local::now())
        );
    }
    Ok(())
}

fn stats() -> Result<(), Box<dyn Error>> {
    let store = SessionStore::open_default()?;
    println!("{}", report::stats_report(&store.get_stats()?));
    Ok(())
}

fn show(args: &ShowArgs) -> Result<(), Box<dyn Error>> {
    let store = SessionStore::open_default()?;
    let Some(session) = store.get_session(args.id)? else {
        invalid_value(format!("no session with id {}", args.id));
    };
    let samples = store.get_samples(args.id)?;
    println!("{}", report::session_report(&session, &samples));
    Ok(())
}
