use std::env;
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::{Mutex, OnceLock};
use tracing_subscriber::EnvFilter;

use crate::app_dirs::AppDirs;

/// Env-filter directives, e.g. `MTYPE_LOG=debug` or `MTYPE_LOG=runtime=trace`
pub const LOG_ENV: &str = "MTYPE_LOG";
/// Overrides the log file location
pub const LOG_FILE_ENV: &str = "MTYPE_LOG_FILE";

static TRACING_INIT: OnceLock<()> = OnceLock::new();

pub fn log_path() -> PathBuf {
    env::var_os(LOG_FILE_ENV)
        .map(PathBuf::from)
        .or_else(AppDirs::log_path)
        .unwrap_or_else(|| env::temp_dir().join("mtype.log"))
}

fn filter_from(directives: &str) -> Option<EnvFilter> {
    let directives = directives.trim();
    if directives.is_empty() {
        return None;
    }
    EnvFilter::try_new(directives).ok()
}

/// Install a file-backed subscriber when `MTYPE_LOG` is set. The terminal
/// belongs to the TUI, so nothing is ever logged to stdout or stderr.
pub fn init_tracing() {
    let Some(filter) = env::var(LOG_ENV).ok().as_deref().and_then(filter_from) else {
        return;
    };

    let _ = TRACING_INIT.get_or_init(|| {
        let path = log_path();
        if let Some(parent) = path.parent() {
            if std::fs::create_dir_all(parent).is_err() {
                return;
            }
        }
        let file = match OpenOptions::new().create(true).append(true).open(&path) {
            Ok(file) => file,
            Err(_) => return,
        };
        let subscriber = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .finish();
        let _ = tracing::subscriber::set_global_default(subscriber);
    });
}
