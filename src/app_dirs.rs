use directories::ProjectDirs;
use std::path::PathBuf;

const APP_NAME: &str = "mtype";

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    fn project() -> Option<ProjectDirs> {
        ProjectDirs::from("", "", APP_NAME)
    }

    fn home_fallback(parts: &[&str]) -> Option<PathBuf> {
        let home = std::env::var_os("HOME")?;
        Some(parts.iter().fold(PathBuf::from(home), |p, part| p.join(part)))
    }

    pub fn config_path() -> Option<PathBuf> {
        Self::project()
            .map(|pd| pd.config_dir().join("config.json"))
            .or_else(|| Self::home_fallback(&[".config", APP_NAME, "config.json"]))
    }

    pub fn db_path() -> Option<PathBuf> {
        Self::project()
            .map(|pd| pd.data_dir().join("mtype.db"))
            .or_else(|| Self::home_fallback(&[".local", "share", APP_NAME, "mtype.db"]))
    }

    pub fn log_path() -> Option<PathBuf> {
        Self::project()
            .map(|pd| pd.data_local_dir().join("mtype.log"))
            .or_else(|| Self::home_fallback(&[".local", "state", APP_NAME, "mtype.log"]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_are_namespaced() {
        // every platform we build for has a home or project dir
        for path in [AppDirs::config_path(), AppDirs::db_path(), AppDirs::log_path()]
            .into_iter()
            .flatten()
        {
            assert!(path.to_string_lossy().contains(APP_NAME));
        }
    }
}
