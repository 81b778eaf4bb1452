//! `.env` Discovery
//!
//! Finds the nearest `.env` file at or above a directory and loads it into
//! the process environment.

use std::path::{Path, PathBuf};

/// File name searched for.
const DOTENV_FILE: &str = ".env";

/// Load the nearest `.env` at or above `start`.
///
/// Returns the loaded path, or `None` when no ancestor has one. Variables
/// already set in the environment are left alone.
///
/// # Errors
///
/// Returns an error if a `.env` file was found but could not be read or
/// parsed.
pub fn load_dotenv_from(start: &Path) -> Result<Option<PathBuf>, dotenvy::Error> {
    match start
        .ancestors()
        .map(|dir| dir.join(DOTENV_FILE))
        .find(|path| path.is_file())
    {
        Some(path) => dotenvy::from_path(&path).map(|()| Some(path)),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    fn scratch_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("market-sim-{}", uuid::Uuid::new_v4()));
        fs::create_dir_all(dir.join("nested").join("deeper")).unwrap();
        dir
    }

    #[test]
    fn finds_file_in_an_ancestor() {
        let dir = scratch_dir();
        fs::write(dir.join(DOTENV_FILE), "MARKET_SIM_DOTENV_ANCESTOR=found\n").unwrap();

        let loaded = load_dotenv_from(&dir.join("nested").join("deeper")).unwrap();

        assert_eq!(loaded, Some(dir.join(DOTENV_FILE)));
        assert_eq!(
            std::env::var("MARKET_SIM_DOTENV_ANCESTOR").as_deref(),
            Ok("found")
        );
        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn nearest_file_wins() {
        let dir = scratch_dir();
        fs::write(dir.join(DOTENV_FILE), "MARKET_SIM_DOTENV_NEAREST=outer\n").unwrap();
        let inner = dir.join("nested");
        fs::write(inner.join(DOTENV_FILE), "MARKET_SIM_DOTENV_NEAREST=inner\n").unwrap();

        let loaded = load_dotenv_from(&inner.join("deeper")).unwrap();

        assert_eq!(loaded, Some(inner.join(DOTENV_FILE)));
        assert_eq!(
            std::env::var("MARKET_SIM_DOTENV_NEAREST").as_deref(),
            Ok("inner")
        );
        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn malformed_file_is_reported() {
        let dir = scratch_dir();
        fs::write(dir.join(DOTENV_FILE), "MARKET_SIM_DOTENV_BROKEN=\"unterminated\n").unwrap();

        let err = load_dotenv_from(&dir.join("nested")).unwrap_err();

        assert!(!err.not_found());
        fs::remove_dir_all(dir).unwrap();
    }
}
