use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use termines_core::{CellCount, Coord, GameConfig, SortBy};
use thiserror::Error;

use crate::theme::ThemeName;

pub const SETTINGS_FILE: &str = "settings.toml";
const APP_DIR: &str = "termines";
const HOME_VAR: &str = "TERMINES_HOME";

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed settings: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("cannot encode settings: {0}")]
    Encode(#[from] toml::ser::Error),
    #[error("invalid new game: {0}")]
    InvalidGame(#[from] termines_core::GameError),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewGame {
    pub width: Coord,
    pub height: Coord,
    pub mines: CellCount,
}

impl NewGame {
    pub fn game_config(&self) -> termines_core::Result<GameConfig> {
        GameConfig::new((self.width, self.height), self.mines)
    }
}

impl Default for NewGame {
    fn default() -> Self {
        Self {
            width: 30,
            height: 16,
            mines: 99,
        }
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SavedGames {
    pub sort: SortBy,
}

/// User preferences persisted in `settings.toml`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub theme: ThemeName,
    pub max_scrolloff: Coord,
    pub new_game: NewGame,
    pub saved_games: SavedGames,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            theme: ThemeName::default(),
            max_scrolloff: 2,
            new_game: NewGame::default(),
            saved_games: SavedGames::default(),
        }
    }
}

impl Settings {
    /// Reads `settings.toml` from `dir`, writing the defaults first if it is missing.
    pub fn load_or_init(dir: &Path) -> Result<Self, SettingsError> {
        let path = dir.join(SETTINGS_FILE);
        if !path.exists() {
            log::info!("creating default settings at {}", path.display());
            let settings = Self::default();
            settings.save(dir)?;
            return Ok(settings);
        }

        let text = fs::read_to_string(&path)?;
        let settings: Self = toml::from_str(&text)?;
        settings.validate()?;
        log::debug!("loaded settings from {}: {:?}", path.display(), settings);
        Ok(settings)
    }

    pub fn save(&self, dir: &Path) -> Result<(), SettingsError> {
        fs::create_dir_all(dir)?;
        fs::write(dir.join(SETTINGS_FILE), toml::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        self.new_game.game_config()?;
        Ok(())
    }
}

/// Picks the data directory: explicit flag, `$TERMINES_HOME`, the XDG config
/// dir, `~/.config`, then `./config`.
pub fn resolve_data_dir(explicit: Option<PathBuf>) -> PathBuf {
    resolve_with(explicit, |name| std::env::var_os(name))
}

fn resolve_with(explicit: Option<PathBuf>, var: impl Fn(&str) -> Option<OsString>) -> PathBuf {
    let non_empty = |name: &str| var(name).filter(|value| !value.is_empty());

    if let Some(dir) = explicit {
        return dir;
    }
    if let Some(home) = non_empty(HOME_VAR) {
        return PathBuf::from(home);
    }
    if let Some(config) = non_empty("XDG_CONFIG_HOME") {
        return PathBuf::from(config).join(APP_DIR);
    }
    if let Some(home) = non_empty("HOME") {
        return PathBuf::from(home).join(".config").join(APP_DIR);
    }
    PathBuf::from("./config").join(APP_DIR)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &'static [(&'static str, &'static str)]) -> impl Fn(&str) -> Option<OsString> {
        move |name| {
            pairs
                .iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| OsString::from(value))
        }
    }

    #[test]
    fn data_dir_precedence() {
        let all = vars(&[
            ("TERMINES_HOME", "/t"),
            ("XDG_CONFIG_HOME", "/x"),
            ("HOME", "/h"),
        ]);
        assert_eq!(resolve_with(Some("/flag".into()), &all), PathBuf::from("/flag"));
        assert_eq!(resolve_with(None, &all), PathBuf::from("/t"));
        assert_eq!(
            resolve_with(None, vars(&[("XDG_CONFIG_HOME", "/x"), ("HOME", "/h")])),
            PathBuf::from("/x/termines")
        );
        assert_eq!(
            resolve_with(None, vars(&[("TERMINES_HOME", ""), ("HOME", "/h")])),
            PathBuf::from("/h/.config/termines")
        );
        assert_eq!(resolve_with(None, vars(&[])), PathBuf::from("./config/termines"));
    }

    #[test]
    fn missing_file_is_created_with_defaults() {
        let dir = tempfile::tempdir().unwrap();

        let settings = Settings::load_or_init(dir.path()).unwrap();

        assert_eq!(settings, Settings::default());
        assert!(dir.path().join(SETTINGS_FILE).exists());
        assert_eq!(Settings::load_or_init(dir.path()).unwrap(), settings);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join(SETTINGS_FILE),
            "theme = \"mono\"\n[new_game]\nwidth = 9\nheight = 9\nmines = 10\n",
        )
        .unwrap();

        let settings = Settings::load_or_init(dir.path()).unwrap();

        assert_eq!(settings.theme, ThemeName::Mono);
        assert_eq!(settings.max_scrolloff, 2);
        assert_eq!(settings.new_game.game_config().unwrap().size, (9, 9));
        assert_eq!(settings.saved_games.sort, SortBy::Latest);
    }

    #[test]
    fn impossible_new_game_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join(SETTINGS_FILE),
            "[new_game]\nwidth = 2\nheight = 2\nmines = 4\n",
        )
        .unwrap();

        assert!(matches!(
            Settings::load_or_init(dir.path()),
            Err(SettingsError::InvalidGame(_))
        ));
    }
}
