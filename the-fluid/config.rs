//! Loading fluid typing settings from TOML.
//!
//! Settings live under a `[fluid-typing]` table, either in the user's
//! `config.toml` (see [`config_dir`]) or in `.the-fluid/config.toml` in the
//! current directory. Keys of the local file win over the global one.
//!
//! ```toml
//! [fluid-typing]
//! animation-duration = 0.3
//! animation-ease = "ease-out-cubic"
//! identity = "stable"
//! insertion = "trailing"
//! ```

use std::{
  fs,
  io,
  path::{
    Path,
    PathBuf,
  },
};

use etcetera::base_strategy::{
  BaseStrategy,
  choose_base_strategy,
};
use serde::Deserialize;
use thiserror::Error;
use toml::Value;

use crate::options::Options;

pub const CONFIG_DIR_ENV: &str = "THE_FLUID_CONFIG_DIR";

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
  #[error("unknown animation ease `{0}`")]
  UnknownEase(String),
  #[error("animation duration must be a positive number of seconds, got {0}")]
  InvalidDuration(f32),
  #[error("unknown node identity `{0}`, expected `stable` or `offset`")]
  UnknownIdentity(String),
  #[error("unknown insertion mode `{0}`, expected `trailing` or `per-character`")]
  UnknownInsertion(String),
  #[error("failed to parse config: {0}")]
  Parse(#[from] toml::de::Error),
  #[error("failed to read {}: {source}", path.display())]
  Io {
    path:   PathBuf,
    #[source]
    source: io::Error,
  },
}

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Config {
  pub fluid_typing: Options,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct ConfigRaw {
  fluid_typing: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct OptionsRaw {
  animation_duration: Option<f32>,
  animation_ease:     Option<String>,
  identity:           Option<String>,
  insertion:          Option<String>,
}

impl OptionsRaw {
  fn into_options(self) -> Result<Options> {
    let mut options = Options::default();
    if let Some(secs) = self.animation_duration {
      options = options.with_duration(secs)?;
    }
    if let Some(ease) = self.animation_ease {
      options = options.with_ease(ease.parse()?);
    }
    if let Some(identity) = self.identity {
      options = options.with_identity(identity.parse()?);
    }
    if let Some(insertion) = self.insertion {
      options = options.with_insertion(insertion.parse()?);
    }
    Ok(options)
  }
}

impl Config {
  /// Builds the config from the contents of the global and the local file.
  /// A file that could not be read is skipped. Fails only when neither file
  /// was read or when one of them is invalid.
  pub fn load(global: Result<String>, local: Result<String>) -> Result<Config> {
    let global_config: Result<ConfigRaw> =
      global.and_then(|file| toml::from_str(&file).map_err(ConfigError::from));
    let local_config: Result<ConfigRaw> =
      local.and_then(|file| toml::from_str(&file).map_err(ConfigError::from));

    let table = match (global_config, local_config) {
      (Ok(global), Ok(local)) => {
        match (global.fluid_typing, local.fluid_typing) {
          (None, None) => None,
          (None, Some(val)) | (Some(val), None) => Some(val),
          (Some(global), Some(local)) => Some(merge_tables(global, local)),
        }
      },
      (Err(err), _) | (_, Err(err)) if !matches!(err, ConfigError::Io { .. }) => {
        return Err(err);
      },
      (Ok(config), Err(_)) | (Err(_), Ok(config)) => config.fluid_typing,
      (Err(err), Err(_)) => return Err(err),
    };

    let options = match table {
      Some(table) => table.try_into::<OptionsRaw>()?.into_options()?,
      None => Options::default(),
    };
    Ok(Config {
      fluid_typing: options,
    })
  }

  /// Reads and loads the two files at the given paths.
  pub fn load_from(global: &Path, local: &Path) -> Result<Config> {
    Self::load(read_file(global), read_file(local))
  }

  /// Loads `config.toml` from [`config_dir`] and from the local
  /// `.the-fluid` directory.
  pub fn load_user() -> Result<Config> {
    let local = local_config_file();
    match config_file() {
      Some(global) => Self::load_from(&global, &local),
      None => {
        let global = Err(ConfigError::Io {
          path:   PathBuf::from("config.toml"),
          source: io::Error::new(io::ErrorKind::NotFound, "no config directory"),
        });
        Self::load(global, read_file(&local))
      },
    }
  }

  /// Like [`Config::load_user`], falling back to the defaults when no
  /// config exists or it is invalid.
  pub fn load_user_or_default() -> Config {
    match Self::load_user() {
      Ok(config) => config,
      Err(ConfigError::Io { .. }) => Config::default(),
      Err(err) => {
        tracing::warn!(%err, "ignoring invalid fluid typing config");
        Config::default()
      },
    }
  }
}

/// Directory of the user's global config. `THE_FLUID_CONFIG_DIR` overrides
/// the platform default.
pub fn config_dir() -> Option<PathBuf> {
  if let Some(dir) = std::env::var_os(CONFIG_DIR_ENV) {
    return Some(PathBuf::from(dir));
  }
  let strategy = choose_base_strategy().ok()?;
  let mut path = strategy.config_dir();
  path.push("the-fluid");
  Some(path)
}

pub fn config_file() -> Option<PathBuf> {
  config_dir().map(|dir| dir.join("config.toml"))
}

pub fn local_config_file() -> PathBuf {
  PathBuf::from(".the-fluid").join("config.toml")
}

fn read_file(path: &Path) -> Result<String> {
  fs::read_to_string(path).map_err(|source| {
    ConfigError::Io {
      path: path.to_path_buf(),
      source,
    }
  })
}

/// Keys of `right` override keys of `left`.
fn merge_tables(left: Value, right: Value) -> Value {
  match (left, right) {
    (Value::Table(mut left), Value::Table(right)) => {
      for (key, value) in right {
        left.insert(key, value);
      }
      Value::Table(left)
    },
    (_, right) => right,
  }
}
