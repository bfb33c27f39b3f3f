//! Runtime configuration for the forum server binary.

use std::path::{Path, PathBuf};

use config::{ConfigBuilder, ConfigError, builder::DefaultState};
use forum_core::bootstrap::BootstrapConfig;
use serde::Deserialize;

/// Server configuration, deserialised from `config.toml` layered with
/// `FORUM_`-prefixed environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:             String,
  #[serde(default = "default_port")]
  pub port:             u16,
  #[serde(default = "default_store_path")]
  pub store_path:       PathBuf,
  /// External id that is always made a global admin on login.
  #[serde(default)]
  pub designated_admin: Option<String>,
}

fn default_host() -> String { "127.0.0.1".to_string() }

fn default_port() -> u16 { 8080 }

fn default_store_path() -> PathBuf { PathBuf::from("~/.local/share/forum/forum.db") }

impl ServerConfig {
  /// Build a config from the given sources, later sources winning.
  pub fn load(builder: ConfigBuilder<DefaultState>) -> Result<Self, ConfigError> {
    builder.build()?.try_deserialize()
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }

  pub fn bootstrap(&self) -> BootstrapConfig {
    BootstrapConfig {
      designated_admin: self.designated_admin.clone(),
    }
  }
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

#[cfg(test)]
mod tests {
  use config::{Config, File, FileFormat};

  use super::*;

  #[test]
  fn empty_config_uses_defaults() {
    let cfg = ServerConfig::load(Config::builder()).unwrap();
    assert_eq!(cfg.address(), "127.0.0.1:8080");
    assert!(cfg.designated_admin.is_none());
  }

  #[test]
  fn designated_admin_reaches_bootstrap() {
    let toml = r#"
      port = 9000
      store_path = "/tmp/forum.db"
      designated_admin = "discord:1234"
    "#;
    let cfg = ServerConfig::load(
      Config::builder().add_source(File::from_str(toml, FileFormat::Toml)),
    )
    .unwrap();
    assert_eq!(cfg.port, 9000);
    assert_eq!(cfg.store_path, PathBuf::from("/tmp/forum.db"));
    assert_eq!(cfg.bootstrap().designated_admin.as_deref(), Some("discord:1234"));
  }

  #[test]
  fn tilde_only_expands_as_prefix() {
    let plain = Path::new("/var/lib/forum.db");
    assert_eq!(expand_tilde(plain), plain);
    let inner = Path::new("data/~/forum.db");
    assert_eq!(expand_tilde(inner), inner);
  }
}
