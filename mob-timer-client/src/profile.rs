//! Persisted display name, attached to start/toggle requests.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum ProfileError {
    #[error("could not find a config directory")]
    NoConfigDir,
    #[error("profile I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid profile: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("could not serialize profile: {0}")]
    Serialize(#[from] toml::ser::Error),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct ProfileStore {
    path: PathBuf,
}

impl ProfileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<config dir>/mob-timer/profile.toml`
    pub fn default_location() -> Result<Self, ProfileError> {
        let mut path = dirs::config_dir().ok_or(ProfileError::NoConfigDir)?;
        path.push(crate::config::APP_DIR);
        path.push("profile.toml");
        Ok(Self::new(path))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Missing file reads as an empty name.
    pub async fn load(&self) -> Result<Profile, ProfileError> {
        if !self.path.exists() {
            return Ok(Profile::default());
        }
        let content = tokio::fs::read_to_string(&self.path).await?;
        Ok(toml::from_str(&content)?)
    }

    pub async fn save_name(&self, name: &str) -> Result<(), ProfileError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let profile = Profile { name: name.to_string() };
        tokio::fs::write(&self.path, toml::to_string_pretty(&profile)?).await?;
        Ok(())
    }
}
