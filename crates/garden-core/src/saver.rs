use std::path::{Path, PathBuf};

use crate::error::GardenError;
use crate::models::data::{AppData, AppDataFile};

/// Loads and saves [`AppData`] as YAML.
pub struct AppDataSaver {
    path: PathBuf,
    data: AppData,
}

impl AppDataSaver {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            data: AppData::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn data(&self) -> &AppData {
        &self.data
    }

    /// Replace the in-memory data with the file's contents. A missing file
    /// loads as empty data.
    pub fn reload(&self) -> Result<(), GardenError> {
        if !self.path.exists() {
            tracing::debug!(path = %self.path.display(), "no data file, starting empty");
            self.data.load(AppDataFile::default());
            return Ok(());
        }

        let content = std::fs::read_to_string(&self.path)?;
        let file: AppDataFile = if content.trim().is_empty() {
            AppDataFile::default()
        } else {
            serde_yaml::from_str(&content)
                .map_err(|e| GardenError::Settings(format!("{}: {e}", self.path.display())))?
        };
        tracing::info!(
            path = %self.path.display(),
            starred = file.starred_anime.len(),
            "loaded app data"
        );
        self.data.load(file);
        Ok(())
    }

    /// Write the current data, replacing the file atomically.
    pub fn save(&self) -> Result<(), GardenError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_yaml::to_string(&self.data.snapshot())
            .map_err(|e| GardenError::Settings(e.to_string()))?;

        let tmp = self.path.with_extension("yml.tmp");
        std::fs::write(&tmp, content)?;
        std::fs::rename(&tmp, &self.path)?;
        tracing::debug!(path = %self.path.display(), "saved app data");
        Ok(())
    }
}
