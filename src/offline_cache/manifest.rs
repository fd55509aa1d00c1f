use serde::{Deserialize, Serialize};

use crate::types::SyncError;

/// Everything a generation must hold before it may serve requests.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CacheManifest {
    pub generation: String,
    pub required: Vec<String>,
    /// Served for document requests when the network is unreachable.
    /// Must be listed in `required` to be available.
    #[serde(default)]
    pub offline_fallback: Option<String>,
}

impl CacheManifest {
    pub fn new(generation: impl Into<String>, required: Vec<String>) -> Self {
        Self {
            generation: generation.into(),
            required,
            offline_fallback: None,
        }
    }

    pub fn with_offline_fallback(mut self, path: impl Into<String>) -> Self {
        self.offline_fallback = Some(path.into());
        self
    }

    pub(crate) fn validate(&self) -> Result<(), SyncError> {
        if self.generation.trim().is_empty() {
            return Err(SyncError::Cache("cache generation must be named".to_string()));
        }
        if let Some(fallback) = &self.offline_fallback {
            if !self.required.iter().any(|path| path == fallback) {
                return Err(SyncError::Cache(format!(
                    "offline fallback {fallback} is not a required entry"
                )));
            }
        }
        Ok(())
    }

    /// Required paths in manifest order, without duplicates.
    pub(crate) fn unique_paths(&self) -> Vec<&str> {
        let mut seen = Vec::new();
        for path in &self.required {
            if !seen.contains(&path.as_str()) {
                seen.push(path.as_str());
            }
        }
        seen
    }
}
