// src/store/mod.rs
// Durable local persistence of finished transcriptions + text export

use crate::orchestrator::TranscriptionResult;
use chrono::Utc;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use thiserror::Error;

const STORE_LIMIT: usize = 50;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read store: {0}")]
    Read(String),

    #[error("failed to write store: {0}")]
    Write(String),
}

/// A persisted transcription. Id and timestamp are assigned at save time;
/// the text itself is immutable from then on.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedTranscription {
    pub id: String,
    pub file_name: String,
    pub text: String,
    pub timestamp: String,
}

/// JSON-file store of finished transcriptions, newest first, capped at
/// `STORE_LIMIT` entries.
pub struct TranscriptionStore {
    path: PathBuf,
    limit: usize,
}

impl TranscriptionStore {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            limit: STORE_LIMIT,
        }
    }

    pub fn save(&self, result: &TranscriptionResult) -> Result<SavedTranscription, StoreError> {
        let mut entries = self.load_or_create()?;

        let saved = SavedTranscription {
            id: uuid::Uuid::new_v4().to_string(),
            file_name: result.file_name.clone(),
            text: result.text.clone(),
            timestamp: Utc::now().to_rfc3339(),
        };

        entries.insert(0, saved.clone());
        if entries.len() > self.limit {
            entries.truncate(self.limit);
        }

        self.save_raw(&entries)?;

        tracing::info!("Saved transcription {} ({} chars)", saved.id, saved.text.len());

        Ok(saved)
    }

    pub fn list(&self) -> Result<Vec<SavedTranscription>, StoreError> {
        self.load_or_create()
    }

    pub fn delete(&self, id: &str) -> Result<(), StoreError> {
        let mut entries = self.load_or_create()?;
        entries.retain(|entry| entry.id != id);
        self.save_raw(&entries)
    }

    pub fn clear(&self) -> Result<(), StoreError> {
        self.save_raw(&Vec::new())
    }

    fn load_or_create(&self) -> Result<Vec<SavedTranscription>, StoreError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let raw = fs::read_to_string(&self.path).map_err(|e| StoreError::Read(e.to_string()))?;
        match serde_json::from_str::<Vec<SavedTranscription>>(&raw) {
            Ok(entries) => Ok(entries),
            Err(_) => {
                // Unreadable store file: keep a backup and start fresh.
                let backup = self.path.with_extension("json.bak");
                let _ = fs::copy(&self.path, backup);
                tracing::warn!("Store file corrupted, starting with an empty store");
                Ok(Vec::new())
            }
        }
    }

    fn save_raw(&self, entries: &Vec<SavedTranscription>) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| StoreError::Write(e.to_string()))?;
        }
        let json =
            serde_json::to_string_pretty(entries).map_err(|e| StoreError::Write(e.to_string()))?;
        fs::write(&self.path, json).map_err(|e| StoreError::Write(e.to_string()))
    }
}

/// Write `text` into `dir` under a sanitized version of `suggested_name`
/// with a `.txt` extension. Returns the written path.
pub fn export_text(dir: &Path, suggested_name: &str, text: &str) -> Result<PathBuf, StoreError> {
    let file_name = export_file_name(suggested_name);
    let path = dir.join(file_name);

    fs::create_dir_all(dir).map_err(|e| StoreError::Write(e.to_string()))?;
    fs::write(&path, text).map_err(|e| StoreError::Write(e.to_string()))?;

    tracing::info!("Exported transcript to {}", path.display());

    Ok(path)
}

fn export_file_name(suggested: &str) -> String {
    static INVALID_RE: OnceLock<Regex> = OnceLock::new();
    let re = INVALID_RE.get_or_init(|| {
        Regex::new(r"[^A-Za-z0-9._ -]+").expect("valid filename filter regex")
    });

    let cleaned = re.replace_all(suggested.trim(), "_");
    let cleaned = cleaned.trim_matches(|c| c == '.' || c == ' ');
    let base = if cleaned.is_empty() {
        "transcription"
    } else {
        cleaned
    };

    let mut name = base.to_string();
    if !name.to_ascii_lowercase().ends_with(".txt") {
        name.push_str(".txt");
    }
    name
}
