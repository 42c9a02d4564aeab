//! Durable storage for the access/refresh token pair.
//!
//! The store holds exactly two string values under fixed keys,
//! persisted as a JSON file. Reads and writes are synchronous and
//! happen only from the task that owns the gateway; concurrent access
//! from another process sharing the same file is out of scope.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::error::{KardexError, Result};

/// On-disk layout. Field names are the fixed storage keys.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct StoredTokens {
    access_token: Option<String>,
    refresh_token: Option<String>,
}

/// Token store backed by an optional JSON file.
///
/// Without a path the store is memory-only, which the test suite uses.
#[derive(Debug)]
pub struct TokenStore {
    path: Option<PathBuf>,
    tokens: StoredTokens,
}

impl TokenStore {
    /// Open a store, loading any previously persisted pair.
    pub fn open(path: Option<PathBuf>) -> Result<Self> {
        let mut store = Self {
            path,
            tokens: StoredTokens::default(),
        };
        store.load()?;
        Ok(store)
    }

    /// Memory-only store.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            tokens: StoredTokens::default(),
        }
    }

    pub fn access(&self) -> Option<String> {
        self.tokens.access_token.clone()
    }

    pub fn refresh(&self) -> Option<String> {
        self.tokens.refresh_token.clone()
    }

    /// Store a new access token, replacing the refresh token only when
    /// the backend issued a new one.
    pub fn set(&mut self, access: String, refresh: Option<String>) -> Result<()> {
        self.tokens.access_token = Some(access);
        if let Some(refresh) = refresh {
            self.tokens.refresh_token = Some(refresh);
        }
        self.save()
    }

    /// Drop both tokens, on logout or unrecoverable refresh failure.
    pub fn clear(&mut self) -> Result<()> {
        self.tokens = StoredTokens::default();
        self.save()
    }

    fn load(&mut self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if !path.exists() {
            return Ok(());
        }

        let content = fs::read_to_string(path).map_err(|e| KardexError::io("reading token storage", e))?;
        if content.trim().is_empty() {
            return Ok(());
        }

        self.tokens = serde_json::from_str(&content)
            .map_err(|e| KardexError::malformed_token(format!("unreadable token storage: {}", e)))?;
        Ok(())
    }

    fn save(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| KardexError::io("creating token storage directory", e))?;
        }

        let content = serde_json::to_string_pretty(&self.tokens)?;
        fs::write(path, content).map_err(|e| KardexError::io("writing token storage", e))?;
        Ok(())
    }
}
