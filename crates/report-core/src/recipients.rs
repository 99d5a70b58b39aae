//! Read-only access to the per-branch recipient store.
//!
//! The store is a JSON document maintained by a separate editor:
//!
//! ```json
//! { "stores": { "05": { "admins": ["a@x"], "coordinators": ["c@x"] } } }
//! ```
//!
//! This module only reads it; the pipeline never writes recipient data.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::data_processors::BranchCodeProcessor;
use crate::models::BranchCode;

/// Lookup of notification recipients per branch.
pub trait RecipientDirectory: Send + Sync {
    /// Primary recipients for `branch`; empty when the branch is unknown.
    fn admins_for(&self, branch: &BranchCode) -> Vec<String>;
    /// Copied recipients for `branch`; empty when the branch is unknown.
    fn coordinators_for(&self, branch: &BranchCode) -> Vec<String>;
}

/// Recipient lists of a single branch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreRecipients {
    #[serde(default)]
    pub admins: Vec<String>,
    #[serde(default)]
    pub coordinators: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RecipientStore {
    #[serde(default)]
    stores: BTreeMap<String, StoreRecipients>,
}

/// [`RecipientDirectory`] backed by the JSON recipient store.
#[derive(Debug, Clone, Default)]
pub struct JsonRecipientDirectory {
    stores: BTreeMap<String, StoreRecipients>,
}

impl JsonRecipientDirectory {
    /// Default store location: `~/Documents/CobrancaNF/email_config.json`.
    pub fn default_path() -> PathBuf {
        let documents = dirs::document_dir()
            .or_else(|| dirs::home_dir().map(|h| h.join("Documents")))
            .unwrap_or_else(|| PathBuf::from("."));
        documents.join("CobrancaNF").join("email_config.json")
    }

    /// Load the store at `path`.
    ///
    /// A missing or unparsable file yields an empty directory and a warning,
    /// so a run can still produce artifacts without recipients.
    pub fn load_from(path: &Path) -> Self {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) => {
                warn!("Recipient store {} not readable: {}", path.display(), e);
                return Self::default();
            }
        };

        match serde_json::from_str::<RecipientStore>(&content) {
            Ok(store) => {
                let directory = Self::from_entries(store.stores);
                debug!(
                    "Loaded recipients for {} branches from {}",
                    directory.len(),
                    path.display()
                );
                directory
            }
            Err(e) => {
                warn!("Recipient store {} is not valid JSON: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Build a directory from `(branch key, recipients)` pairs.
    ///
    /// Numeric keys are canonicalized like ledger branch codes, so a store
    /// written with `"5"` still matches branch `05`.
    pub fn from_entries(entries: impl IntoIterator<Item = (String, StoreRecipients)>) -> Self {
        let stores = entries
            .into_iter()
            .map(|(key, recipients)| (canonical_key(&key), recipients))
            .collect();
        Self { stores }
    }

    pub fn len(&self) -> usize {
        self.stores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stores.is_empty()
    }

    pub fn get(&self, branch: &BranchCode) -> Option<&StoreRecipients> {
        self.stores.get(branch.as_str())
    }
}

impl RecipientDirectory for JsonRecipientDirectory {
    fn admins_for(&self, branch: &BranchCode) -> Vec<String> {
        self.get(branch).map(|s| s.admins.clone()).unwrap_or_default()
    }

    fn coordinators_for(&self, branch: &BranchCode) -> Vec<String> {
        self.get(branch)
            .map(|s| s.coordinators.clone())
            .unwrap_or_default()
    }
}

fn canonical_key(key: &str) -> String {
    match BranchCodeProcessor::parse(key) {
        Ok(Some(code)) => code.as_str().to_string(),
        _ => key.trim().to_string(),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
