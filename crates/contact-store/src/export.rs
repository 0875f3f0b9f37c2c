//! Export projection for the bulk-send tool.
//!
//! Two artifacts are recomputed in full from the registry after every
//! mutation: the opted-in CSV (`phone,name`) and the newline-delimited
//! opted-out list. Both are written atomically (temp file + rename) so the
//! bulk sender never observes a partial file.

use crate::error::StoreError;
use crate::registry::ContactRegistry;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// Destination paths for the two export artifacts.
#[derive(Debug, Clone)]
pub struct ExportSink {
    contacts_csv: PathBuf,
    optout_list: PathBuf,
}

impl ExportSink {
    pub fn new(contacts_csv: impl Into<PathBuf>, optout_list: impl Into<PathBuf>) -> Self {
        Self {
            contacts_csv: contacts_csv.into(),
            optout_list: optout_list.into(),
        }
    }

    /// Overwrite both artifacts from the registry's current contents.
    /// Idempotent; safe to re-run.
    pub async fn refresh(&self, registry: &ContactRegistry) -> Result<(), StoreError> {
        let contacts = registry.list("");

        let mut csv = String::from("phone,name\n");
        for contact in contacts.iter().filter(|c| c.consent.is_opted_in()) {
            csv.push_str(&csv_field(&contact.phone));
            csv.push(',');
            csv.push_str(&csv_field(&contact.name));
            csv.push('\n');
        }

        let mut optouts = String::new();
        for contact in contacts.iter().filter(|c| !c.consent.is_opted_in()) {
            optouts.push_str(&contact.phone);
            optouts.push('\n');
        }

        write_atomic(&self.contacts_csv, csv.as_bytes()).await?;
        write_atomic(&self.optout_list, optouts.as_bytes()).await?;

        debug!(
            csv = %self.contacts_csv.display(),
            optouts = %self.optout_list.display(),
            "Refreshed export artifacts"
        );
        Ok(())
    }
}

/// Quote a CSV field only when it needs it; embedded quotes are doubled.
pub fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

async fn write_atomic(path: &Path, data: &[u8]) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).await?;
        }
    }

    let temp_path = path.with_extension("tmp");
    fs::write(&temp_path, data).await?;
    fs::rename(&temp_path, path).await?;
    Ok(())
}
