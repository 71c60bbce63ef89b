//! Persistent record of the links and directories this tool created.
//!
//! The record is the only authority removal consults: nothing absent from it
//! is ever unlinked or deleted.

use anyhow::Result;
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::error::LinkError;
use crate::runtime::Runtime;

/// Links and directories owned by this tool.
///
/// Both sets serialize as sorted lists, so the file content only depends on
/// what is recorded, never on the order it was recorded in.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkRecord {
    pub links: BTreeSet<PathBuf>,
    pub directories: BTreeSet<PathBuf>,
}

impl LinkRecord {
    pub fn is_empty(&self) -> bool {
        self.links.is_empty() && self.directories.is_empty()
    }

    /// Build a record from parsed JSON, rejecting anything that is not an
    /// object carrying `links` and `directories` lists.
    fn from_value(value: &Value) -> Result<Self, String> {
        let object = value
            .as_object()
            .ok_or_else(|| "top level is not an object".to_string())?;

        Ok(Self {
            links: path_list(object.get("links"), "links")?,
            directories: path_list(object.get("directories"), "directories")?,
        })
    }
}

fn path_list(value: Option<&Value>, field: &str) -> Result<BTreeSet<PathBuf>, String> {
    let items = value
        .ok_or_else(|| format!("missing '{}' field", field))?
        .as_array()
        .ok_or_else(|| format!("'{}' is not a list", field))?;

    Ok(items
        .iter()
        .map(|item| match item {
            Value::String(s) => PathBuf::from(s),
            other => PathBuf::from(other.to_string()),
        })
        .collect())
}

/// Reads and writes the record file.
pub struct RecordStore<'a, R: Runtime> {
    runtime: &'a R,
    path: PathBuf,
}

impl<'a, R: Runtime> RecordStore<'a, R> {
    pub fn new(runtime: &'a R, path: impl Into<PathBuf>) -> Self {
        Self {
            runtime,
            path: path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the record, creating an empty one on disk if none exists yet.
    ///
    /// An unreadable file or invalid JSON is logged and treated as empty. Valid
    /// JSON of the wrong shape is a [`LinkError::InvalidRecord`].
    #[tracing::instrument(skip(self))]
    pub fn load(&self) -> Result<LinkRecord> {
        if !self.runtime.exists(&self.path) {
            info!("Record file {:?} does not exist, creating an empty one", self.path);
            let record = LinkRecord::default();
            self.save(&record);
            return Ok(record);
        }

        let content = match self.runtime.read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) => {
                warn!("Cannot read record file {:?}: {:#}", self.path, e);
                return Ok(LinkRecord::default());
            }
        };

        let value: Value = match serde_json::from_str(&content) {
            Ok(value) => value,
            Err(e) => {
                warn!("Cannot parse record file {:?}: {}", self.path, e);
                return Ok(LinkRecord::default());
            }
        };

        let record = LinkRecord::from_value(&value).map_err(|reason| LinkError::InvalidRecord {
            path: self.path.clone(),
            reason,
        })?;
        debug!(
            "Loaded {} link(s) and {} director(ies) from {:?}",
            record.links.len(),
            record.directories.len(),
            self.path
        );
        Ok(record)
    }

    /// Overwrite the record file. Returns false (after logging) if it could not be written.
    #[tracing::instrument(skip(self, record))]
    pub fn save(&self, record: &LinkRecord) -> bool {
        info!("Saving link record to {:?}", self.path);
        let result = serde_json::to_string_pretty(record)
            .map_err(anyhow::Error::from)
            .and_then(|content| self.runtime.write(&self.path, content.as_bytes()));

        match result {
            Ok(()) => true,
            Err(e) => {
                error!("Cannot write record file {:?}: {:#}", self.path, e);
                false
            }
        }
    }

    /// Remove the record file once nothing is left to track.
    #[tracing::instrument(skip(self))]
    pub fn delete(&self) {
        if !self.runtime.exists(&self.path) {
            debug!("Record file {:?} already absent", self.path);
            return;
        }
        match self.runtime.remove_file(&self.path) {
            Ok(()) => info!("Deleted record file {:?}", self.path),
            Err(e) => warn!("Cannot delete record file {:?}: {:#}", self.path, e),
        }
    }
}
