use std::fs;
use std::path::{Path, PathBuf};

use crate::model::candidate::StaffRecord;

/// Error type for fetching the mentionable-user directory
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("could not read {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not decode staff list: {0}")]
    DecodeError(#[from] serde_json::Error),
    #[error("staff directory unavailable: {0}")]
    Unavailable(String),
}

/// The host-supplied collaborator that lists mentionable users.
///
/// Implementations may block; hosts run them off the input thread (see
/// [`crate::io::fetch_worker::FetchWorker`]) and hand the result back through
/// [`crate::ops::directory::CandidateDirectory::complete_refresh`].
pub trait MentionSource: Send + Sync {
    fn fetch_mentionable_users(&self) -> Result<Vec<StaffRecord>, FetchError>;
}

/// Decode a staff list response body: either a bare array or an object with
/// the array under `data`.
pub fn parse_staff_payload(body: &str) -> Result<Vec<StaffRecord>, FetchError> {
    let mut value: serde_json::Value = serde_json::from_str(body)?;
    let list = match value.get_mut("data").map(serde_json::Value::take) {
        Some(data) => data,
        None => value,
    };
    Ok(serde_json::from_value(list)?)
}

/// Reads the staff list from a JSON file on every fetch.
#[derive(Debug, Clone)]
pub struct StaffFileSource {
    path: PathBuf,
}

impl StaffFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        StaffFileSource { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl MentionSource for StaffFileSource {
    fn fetch_mentionable_users(&self) -> Result<Vec<StaffRecord>, FetchError> {
        let body = fs::read_to_string(&self.path).map_err(|e| FetchError::ReadError {
            path: self.path.clone(),
            source: e,
        })?;
        parse_staff_payload(&body)
    }
}

/// A fixed in-memory staff list.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    records: Vec<StaffRecord>,
}

impl StaticSource {
    pub fn new(records: Vec<StaffRecord>) -> Self {
        StaticSource { records }
    }
}

impl MentionSource for StaticSource {
    fn fetch_mentionable_users(&self) -> Result<Vec<StaffRecord>, FetchError> {
        Ok(self.records.clone())
    }
}
