//! Core data types for Game Tuner.

use crate::error::{ErrorKind, PatchError};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// A resolved game installation: the executable and the directory holding it.
///
/// Only constructed by `system::paths::resolve_installation`, which checks
/// that the executable exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstallationTarget {
    executable_path: PathBuf,
    directory: PathBuf,
}

impl InstallationTarget {
    pub(crate) fn new(executable_path: PathBuf, directory: PathBuf) -> Self {
        InstallationTarget {
            executable_path,
            directory,
        }
    }

    pub fn executable_path(&self) -> &Path {
        &self.executable_path
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }
}

/// Result of probing the known install locations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DetectionResult {
    pub found: bool,
    pub path: Option<PathBuf>,
}

/// How a config file was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiscoveryMethod {
    /// Exact match against the known filename list
    KnownName,
    /// Fallback directory scan
    PatternMatch,
}

/// A candidate config file in the installation directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiscoveredFile {
    pub path: PathBuf,
    pub method: DiscoveryMethod,
}

impl DiscoveredFile {
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default()
    }
}

/// Value side of an override. Numbers keep their JSON rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OverrideValue {
    Number(serde_json::Number),
    Text(String),
}

impl OverrideValue {
    pub fn render(&self) -> String {
        match self {
            OverrideValue::Number(n) => n.to_string(),
            OverrideValue::Text(s) => s.clone(),
        }
    }
}

impl fmt::Display for OverrideValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

impl From<&str> for OverrideValue {
    fn from(s: &str) -> Self {
        OverrideValue::Text(s.to_string())
    }
}

impl From<String> for OverrideValue {
    fn from(s: String) -> Self {
        OverrideValue::Text(s)
    }
}

impl From<i32> for OverrideValue {
    fn from(n: i32) -> Self {
        OverrideValue::Number(n.into())
    }
}

impl From<i64> for OverrideValue {
    fn from(n: i64) -> Self {
        OverrideValue::Number(n.into())
    }
}

impl From<u64> for OverrideValue {
    fn from(n: u64) -> Self {
        OverrideValue::Number(n.into())
    }
}

impl From<f64> for OverrideValue {
    fn from(n: f64) -> Self {
        serde_json::Number::from_f64(n)
            .map(OverrideValue::Number)
            .unwrap_or_else(|| OverrideValue::Text(n.to_string()))
    }
}

/// Ordered key/value overrides requested by the caller.
///
/// Keys are matched case-insensitively against file content but written
/// back with the casing given here. Inserting a key that is already present
/// (ignoring case) replaces its value and keeps its original position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OverrideSet {
    entries: Vec<(String, OverrideValue)>,
}

impl OverrideSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<OverrideValue>) {
        let key = key.into();
        let value = value.into();
        match self
            .entries
            .iter_mut()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(&key))
        {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<OverrideValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &OverrideValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Refuse sets holding a blank key.
    ///
    /// A blank key has no anchor in any dialect, so it must never reach
    /// the substitution engine.
    pub fn validate(&self) -> Result<(), PatchError> {
        match self.entries.iter().find(|(key, _)| key.trim().is_empty()) {
            Some((key, _)) => Err(PatchError::InvalidArgument(format!(
                "override keys cannot be empty (got '{}')",
                key
            ))),
            None => Ok(()),
        }
    }

    /// Build from a JSON object of string or number values.
    pub fn from_json(value: &serde_json::Value) -> Result<Self, PatchError> {
        let object = value.as_object().ok_or_else(|| {
            PatchError::InvalidArgument("overrides must be a JSON object".to_string())
        })?;

        let mut set = OverrideSet::new();
        for (key, value) in object {
            if key.trim().is_empty() {
                return Err(PatchError::InvalidArgument(
                    "override keys cannot be empty".to_string(),
                ));
            }
            let value = match value {
                serde_json::Value::String(s) => OverrideValue::Text(s.clone()),
                serde_json::Value::Number(n) => OverrideValue::Number(n.clone()),
                other => {
                    return Err(PatchError::InvalidArgument(format!(
                        "override '{}' must be a string or number, got {}",
                        key, other
                    )))
                }
            };
            set.insert(key.clone(), value);
        }
        Ok(set)
    }

    /// Parse a `key=value` pair as given on the command line.
    pub fn parse_pair(pair: &str) -> Result<(String, OverrideValue), PatchError> {
        let (key, value) = pair.split_once('=').ok_or_else(|| {
            PatchError::InvalidArgument(format!("expected key=value, got '{}'", pair))
        })?;
        let key = key.trim();
        if key.is_empty() {
            return Err(PatchError::InvalidArgument(format!(
                "empty key in '{}'",
                pair
            )));
        }
        Ok((key.to_string(), OverrideValue::Text(value.to_string())))
    }
}

impl<K: Into<String>, V: Into<OverrideValue>> FromIterator<(K, V)> for OverrideSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut set = OverrideSet::new();
        for (k, v) in iter {
            set.insert(k, v);
        }
        set
    }
}

/// The pristine copy of one config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BackupRecord {
    pub original: PathBuf,
    pub backup: PathBuf,
    /// False when an earlier backup already existed and was kept
    pub created: bool,
}

/// Per-file outcome status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatchStatus {
    Updated,
    Error,
}

/// Outcome of patching one discovered file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PatchResult {
    #[serde(serialize_with = "serialize_file_path")]
    pub file: DiscoveredFile,
    pub status: PatchStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

fn serialize_file_path<S: Serializer>(file: &DiscoveredFile, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&file.path.to_string_lossy())
}

impl PatchResult {
    pub fn updated(file: DiscoveredFile, detail: Option<String>) -> Self {
        PatchResult {
            file,
            status: PatchStatus::Updated,
            detail,
        }
    }

    pub fn error(file: DiscoveredFile, detail: impl Into<String>) -> Self {
        PatchResult {
            file,
            status: PatchStatus::Error,
            detail: Some(detail.into()),
        }
    }

    pub fn is_updated(&self) -> bool {
        self.status == PatchStatus::Updated
    }
}

/// Consolidated result of one `apply_configuration` call.
///
/// `success` only says that discovery found files. Inspect `results` to see
/// whether each one was updated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PatchReport {
    pub success: bool,
    pub results: Vec<PatchResult>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub cancelled: bool,
}

impl PatchReport {
    pub fn all_updated(&self) -> bool {
        self.results.iter().all(PatchResult::is_updated)
    }

    pub fn failed(&self) -> impl Iterator<Item = &PatchResult> {
        self.results.iter().filter(|r| !r.is_updated())
    }
}

/// Process priority classes accepted by the priority controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PriorityLevel {
    RealTime,
    High,
    AboveNormal,
    Normal,
    BelowNormal,
    Idle,
}

impl PriorityLevel {
    pub const ALL: [PriorityLevel; 6] = [
        PriorityLevel::RealTime,
        PriorityLevel::High,
        PriorityLevel::AboveNormal,
        PriorityLevel::Normal,
        PriorityLevel::BelowNormal,
        PriorityLevel::Idle,
    ];

    /// Label as understood by the Windows `PriorityClass` property.
    pub fn label(&self) -> &'static str {
        match self {
            PriorityLevel::RealTime => "RealTime",
            PriorityLevel::High => "High",
            PriorityLevel::AboveNormal => "AboveNormal",
            PriorityLevel::Normal => "Normal",
            PriorityLevel::BelowNormal => "BelowNormal",
            PriorityLevel::Idle => "Idle",
        }
    }

    /// Absolute Unix niceness for this level.
    pub fn niceness(&self) -> i32 {
        match self {
            PriorityLevel::RealTime => -20,
            PriorityLevel::High => -10,
            PriorityLevel::AboveNormal => -5,
            PriorityLevel::Normal => 0,
            PriorityLevel::BelowNormal => 5,
            PriorityLevel::Idle => 19,
        }
    }
}

impl FromStr for PriorityLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PriorityLevel::ALL
            .iter()
            .copied()
            .find(|level| level.label().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                format!(
                    "unknown priority '{}', expected one of: {}",
                    s,
                    PriorityLevel::ALL
                        .iter()
                        .map(|l| l.label())
                        .collect::<Vec<_>>()
                        .join(", ")
                )
            })
    }
}

impl fmt::Display for PriorityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A fire-and-forget request against the OS process table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessCommand {
    pub target: String,
    pub action: ProcessAction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessAction {
    SetPriority(PriorityLevel),
    Terminate,
}

impl fmt::Display for ProcessCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.action {
            ProcessAction::SetPriority(level) => write!(f, "set-priority {} {}", self.target, level),
            ProcessAction::Terminate => write!(f, "terminate {}", self.target),
        }
    }
}

/// Boundary shape of priority/terminate calls.
///
/// A failed outcome carries the `ErrorKind` of its cause so callers can
/// branch without parsing `detail`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<ErrorKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl CommandOutcome {
    pub fn dispatched() -> Self {
        CommandOutcome {
            success: true,
            kind: None,
            detail: None,
        }
    }

    pub fn failed(kind: ErrorKind, detail: impl Into<String>) -> Self {
        CommandOutcome {
            success: false,
            kind: Some(kind),
            detail: Some(detail.into()),
        }
    }
}

impl From<crate::error::ProcessError> for CommandOutcome {
    fn from(err: crate::error::ProcessError) -> Self {
        CommandOutcome::failed(err.kind(), err.to_string())
    }
}
