//! Wire types for the put.io v2 API.
//!
//! put.io serialises timestamps as naive `%Y-%m-%dT%H:%M:%S` strings with no
//! timezone, which chrono's `NaiveDateTime` serde impl accepts directly.

use chrono::NaiveDateTime;
use serde::Deserialize;

/// A file or folder as returned by `/files/list`.
///
/// The same shape is returned for trashed entries when listing with
/// `trash=true`; for those, `created_at` reflects when the entry landed in
/// trash.
#[derive(Debug, Clone, Deserialize)]
pub struct File {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub size: u64,
    pub created_at: NaiveDateTime,
    pub file_type: FileType,
}

impl File {
    /// Whether this entry is a folder.
    pub fn is_folder(&self) -> bool {
        self.file_type == FileType::Folder
    }

    /// Whether this entry is video content.
    pub fn is_video(&self) -> bool {
        self.file_type == FileType::Video
    }
}

/// put.io's file type discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FileType {
    Folder,
    Video,
    Audio,
    Image,
    Archive,
    Pdf,
    Text,
    #[serde(other)]
    Other,
}

/// Disk usage figures from `/account/info`.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Disk {
    pub size: u64,
    pub used: u64,
    pub avail: u64,
}

/// Account usage summary.
///
/// `trash_size` is absent from some API responses and defaults to zero.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct AccountUsage {
    pub disk: Disk,
    #[serde(default)]
    pub trash_size: u64,
}

// =============================================================================
// Response envelopes
// =============================================================================

#[derive(Debug, Deserialize)]
pub(crate) struct AccountInfoResponse {
    pub info: AccountUsage,
}

#[derive(Debug, Deserialize)]
pub(crate) struct FileListResponse {
    #[serde(default)]
    pub files: Vec<File>,
    #[serde(default)]
    pub cursor: Option<String>,
}

/// Error payload put.io attaches to non-2xx responses.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub error_type: Option<String>,
    #[serde(default)]
    pub error_message: Option<String>,
}
