//! # putio
//!
//! A minimal blocking client for the put.io v2 API, covering the surface a
//! storage janitor needs: account usage, file listing (with cursor
//! pagination), trash listing, moving files to trash, and permanent deletion
//! from trash.
//!
//! ## Example
//!
//! ```no_run
//! use putio::Client;
//!
//! let client = Client::new("MY_TOKEN");
//! let usage = client.account_info().unwrap();
//! println!("{} of {} bytes used", usage.disk.used, usage.disk.size);
//! ```
//!
//! ## Errors
//!
//! Every error is classified as transient (retry after a delay), fatal
//! (credentials rejected, stop everything), or permanent (this operation will
//! never succeed). See [`Error::class`].

pub mod error;
pub mod types;

pub use error::{Error, ErrorClass, Result};
pub use types::{AccountUsage, Disk, File, FileType};

use serde::de::DeserializeOwned;
use std::time::Duration;
use types::{AccountInfoResponse, ErrorBody, FileListResponse};

/// put.io API base URL.
const BASE_URL: &str = "https://api.put.io/v2";

/// Page size for file listings.
const PER_PAGE: &str = "1000";

/// Request timeout. put.io listings on large folders can be slow.
const TIMEOUT: Duration = Duration::from_secs(30);

/// Blocking put.io API client.
///
/// Holds a [`ureq::Agent`] so connections are reused across calls. All
/// methods authenticate with the OAuth token given at construction.
pub struct Client {
    agent: ureq::Agent,
    token: String,
    base_url: String,
}

impl Client {
    /// Create a client for the real put.io API.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self::with_base_url(token, BASE_URL)
    }

    /// Create a client against a custom base URL (for testing).
    #[must_use]
    pub fn with_base_url(token: impl Into<String>, base_url: impl Into<String>) -> Self {
        // Non-2xx statuses are handled in parse_json so the error payload
        // put.io attaches can be surfaced.
        let config = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(Some(TIMEOUT))
            .build();
        Self {
            agent: ureq::Agent::new_with_config(config),
            token: token.into(),
            base_url: base_url.into(),
        }
    }

    /// Get the current API base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch account disk usage and trash size.
    pub fn account_info(&self) -> Result<AccountUsage> {
        let resp: AccountInfoResponse = self.get_json("/account/info", &[])?;
        Ok(resp.info)
    }

    /// List the direct children of a folder, following cursor pagination.
    ///
    /// `parent_id` 0 is the account root.
    pub fn list_folder(&self, parent_id: u64) -> Result<Vec<File>> {
        let parent = parent_id.to_string();
        let page: FileListResponse = self.get_json(
            "/files/list",
            &[("parent_id", parent.as_str()), ("per_page", PER_PAGE)],
        )?;
        self.drain_pages(page)
    }

    /// List trashed files. `created_at` on the returned entries reflects when
    /// they entered the trash.
    pub fn list_trash(&self) -> Result<Vec<File>> {
        let page: FileListResponse =
            self.get_json("/files/list", &[("trash", "true"), ("per_page", PER_PAGE)])?;
        self.drain_pages(page)
    }

    /// Move a file or folder (and its subtree) to trash.
    pub fn move_to_trash(&self, file_id: u64) -> Result<()> {
        let ids = file_id.to_string();
        let _: serde_json::Value =
            self.post_form("/files/delete", &[], &[("file_ids", ids.as_str())])?;
        Ok(())
    }

    /// Permanently delete a live file or folder, bypassing trash entirely.
    /// The space it occupied is freed immediately.
    pub fn delete_permanently(&self, file_id: u64) -> Result<()> {
        let ids = file_id.to_string();
        let _: serde_json::Value = self.post_form(
            "/files/delete",
            &[("permanently", "true")],
            &[("file_ids", ids.as_str())],
        )?;
        Ok(())
    }

    /// Permanently delete a trashed file. The space it occupied is freed.
    pub fn delete_from_trash(&self, file_id: u64) -> Result<()> {
        let ids = file_id.to_string();
        let _: serde_json::Value = self.post_form(
            "/files/delete",
            &[("trash", "true"), ("permanently", "true")],
            &[("file_ids", ids.as_str())],
        )?;
        Ok(())
    }

    /// Follow `cursor` continuations until the listing is exhausted.
    fn drain_pages(&self, first: FileListResponse) -> Result<Vec<File>> {
        collect_pages(first, |cursor| {
            self.post_form("/files/list/continue", &[], &[("cursor", cursor)])
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> Result<T> {
        let mut req = self
            .agent
            .get(self.url(path))
            .header("Authorization", &format!("token {}", self.token))
            .header("Accept", "application/json");
        for (k, v) in query {
            req = req.query(*k, *v);
        }
        parse_json(req.call()?)
    }

    fn post_form<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
        form: &[(&str, &str)],
    ) -> Result<T> {
        let mut req = self
            .agent
            .post(self.url(path))
            .header("Authorization", &format!("token {}", self.token))
            .header("Accept", "application/json");
        for (k, v) in query {
            req = req.query(*k, *v);
        }
        parse_json(req.send_form(form.iter().copied())?)
    }
}

/// Accumulate files across cursor continuations until the listing is
/// exhausted. A missing or empty cursor terminates.
fn collect_pages(
    first: FileListResponse,
    mut next_page: impl FnMut(&str) -> Result<FileListResponse>,
) -> Result<Vec<File>> {
    let mut files = first.files;
    let mut cursor = first.cursor;
    while let Some(c) = cursor.filter(|c| !c.is_empty()) {
        let page = next_page(&c)?;
        files.extend(page.files);
        cursor = page.cursor;
    }
    Ok(files)
}

/// Turn a raw HTTP response into a decoded value or a classified error.
fn parse_json<T: DeserializeOwned>(mut response: ureq::http::Response<ureq::Body>) -> Result<T> {
    let status = response.status().as_u16();
    let body = response
        .body_mut()
        .read_to_string()
        .map_err(|e| Error::Transport(e.to_string()))?;

    match status {
        200..=299 => serde_json::from_str(&body).map_err(Error::from),
        401 | 403 => Err(Error::Unauthorized { status }),
        429 => Err(Error::RateLimited),
        _ => {
            let parsed: ErrorBody = serde_json::from_str(&body).unwrap_or_default();
            Err(Error::Api {
                status,
                error_type: parsed.error_type,
                message: parsed.error_message,
            })
        }
    }
}
