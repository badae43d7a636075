// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Chunked file upload to the device.
//!
//! Files go to the iControl REST file-transfer endpoint in 1 MiB pieces, each
//! carrying `Content-Range: <start>-<end>/<total>` with an inclusive `end`.
//! The device assembles them under [`REMOTE_DOWNLOADS_DIR`].

use std::fs::File;
use std::io::Read;
use std::path::Path;

use f5_http::Method;
use tracing::{debug, info, instrument};

use crate::error::{Result, SdkError};
use crate::session::{RequestOptions, SessionManager};

pub const CHUNK_SIZE: usize = 1024 * 1024;
pub const UPLOAD_URI: &str = "/mgmt/shared/file-transfer/uploads";
pub const REMOTE_DOWNLOADS_DIR: &str = "/var/config/rest/downloads";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadResult {
    /// Absolute path of the assembled file on the device.
    pub remote_path: String,
    pub bytes: u64,
    pub chunks: usize,
}

/// `Content-Range` value for a chunk of `len` bytes starting at `start`.
pub fn content_range(start: u64, len: usize, total: u64) -> String {
    format!("{}-{}/{}", start, start + len as u64 - 1, total)
}

/// Upload `local` to the device as `remote_name`.
pub fn upload_file(session: &SessionManager, local: &Path, remote_name: &str) -> Result<UploadResult> {
    session
        .config()
        .logger
        .scope(|| upload_chunks(session, local, remote_name))
}

#[instrument(name = "upload_file", skip(session, local), fields(local = %local.display()))]
fn upload_chunks(session: &SessionManager, local: &Path, remote_name: &str) -> Result<UploadResult> {
    let mut file = File::open(local)?;
    let total = file.metadata()?.len();
    if total == 0 {
        return Err(SdkError::InvalidInput(format!(
            "refusing to upload empty file {}",
            local.display()
        )));
    }

    let uri = format!("{}/{}", UPLOAD_URI, remote_name);
    let mut start = 0u64;
    let mut chunks = 0usize;

    loop {
        let mut chunk = Vec::with_capacity(CHUNK_SIZE);
        (&mut file).take(CHUNK_SIZE as u64).read_to_end(&mut chunk)?;
        if chunk.is_empty() {
            break;
        }

        let len = chunk.len();
        let range = content_range(start, len, total);
        debug!(chunk = chunks, %range, "Uploading chunk");

        let options = RequestOptions::default()
            .with_method(Method::Post)
            .with_header("Content-Type", "application/octet-stream")
            .with_header("Content-Range", range)
            .with_header("Content-Length", len.to_string())
            .with_raw_body(chunk);
        session.send(&uri, &options)?;

        start += len as u64;
        chunks += 1;
    }

    info!(bytes = total, chunks, remote_name, "Upload complete");
    Ok(UploadResult {
        remote_path: format!("{}/{}", REMOTE_DOWNLOADS_DIR, remote_name),
        bytes: total,
        chunks,
    })
}
