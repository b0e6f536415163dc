// ── Binary attachment helpers ──
//
// Attachments travel inline as base64 with a separate content type.
// These helpers size, shorten, encode and unpack them.

use std::path::{Path, PathBuf};

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use chrono::Utc;
use tracing::debug;

use crate::error::CoreError;

/// A file read from disk, ready to attach.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedFile {
    pub data: String,
    pub content_type: String,
}

/// Decoded size of a base64 payload, e.g. `"1 234 bytes"`.
pub fn byte_size(base64: &str) -> String {
    let padding = if base64.ends_with("==") {
        2
    } else {
        usize::from(base64.ends_with('='))
    };
    let size = (base64.len() / 4 * 3).saturating_sub(padding);
    format!("{} bytes", group_thousands(size))
}

fn group_thousands(value: usize) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(' ');
        }
        out.push(ch);
    }
    out
}

/// Shorten long text to its first 15 and last 10 characters.
pub fn abbreviate(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    if chars.len() < 30 {
        return text.to_owned();
    }
    let head: String = chars.iter().take(15).collect();
    let tail: String = chars.iter().skip(chars.len() - 10).collect();
    format!("{head}...{tail}")
}

/// Read `path` and encode it, guessing the content type from the extension.
pub async fn to_base64(path: &Path) -> Result<EncodedFile, CoreError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| CoreError::Attachment {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
    let content_type = mime_guess::from_path(path)
        .first_or_octet_stream()
        .essence_str()
        .to_owned();
    debug!(path = %path.display(), bytes = bytes.len(), %content_type, "attachment encoded");
    Ok(EncodedFile {
        data: STANDARD.encode(bytes),
        content_type,
    })
}

/// Decode an attachment into `dir` so an external viewer can open it.
/// Returns the written file's path.
pub async fn open_file(content_type: &str, data: &str, dir: &Path) -> Result<PathBuf, CoreError> {
    let bytes = STANDARD
        .decode(data.trim())
        .map_err(|e| CoreError::Attachment {
            path: dir.display().to_string(),
            reason: format!("invalid base64 payload: {e}"),
        })?;
    let extension = mime_guess::get_mime_extensions_str(content_type)
        .and_then(|exts| exts.first())
        .copied()
        .unwrap_or("bin");
    let name = format!("attachment-{}.{extension}", Utc::now().format("%Y%m%d%H%M%S%3f"));
    let path = dir.join(name);

    tokio::fs::write(&path, bytes)
        .await
        .map_err(|e| CoreError::Attachment {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
    debug!(path = %path.display(), %content_type, "attachment written");
    Ok(path)
}
