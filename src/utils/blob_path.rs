use chrono::Utc;
use percent_encoding::percent_decode_str;
use std::sync::atomic::{AtomicI64, Ordering};

/// Replaces every character outside `[A-Za-z0-9.-]` with `_`.
pub fn sanitize_file_name(file_name: &str) -> String {
    file_name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// `{owner}/{schedule}/{timestamp}_{sanitized name}`
pub fn derive_blob_path(owner_id: &str, schedule_id: &str, timestamp_ms: i64, file_name: &str) -> String {
    format!(
        "{}/{}/{}_{}",
        owner_id,
        schedule_id,
        timestamp_ms,
        sanitize_file_name(file_name)
    )
}

/// Prefix every blob uploaded for this schedule lives under.
pub fn schedule_prefix(owner_id: &str, schedule_id: &str) -> String {
    format!("{}/{}/", owner_id, schedule_id)
}

/// Splits a blob path into `(owner, schedule, file)`. Paths with another shape are not ours.
pub fn split_blob_path(blob_path: &str) -> Option<(&str, &str, &str)> {
    let mut parts = blob_path.splitn(3, '/');
    let owner = parts.next().filter(|s| !s.is_empty())?;
    let schedule = parts.next().filter(|s| !s.is_empty())?;
    let file = parts.next().filter(|s| !s.is_empty() && !s.contains('/'))?;
    Some((owner, schedule, file))
}

/// Millisecond clock that never hands out the same value twice.
#[derive(Debug, Default)]
pub struct BlobClock {
    last: AtomicI64,
}

impl BlobClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_millis(&self) -> i64 {
        let now = Utc::now().timestamp_millis();
        let previous = self
            .last
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
                Some(now.max(last + 1))
            })
            .unwrap_or_else(|last| last);
        now.max(previous + 1)
    }
}

/// Maps blob paths to the public URLs stored in resource records, and back.
#[derive(Debug, Clone)]
pub struct BlobLocator {
    prefix: String,
}

impl BlobLocator {
    pub fn new(public_base_url: &str) -> Self {
        Self {
            prefix: format!("{}/", public_base_url.trim_end_matches('/')),
        }
    }

    pub fn url_for(&self, blob_path: &str) -> String {
        format!("{}{}", self.prefix, blob_path)
    }

    /// `None` when the URL is outside our container or does not decode.
    pub fn path_for(&self, file_url: &str) -> Option<String> {
        let encoded = file_url.strip_prefix(&self.prefix)?;
        let decoded = percent_decode_str(encoded).decode_utf8().ok()?;
        if decoded.is_empty() {
            return None;
        }
        Some(decoded.into_owned())
    }
}
