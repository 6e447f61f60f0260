// ABOUTME: Shared utility functions for Tasklane
// ABOUTME: ID generation, timestamps, chunking, and title validation

use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::constants::TITLE_MAX_LEN;

/// Generate a new random entity id
pub fn new_id() -> Uuid {
    Uuid::new_v4()
}

/// Current UTC timestamp
pub fn utcnow() -> DateTime<Utc> {
    Utc::now()
}

/// Split a slice into consecutive chunks of at most `size` items, preserving order.
///
/// A `size` of 0 is treated as 1.
pub fn chunked<T>(items: &[T], size: usize) -> std::slice::Chunks<'_, T> {
    items.chunks(size.max(1))
}

/// Render a byte count the way error messages report upload limits ("5MB", "512KB")
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;

    if bytes >= MB && bytes % MB == 0 {
        format!("{}MB", bytes / MB)
    } else if bytes >= KB && bytes % KB == 0 {
        format!("{}KB", bytes / KB)
    } else {
        format!("{}B", bytes)
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TitleError {
    #[error("title must not be empty")]
    Empty,
    #[error("title must be at most {max} characters (got {len})")]
    TooLong { len: usize, max: usize },
}

/// Check that a title holds between 1 and `TITLE_MAX_LEN` characters
pub fn validate_title(title: &str) -> Result<(), TitleError> {
    let len = title.chars().count();
    if len == 0 {
        return Err(TitleError::Empty);
    }
    if len > TITLE_MAX_LEN {
        return Err(TitleError::TooLong {
            len,
            max: TITLE_MAX_LEN,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunked_preserves_order() {
        let items: Vec<u32> = (0..250).collect();
        let chunks: Vec<&[u32]> = chunked(&items, 100).collect();

        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].len(), 100);
        assert_eq!(chunks[2].len(), 50);
        let flattened: Vec<u32> = chunks.concat();
        assert_eq!(flattened, items);
    }

    #[test]
    fn test_chunked_zero_size() {
        let items = [1, 2, 3];
        assert_eq!(chunked(&items, 0).count(), 3);
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(5 * 1024 * 1024), "5MB");
        assert_eq!(format_size(512 * 1024), "512KB");
        assert_eq!(format_size(1000), "1000B");
    }

    #[test]
    fn test_validate_title() {
        assert!(validate_title("Buy milk").is_ok());
        assert_eq!(validate_title(""), Err(TitleError::Empty));
        assert!(validate_title(&"a".repeat(256)).is_ok());
        assert_eq!(
            validate_title(&"a".repeat(257)),
            Err(TitleError::TooLong { len: 257, max: 256 })
        );
        // Characters, not bytes
        assert!(validate_title(&"é".repeat(256)).is_ok());
    }

    #[test]
    fn test_new_id_is_unique() {
        assert_ne!(new_id(), new_id());
    }
}
