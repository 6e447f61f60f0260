// ABOUTME: Core types, traits, and utilities for Tasklane
// ABOUTME: Foundational package providing shared functionality across all Tasklane packages

pub mod constants;
pub mod pagination;
pub mod status;
pub mod utils;

// Re-export constants
pub use constants::{BULK_SIZE_LIMIT, MAX_IMPORT_BYTES, TITLE_MAX_LEN};

// Re-export pagination types
pub use pagination::{LimitOffset, Page, PageLinks};

// Re-export the shared status enum
pub use status::{Status, UnknownStatus};

// Re-export utilities
pub use utils::{chunked, format_size, new_id, utcnow, validate_title, TitleError};
