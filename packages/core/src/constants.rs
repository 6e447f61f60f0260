/// Maximum number of rows inserted by a single bulk `INSERT` statement
pub const BULK_SIZE_LIMIT: usize = 100;

/// Maximum accepted size of an uploaded import file (5 MiB)
pub const MAX_IMPORT_BYTES: u64 = 5 * 1024 * 1024;

/// Maximum length of a Todo or SubTask title, in characters
pub const TITLE_MAX_LEN: usize = 256;
