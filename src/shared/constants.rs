/// Synthetic leading column holding each record's creation timestamp
pub const TIMESTAMP_COLUMN: &str = "HORODATEUR";

/// Extension of rendered report artifacts
pub const REPORT_FILE_EXTENSION: &str = "xlsx";

/// MIME type of rendered report artifacts
pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Field types treated as references to stored files unless overridden
pub const DEFAULT_FILE_FIELD_TYPES: &str =
    "file,image,photo,picture,signature,audio,video,document";
