//! Error types for the stratum storage engine.

use thiserror::Error;

/// Result type alias using StratumError.
pub type Result<T> = std::result::Result<T, StratumError>;

/// Errors that can occur in stratum operations.
#[derive(Debug, Error)]
pub enum StratumError {
    // I/O and file errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("file not found: {0}")]
    FileNotFound(String),

    #[error("file already exists: {0}")]
    FileExists(String),

    #[error("page {page_no} does not exist in file {file_id}")]
    PageNotFound { file_id: u32, page_no: u32 },

    #[error("page corrupted: {page_no}, reason: {reason}")]
    PageCorrupted { page_no: u32, reason: String },

    // Buffer pool errors
    #[error("buffer pool full, unable to allocate frame")]
    BufferPoolFull,

    // Heap file errors
    #[error("record size mismatch: got {size} bytes, heap stores {expected}-byte records")]
    RecordSizeMismatch { size: usize, expected: usize },

    // Index errors
    #[error("bad index info for {0}: meta page does not match supplied parameters")]
    BadIndexInfo(String),

    #[error("bad scan opcodes: low operator must be GT or GTE, high operator must be LT or LTE")]
    BadOpcodes,

    #[error("bad scan range: low value {low} exceeds high value {high}")]
    BadScanRange { low: i32, high: i32 },

    #[error("no key in the index satisfies the scan predicate")]
    NoSuchKeyFound,

    #[error("scan not initialized")]
    ScanNotInitialized,

    #[error("index scan completed")]
    IndexScanCompleted,

    #[error("relation name too long: {0:?} exceeds 20 bytes")]
    RelationNameTooLong(String),

    #[error("unsupported attribute type: {0}")]
    UnsupportedAttrType(String),

    #[error("index corrupted: {0}")]
    IndexCorrupted(String),

    // Configuration errors
    #[error("invalid parameter: {name} = {value}")]
    InvalidParameter { name: String, value: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Error as IoError, ErrorKind};

    #[test]
    fn test_io_error_conversion() {
        let io_err = IoError::new(ErrorKind::NotFound, "file not found");
        let err: StratumError = io_err.into();
        assert!(matches!(err, StratumError::Io(_)));
        assert!(err.to_string().contains("I/O error"));
    }

    #[test]
    fn test_file_errors_display() {
        let err = StratumError::FileNotFound("employees".to_string());
        assert_eq!(err.to_string(), "file not found: employees");

        let err = StratumError::FileExists("employees.8".to_string());
        assert_eq!(err.to_string(), "file already exists: employees.8");
    }

    #[test]
    fn test_page_not_found_display() {
        let err = StratumError::PageNotFound {
            file_id: 1,
            page_no: 42,
        };
        assert_eq!(err.to_string(), "page 42 does not exist in file 1");
    }

    #[test]
    fn test_buffer_pool_full_display() {
        let err = StratumError::BufferPoolFull;
        assert_eq!(
            err.to_string(),
            "buffer pool full, unable to allocate frame"
        );
    }

    #[test]
    fn test_record_size_mismatch_display() {
        let err = StratumError::RecordSizeMismatch {
            size: 100,
            expected: 800,
        };
        assert_eq!(
            err.to_string(),
            "record size mismatch: got 100 bytes, heap stores 800-byte records"
        );
    }

    #[test]
    fn test_scan_errors_display() {
        let err = StratumError::BadScanRange { low: 100, high: 99 };
        assert_eq!(
            err.to_string(),
            "bad scan range: low value 100 exceeds high value 99"
        );

        let err = StratumError::NoSuchKeyFound;
        assert_eq!(
            err.to_string(),
            "no key in the index satisfies the scan predicate"
        );

        let err = StratumError::ScanNotInitialized;
        assert_eq!(err.to_string(), "scan not initialized");

        let err = StratumError::IndexScanCompleted;
        assert_eq!(err.to_string(), "index scan completed");
    }

    #[test]
    fn test_bad_opcodes_display() {
        let err = StratumError::BadOpcodes;
        assert!(err.to_string().contains("GT or GTE"));
        assert!(err.to_string().contains("LT or LTE"));
    }

    #[test]
    fn test_index_info_errors_display() {
        let err = StratumError::BadIndexInfo("employees.8".to_string());
        assert!(err.to_string().contains("employees.8"));

        let err = StratumError::RelationNameTooLong("a_very_long_relation_name".to_string());
        assert!(err.to_string().contains("exceeds 20 bytes"));

        let err = StratumError::UnsupportedAttrType("DOUBLE".to_string());
        assert_eq!(err.to_string(), "unsupported attribute type: DOUBLE");
    }

    #[test]
    fn test_invalid_parameter_display() {
        let err = StratumError::InvalidParameter {
            name: "num_frames".to_string(),
            value: "0".to_string(),
        };
        assert_eq!(err.to_string(), "invalid parameter: num_frames = 0");
    }

    #[test]
    fn test_result_type_alias() {
        fn returns_ok() -> Result<i32> {
            Ok(42)
        }

        fn returns_err() -> Result<i32> {
            Err(StratumError::NoSuchKeyFound)
        }

        assert!(returns_ok().is_ok());
        assert!(returns_err().is_err());
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<StratumError>();
    }
}
