//! EPTS error codes following a structured numbering system
//!
//! Error code ranges:
//! - EPTS0001-EPTS0099: Parse errors (composition strings, parameter mappings)
//! - EPTS0100-EPTS0199: Configuration errors (parameters, registrations, metadata)
//! - EPTS0200-EPTS0299: Data access errors (observation store gateway)
//! - EPTS0400-EPTS0499: System errors (I/O, malformed input files)

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

/// Error code identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ErrorCode(u16);

impl ErrorCode {
    /// Create a new error code
    pub const fn new(code: u16) -> Self {
        Self(code)
    }

    /// Get the numeric code
    pub const fn code(&self) -> u16 {
        self.0
    }

    /// Get error information for this code
    pub fn info(&self) -> &'static ErrorInfo {
        ERROR_INFO.get(&self.0).unwrap_or(&UNKNOWN_ERROR)
    }

    /// Check if this is a parse error (0001-0099)
    pub const fn is_parse_error(&self) -> bool {
        self.0 >= 1 && self.0 < 100
    }

    /// Check if this is a configuration error (0100-0199)
    pub const fn is_configuration_error(&self) -> bool {
        self.0 >= 100 && self.0 < 200
    }

    /// Check if this is a data access error (0200-0299)
    pub const fn is_data_access_error(&self) -> bool {
        self.0 >= 200 && self.0 < 300
    }

    /// Check if this is a system error (0400-0499)
    pub const fn is_system_error(&self) -> bool {
        self.0 >= 400 && self.0 < 500
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EPTS{:04}", self.0)
    }
}

/// Information about an error code
#[derive(Debug, Clone)]
pub struct ErrorInfo {
    /// Short description of the error
    pub description: &'static str,
    /// Detailed help text
    pub help: Option<&'static str>,
}

impl ErrorInfo {
    const fn new(description: &'static str) -> Self {
        Self {
            description,
            help: None,
        }
    }

    const fn with_help(mut self, help: &'static str) -> Self {
        self.help = Some(help);
        self
    }
}

static UNKNOWN_ERROR: ErrorInfo = ErrorInfo::new("Unknown error");

static ERROR_INFO: LazyLock<HashMap<u16, ErrorInfo>> = LazyLock::new(|| {
    let mut map = HashMap::new();

    // Parse errors (0001-0099)
    map.insert(1, ErrorInfo::new("Unexpected token"));
    map.insert(2, ErrorInfo::new("Unexpected end of input"));
    map.insert(3, ErrorInfo::new("Expected search name"));
    map.insert(4, ErrorInfo::new("Missing closing parenthesis"));
    map.insert(5, ErrorInfo::new("Invalid parameter mapping")
        .with_help("Mappings look like `startDate=${onOrAfter},location=${location}`"));
    map.insert(6, ErrorInfo::new("Invalid date offset")
        .with_help("Offsets look like `${endDate-12m}`; units are d, w, m and y"));
    map.insert(7, ErrorInfo::new("Invalid date literal"));

    // Configuration errors (0100-0199)
    map.insert(100, ErrorInfo::new("Missing required parameter")
        .with_help("Supply the parameter explicitly or cache it in the calculation context"));
    map.insert(101, ErrorInfo::new("Unmapped search parameter")
        .with_help("Every parameter a search declares needs an entry in its mapping"));
    map.insert(102, ErrorInfo::new("Unregistered search"));
    map.insert(103, ErrorInfo::new("Parameter type mismatch"));
    map.insert(104, ErrorInfo::new("Unknown metadata name"));
    map.insert(105, ErrorInfo::new("Unknown calculation"));
    map.insert(106, ErrorInfo::new("Duplicate search"));

    // Data access errors (0200-0299)
    map.insert(200, ErrorInfo::new("Observation store failure"));
    map.insert(201, ErrorInfo::new("Patient not found in store"));

    // System errors (0400-0499)
    map.insert(400, ErrorInfo::new("Internal error"));
    map.insert(401, ErrorInfo::new("I/O error"));
    map.insert(402, ErrorInfo::new("Invalid input format"));

    map
});

// Parse errors
pub const EPTS0001: ErrorCode = ErrorCode::new(1);
pub const EPTS0002: ErrorCode = ErrorCode::new(2);
pub const EPTS0003: ErrorCode = ErrorCode::new(3);
pub const EPTS0004: ErrorCode = ErrorCode::new(4);
pub const EPTS0005: ErrorCode = ErrorCode::new(5);
pub const EPTS0006: ErrorCode = ErrorCode::new(6);
pub const EPTS0007: ErrorCode = ErrorCode::new(7);

// Configuration errors
pub const EPTS0100: ErrorCode = ErrorCode::new(100);
pub const EPTS0101: ErrorCode = ErrorCode::new(101);
pub const EPTS0102: ErrorCode = ErrorCode::new(102);
pub const EPTS0103: ErrorCode = ErrorCode::new(103);
pub const EPTS0104: ErrorCode = ErrorCode::new(104);
pub const EPTS0105: ErrorCode = ErrorCode::new(105);
pub const EPTS0106: ErrorCode = ErrorCode::new(106);

// Data access errors
pub const EPTS0200: ErrorCode = ErrorCode::new(200);
pub const EPTS0201: ErrorCode = ErrorCode::new(201);

// System errors
pub const EPTS0400: ErrorCode = ErrorCode::new(400);
pub const EPTS0401: ErrorCode = ErrorCode::new(401);
pub const EPTS0402: ErrorCode = ErrorCode::new(402);
