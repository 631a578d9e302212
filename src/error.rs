use core::fmt::{self, Display};

/// NVMe status code type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCodeType {
    /// Generic command status
    Generic,
    /// Command specific status
    CommandSpecific,
    /// Media and data integrity errors
    MediaError,
    /// Path related errors
    PathError,
    /// Vendor specific
    VendorSpecific,
}

/// NVMe command status codes.
#[derive(Debug, Clone, Copy)]
pub struct StatusCode {
    /// Status code type
    pub sct: StatusCodeType,
    /// Status code value
    pub sc: u8,
}

impl StatusCode {
    /// Create a new status code.
    pub fn new(sct: StatusCodeType, sc: u8) -> Self {
        Self { sct, sc }
    }

    /// Parse from a raw completion status field.
    pub fn from_raw(status: u16) -> Self {
        let sc = ((status >> 1) & 0xFF) as u8;
        let sct_val = ((status >> 9) & 0x7) as u8;

        let sct = match sct_val {
            0 => StatusCodeType::Generic,
            1 => StatusCodeType::CommandSpecific,
            2 => StatusCodeType::MediaError,
            3 => StatusCodeType::PathError,
            7 => StatusCodeType::VendorSpecific,
            _ => StatusCodeType::Generic,
        };

        Self { sct, sc }
    }

    /// Get human-readable description.
    pub fn description(&self) -> &'static str {
        match (self.sct, self.sc) {
            // Generic command status
            (StatusCodeType::Generic, 0x00) => "Success",
            (StatusCodeType::Generic, 0x01) => "Invalid Command Opcode",
            (StatusCodeType::Generic, 0x02) => "Invalid Field in Command",
            (StatusCodeType::Generic, 0x04) => "Data Transfer Error",
            (StatusCodeType::Generic, 0x05) => "Commands Aborted due to Power Loss Notification",
            (StatusCodeType::Generic, 0x06) => "Internal Error",
            (StatusCodeType::Generic, 0x07) => "Command Abort Requested",
            (StatusCodeType::Generic, 0x0C) => "Command Sequence Error",
            (StatusCodeType::Generic, 0x15) => "Operation Denied",
            (StatusCodeType::Generic, 0x20) => "Command Interrupted",
            (StatusCodeType::Generic, 0x21) => "Transient Transport Error",

            // Command specific errors
            (StatusCodeType::CommandSpecific, 0x0D) => "Feature Identifier Not Saveable",
            (StatusCodeType::CommandSpecific, 0x0E) => "Feature Not Changeable",
            (StatusCodeType::CommandSpecific, 0x0F) => "Feature Not Namespace Specific",

            _ => "Unknown Error",
        }
    }
}

impl Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// Contains all possible errors that can occur in APST management.
#[derive(Debug)]
pub enum Error {
    /// Buffer is smaller than the structure being parsed.
    InvalidBufferSize,
    /// Transient payload buffer could not be allocated.
    AllocationFailed,
    /// Command failed with a specific status code.
    CommandFailed(u16),
    /// NVMe status code error.
    NvmeStatus(StatusCode),
}

impl core::error::Error for Error {}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidBufferSize => {
                write!(f, "Buffer is smaller than the structure being parsed")
            }
            Error::AllocationFailed => {
                write!(f, "Transient payload buffer could not be allocated")
            }
            Error::CommandFailed(code) => {
                write!(f, "Command failed with status code: {}", code)
            }
            Error::NvmeStatus(code) => {
                write!(f, "NVMe error: {}", code.description())
            }
        }
    }
}

/// Result type for APST operations.
pub type Result<T> = core::result::Result<T, Error>;
