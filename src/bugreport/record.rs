//! Bugreport status records as stored by the BugReport app

use std::fmt;

/// Lifecycle status of a bugreport job
///
/// Codes match the `status` column written by the app. Codes this tool
/// does not know about, such as ones added by newer app versions, are kept
/// as [`Status::Unknown`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    WritePending,
    WriteFailed,
    UploadPending,
    UploadSuccess,
    UploadFailed,
    UserCancelled,
    Unknown(i64),
}

impl Status {
    pub const ALL: [Status; 6] = [
        Status::WritePending,
        Status::WriteFailed,
        Status::UploadPending,
        Status::UploadSuccess,
        Status::UploadFailed,
        Status::UserCancelled,
    ];

    pub fn from_code(code: i64) -> Self {
        match code {
            0 => Status::WritePending,
            1 => Status::WriteFailed,
            2 => Status::UploadPending,
            3 => Status::UploadSuccess,
            4 => Status::UploadFailed,
            5 => Status::UserCancelled,
            other => Status::Unknown(other),
        }
    }

    pub fn code(self) -> i64 {
        match self {
            Status::WritePending => 0,
            Status::WriteFailed => 1,
            Status::UploadPending => 2,
            Status::UploadSuccess => 3,
            Status::UploadFailed => 4,
            Status::UserCancelled => 5,
            Status::Unknown(code) => code,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Status::WritePending => "WRITE_PENDING",
            Status::WriteFailed => "WRITE_FAILED",
            Status::UploadPending => "UPLOAD_PENDING",
            Status::UploadSuccess => "UPLOAD_SUCCESS",
            Status::UploadFailed => "UPLOAD_FAILED",
            Status::UserCancelled => "USER_CANCELLED",
            Status::Unknown(_) => "UNKNOWN_STATUS",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of the app's `bugreports` table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BugReportRecord {
    id: i64,
    timestamp: String,
    filepath: String,
    status: Status,
    status_message: String,
}

impl BugReportRecord {
    /// Build a record from raw column values
    pub fn new(
        id: i64,
        timestamp: impl Into<String>,
        filepath: impl Into<String>,
        status_code: i64,
        status_message: impl Into<String>,
    ) -> Self {
        Self {
            id,
            timestamp: timestamp.into(),
            filepath: filepath.into(),
            status: Status::from_code(status_code),
            status_message: status_message.into(),
        }
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    /// Device-local path of the bugreport zip
    pub fn filepath(&self) -> &str {
        &self.filepath
    }

    pub fn status(&self) -> Status {
        self.status
    }

    /// Diagnostic detail; empty unless something failed
    pub fn status_message(&self) -> &str {
        &self.status_message
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes_round_trip() {
        for status in Status::ALL {
            assert_eq!(Status::from_code(status.code()), status);
        }
    }

    #[test]
    fn test_unknown_codes_are_kept() {
        let status = Status::from_code(6);
        assert_eq!(status, Status::Unknown(6));
        assert_eq!(status.code(), 6);
        assert_eq!(status.to_string(), "UNKNOWN_STATUS");
        assert_eq!(Status::from_code(-1), Status::Unknown(-1));
    }

    #[test]
    fn test_status_display() {
        assert_eq!(Status::UploadPending.to_string(), "UPLOAD_PENDING");
        assert_eq!(Status::UserCancelled.to_string(), "USER_CANCELLED");
    }

    #[test]
    fn test_record_keeps_unknown_status_and_message() {
        let record = BugReportRecord::new(1, "2019-01-01", "/a.zip", 42, "waiting for user");
        assert_eq!(record.status(), Status::Unknown(42));
        assert_eq!(record.status_message(), "waiting for user");
    }

    #[test]
    fn test_record_accessors() {
        let record =
            BugReportRecord::new(7, "2019-05-06", "/pending/bug.zip", 4, "no network");
        assert_eq!(record.id(), 7);
        assert_eq!(record.timestamp(), "2019-05-06");
        assert_eq!(record.filepath(), "/pending/bug.zip");
        assert_eq!(record.status(), Status::UploadFailed);
        assert_eq!(record.status_message(), "no network");
    }
}
