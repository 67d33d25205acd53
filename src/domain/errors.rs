use crate::domain::reservation::ReservationRecord;
use std::fmt;

// Domain-level errors for the guest directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectoryError {
    // Spreadsheet id or credential missing; a deployment defect, never retried.
    Configuration(String),
    Transport(TransportError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    // The request never produced an HTTP response.
    Network(String),
    Upstream {
        status: u16,
        message: Option<String>,
    },
    Decode(String),
}

impl fmt::Display for DirectoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DirectoryError::Configuration(reason) => write!(f, "configuration error: {reason}"),
            DirectoryError::Transport(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for DirectoryError {}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::Network(reason) => write!(f, "sheets transport error: {reason}"),
            TransportError::Upstream { status, message } => {
                if let Some(message) = message {
                    write!(f, "sheets upstream error {status}: {message}")
                } else {
                    write!(f, "sheets upstream error {status}")
                }
            }
            TransportError::Decode(reason) => write!(f, "sheets response decode error: {reason}"),
        }
    }
}

impl From<TransportError> for DirectoryError {
    fn from(err: TransportError) -> Self {
        DirectoryError::Transport(err)
    }
}

/// Result of looking one guest code up against a fresh directory snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupOutcome {
    Found(ReservationRecord),
    NotFound,
    TransportError(TransportError),
    ConfigurationError(String),
}

impl From<Result<Option<ReservationRecord>, DirectoryError>> for LookupOutcome {
    fn from(result: Result<Option<ReservationRecord>, DirectoryError>) -> Self {
        match result {
            Ok(Some(record)) => LookupOutcome::Found(record),
            Ok(None) => LookupOutcome::NotFound,
            Err(DirectoryError::Transport(err)) => LookupOutcome::TransportError(err),
            Err(DirectoryError::Configuration(reason)) => LookupOutcome::ConfigurationError(reason),
        }
    }
}

/// User-facing classification of a failed lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Network,
    Permission,
    SheetNotFound,
    BadRequest,
    Configuration,
    Unknown,
}

impl FailureKind {
    pub fn of_transport(err: &TransportError) -> Self {
        match err {
            TransportError::Network(_) => FailureKind::Network,
            TransportError::Upstream { status, .. } => match status {
                401 | 403 => FailureKind::Permission,
                404 => FailureKind::SheetNotFound,
                400 => FailureKind::BadRequest,
                _ => FailureKind::Unknown,
            },
            TransportError::Decode(_) => FailureKind::Unknown,
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            FailureKind::Network => {
                "Network Error: Cannot connect to Google Sheets API. \
                 Check your internet connection."
            }
            FailureKind::Permission => {
                "Permission Error (403): API key does not have access to Google Sheets API."
            }
            FailureKind::SheetNotFound => {
                "Sheet Not Found (404): The Google Sheet ID may be incorrect."
            }
            FailureKind::BadRequest => "Bad Request (400): Invalid API key or request format.",
            FailureKind::Configuration => "Google API configuration missing",
            FailureKind::Unknown => "An error occurred while looking up guest information",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FailureKind::Network => "network",
            FailureKind::Permission => "permission",
            FailureKind::SheetNotFound => "sheet_not_found",
            FailureKind::BadRequest => "bad_request",
            FailureKind::Configuration => "configuration",
            FailureKind::Unknown => "unknown",
        }
    }
}
