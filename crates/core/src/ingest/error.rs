use std::fmt;

/// A failed poll of the ingestion collaborator.
///
/// The `Display` text is what the dashboard shows in its error banner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    Status { status: u16, body: String },
    Transport(String),
    Decode(String),
    Invalid(String),
}

impl FetchError {
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchError::Status { status, .. } => {
                write!(f, "Failed to fetch trends: HTTP {status}")
            }
            FetchError::Transport(detail) => write!(f, "Failed to fetch trends: {detail}"),
            FetchError::Decode(detail) => {
                write!(f, "Failed to fetch trends: unreadable response ({detail})")
            }
            FetchError::Invalid(detail) => {
                write!(f, "Failed to fetch trends: invalid trend data ({detail})")
            }
        }
    }
}

impl std::error::Error for FetchError {}
