use std::fmt;

/// Transport-level or protocol-level failure talking to the notification collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    Status { status: u16, detail: String },
    Transport(String),
    Decode(String),
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchError::Status { status, detail } if detail.is_empty() => {
                write!(f, "Failed to send alert: HTTP {status}")
            }
            DispatchError::Status { status, detail } => {
                write!(f, "Failed to send alert: HTTP {status} ({detail})")
            }
            DispatchError::Transport(detail) => write!(f, "Failed to send alert: {detail}"),
            DispatchError::Decode(detail) => {
                write!(f, "Failed to send alert: unreadable response ({detail})")
            }
        }
    }
}

impl std::error::Error for DispatchError {}
