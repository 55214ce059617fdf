use thiserror::Error;

/// Reasons a confirm action is rejected before any remote call is issued.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditorError {
    #[error("Invalid subscription interval")]
    InvalidInterval { input: String },
    #[error("Invalid alarm threshold")]
    InvalidThreshold { input: String },
    #[error("no alarm kind selected")]
    MissingAlarmKind,
    #[error("unrecognized alarm kind label: {label}")]
    UnknownAlarmLabel { label: String },
}

impl EditorError {
    /// Malformed user input, as opposed to a broken editor invariant.
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            EditorError::InvalidInterval { .. } | EditorError::InvalidThreshold { .. }
        )
    }
}

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("remote calls require a Wi-Fi connection or an active hotspot")]
    NotConnectable,
    #[error("device rejected request with status {status}: {message}")]
    Rejected { status: u16, message: String },
}
