//! Error taxonomy for one poll cycle.
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WatchError {
    #[error("endpoint unavailable: HTTP {status}: {body}")]
    EndpointUnavailable { status: u16, body: String },
    #[error("request to the homework API failed: {0}")]
    Transport(String),
    #[error("malformed response: {0}")]
    MalformedResponse(String),
    #[error("invalid response shape: {0}")]
    InvalidResponseShape(&'static str),
    #[error("response has no \"homeworks\" key")]
    MissingHomeworksKey,
    #[error("missing required field \"{0}\" in homework record")]
    MissingRequiredField(&'static str),
    #[error("unknown homework status \"{0}\"")]
    UnknownStatusCode(String),
    #[error("failed to send notification: {0}")]
    NotificationSendFailure(String),
    #[error("missing environment variables: {}", .0.join(", "))]
    MissingCredentials(Vec<&'static str>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    EndpointUnavailable,
    Transport,
    MalformedResponse,
    InvalidResponseShape,
    MissingHomeworksKey,
    MissingRequiredField,
    UnknownStatusCode,
    NotificationSendFailure,
    MissingCredentials,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::EndpointUnavailable => "endpoint_unavailable",
            ErrorKind::Transport => "transport",
            ErrorKind::MalformedResponse => "malformed_response",
            ErrorKind::InvalidResponseShape => "invalid_response_shape",
            ErrorKind::MissingHomeworksKey => "missing_homeworks_key",
            ErrorKind::MissingRequiredField => "missing_required_field",
            ErrorKind::UnknownStatusCode => "unknown_status_code",
            ErrorKind::NotificationSendFailure => "notification_send_failure",
            ErrorKind::MissingCredentials => "missing_credentials",
        }
    }
}

/// Identity of an error for duplicate suppression: same kind and same text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorKey {
    pub kind: ErrorKind,
    pub message: String,
}

impl WatchError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            WatchError::EndpointUnavailable { .. } => ErrorKind::EndpointUnavailable,
            WatchError::Transport(_) => ErrorKind::Transport,
            WatchError::MalformedResponse(_) => ErrorKind::MalformedResponse,
            WatchError::InvalidResponseShape(_) => ErrorKind::InvalidResponseShape,
            WatchError::MissingHomeworksKey => ErrorKind::MissingHomeworksKey,
            WatchError::MissingRequiredField(_) => ErrorKind::MissingRequiredField,
            WatchError::UnknownStatusCode(_) => ErrorKind::UnknownStatusCode,
            WatchError::NotificationSendFailure(_) => ErrorKind::NotificationSendFailure,
            WatchError::MissingCredentials(_) => ErrorKind::MissingCredentials,
        }
    }

    pub fn key(&self) -> ErrorKey {
        ErrorKey {
            kind: self.kind(),
            message: self.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_distinguishes_kind_and_text() {
        let a = WatchError::EndpointUnavailable {
            status: 500,
            body: "oops".into(),
        };
        let b = WatchError::EndpointUnavailable {
            status: 503,
            body: "oops".into(),
        };
        assert_eq!(a.key(), a.key());
        assert_ne!(a.key(), b.key());
        assert_eq!(a.key().kind, ErrorKind::EndpointUnavailable);
    }

    #[test]
    fn missing_credentials_lists_names() {
        let err = WatchError::MissingCredentials(vec!["P_TOKEN", "T_CHAT_ID"]);
        assert_eq!(
            err.to_string(),
            "missing environment variables: P_TOKEN, T_CHAT_ID"
        );
        assert_eq!(err.kind().as_str(), "missing_credentials");
    }
}
