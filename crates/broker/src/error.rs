//! Broker error types.

/// Errors produced while talking to the URL broker.
#[derive(Debug, thiserror::Error)]
pub enum BrokerError {
    /// The credential was missing or rejected (HTTP 401/403).
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// The broker answered with another non-2xx status.
    #[error("broker unavailable (HTTP {status}): {message}")]
    Unavailable { status: u16, message: String },

    /// The broker could not be reached (DNS, connect, TLS, reset).
    ///
    /// Counts as "broker unavailable" together with [`Unavailable`]; it is
    /// kept apart only so the underlying `reqwest` error is preserved. Use
    /// [`is_unavailable`](Self::is_unavailable) to classify.
    ///
    /// [`Unavailable`]: Self::Unavailable
    #[error("broker unavailable: {0}")]
    Http(#[from] reqwest::Error),

    /// The broker answered 2xx with a body we cannot use.
    #[error("invalid broker response: {0}")]
    InvalidResponse(String),
}

impl BrokerError {
    /// Returns `true` if the caller must re-authenticate rather than retry.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized(_))
    }

    /// Returns `true` if the broker failed to answer or answered with a
    /// non-2xx status other than 401/403.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable { .. } | Self::Http(_))
    }

    /// HTTP status returned by the broker, if it answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Unavailable { status, .. } => Some(*status),
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unauthorized_classification() {
        assert!(BrokerError::Unauthorized("expired".into()).is_unauthorized());
        assert!(
            !BrokerError::Unavailable {
                status: 500,
                message: "boom".into()
            }
            .is_unauthorized()
        );
        assert!(!BrokerError::Unauthorized("expired".into()).is_unavailable());
        assert!(
            BrokerError::Unavailable {
                status: 500,
                message: "boom".into()
            }
            .is_unavailable()
        );
    }

    #[test]
    fn display_includes_status() {
        let err = BrokerError::Unavailable {
            status: 503,
            message: "Service Unavailable".into(),
        };
        assert_eq!(
            err.to_string(),
            "broker unavailable (HTTP 503): Service Unavailable"
        );
        assert_eq!(err.status(), Some(503));
    }
}
