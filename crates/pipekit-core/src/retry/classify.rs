//! Classify HTTP status codes and transport failures for retry decisions.

use std::fmt;

/// What a status code means to a retrying caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    /// 404: the remote object is gone.
    NotFound,
    /// 409: the request conflicts with current remote state.
    Conflict,
    /// 408, 429 or any 5xx: infrastructure trouble expected to clear up.
    Retryable,
    /// Anything else (other 4xx, unexpected codes): retrying will not help.
    Other,
}

/// Classify an HTTP status code.
pub fn classify_status(code: u16) -> StatusClass {
    match code {
        404 => StatusClass::NotFound,
        409 => StatusClass::Conflict,
        408 | 429 => StatusClass::Retryable,
        500..=u16::MAX => StatusClass::Retryable,
        _ => StatusClass::Other,
    }
}

/// Network-level failure categories (no HTTP status was received).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkKind {
    /// Connect or transfer timed out.
    Timeout,
    /// DNS, refused/reset connection, short read or write.
    Connection,
    /// TLS setup, malformed URL, or anything not expected to heal.
    Other,
}

impl NetworkKind {
    pub fn is_retryable(&self) -> bool {
        matches!(self, NetworkKind::Timeout | NetworkKind::Connection)
    }
}

impl fmt::Display for NetworkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NetworkKind::Timeout => write!(f, "timeout"),
            NetworkKind::Connection => write!(f, "connection"),
            NetworkKind::Other => write!(f, "network"),
        }
    }
}

/// Classify a curl error into a network kind.
pub fn classify_curl_error(e: &curl::Error) -> NetworkKind {
    if e.is_operation_timedout() {
        return NetworkKind::Timeout;
    }
    if e.is_couldnt_connect()
        || e.is_couldnt_resolve_host()
        || e.is_couldnt_resolve_proxy()
        || e.is_read_error()
        || e.is_recv_error()
        || e.is_send_error()
        || e.is_got_nothing()
    {
        return NetworkKind::Connection;
    }
    NetworkKind::Other
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeouts_rate_limits_and_5xx_are_retryable() {
        for code in [408, 429, 500, 502, 503, 504, 599] {
            assert_eq!(classify_status(code), StatusClass::Retryable, "{code}");
        }
    }

    #[test]
    fn not_found_and_conflict_are_distinct() {
        assert_eq!(classify_status(404), StatusClass::NotFound);
        assert_eq!(classify_status(409), StatusClass::Conflict);
    }

    #[test]
    fn other_4xx_are_not_retryable() {
        for code in [400, 401, 403, 405, 422, 499] {
            assert_eq!(classify_status(code), StatusClass::Other, "{code}");
        }
    }

    #[test]
    fn network_kinds() {
        assert!(NetworkKind::Timeout.is_retryable());
        assert!(NetworkKind::Connection.is_retryable());
        assert!(!NetworkKind::Other.is_retryable());
    }

    #[test]
    fn curl_timeout_and_connect_errors() {
        // CURLE_OPERATION_TIMEDOUT = 28, CURLE_COULDNT_CONNECT = 7, CURLE_URL_MALFORMAT = 3
        assert_eq!(classify_curl_error(&curl::Error::new(28)), NetworkKind::Timeout);
        assert_eq!(classify_curl_error(&curl::Error::new(7)), NetworkKind::Connection);
        assert_eq!(classify_curl_error(&curl::Error::new(3)), NetworkKind::Other);
    }
}
