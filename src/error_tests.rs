//! Tests for error types

#[cfg(test)]
mod tests {
    use super::super::error::{AnalysisError, ErrorKind};

    #[test]
    fn test_invalid_input_error() {
        let err = AnalysisError::InvalidInput("No text provided".to_string());
        assert!(err.to_string().contains("Invalid input"));
        assert!(err.to_string().contains("No text provided"));
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[test]
    fn test_auth_error() {
        let err = AnalysisError::AuthenticationFailure("Access denied".to_string());
        assert!(err.to_string().contains("Authentication error"));
        assert_eq!(err.kind(), ErrorKind::AuthenticationFailure);
    }

    #[test]
    fn test_rate_limited() {
        let err = AnalysisError::RateLimited { retry_after_secs: 30 };
        let msg = err.to_string();
        assert!(msg.contains("Rate limited"));
        assert!(msg.contains("30"));
        assert_eq!(err.kind(), ErrorKind::RateLimited);
    }

    #[test]
    fn test_timeout() {
        let err = AnalysisError::Timeout { timeout_secs: 10 };
        assert!(err.to_string().contains("10 seconds"));
        assert_eq!(err.kind(), ErrorKind::Timeout);
    }

    #[test]
    fn test_service_unavailable() {
        let err = AnalysisError::ServiceUnavailable("503 Service Unavailable".to_string());
        assert!(err.to_string().contains("Service unavailable"));
        assert_eq!(err.kind(), ErrorKind::ServiceUnavailable);
    }

    #[test]
    fn test_api_error_is_internal() {
        let err = AnalysisError::Api {
            status: 404,
            message: "Resource not found".to_string(),
        };
        assert!(err.to_string().contains("404"));
        assert_eq!(err.kind(), ErrorKind::Internal);
    }

    #[test]
    fn test_json_error_is_internal() {
        let err: AnalysisError = serde_json::from_str::<serde_json::Value>("{")
            .unwrap_err()
            .into();
        assert!(err.to_string().contains("JSON parsing error"));
        assert_eq!(err.kind(), ErrorKind::Internal);
    }

    #[test]
    fn test_user_messages_distinct() {
        let kinds = [
            ErrorKind::InvalidInput,
            ErrorKind::AuthenticationFailure,
            ErrorKind::ServiceUnavailable,
            ErrorKind::RateLimited,
            ErrorKind::Timeout,
            ErrorKind::Internal,
        ];
        for (i, a) in kinds.iter().enumerate() {
            for b in &kinds[i + 1..] {
                assert_ne!(a.user_message(), b.user_message());
            }
        }
    }

    #[test]
    fn test_kind_serializes_snake_case() {
        let json = serde_json::to_string(&ErrorKind::AuthenticationFailure).unwrap();
        assert_eq!(json, "\"authentication_failure\"");
    }
}
