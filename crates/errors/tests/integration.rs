//! Integration tests for error types

#[cfg(test)]
mod tests {
    use upstate_errors::*;

    #[test]
    fn test_error_conversion() {
        let store_err = StoreError::LockFailed {
            key: "upstate_abc".into(),
        };
        let err: Error = store_err.into();
        assert!(matches!(err, Error::Store(_)));
        assert!(err.is_retryable());
    }

    #[test]
    fn test_error_display() {
        let err = ConfigError::InvalidValue {
            field: "UPSTATE_CACHE_SLIDING".into(),
            value: "maybe".into(),
        };
        assert_eq!(
            err.to_string(),
            "invalid value for UPSTATE_CACHE_SLIDING: maybe"
        );
    }

    #[test]
    fn test_error_clone() {
        let err = UploadRejection::too_large(1024).with_help_link("https://example.org/limits");
        let cloned = err.clone();
        assert_eq!(err, cloned);
        assert_eq!(cloned.status_code, 413);
    }

    #[test]
    fn test_session_errors_hint_at_fallback() {
        let err = StoreError::ReadOnly;
        assert_eq!(err.user_code(), Some("store.read_only"));
        assert!(err.user_hint().is_some());
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_rejection_codes_by_status() {
        assert_eq!(
            UploadRejection::new(415, "no").user_code(),
            Some("rejection.unsupported_media_type")
        );
        assert_eq!(
            UploadRejection::new(503, "busy").user_code(),
            Some("rejection.server")
        );
    }
}
