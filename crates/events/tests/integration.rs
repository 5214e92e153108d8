//! Integration tests for events

#[cfg(test)]
mod tests {
    use pvdrv_errors::CleanupError;
    use pvdrv_events::*;
    use pvdrv_types::CleanupStage;

    #[tokio::test]
    async fn test_event_emitter() {
        let (tx, mut rx) = channel();

        tx.emit_error("test error");
        tx.emit_debug("test debug");

        let event1 = rx.recv().await.unwrap();
        assert!(matches!(event1, AppEvent::General(GeneralEvent::Error { .. })));

        let event2 = rx.recv().await.unwrap();
        assert!(matches!(
            event2,
            AppEvent::General(GeneralEvent::DebugLog { .. })
        ));
    }

    #[tokio::test]
    async fn test_dropped_receiver() {
        let (tx, rx) = channel();
        drop(rx);

        // Should not panic when receiver is dropped
        tx.emit_warning("ignored");
    }

    #[test]
    fn test_log_levels() {
        let retry = AppEvent::Cleanup(CleanupEvent::UninstallRetryScheduled {
            product_code: "{0}".into(),
            attempt: 1,
            exit_code: 1603,
            delay_secs: 1,
        });
        assert_eq!(retry.log_level(), tracing::Level::WARN);

        let failed = AppEvent::Driver(DriverEvent::StageFailed {
            driver: "xenvif".into(),
            inf: "xenvif.inf".into(),
            code: 2,
            message: "not found".into(),
        });
        assert_eq!(failed.log_level(), tracing::Level::ERROR);

        let skipped = AppEvent::Cleanup(CleanupEvent::StageSkipped {
            stage: CleanupStage::PurgeRemnants,
        });
        assert_eq!(skipped.log_level(), tracing::Level::INFO);
        assert_eq!(skipped.log_target(), "pvdrv::events::cleanup");
        assert_eq!(skipped.event_source(), EventSource::CLEANUP);
    }

    #[test]
    fn test_failure_context_from_error() {
        let err = CleanupError::UninstallFailed {
            product_code: "{0}".into(),
            exit_code: 1603,
            attempts: 5,
        };
        let ctx = FailureContext::from_error(&err);
        assert_eq!(ctx.code.as_deref(), Some("cleanup.uninstall_failed"));
        assert!(ctx.retryable);
        assert!(ctx.hint.is_some());
    }

    #[test]
    fn test_event_serialization() {
        let event = AppEvent::Cleanup(CleanupEvent::StageStarted {
            stage: CleanupStage::UninstallMsis,
        });
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["domain"], "cleanup");
        assert_eq!(json["event"]["type"], "stage_started");
        assert_eq!(json["event"]["stage"], "uninstall_msis");
    }
}
