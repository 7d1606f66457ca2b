//! Structured logging for transfer events

use tracing::Level;
use upstate_events::{EventMessage, TransferEvent};

/// Emit a tracing event at a level only known at runtime
macro_rules! log_at {
    ($level:expr, $($arg:tt)+) => {
        match $level {
            Level::ERROR => tracing::error!($($arg)+),
            Level::WARN => tracing::warn!($($arg)+),
            Level::INFO => tracing::info!($($arg)+),
            Level::DEBUG => tracing::debug!($($arg)+),
            Level::TRACE => tracing::trace!($($arg)+),
        }
    };
}

/// Log a transfer event with structured fields at the level its metadata
/// carries
pub fn log_event_with_tracing(message: &EventMessage) {
    let meta = &message.meta;
    let level = meta.tracing_level();
    match &message.event {
        TransferEvent::Started { transfer_id, tier } => {
            log_at!(
                level,
                source = meta.source.as_str(),
                event_id = %meta.event_id,
                correlation = ?meta.correlation_id,
                transfer_id = %transfer_id,
                tier = %tier,
                "Transfer started"
            );
        }
        TransferEvent::Published {
            transfer_id,
            tier,
            bytes_read,
            status,
        } => {
            log_at!(
                level,
                source = meta.source.as_str(),
                event_id = %meta.event_id,
                correlation = ?meta.correlation_id,
                transfer_id = %transfer_id,
                tier = %tier,
                bytes_read,
                status = %status,
                "Progress published"
            );
        }
        TransferEvent::StatusPulledDown {
            transfer_id,
            status,
        } => {
            log_at!(
                level,
                source = meta.source.as_str(),
                event_id = %meta.event_id,
                correlation = ?meta.correlation_id,
                transfer_id = %transfer_id,
                status = %status,
                "Stored status adopted by receiver"
            );
        }
        TransferEvent::CancelRequested { transfer_id } => {
            log_at!(
                level,
                source = meta.source.as_str(),
                event_id = %meta.event_id,
                correlation = ?meta.correlation_id,
                transfer_id = %transfer_id,
                "Cancel requested"
            );
        }
        TransferEvent::Demoted {
            transfer_id,
            status,
        } => {
            log_at!(
                level,
                source = meta.source.as_str(),
                event_id = %meta.event_id,
                correlation = ?meta.correlation_id,
                transfer_id = %transfer_id,
                status = %status,
                "Transfer moved to cache"
            );
        }
        TransferEvent::SessionUnavailable {
            transfer_id,
            failure,
        } => {
            log_at!(
                level,
                source = meta.source.as_str(),
                event_id = %meta.event_id,
                correlation = ?meta.correlation_id,
                transfer_id = %transfer_id,
                retryable = failure.retryable,
                code = ?failure.code,
                message = %failure.message,
                hint = ?failure.hint,
                "Session tier unavailable"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::{Arc, Mutex};
    use tracing_subscriber::fmt::MakeWriter;
    use upstate_errors::StoreError;
    use upstate_events::FailureContext;
    use upstate_types::{Tier, TransferId, UploadStatus};

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for Captured {
        type Writer = Self;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    fn logged_line(event: TransferEvent) -> serde_json::Value {
        let captured = Captured::default();
        let subscriber = tracing_subscriber::fmt()
            .json()
            .with_max_level(Level::TRACE)
            .with_writer(captured.clone())
            .finish();
        tracing::subscriber::with_default(subscriber, || {
            log_event_with_tracing(&EventMessage::from_event(event));
        });
        let bytes = captured.0.lock().unwrap().clone();
        let text = String::from_utf8(bytes).unwrap();
        serde_json::from_str(text.lines().next().unwrap()).unwrap()
    }

    fn abc() -> TransferId {
        TransferId::parse("abc").unwrap()
    }

    #[test]
    fn events_are_logged_at_their_metadata_level() {
        let published = logged_line(TransferEvent::Published {
            transfer_id: abc(),
            tier: Tier::Process,
            bytes_read: 10,
            status: UploadStatus::InProgress,
        });
        assert_eq!(published["level"], "DEBUG");
        assert_eq!(published["fields"]["message"], "Progress published");

        let demoted = logged_line(TransferEvent::Demoted {
            transfer_id: abc(),
            status: UploadStatus::Completed,
        });
        assert_eq!(demoted["level"], "INFO");

        let unavailable = logged_line(TransferEvent::SessionUnavailable {
            transfer_id: abc(),
            failure: FailureContext::from_error(&StoreError::ReadOnly),
        });
        assert_eq!(unavailable["level"], "WARN");
        assert_eq!(unavailable["fields"]["retryable"], false);
    }

    #[test]
    fn explicit_meta_level_overrides_the_event_default() {
        let captured = Captured::default();
        let subscriber = tracing_subscriber::fmt()
            .json()
            .with_max_level(Level::TRACE)
            .with_writer(captured.clone())
            .finish();
        let meta = upstate_events::EventMeta::new(Level::ERROR, upstate_events::EventSource::SYNC);
        let message = EventMessage::new(meta, TransferEvent::CancelRequested { transfer_id: abc() });
        tracing::subscriber::with_default(subscriber, || log_event_with_tracing(&message));

        let text = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        let line: serde_json::Value = serde_json::from_str(text.trim()).unwrap();
        assert_eq!(line["level"], "ERROR");
        assert_eq!(line["fields"]["source"], "sync");
    }
}
