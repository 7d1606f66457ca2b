//! Integration tests for events

use upstate_errors::StoreError;
use upstate_events::*;
use upstate_types::{Tier, TransferId, UploadStatus};

fn id() -> TransferId {
    TransferId::parse("abc").unwrap()
}

#[tokio::test]
async fn emitted_events_carry_metadata() {
    let (tx, mut rx) = channel();

    tx.emit(TransferEvent::Started {
        transfer_id: id(),
        tier: Tier::Session,
    });
    tx.emit(TransferEvent::SessionUnavailable {
        transfer_id: id(),
        failure: FailureContext::from_error(&StoreError::ReadOnly),
    });

    let first = rx.recv().await.unwrap();
    assert_eq!(first.meta.correlation_id.as_deref(), Some("abc"));
    assert_eq!(first.meta.source, EventSource::TRANSFER);
    assert_eq!(first.meta.level, EventLevel::Info);

    let second = rx.recv().await.unwrap();
    assert_eq!(second.meta.level, EventLevel::Warn);
    assert_eq!(second.meta.source, EventSource::STORE);
    assert!(matches!(second.event, TransferEvent::SessionUnavailable { .. }));
}

#[tokio::test]
async fn dropped_receiver_is_ignored() {
    let (tx, rx) = channel();
    drop(rx);

    tx.emit(TransferEvent::CancelRequested { transfer_id: id() });
}

#[test]
fn missing_sender_emits_nothing() {
    let sender: Option<EventSender> = None;
    sender.emit(TransferEvent::CancelRequested { transfer_id: id() });
}

#[test]
fn event_serializes_with_type_tag() {
    let event = TransferEvent::Demoted {
        transfer_id: id(),
        status: UploadStatus::Completed,
    };
    let json = serde_json::to_value(&event).unwrap();
    assert_eq!(json["type"], "demoted");
    assert_eq!(json["transfer_id"], "abc");
    assert_eq!(json["status"], "completed");
}
