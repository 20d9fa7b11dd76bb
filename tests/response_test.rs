//! OakDB Rust SDK - Streamed Response Tests

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use serde_json::{json, Value};

use oakdb::{ChunkBuffer, Error, JsonCodec, QueryChunk, QueryDecoder, Section};

fn pair() -> (QueryDecoder, oakdb::StreamedQueryResult) {
    QueryDecoder::streamed("req-7", Some("ctx-7".into()), Arc::new(JsonCodec))
}

fn payload(section: Section, body: &str) -> QueryChunk {
    QueryChunk::Payload {
        section,
        buffer: ChunkBuffer::new(body.as_bytes()),
    }
}

#[tokio::test]
async fn test_sections_are_independently_consumable() {
    let (decoder, mut result) = pair();

    // Interleaved, out-of-order section arrival.
    decoder
        .push(payload(Section::Signature, r#"{"*":"*"}"#))
        .unwrap();
    decoder.push(payload(Section::Rows, r#"{"n":1}"#)).unwrap();
    decoder
        .push(payload(Section::Errors, r#"{"code":5000,"msg":"internal"}"#))
        .unwrap();
    decoder.push(payload(Section::Rows, r#"{"n":2}"#)).unwrap();
    decoder.push(QueryChunk::SectionEnd(Section::Rows)).unwrap();
    decoder
        .push(QueryChunk::SectionEnd(Section::Errors))
        .unwrap();
    decoder.push(QueryChunk::Status { success: false }).unwrap();

    // Consume errors before rows: neither forces the other.
    let errors: Vec<Value> = result
        .errors()
        .map(|e| e.unwrap())
        .collect::<Vec<_>>()
        .await;
    assert_eq!(errors, vec![json!({"code": 5000, "msg": "internal"})]);

    let rows: Vec<Value> = result.rows().map(|r| r.unwrap()).collect::<Vec<_>>().await;
    assert_eq!(rows, vec![json!({"n": 1}), json!({"n": 2})]);

    let signature = result.signature().await.unwrap().unwrap();
    assert_eq!(signature, json!({"*": "*"}));

    assert!(!result.final_success().await.unwrap());
}

#[tokio::test]
async fn test_malformed_errors_section_does_not_affect_rows() {
    let (decoder, mut result) = pair();

    decoder.push(payload(Section::Rows, r#"{"n":1}"#)).unwrap();
    decoder.push(payload(Section::Errors, "{broken")).unwrap();
    decoder.push(payload(Section::Rows, r#"{"n":2}"#)).unwrap();
    decoder.push(QueryChunk::SectionEnd(Section::Rows)).unwrap();
    decoder
        .push(QueryChunk::SectionEnd(Section::Errors))
        .unwrap();
    decoder.push(QueryChunk::Status { success: true }).unwrap();

    let rows: Vec<Value> = result.rows().map(|r| r.unwrap()).collect::<Vec<_>>().await;
    assert_eq!(rows, vec![json!({"n": 1}), json!({"n": 2})]);

    let errors: Vec<oakdb::Result<Value>> = result.errors().collect::<Vec<_>>().await;
    assert_eq!(errors.len(), 1);
    assert!(matches!(errors[0], Err(Error::Transcoding(_))));

    // The terminal marker still resolves the final status.
    assert!(result.final_success().await.unwrap());
}

#[tokio::test]
async fn test_transport_failure_broadcasts_to_all_sections() {
    let (decoder, mut result) = pair();
    decoder.push(payload(Section::Rows, r#"{"n":1}"#)).unwrap();
    decoder.fail(Error::Transport("connection dropped".into()));

    let rows: Vec<oakdb::Result<Value>> = result.rows().collect::<Vec<_>>().await;
    assert_eq!(rows.len(), 2);
    assert!(rows[0].is_ok());
    assert!(matches!(rows[1], Err(Error::Transport(_))));

    let errors: Vec<oakdb::Result<Value>> = result.errors().collect::<Vec<_>>().await;
    assert!(matches!(errors[0], Err(Error::Transport(_))));

    assert!(matches!(
        result.final_success().await,
        Err(Error::Transport(_))
    ));
}

#[tokio::test]
async fn test_final_success_suspends_until_terminal_marker() {
    let (decoder, mut result) = pair();

    let waiter = tokio::spawn(async move { result.final_success().await });
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(!waiter.is_finished());

    decoder.push(QueryChunk::Status { success: true }).unwrap();
    assert!(waiter.await.unwrap().unwrap());
}

#[tokio::test]
async fn test_buffers_released_exactly_once_even_on_decode_failure() {
    let released = Arc::new(AtomicUsize::new(0));
    let (decoder, _result) = pair();

    for body in [&br#"{"n":1}"#[..], &b"{broken"[..], &br#"{"n":2}"#[..]] {
        let counter = Arc::clone(&released);
        decoder
            .push(QueryChunk::Payload {
                section: Section::Rows,
                buffer: ChunkBuffer::with_release(body, move || {
                    counter.fetch_add(1, Ordering::SeqCst);
                }),
            })
            .unwrap();
    }
    assert_eq!(released.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_cancel_fails_consumption_and_pushing() {
    let released = Arc::new(AtomicUsize::new(0));
    let (decoder, mut result) = pair();
    decoder.push(payload(Section::Rows, r#"{"n":1}"#)).unwrap();

    result.cancel();

    // Pending consumption fails instead of hanging.
    assert!(matches!(
        result.final_success().await,
        Err(Error::Cancelled)
    ));
    let first = result.rows().next().await;
    assert!(matches!(first, Some(Err(Error::Cancelled))));

    // Pushes are rejected, and the rejected chunk's buffer is still released.
    let counter = Arc::clone(&released);
    let rejected = decoder.push(QueryChunk::Payload {
        section: Section::Rows,
        buffer: ChunkBuffer::with_release(&b"{}"[..], move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }),
    });
    assert!(matches!(rejected, Err(Error::Cancelled)));
    assert_eq!(released.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_deadline_fails_open_sections_uniformly() {
    tokio::time::pause();
    let (decoder, mut result) = pair();
    decoder.arm_deadline(Duration::from_millis(50));
    decoder.push(payload(Section::Rows, r#"{"n":1}"#)).unwrap();

    tokio::time::advance(Duration::from_millis(60)).await;

    assert!(matches!(result.final_success().await, Err(Error::Timeout)));
    let rows: Vec<oakdb::Result<Value>> = result.rows().collect::<Vec<_>>().await;
    assert!(matches!(rows.last(), Some(Err(Error::Timeout))));
    let errors: Vec<oakdb::Result<Value>> = result.errors().collect::<Vec<_>>().await;
    assert!(matches!(errors.last(), Some(Err(Error::Timeout))));
}

#[tokio::test]
async fn test_deadline_is_a_noop_after_completion() {
    tokio::time::pause();
    let (decoder, mut result) = pair();
    decoder.arm_deadline(Duration::from_millis(50));
    decoder.push(QueryChunk::SectionEnd(Section::Rows)).unwrap();
    decoder.push(QueryChunk::Status { success: true }).unwrap();

    tokio::time::advance(Duration::from_millis(60)).await;

    assert!(result.final_success().await.unwrap());
    assert!(result.rows().next().await.is_none());
}

#[tokio::test]
async fn test_request_and_context_ids_available_immediately() {
    let (_decoder, result) = pair();
    assert_eq!(result.request_id(), "req-7");
    assert_eq!(result.client_context_id(), "ctx-7");

    // A missing context id is generated, not left empty.
    let (_d, generated) = QueryDecoder::streamed("req-8", None, Arc::new(JsonCodec));
    assert!(!generated.client_context_id().is_empty());
}
