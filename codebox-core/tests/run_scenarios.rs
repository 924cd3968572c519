//! End-to-end runs against the in-memory backends

use std::time::Duration;

use bytes::Bytes;
use codebox_core::assistants::{RunStatus, ThreadMessage};
use codebox_core::config::{AssistantsConfig, ResponsesConfig};
use codebox_core::mock::{MockAssistants, MockResponses};
use codebox_core::prelude::*;
use serde_json::json;

const PNG: &[u8] = b"\x89PNG\r\n\x1a\n\x00\x00\x00\rIHDR\x00\x00";

fn no_backoff() -> AssistantsConfig {
    AssistantsConfig {
        retry_backoff_secs: 0,
        ..Default::default()
    }
}

fn reply(value: serde_json::Value) -> ThreadMessage {
    serde_json::from_value(value).unwrap()
}

#[tokio::test]
async fn test_simple_math() {
    let tmp = tempfile::tempdir().unwrap();
    let backend = MockAssistants::new();
    backend.set_reply(reply(json!({
        "role": "assistant",
        "content": [{"type": "text", "text": {"value": "4\n", "annotations": []}}],
        "attachments": []
    })));
    let client = AssistantsClient::with_settings(backend, no_backoff(), FileStoreConfig::new(tmp.path()))
        .await
        .unwrap();

    let out = client.run("result = 2 + 2\nprint(result)").await.unwrap();

    assert_eq!(out.text.as_deref(), Some("4\n"));
    assert_eq!(out.file_paths, Some(vec![]));
}

#[tokio::test]
async fn test_image_block_is_saved_as_png() {
    let tmp = tempfile::tempdir().unwrap();
    let dir = tmp.path().join("files");
    let backend = MockAssistants::new();
    backend.add_file("file-abc", Bytes::from_static(PNG));
    backend.set_reply(reply(json!({
        "content": [
            {"type": "image_file", "image_file": {"file_id": "file-abc"}},
            {"type": "text", "text": {"value": "Here is the sine curve.", "annotations": []}}
        ]
    })));
    let client = AssistantsClient::with_settings(backend, no_backoff(), FileStoreConfig::new(&dir))
        .await
        .unwrap();

    let out = client.run("plt.plot(x, np.sin(x)); plt.savefig('sin.png')").await.unwrap();

    let expected = dir.join("file-abc.png").display().to_string();
    assert_eq!(out.file_paths, Some(vec![expected.clone()]));
    assert_eq!(std::fs::read(expected).unwrap(), PNG);
}

#[tokio::test]
async fn test_annotation_and_attachment_share_a_file() {
    let tmp = tempfile::tempdir().unwrap();
    let backend = MockAssistants::new();
    backend.add_file("file-csv", Bytes::from_static(b"n,fib\n0,0\n1,1\n"));
    backend.add_file("file-pdf", Bytes::from_static(b"%PDF-1.4\n"));
    backend.set_reply(reply(json!({
        "content": [{"type": "text", "text": {
            "value": "[Fibonacci_Series.csv](sandbox:/mnt/data/Fibonacci_Series.csv)",
            "annotations": [{"type": "file_path", "file_path": {"file_id": "file-csv"}}]
        }}],
        "attachments": [
            {"file_id": "file-pdf", "tools": [{"type": "code_interpreter"}]},
            {"file_id": "file-csv", "tools": [{"type": "code_interpreter"}]}
        ]
    })));
    let client = AssistantsClient::with_settings(backend, no_backoff(), FileStoreConfig::new(tmp.path()))
        .await
        .unwrap();

    let out = client.run("fib()").await.unwrap();

    let paths = out.file_paths.unwrap();
    assert_eq!(paths.len(), 2);
    assert!(paths[0].ends_with("file-csv"));
    assert!(paths[1].ends_with("file-pdf.pdf"));
    assert_eq!(client.backend().calls().downloads, 2);
}

#[tokio::test]
async fn test_malformed_message_returns_none_pair() {
    let tmp = tempfile::tempdir().unwrap();
    let backend = MockAssistants::new();
    backend.set_reply(reply(json!({"id": "msg_1", "attachments": [{"file_id": "file-x"}]})));
    let client = AssistantsClient::with_settings(backend, no_backoff(), FileStoreConfig::new(tmp.path()))
        .await
        .unwrap();

    let out = client.run("print(1)").await.unwrap();

    assert_eq!(out.text, None);
    assert_eq!(out.file_paths, None);
    assert_eq!(client.backend().calls().downloads, 0);
}

#[tokio::test]
async fn test_retry_bound() {
    let tmp = tempfile::tempdir().unwrap();
    let backend = MockAssistants::new();
    for _ in 0..10 {
        backend.push_run(RunStatus::Failed, Some("server_error"));
    }
    let client = AssistantsClient::with_settings(backend, no_backoff(), FileStoreConfig::new(tmp.path()))
        .await
        .unwrap();

    let err = client.run("print(1)").await.unwrap_err();

    assert!(matches!(err, Error::RunFailed { attempts: 3, .. }));
    let calls = client.backend().calls();
    assert_eq!(calls.messages, 3);
    assert_eq!(calls.runs, 3);
}

#[tokio::test]
async fn test_no_retry_budget() {
    let tmp = tempfile::tempdir().unwrap();
    let backend = MockAssistants::new();
    backend.push_run(RunStatus::Failed, None);
    let client = AssistantsClient::with_settings(backend, no_backoff(), FileStoreConfig::new(tmp.path()))
        .await
        .unwrap()
        .with_retry_policy(RetryPolicy {
            max_retries: 0,
            backoff: Duration::ZERO,
        });

    let err = client.run("print(1)").await.unwrap_err();

    assert!(matches!(err, Error::RunFailed { attempts: 1, .. }));
    assert_eq!(client.backend().calls().runs, 1);
}

#[tokio::test]
async fn test_unrecognized_status_fails_immediately() {
    let tmp = tempfile::tempdir().unwrap();
    let backend = MockAssistants::new();
    backend.push_run(RunStatus::RequiresAction, None);
    let client = AssistantsClient::with_settings(backend, no_backoff(), FileStoreConfig::new(tmp.path()))
        .await
        .unwrap();

    let err = client.run("print(1)").await.unwrap_err();

    match err {
        Error::UnexpectedRunStatus { status, .. } => assert_eq!(status, "requires_action"),
        other => panic!("unexpected error: {other}"),
    }
    let calls = client.backend().calls();
    assert_eq!(calls.runs, 1);
    assert_eq!(calls.threads, 1);
}

#[tokio::test]
async fn test_responses_client_shares_sniffing() {
    let tmp = tempfile::tempdir().unwrap();
    let backend = MockResponses::new();
    backend.add_file("cfile_1", Bytes::from_static(PNG));
    backend.push_response(
        serde_json::from_value(json!({
            "status": "completed",
            "output": [
                {"type": "message", "content": [{"type": "output_text", "text": "4\n"}]},
                {"type": "tool_result", "tool_name": "code_interpreter", "files": [{"file_id": "cfile_1"}]}
            ]
        }))
        .unwrap(),
    );
    let client = ResponsesClient::with_settings(backend, ResponsesConfig::default(), FileStoreConfig::new(tmp.path()))
        .await
        .unwrap();

    let out = client.run("print(2 + 2)").await.unwrap();

    assert_eq!(out.text.as_deref(), Some("4\n"));
    let paths = out.file_paths.unwrap();
    assert!(paths[0].ends_with("cfile_1.png"));
}
