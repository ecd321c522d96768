//! Integration test: run a minimal fake conversation service on a free port and drive it through
//! `ReqwestTransport`. Checks auth, URL, version, context echo, status mapping and timeouts.

use axum::extract::{Path, Query};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::Router;
use conversation::{
    ConversationClient, ConversationError, Credentials, MessageRequest, ReqwestTransport,
    TransportError, API_VERSION,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::time::Duration;

const WORKSPACE: &str = "ws-live";
// base64("bob:hunter2")
const EXPECTED_AUTH: &str = "Basic Ym9iOmh1bnRlcjI=";

async fn message(
    Path(workspace): Path<String>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
    body: String,
) -> (StatusCode, String) {
    if headers.get("authorization").and_then(|v| v.to_str().ok()) != Some(EXPECTED_AUTH) {
        return (StatusCode::UNAUTHORIZED, r#"{"error":"Unauthorized"}"#.to_string());
    }
    if workspace != WORKSPACE {
        return (StatusCode::NOT_FOUND, r#"{"error":"Workspace not found"}"#.to_string());
    }
    if query.get("version").map(String::as_str) != Some(API_VERSION) {
        return (StatusCode::BAD_REQUEST, r#"{"error":"bad version"}"#.to_string());
    }
    if headers.get("content-type").and_then(|v| v.to_str().ok()) != Some("application/json") {
        return (StatusCode::UNSUPPORTED_MEDIA_TYPE, String::new());
    }
    let Ok(req) = serde_json::from_str::<Value>(&body) else {
        return (StatusCode::BAD_REQUEST, String::new());
    };

    let text = req["input"]["text"].as_str().unwrap_or("").to_string();
    if text == "slow" {
        tokio::time::sleep(Duration::from_secs(3)).await;
    }
    let (conversation_id, turn) = match req.get("context") {
        Some(ctx) => (
            ctx["conversation_id"].as_str().unwrap_or("").to_string(),
            ctx["system"]["dialog_turn_counter"].as_u64().unwrap_or(0) + 1,
        ),
        None => ("conv-live-1".to_string(), 1),
    };
    let intent = if turn == 1 { "greeting" } else { "followup" };
    let reply = json!({
        "input": {"text": text},
        "intents": [{"intent": intent, "confidence": 0.75}],
        "entities": [],
        "context": {"conversation_id": conversation_id, "system": {"dialog_turn_counter": turn}},
        "output": {"log_messages": [], "text": [format!("turn {turn}")], "nodes_visited": ["root"]}
    });
    (StatusCode::OK, reply.to_string())
}

async fn start_service() -> String {
    let app = Router::new().route(
        "/conversation/api/v1/workspaces/:workspace_id/message",
        post(message),
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind free port");
    let addr = listener.local_addr().expect("local_addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    format!("http://{}", addr)
}

fn client(base_url: &str, creds: Credentials) -> ConversationClient<ReqwestTransport> {
    ConversationClient::new(creds, ReqwestTransport::new()).with_base_url(base_url)
}

#[tokio::test]
async fn two_turn_dialogue_over_http() {
    let base = start_service().await;
    let client = client(&base, Credentials::new("bob", "hunter2", WORKSPACE));

    let first = client
        .send_message(&client.continue_with("hello"))
        .await
        .unwrap();
    assert_eq!(first.context.conversation_id, "conv-live-1");
    assert_eq!(first.top_intent().unwrap().intent, "greeting");
    assert_eq!(first.text(), "turn 1");

    let second = client
        .send_message(&client.continue_with("and then?"))
        .await
        .unwrap();
    assert_eq!(second.context.conversation_id, "conv-live-1");
    assert_eq!(second.top_intent().unwrap().intent, "followup");
    assert_eq!(second.text(), "turn 2");
}

#[tokio::test]
async fn wrong_credentials_and_workspace_map_to_status() {
    let base = start_service().await;

    let bad_auth = client(&base, Credentials::new("bob", "wrong", WORKSPACE));
    let err = bad_auth
        .send_message(&MessageRequest::new("hi"))
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(401));
    assert!(!err.is_retryable());

    let bad_ws = client(&base, Credentials::new("bob", "hunter2", "nope"));
    let err = bad_ws
        .send_message(&MessageRequest::new("hi"))
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(404));
    assert!(bad_ws.last_response().is_none());
}

#[tokio::test]
async fn client_deadline_surfaces_as_timeout() {
    let base = start_service().await;
    let client = client(&base, Credentials::new("bob", "hunter2", WORKSPACE))
        .with_timeout(Duration::from_millis(200));

    let err = client
        .send_message(&MessageRequest::new("slow"))
        .await
        .unwrap_err();
    assert!(
        matches!(err, ConversationError::Transport(TransportError::Timeout)),
        "{err:?}"
    );
}

#[tokio::test]
async fn unreachable_service_is_transport_error() {
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind free port");
        listener.local_addr().expect("local_addr").port()
    };
    let client = client(
        &format!("http://127.0.0.1:{}", port),
        Credentials::new("bob", "hunter2", WORKSPACE),
    );
    let err = client
        .send_message(&MessageRequest::new("hi"))
        .await
        .unwrap_err();
    assert!(
        matches!(err, ConversationError::Transport(TransportError::Request(_))),
        "{err:?}"
    );
}
