//! Chat sessions end to end, with both vendors mocked

use parley::dispatch::{Dispatcher, Settings};
use parley::session::{ChatRequest, ChatService, MemoryStore, SessionStore};
use parley::{Role, ERROR_SENTINEL};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::sync::Arc;
use test_log::test;
use tokio::sync::mpsc;
use wiremock::matchers::{body_partial_json, method};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn service(openai: &MockServer, gemini: &MockServer) -> (ChatService, MemoryStore) {
    let openai_url = format!("{}/v1", openai.uri());
    let gemini_url = gemini.uri();
    let settings = Settings::from_lookup(|name| match name {
        "OPENAI_API_KEY" => Some("sk-test".to_string()),
        "GEMINI_API_KEY" => Some("g-test".to_string()),
        "OPENAI_BASE_URL" => Some(openai_url.clone()),
        "GEMINI_BASE_URL" => Some(gemini_url.clone()),
        "PARLEY_STREAM_UNIT" => Some("word".to_string()),
        "PARLEY_STREAM_DELAY_MS" => Some("0".to_string()),
        _ => None,
    })
    .unwrap();

    let dispatcher = Dispatcher::from_settings(&settings).unwrap();
    let store = MemoryStore::new();
    let service = ChatService::new(Arc::new(dispatcher), Arc::new(store.clone()));
    (service, store)
}

fn gemini_reply(text: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "candidates": [{"content": {"role": "model", "parts": [{"text": text}]}}],
    }))
}

#[test(tokio::test)]
async fn test_stream_envelope_with_fallback() {
    let openai = MockServer::start().await;
    let gemini = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("down"))
        .expect(1)
        .mount(&gemini)
        .await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({"stream": true})))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/event-stream")
                .set_body_string(concat!(
                    "data: {\"choices\":[{\"delta\":{\"content\":\"Hello\"}}]}\n\n",
                    "data: {\"choices\":[{\"delta\":{\"content\":\" there\"}}]}\n\n",
                    "data: [DONE]\n\n",
                )),
        )
        .expect(1)
        .mount(&openai)
        .await;

    let (service, store) = service(&openai, &gemini).await;
    let (tx, mut rx) = mpsc::channel(16);

    let reply = service
        .stream("alice", ChatRequest::new("Say hello"), tx)
        .await
        .unwrap();

    let mut lines = Vec::new();
    while let Some(line) = rx.recv().await {
        lines.push(serde_json::from_str::<Value>(&line).unwrap());
    }
    assert_eq!(
        lines,
        vec![
            json!({"type": "session_id", "session_id": reply.session_id.to_string()}),
            json!({"type": "content", "content": "Hello"}),
            json!({"type": "content", "content": " there"}),
            json!({"type": "message_id", "message_id": reply.id.to_string()}),
        ]
    );

    let history = store.messages(reply.session_id).await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[1].role, Role::Assistant);
    assert_eq!(history[1].content, "Hello there");
}

#[test(tokio::test)]
async fn test_conversation_continues_in_session() {
    let openai = MockServer::start().await;
    let gemini = MockServer::start().await;
    // array matching is by prefix, so the longer history goes first
    Mock::given(method("POST"))
        .and(body_partial_json(json!({
            "contents": [
                {"role": "user", "parts": [{"text": "First question"}]},
                {"role": "model", "parts": [{"text": "First answer"}]},
                {"role": "user", "parts": [{"text": "Second question"}]},
            ],
        })))
        .respond_with(gemini_reply("Second answer"))
        .expect(1)
        .mount(&gemini)
        .await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({
            "contents": [{"role": "user", "parts": [{"text": "First question"}]}],
        })))
        .respond_with(gemini_reply("First answer"))
        .expect(1)
        .mount(&gemini)
        .await;

    let (service, store) = service(&openai, &gemini).await;

    let first = service
        .send("alice", ChatRequest::new("First question"))
        .await
        .unwrap();
    let second = service
        .send(
            "alice",
            ChatRequest::new("Second question").in_session(first.session_id),
        )
        .await
        .unwrap();

    assert_eq!(second.session_id, first.session_id);
    assert_eq!(second.content, "Second answer");
    assert_eq!(store.messages(first.session_id).await.unwrap().len(), 4);
    assert_eq!(store.list_sessions("alice").await.unwrap().len(), 1);
}

#[test(tokio::test)]
async fn test_send_with_every_provider_down() {
    let openai = MockServer::start().await;
    let gemini = MockServer::start().await;
    for server in [&openai, &gemini] {
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .expect(1)
            .mount(server)
            .await;
    }

    let (service, store) = service(&openai, &gemini).await;
    let reply = service
        .send("alice", ChatRequest::new("Anyone there?"))
        .await
        .unwrap();

    assert!(reply.content.starts_with(ERROR_SENTINEL));
    let history = store.messages(reply.session_id).await.unwrap();
    assert_eq!(history[1].content, reply.content);
}
