//! Streaming through the dispatcher against mocked vendor endpoints

use futures::StreamExt;
use parley::dispatch::{Dispatcher, Settings};
use parley::providers::{GeminiBuilder, OpenAIBuilder};
use parley::{CanonicalChunk, ChunkStream, Conversation, Turn};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use test_log::test;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn settings(openai: &MockServer, gemini: &MockServer, extra: &[(&str, &str)]) -> Settings {
    let mut vars: HashMap<String, String> = HashMap::from([
        ("OPENAI_API_KEY".into(), "sk-test".into()),
        ("GEMINI_API_KEY".into(), "g-test".into()),
        ("OPENAI_BASE_URL".into(), format!("{}/v1", openai.uri())),
        ("GEMINI_BASE_URL".into(), gemini.uri()),
        ("PARLEY_STREAM_DELAY_MS".into(), "0".into()),
    ]);
    for (key, value) in extra {
        vars.insert(key.to_string(), value.to_string());
    }
    Settings::from_lookup(|name| vars.get(name).cloned()).unwrap()
}

fn sse(events: &[&str]) -> ResponseTemplate {
    let body: String = events.iter().map(|e| format!("data: {e}\n\n")).collect();
    ResponseTemplate::new(200)
        .insert_header("content-type", "text/event-stream")
        .set_body_string(body)
}

fn delta(text: &str) -> String {
    json!({"choices": [{"delta": {"content": text}}]}).to_string()
}

fn gemini_reply(text: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "candidates": [{"content": {"role": "model", "parts": [{"text": text}]}}],
    }))
}

fn conversation() -> Conversation {
    Conversation::new().with_turn(Turn::user("Hi"))
}

async fn texts(stream: ChunkStream) -> Vec<String> {
    stream
        .map(|item| match item {
            Ok(CanonicalChunk::Content { content }) => content,
            other => panic!("unexpected item: {other:?}"),
        })
        .collect()
        .await
}

#[test(tokio::test)]
async fn test_simulated_stream_matches_generate() {
    let openai = MockServer::start().await;
    let gemini = MockServer::start().await;
    let reply = "Streaming, simulated: one piece at a time.";
    Mock::given(method("POST"))
        .respond_with(gemini_reply(reply))
        .expect(2)
        .mount(&gemini)
        .await;

    let dispatcher = Dispatcher::from_settings(&settings(&openai, &gemini, &[])).unwrap();

    let whole = dispatcher.generate(&conversation()).await.unwrap();
    let pieces = texts(dispatcher.stream(&conversation())).await;

    assert_eq!(pieces.len(), reply.chars().count());
    assert_eq!(pieces.concat(), whole);
}

#[test(tokio::test)]
async fn test_word_units() {
    let openai = MockServer::start().await;
    let gemini = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(gemini_reply("one two  three"))
        .mount(&gemini)
        .await;

    let settings = settings(&openai, &gemini, &[("PARLEY_STREAM_UNIT", "word")]);
    let dispatcher = Dispatcher::from_settings(&settings).unwrap();

    let pieces = texts(dispatcher.stream(&conversation())).await;
    assert_eq!(pieces, vec!["one ", "two  ", "three"]);
}

#[test(tokio::test)]
async fn test_native_stream() {
    let openai = MockServer::start().await;
    let gemini = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_partial_json(json!({"stream": true})))
        .respond_with(sse(&[
            delta("Hel").as_str(),
            delta("lo").as_str(),
            delta("!").as_str(),
            "[DONE]",
        ]))
        .expect(1)
        .mount(&openai)
        .await;

    let settings = settings(&openai, &gemini, &[("PARLEY_PROVIDER_PREFERENCE", "openai")]);
    let dispatcher = Dispatcher::from_settings(&settings).unwrap();

    let pieces = texts(dispatcher.stream(&conversation())).await;
    assert_eq!(pieces, vec!["Hel", "lo", "!"]);
}

#[test(tokio::test)]
async fn test_first_chunk_error_switches_provider() {
    let openai = MockServer::start().await;
    let gemini = MockServer::start().await;
    let failure = json!({"error": {"message": "model overloaded"}}).to_string();
    Mock::given(method("POST"))
        .respond_with(sse(&[failure.as_str()]))
        .expect(1)
        .mount(&openai)
        .await;
    Mock::given(method("POST"))
        .respond_with(gemini_reply("ok"))
        .expect(1)
        .mount(&gemini)
        .await;

    let settings = settings(&openai, &gemini, &[("PARLEY_PROVIDER_PREFERENCE", "openai")]);
    let dispatcher = Dispatcher::from_settings(&settings).unwrap();

    let pieces = texts(dispatcher.stream(&conversation())).await;
    assert_eq!(pieces, vec!["o", "k"]);
}

#[test(tokio::test)]
async fn test_status_error_before_stream_switches_provider() {
    let openai = MockServer::start().await;
    let gemini = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&openai)
        .await;
    Mock::given(method("POST"))
        .respond_with(gemini_reply("Hello!"))
        .expect(1)
        .mount(&gemini)
        .await;

    let settings = settings(&openai, &gemini, &[("PARLEY_PROVIDER_PREFERENCE", "openai")]);
    let dispatcher = Dispatcher::from_settings(&settings).unwrap();

    let pieces = texts(dispatcher.stream(&conversation())).await;
    assert_eq!(pieces.concat(), "Hello!");
}

#[test(tokio::test)]
async fn test_unresponsive_stream_times_out_and_falls_back() {
    let openai = MockServer::start().await;
    let gemini = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({"stream": true})))
        .respond_with(
            sse(&[delta("late").as_str(), "[DONE]"]).set_delay(Duration::from_millis(500)),
        )
        .expect(1)
        .mount(&openai)
        .await;
    Mock::given(method("POST"))
        .respond_with(gemini_reply("ok"))
        .expect(1)
        .mount(&gemini)
        .await;

    let primary = OpenAIBuilder::new("sk-test")
        .base_url(format!("{}/v1", openai.uri()))
        .timeout(Duration::from_millis(50))
        .build()
        .unwrap();
    let secondary = GeminiBuilder::new("g-test")
        .base_url(gemini.uri())
        .stream_delay(Duration::ZERO)
        .build()
        .unwrap();
    let dispatcher = Dispatcher::builder()
        .primary(Arc::new(primary))
        .secondary(Arc::new(secondary))
        .build()
        .unwrap();

    let pieces = tokio::time::timeout(
        Duration::from_secs(5),
        texts(dispatcher.stream(&conversation())),
    )
    .await
    .expect("stream stalled on the unresponsive provider");
    assert_eq!(pieces, vec!["o", "k"]);
}

async fn mid_stream_failure(mode: &str) -> Vec<String> {
    let openai = MockServer::start().await;
    let gemini = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(sse(&[
            delta("Par").as_str(),
            delta("tial").as_str(),
            "{truncated",
        ]))
        .expect(1)
        .mount(&openai)
        .await;
    Mock::given(method("POST"))
        .respond_with(gemini_reply("Full"))
        .expect(1)
        .mount(&gemini)
        .await;

    let settings = settings(
        &openai,
        &gemini,
        &[
            ("PARLEY_PROVIDER_PREFERENCE", "openai"),
            ("PARLEY_STREAM_MODE", mode),
        ],
    );
    let dispatcher = Dispatcher::from_settings(&settings).unwrap();
    texts(dispatcher.stream(&conversation())).await
}

#[test(tokio::test)]
async fn test_mid_stream_failure_splice() {
    let pieces = mid_stream_failure("splice").await;
    assert_eq!(pieces, vec!["Par", "tial", "F", "u", "l", "l"]);
}

#[test(tokio::test)]
async fn test_mid_stream_failure_buffered() {
    let pieces = mid_stream_failure("buffered").await;
    assert_eq!(pieces, vec!["F", "u", "l", "l"]);
}

#[test(tokio::test)]
async fn test_dropping_stream_skips_fallback() {
    let openai = MockServer::start().await;
    let gemini = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(gemini_reply(&"x".repeat(50)))
        .expect(1)
        .mount(&gemini)
        .await;
    Mock::given(method("POST"))
        .respond_with(sse(&["[DONE]"]))
        .expect(0)
        .mount(&openai)
        .await;

    let dispatcher = Dispatcher::from_settings(&settings(&openai, &gemini, &[])).unwrap();
    let taken: Vec<_> = dispatcher
        .stream(&conversation())
        .take(2)
        .collect()
        .await;

    assert_eq!(taken.len(), 2);
    assert!(taken.iter().all(|item| item.is_ok()));
}

#[test(tokio::test)]
async fn test_unpolled_stream_makes_no_request() {
    let openai = MockServer::start().await;
    let gemini = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(gemini_reply("never"))
        .expect(0)
        .mount(&gemini)
        .await;

    let dispatcher = Dispatcher::from_settings(&settings(&openai, &gemini, &[])).unwrap();
    drop(dispatcher.stream(&conversation()));
}
