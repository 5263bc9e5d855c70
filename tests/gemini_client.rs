//! Drives `GeminiClient` against a local stand-in for the Gemini endpoint.

use actix_web::{dev::ServerHandle, web, App, HttpRequest, HttpResponse, HttpServer};
use gemini_image_proxy::{
    proxy::{build_payload, map_upstream_reply},
    GeminiClient, GenerationBackend, GenerationRequest, KeyTransport, ProxyConfig, ProxyError,
};
use serde_json::{json, Value};
use std::net::{SocketAddr, TcpListener};

const API_KEY: &str = "upstream-secret";

async fn fake_generate(
    req: HttpRequest,
    path: web::Path<String>,
    body: web::Json<Value>,
) -> HttpResponse {
    let header_key = req
        .headers()
        .get("x-goog-api-key")
        .and_then(|v| v.to_str().ok());
    let query_key = req
        .query_string()
        .split('&')
        .find_map(|pair| pair.strip_prefix("key="));

    if header_key != Some(API_KEY) && query_key != Some(API_KEY) {
        return HttpResponse::Forbidden()
            .json(json!({ "error": { "code": 403, "message": "API key not valid." } }));
    }

    match path.as_str() {
        "gemini-test:generateContent" => {
            let prompt = body["contents"][0]["parts"]
                .as_array()
                .and_then(|parts| parts.last())
                .and_then(|part| part["text"].as_str())
                .unwrap_or_default()
                .to_string();
            HttpResponse::Ok().json(json!({
                "candidates": [{
                    "content": { "parts": [
                        { "text": format!("echo: {}", prompt) },
                        { "inlineData": { "mimeType": "image/png", "data": "AAAA" } }
                    ] }
                }]
            }))
        }
        "gemini-html:generateContent" => HttpResponse::BadGateway()
            .content_type("text/html")
            .body("<html>bad gateway</html>"),
        _ => HttpResponse::NotFound().json(json!({ "error": { "message": "model not found" } })),
    }
}

async fn start_fake_upstream() -> (SocketAddr, ServerHandle) {
    let server = HttpServer::new(|| {
        App::new().route("/v1beta/models/{model_action}", web::post().to(fake_generate))
    })
    .workers(1)
    .bind(("127.0.0.1", 0))
    .unwrap();
    let addr = server.addrs()[0];
    let server = server.run();
    let handle = server.handle();
    actix_web::rt::spawn(server);
    (addr, handle)
}

fn config_for(addr: SocketAddr, model: &str) -> ProxyConfig {
    ProxyConfig::new()
        .with_base_url(format!("http://{}/v1beta", addr))
        .with_model(model)
}

#[actix_web::test]
async fn test_header_transport_round_trip() {
    let (addr, handle) = start_fake_upstream().await;
    let client = GeminiClient::new(&config_for(addr, "gemini-test")).unwrap();

    let payload = build_payload(&GenerationRequest::new("a cat"));
    let reply = client.generate_content(API_KEY, &payload).await.unwrap();

    assert_eq!(reply.status, 200);
    let body = reply.body.clone().unwrap();
    assert_eq!(body["candidates"][0]["content"]["parts"][0]["text"], "echo: a cat");
    assert_eq!(
        map_upstream_reply(reply).unwrap().image_url,
        "data:image/png;base64,AAAA"
    );

    handle.stop(true).await;
}

#[actix_web::test]
async fn test_query_transport_round_trip() {
    let (addr, handle) = start_fake_upstream().await;
    let config = config_for(addr, "gemini-test").with_key_transport(KeyTransport::Query);
    let client = GeminiClient::new(&config).unwrap();

    let payload = build_payload(&GenerationRequest::new("a dog"));
    let reply = client.generate_content(API_KEY, &payload).await.unwrap();
    assert_eq!(reply.status, 200);

    handle.stop(true).await;
}

#[actix_web::test]
async fn test_rejected_key_surfaces_upstream_message() {
    let (addr, handle) = start_fake_upstream().await;
    let client = GeminiClient::new(&config_for(addr, "gemini-test")).unwrap();

    let payload = build_payload(&GenerationRequest::new("a cat"));
    let reply = client.generate_content("wrong", &payload).await.unwrap();
    assert_eq!(reply.status, 403);

    let err = map_upstream_reply(reply).unwrap_err();
    assert_eq!(err.http_status(), 403);
    assert_eq!(err.client_message(), "API key not valid.");

    handle.stop(true).await;
}

#[actix_web::test]
async fn test_non_json_body_is_absent() {
    let (addr, handle) = start_fake_upstream().await;
    let client = GeminiClient::new(&config_for(addr, "gemini-html")).unwrap();

    let payload = build_payload(&GenerationRequest::new("a cat"));
    let reply = client.generate_content(API_KEY, &payload).await.unwrap();
    assert_eq!(reply.status, 502);
    assert!(reply.body.is_none());

    let err = map_upstream_reply(reply).unwrap_err();
    assert_eq!(
        err.client_message(),
        "Gemini API request failed with status 502."
    );

    handle.stop(true).await;
}

#[actix_web::test]
async fn test_unreachable_upstream_is_transport_error_without_key() {
    // Reserve a port, then free it so nothing is listening there.
    let addr = TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap();
    let config = config_for(addr, "gemini-test").with_key_transport(KeyTransport::Query);
    let client = GeminiClient::new(&config).unwrap();

    let payload = build_payload(&GenerationRequest::new("a cat"));
    let err = client.generate_content(API_KEY, &payload).await.unwrap_err();

    assert!(matches!(err, ProxyError::Transport(_)));
    assert_eq!(err.http_status(), 500);
    assert!(!err.client_message().contains(API_KEY));
}
