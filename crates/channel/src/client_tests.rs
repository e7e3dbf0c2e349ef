use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use super::*;

/// Serve one canned HTTP response per connection and return the raw requests.
async fn serve(responses: Vec<String>) -> (String, JoinHandle<Vec<String>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        let mut requests = Vec::new();
        for response in responses {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 4096];
            loop {
                let n = stream.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
                if request.windows(4).any(|w| w == b"\r\n\r\n") {
                    break;
                }
            }
            requests.push(String::from_utf8_lossy(&request).to_string());
            stream.write_all(response.as_bytes()).await.unwrap();
            stream.shutdown().await.unwrap();
        }
        requests
    });
    (format!("http://{addr}/api"), handle)
}

fn response(status: &str, headers: &str, body: &str) -> String {
    format!(
        "HTTP/1.1 {status}\r\n{headers}Content-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    )
}

fn client(base_url: &str, max_retries: u32) -> RestChannelClient {
    let config = ChannelConfig {
        api_base_url: base_url.to_string(),
        bot_token: "secret".to_string(),
        channel_id: ChannelId(1),
        request_timeout_secs: 5,
        max_retries,
    };
    RestChannelClient::new(&config, CancellationToken::new()).unwrap()
}

#[test]
fn test_urls() {
    let client = client("https://discord.com/api/v10/", 0);
    assert_eq!(
        client.messages_url(ChannelId(7)),
        "https://discord.com/api/v10/channels/7/messages"
    );
    assert_eq!(
        client.message_url(ChannelId(7), MessageId(42)),
        "https://discord.com/api/v10/channels/7/messages/42"
    );
    assert_eq!(client.current_user_url(), "https://discord.com/api/v10/users/@me");
}

#[test]
fn test_truncate_body() {
    assert_eq!(truncate_body("short".to_string()), "short");
    let long = "é".repeat(400);
    let truncated = truncate_body(long);
    assert!(truncated.ends_with("..."));
    assert!(truncated.len() <= MAX_ERROR_BODY + 3);
}

#[tokio::test]
async fn test_get_message_sends_bot_token() {
    let body = r#"{"id": "5", "attachments": [{"filename": "a.part1", "url": "http://cdn/a", "size": 3}]}"#;
    let (base, server) = serve(vec![response("200 OK", "", body)]).await;

    let message = client(&base, 0)
        .get_message(ChannelId(1), MessageId(5))
        .await
        .unwrap();

    assert_eq!(message.id, MessageId(5));
    assert_eq!(message.attachments[0].filename, "a.part1");
    let requests = server.await.unwrap();
    assert!(requests[0].starts_with("GET /api/channels/1/messages/5 "));
    assert!(requests[0].to_lowercase().contains("authorization: bot secret"));
}

#[tokio::test]
async fn test_rate_limited_request_is_retried() {
    let (base, server) = serve(vec![
        response(
            "429 Too Many Requests",
            "",
            r#"{"retry_after": 0.01, "global": false}"#,
        ),
        response("200 OK", "", r#"{"id": "1", "username": "bot"}"#),
    ])
    .await;

    let identity = client(&base, 2).current_identity().await.unwrap();

    assert_eq!(identity.username, "bot");
    assert_eq!(server.await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_rate_limit_gives_up_after_max_retries() {
    let limited = response("429 Too Many Requests", "Retry-After: 0\r\n", "");
    let (base, server) = serve(vec![limited.clone(), limited]).await;

    let err = client(&base, 1)
        .delete_message(ChannelId(1), MessageId(2))
        .await
        .unwrap_err();

    assert!(matches!(err, ChannelError::RateLimited { .. }));
    assert_eq!(server.await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_missing_message_is_not_found() {
    let (base, _server) = serve(vec![response(
        "404 Not Found",
        "",
        r#"{"message": "Unknown Message", "code": 10008}"#,
    )])
    .await;

    let err = client(&base, 0)
        .delete_message(ChannelId(1), MessageId(2))
        .await
        .unwrap_err();

    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_unexpected_status_keeps_body() {
    let (base, _server) = serve(vec![response(
        "403 Forbidden",
        "",
        r#"{"message": "Missing Permissions"}"#,
    )])
    .await;

    let err = client(&base, 0)
        .get_message(ChannelId(1), MessageId(2))
        .await
        .unwrap_err();

    match err {
        ChannelError::Status { status, body } => {
            assert_eq!(status, 403);
            assert!(body.contains("Missing Permissions"));
        }
        other => panic!("unexpected error {other}"),
    }
}

#[tokio::test]
async fn test_download_does_not_send_bot_token() {
    let (base, server) = serve(vec![response("200 OK", "", "chunk-bytes")]).await;

    let bytes = client(&base, 0)
        .download_attachment(&format!("{base}/attachments/1/2/a.part1"))
        .await
        .unwrap();

    assert_eq!(bytes, Bytes::from_static(b"chunk-bytes"));
    let requests = server.await.unwrap();
    assert!(!requests[0].to_lowercase().contains("authorization"));
}

#[tokio::test]
async fn test_cancelled_token_stops_requests() {
    let config = ChannelConfig {
        api_base_url: "http://127.0.0.1:9".to_string(),
        bot_token: "secret".to_string(),
        channel_id: ChannelId(1),
        request_timeout_secs: 5,
        max_retries: 0,
    };
    let token = CancellationToken::new();
    let client = RestChannelClient::new(&config, token.clone()).unwrap();
    token.cancel();

    let err = client
        .get_message(ChannelId(1), MessageId(1))
        .await
        .unwrap_err();

    assert!(matches!(err, ChannelError::Cancelled));
}
