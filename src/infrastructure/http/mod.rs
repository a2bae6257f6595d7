//! HTTP surface - push endpoints for external senders

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Deserializer, Serialize};
use std::{net::SocketAddr, sync::Arc};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::application::errors::DispatchError;
use crate::application::messaging::{BroadcastReport, Dispatcher};

/// Body of `POST /send-message`. Missing or null fields decode as empty strings.
#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    #[serde(default, deserialize_with = "null_as_default")]
    pub user: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub message: String,
}

/// Body of `POST /send-message-all`. A `user` field, if sent, is ignored.
#[derive(Debug, Deserialize)]
pub struct BroadcastRequest {
    #[serde(default, deserialize_with = "null_as_default")]
    pub message: String,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    service: &'static str,
    version: &'static str,
    users: usize,
}

/// Start the HTTP server and serve until it fails
pub async fn serve(addr: SocketAddr, dispatcher: Arc<Dispatcher>) -> std::io::Result<()> {
    let app = create_router(dispatcher);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("HTTP server listening on {}", addr);
    axum::serve(listener, app).await
}

/// Create the router with all routes and middleware
pub fn create_router(dispatcher: Arc<Dispatcher>) -> Router {
    Router::new()
        .route("/send-message", post(send_message_handler))
        .route("/send-message-all", post(send_message_all_handler))
        .route("/health", get(health_handler))
        .with_state(dispatcher)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
}

/// A body that is not JSON, or has a field of the wrong type, is a 400
fn parse_body<T: for<'de> Deserialize<'de>>(body: &[u8]) -> Result<T, Response> {
    serde_json::from_slice(body).map_err(|e| {
        tracing::debug!("Rejecting request body: {}", e);
        (StatusCode::BAD_REQUEST, "Invalid request").into_response()
    })
}

/// POST /send-message
async fn send_message_handler(State(dispatcher): State<Arc<Dispatcher>>, body: Bytes) -> Response {
    let req: SendMessageRequest = match parse_body(&body) {
        Ok(req) => req,
        Err(rejection) => return rejection,
    };

    match dispatcher.send_one(&req.user, &req.message).await {
        Ok(chat_id) => (StatusCode::OK, format!("Message sent to chat_id: {}", chat_id)).into_response(),
        Err(DispatchError::UserNotFound(_)) => (StatusCode::NOT_FOUND, "User not found").into_response(),
        Err(DispatchError::Send(e)) => {
            tracing::error!("Failed to send message to {}: {}", req.user, e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to send message").into_response()
        }
    }
}

/// POST /send-message-all
async fn send_message_all_handler(State(dispatcher): State<Arc<Dispatcher>>, body: Bytes) -> Response {
    let req: BroadcastRequest = match parse_body(&body) {
        Ok(req) => req,
        Err(rejection) => return rejection,
    };

    let report: BroadcastReport = dispatcher.send_all(&req.message).await;
    if report.failed > 0 {
        tracing::warn!("Broadcast reached {} of {} users", report.attempted - report.failed, report.attempted);
    }
    (StatusCode::OK, "Message sent to all users").into_response()
}

/// GET /health
async fn health_handler(State(dispatcher): State<Arc<Dispatcher>>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy",
        service: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        users: dispatcher.registry().len().await,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::messaging::dispatcher::tests::{dispatcher_with, FakeBot};
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    async fn app_with(bot: Arc<FakeBot>, users: &[(&str, i64)]) -> Router {
        let dispatcher = dispatcher_with(bot);
        for (name, chat_id) in users {
            dispatcher.registry().upsert_if_absent(name, *chat_id, None).await;
        }
        create_router(Arc::new(dispatcher))
    }

    async fn post_json(app: Router, uri: &str, body: &str) -> (StatusCode, String) {
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_send_message() {
        let bot = Arc::new(FakeBot::default());
        let app = app_with(bot.clone(), &[("alice", 42)]).await;

        let (status, body) = post_json(app, "/send-message", r#"{"user":"alice","message":"hi"}"#).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "Message sent to chat_id: 42");
        assert_eq!(bot.sent(), vec![(42, "hi".to_string())]);
    }

    #[tokio::test]
    async fn test_send_message_unknown_user() {
        let bot = Arc::new(FakeBot::default());
        let app = app_with(bot.clone(), &[("alice", 42)]).await;

        let (status, _) = post_json(app, "/send-message", r#"{"user":"bob","message":"hi"}"#).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(bot.sent().is_empty());
    }

    #[tokio::test]
    async fn test_send_message_failure() {
        let bot = Arc::new(FakeBot::failing(&[42]));
        let app = app_with(bot, &[("alice", 42)]).await;

        let (status, body) = post_json(app, "/send-message", r#"{"user":"alice","message":"hi"}"#).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, "Failed to send message");
    }

    #[tokio::test]
    async fn test_malformed_bodies() {
        let bot = Arc::new(FakeBot::default());

        for body in ["not json", r#"{"user":1,"message":"hi"}"#, r#"{"user":"alice","message":7}"#, ""] {
            let app = app_with(bot.clone(), &[("alice", 42)]).await;
            let (status, _) = post_json(app, "/send-message", body).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "body: {:?}", body);
        }

        let app = app_with(bot.clone(), &[("alice", 42)]).await;
        let (status, _) = post_json(app, "/send-message-all", "{").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        assert!(bot.sent().is_empty());
    }

    #[tokio::test]
    async fn test_missing_fields_default_to_empty() {
        let bot = Arc::new(FakeBot::default());

        // No user: looked up as "" and not found
        let app = app_with(bot.clone(), &[("alice", 42)]).await;
        let (status, body) = post_json(app, "/send-message", r#"{"message":"hi"}"#).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, "User not found");
        assert!(bot.sent().is_empty());

        // No message: sent as empty text
        let app = app_with(bot.clone(), &[("alice", 42)]).await;
        let (status, _) = post_json(app, "/send-message", r#"{"user":"alice"}"#).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(bot.sent(), vec![(42, String::new())]);

        for body in ["{}", r#"{"message":null}"#] {
            let bot = Arc::new(FakeBot::default());
            let app = app_with(bot.clone(), &[("alice", 42)]).await;
            let (status, response) = post_json(app, "/send-message-all", body).await;
            assert_eq!(status, StatusCode::OK, "body: {:?}", body);
            assert_eq!(response, "Message sent to all users");
            assert_eq!(bot.sent(), vec![(42, String::new())]);
        }
    }

    #[tokio::test]
    async fn test_send_message_all_ignores_user_and_failures() {
        let bot = Arc::new(FakeBot::failing(&[2]));
        let app = app_with(bot.clone(), &[("alice", 1), ("bob", 2), ("carol", 3)]).await;

        let (status, body) =
            post_json(app, "/send-message-all", r#"{"user":"alice","message":"news"}"#).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "Message sent to all users");
        assert_eq!(bot.sent().len(), 3);
    }

    #[tokio::test]
    async fn test_health() {
        let app = app_with(Arc::new(FakeBot::default()), &[("alice", 1)]).await;

        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["status"], "healthy");
        assert_eq!(json["users"], 1);
    }
}
