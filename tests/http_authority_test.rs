//! HttpAuthority against a local axum server.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{Value, json};
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use strictly_letters::{Authority, AuthorityError, HttpAuthority, RetryPolicy};
use strictly_wordgrid::{
    Board, Coord, Glyph, LettersRequest, PlacedLetter, ValidationRequest, Verdict,
};
use tokio::task::JoinHandle;

#[derive(Clone, Default)]
struct Hits {
    count: Arc<AtomicU32>,
}

impl Hits {
    fn bump(&self) -> u32 {
        self.count.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn get(&self) -> u32 {
        self.count.load(Ordering::SeqCst)
    }
}

async fn serve(router: Router) -> (String, JoinHandle<()>) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        axum::serve(listener, router.into_make_service())
            .await
            .unwrap();
    });
    tokio::time::sleep(Duration::from_millis(50)).await;
    (format!("http://{addr}"), handle)
}

fn fast_retry() -> RetryPolicy {
    RetryPolicy::default()
        .with_max_attempts(3)
        .with_initial_backoff(Duration::from_millis(10))
        .with_max_backoff(Duration::from_millis(20))
}

fn authority(url: &str) -> HttpAuthority {
    HttpAuthority::new(url, Duration::from_secs(2), fast_retry()).unwrap()
}

fn one_letter_move() -> ValidationRequest {
    let board = Board::new(20).place(Coord::new(7, 7), Glyph::new('A')).unwrap();
    ValidationRequest::new(vec![PlacedLetter::new(Glyph::new('A'), 7, 7)], board)
}

#[tokio::test]
async fn test_validation_retries_server_errors() {
    async fn flaky(State(hits): State<Hits>, Json(body): Json<Value>) -> Response {
        assert!(body.get("placedLetters").is_some());
        if hits.bump() < 3 {
            return StatusCode::SERVICE_UNAVAILABLE.into_response();
        }
        Json(json!({ "message": 7 })).into_response()
    }

    let hits = Hits::default();
    let router = Router::new()
        .route("/validate_board", post(flaky))
        .with_state(hits.clone());
    let (url, handle) = serve(router).await;

    let verdict = authority(&url).validate_move(&one_letter_move()).await.unwrap();
    assert_eq!(verdict, Verdict::Accepted(7));
    assert_eq!(hits.get(), 3);
    handle.abort();
}

#[tokio::test]
async fn test_validation_decodes_rejection() {
    async fn reject() -> Json<Value> {
        Json(json!({ "message": false }))
    }

    let router = Router::new().route("/validate_board", post(reject));
    let (url, handle) = serve(router).await;

    let verdict = authority(&url).validate_move(&one_letter_move()).await.unwrap();
    assert_eq!(verdict, Verdict::Rejected);
    handle.abort();
}

#[tokio::test]
async fn test_client_errors_are_not_retried() {
    async fn refuse(State(hits): State<Hits>) -> StatusCode {
        hits.bump();
        StatusCode::BAD_REQUEST
    }

    let hits = Hits::default();
    let router = Router::new()
        .route("/validate_board", post(refuse))
        .with_state(hits.clone());
    let (url, handle) = serve(router).await;

    let err = authority(&url)
        .validate_move(&one_letter_move())
        .await
        .unwrap_err();
    assert!(matches!(err, AuthorityError::Status { status: 400, .. }));
    assert!(!err.is_retryable());
    assert_eq!(hits.get(), 1);
    handle.abort();
}

#[tokio::test]
async fn test_tile_draw_not_repeated_after_server_error() {
    async fn broken(State(hits): State<Hits>) -> StatusCode {
        hits.bump();
        StatusCode::INTERNAL_SERVER_ERROR
    }

    let hits = Hits::default();
    let router = Router::new()
        .route("/get_letters", post(broken))
        .with_state(hits.clone());
    let (url, handle) = serve(router).await;

    let err = authority(&url)
        .request_tiles(LettersRequest::new(3))
        .await
        .unwrap_err();
    assert!(matches!(err, AuthorityError::Network { attempts: 1, .. }));
    assert!(err.is_retryable());
    assert_eq!(hits.get(), 1);
    handle.abort();
}

#[tokio::test]
async fn test_tile_draw_returns_letters() {
    async fn deal(Json(body): Json<Value>) -> Json<Value> {
        let needed = body["needed"].as_u64().unwrap_or(0) as usize;
        Json(json!({ "letters": vec!["X"; needed] }))
    }

    let router = Router::new().route("/get_letters", post(deal));
    let (url, handle) = serve(router).await;

    let letters = authority(&url)
        .request_tiles(LettersRequest::new(2))
        .await
        .unwrap();
    assert_eq!(letters, vec![Glyph::new('X'), Glyph::new('X')]);
    handle.abort();
}

#[tokio::test]
async fn test_malformed_body_is_decode_error() {
    async fn garbage() -> &'static str {
        "not json"
    }

    let router = Router::new().route("/validate_board", post(garbage));
    let (url, handle) = serve(router).await;

    let err = authority(&url)
        .validate_move(&one_letter_move())
        .await
        .unwrap_err();
    assert!(matches!(err, AuthorityError::Decode(_)));
    handle.abort();
}

#[tokio::test]
async fn test_unreachable_authority_exhausts_attempts() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = authority(&format!("http://{addr}"))
        .request_tiles(LettersRequest::new(1))
        .await
        .unwrap_err();
    assert!(matches!(err, AuthorityError::Network { attempts: 3, .. }));
}
