//! Tests for `GatewayClient` against a mock gateway bound to an ephemeral
//! port.

use std::{
  collections::VecDeque,
  net::SocketAddr,
  sync::{Arc, Mutex},
  time::Duration,
};

use axum::{
  Json, Router,
  extract::{Path, Query, State},
  http::StatusCode,
  routing::{get, post},
};
use serde_json::{Value, json};

use crate::{Error, GatewayClient, GatewayConfig};

const ACCOUNT: &str = "+15550001111";

async fn serve(router: Router) -> SocketAddr {
  let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
    .await
    .expect("bind ephemeral port");
  let addr = listener.local_addr().unwrap();
  tokio::spawn(async move {
    axum::serve(listener, router).await.unwrap();
  });
  addr
}

fn client(addr: SocketAddr) -> GatewayClient {
  GatewayClient::new(GatewayConfig {
    base_url:    format!("http://{addr}"),
    account:     ACCOUNT.to_string(),
    device_name: "courier".to_string(),
  })
  .unwrap()
}

// ─── Health ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn about_parses_mode_and_version() {
  let router = Router::new().route(
    "/v1/about",
    get(|| async { Json(json!({"mode": "normal", "version": "0.80"})) }),
  );
  let gateway = client(serve(router).await);

  let about = gateway.about().await.unwrap();
  assert_eq!(about.mode, "normal");
  assert_eq!(about.version, "0.80");
  assert!(gateway.check_health().await);
}

#[tokio::test]
async fn check_health_false_on_error_status() {
  let router = Router::new().route(
    "/v1/about",
    get(|| async {
      (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({"error": "starting up"})),
      )
    }),
  );
  let gateway = client(serve(router).await);

  assert!(!gateway.check_health().await);
  let err = gateway.about().await.unwrap_err();
  assert!(matches!(err, Error::Gateway { status: 500, .. }));
}

// ─── Linking ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn link_device_passes_device_name_and_returns_artifact() {
  let router = Router::new().route(
    "/v1/qrcodelink",
    get(
      |Query(params): Query<std::collections::HashMap<String, String>>| async move {
        if params.get("device_name").map(String::as_str) == Some("courier") {
          (StatusCode::OK, b"PNGDATA".to_vec())
        } else {
          (StatusCode::BAD_REQUEST, Vec::new())
        }
      },
    ),
  );
  let gateway = client(serve(router).await);

  let artifact = gateway.link_device().await.unwrap();
  assert_eq!(artifact, b"PNGDATA");
}

#[tokio::test]
async fn link_rejection_is_a_linking_error() {
  let router = Router::new().route(
    "/v1/qrcodelink",
    get(|| async {
      (
        StatusCode::BAD_REQUEST,
        Json(json!({"error": "gateway not in linkable mode"})),
      )
    }),
  );
  let gateway = client(serve(router).await);

  let err = gateway.link_device().await.unwrap_err();
  match err {
    Error::Linking(message) => {
      assert!(message.contains("gateway not in linkable mode"))
    }
    other => panic!("expected Linking error, got {other:?}"),
  }
}

// ─── Send ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn send_posts_account_recipient_and_message() {
  let router = Router::new().route(
    "/v2/send",
    post(|Json(body): Json<Value>| async move {
      let ok = body["number"] == ACCOUNT
        && body["recipients"] == json!(["+15552220000"])
        && body["message"] == "Pong";
      if ok {
        (StatusCode::CREATED, Json(json!({"timestamp": 1720000000123u64})))
      } else {
        (StatusCode::BAD_REQUEST, Json(json!({"error": "bad body"})))
      }
    }),
  );
  let gateway = client(serve(router).await);

  gateway.send("+15552220000", "Pong").await.unwrap();
}

#[tokio::test]
async fn failed_send_is_a_delivery_error() {
  let router = Router::new().route(
    "/v2/send",
    post(|| async {
      (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({"error": "unregistered recipient"})),
      )
    }),
  );
  let gateway = client(serve(router).await);

  let err = gateway.send("+15559999999", "hi").await.unwrap_err();
  match err {
    Error::Delivery { recipient, status, message } => {
      assert_eq!(recipient, "+15559999999");
      assert_eq!(status, 500);
      assert_eq!(message, "unregistered recipient");
    }
    other => panic!("expected Delivery error, got {other:?}"),
  }
}

// ─── Receive ─────────────────────────────────────────────────────────────────

type Batches = Arc<Mutex<VecDeque<Value>>>;

fn receive_router(batches: Batches) -> Router {
  Router::new()
    .route(
      "/v1/receive/{account}",
      get(
        |Path(account): Path<String>, State(batches): State<Batches>| async move {
          if account != ACCOUNT {
            return (StatusCode::NOT_FOUND, Json(json!([])));
          }
          let next = batches.lock().unwrap().pop_front().unwrap_or(json!([]));
          (StatusCode::OK, Json(next))
        },
      ),
    )
    .with_state(batches)
}

#[tokio::test]
async fn subscription_yields_mapped_events_and_skips_receipts() {
  let batches: Batches = Arc::new(Mutex::new(VecDeque::from([json!([
    // Direct message.
    {"envelope": {
      "source": "+15552220000",
      "timestamp": 1_720_000_000_123i64,
      "dataMessage": {"message": "Ping"}
    }},
    // Read receipt: no dataMessage, must be skipped.
    {"envelope": {"source": "+15552220000", "timestamp": 1_720_000_000_200i64}},
    // Group message.
    {"envelope": {
      "source": "+15553330000",
      "timestamp": 1_720_000_000_300i64,
      "dataMessage": {"message": "hi all", "groupInfo": {"groupId": "group.abc"}}
    }}
  ])])));

  let gateway = client(serve(receive_router(batches)).await);
  let mut sub = gateway.subscribe(Duration::from_millis(10));

  let first = sub.next_event().await.unwrap();
  assert_eq!(first.source, "+15552220000");
  assert_eq!(first.group_id, None);
  assert_eq!(first.content, "Ping");
  assert_eq!(first.timestamp.timestamp_millis(), 1_720_000_000_123);

  let second = sub.next_event().await.unwrap();
  assert_eq!(second.source, "+15553330000");
  assert_eq!(second.group_id, Some("group.abc".to_string()));
  assert_eq!(second.content, "hi all");
}

#[tokio::test]
async fn subscription_error_leaves_it_usable() {
  // First poll errors, later polls deliver.
  let router = {
    let hits = Arc::new(Mutex::new(0u32));
    Router::new()
      .route(
        "/v1/receive/{account}",
        get(
          |Path(_): Path<String>, State(hits): State<Arc<Mutex<u32>>>| async move {
            let mut hits = hits.lock().unwrap();
            *hits += 1;
            if *hits == 1 {
              (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({"error": "busy"})))
            } else {
              (
                StatusCode::OK,
                Json(json!([{"envelope": {
                  "source": "+15552220000",
                  "timestamp": 1i64,
                  "dataMessage": {"message": "again"}
                }}])),
              )
            }
          },
        ),
      )
      .with_state(hits)
  };
  let gateway = client(serve(router).await);
  let mut sub = gateway.subscribe(Duration::from_millis(10));

  assert!(sub.next_event().await.is_err());
  let event = sub.next_event().await.unwrap();
  assert_eq!(event.content, "again");
}
