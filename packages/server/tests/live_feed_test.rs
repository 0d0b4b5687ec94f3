//! End-to-end tests: the real router and scheduler on an ephemeral port,
//! driven over WebSocket and HTTP.

use std::{net::SocketAddr, sync::Arc, time::Duration};

use chrono::Utc;
use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use sitepulse_server::{
    config::ServerConfig,
    domain::{Sample, SiteId, UserId, Zone, ZoneId},
    infrastructure::{
        auth::{JwtTokenVerifier, issue_token},
        message_pusher::WebSocketSubscriptionRegistry,
        repository::{InMemoryCrowdRepository, SeedData},
    },
    ui::{Server, ServerError, state::AppState},
    usecase::{
        BroadcastZoneUpdatesUseCase, ConnectClientUseCase, DisconnectClientUseCase,
        GetZoneSnapshotUseCase, RecordSampleUseCase, UpdateSubscriptionUseCase,
    },
};
use sitepulse_shared::time::{Clock, SystemClock};
use tokio::{net::TcpListener, sync::oneshot, task::JoinHandle};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};

const SECRET: &str = "integration-secret";
const RECV_TIMEOUT: Duration = Duration::from_secs(3);

type Client = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

/// Helper struct to manage an in-process server
struct TestServer {
    addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
    handle: JoinHandle<Result<(), ServerError>>,
}

impl TestServer {
    async fn start() -> Self {
        let config = ServerConfig {
            port: 0,
            broadcast_interval: Duration::from_millis(100),
            ..ServerConfig::default()
        };
        Self::start_with(config, seed()).await
    }

    async fn start_with(config: ServerConfig, seed: SeedData) -> Self {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let repository = Arc::new(
            InMemoryCrowdRepository::from_seed(seed)
                .with_clock(clock.clone())
                .retain_at_least(config.lookback_duration()),
        );
        let registry = Arc::new(WebSocketSubscriptionRegistry::new());
        let token_verifier = Arc::new(JwtTokenVerifier::new(SECRET));

        let get_zone_snapshot_usecase = Arc::new(GetZoneSnapshotUseCase::new(
            repository.clone(),
            clock.clone(),
            config.lookback_duration(),
        ));
        let state = Arc::new(AppState {
            connect_client_usecase: Arc::new(ConnectClientUseCase::new(
                token_verifier.clone(),
                registry.clone(),
            )),
            update_subscription_usecase: Arc::new(UpdateSubscriptionUseCase::new(
                registry.clone(),
            )),
            disconnect_client_usecase: Arc::new(DisconnectClientUseCase::new(registry.clone())),
            get_zone_snapshot_usecase: get_zone_snapshot_usecase.clone(),
            broadcast_zone_updates_usecase: Arc::new(BroadcastZoneUpdatesUseCase::new(
                get_zone_snapshot_usecase,
                registry.clone(),
                clock.clone(),
                config.alert_policy(),
            )),
            record_sample_usecase: Arc::new(RecordSampleUseCase::new(repository, clock)),
            token_verifier,
            registry,
            client_buffer: config.client_buffer,
        });

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let server = Server::new(state, config);
        let handle = tokio::spawn(server.serve(listener, async {
            let _ = shutdown_rx.await;
        }));

        TestServer {
            addr,
            shutdown: Some(shutdown_tx),
            handle,
        }
    }

    fn ws_url(&self, path: &str, token: Option<&str>) -> String {
        match token {
            Some(token) => format!("ws://{}{}?token={}", self.addr, path, token),
            None => format!("ws://{}{}", self.addr, path),
        }
    }

    fn http_url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    async fn connect(&self, user: &str) -> Client {
        let token = token_for(user);
        let (mut client, _) = connect_async(self.ws_url("/api/live/stream", Some(&token)))
            .await
            .unwrap();
        let connected = next_json(&mut client).await;
        assert_eq!(connected, json!({"type": "connected", "userId": user}));
        client
    }

    async fn connections(&self) -> u64 {
        let body: Value = reqwest::get(self.http_url("/api/health"))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        body["connections"].as_u64().unwrap()
    }

    async fn stop(mut self) -> Result<(), ServerError> {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        self.handle.await.unwrap()
    }
}

fn token_for(user: &str) -> String {
    issue_token(
        SECRET,
        &UserId::new(user.to_string()).unwrap(),
        chrono::Duration::minutes(5),
    )
    .unwrap()
}

fn zone(id: &str, site: i64, name: &str, capacity: u32) -> Zone {
    Zone::new(
        ZoneId::new(id.to_string()).unwrap(),
        SiteId::new(site).unwrap(),
        name,
        capacity,
    )
}

fn recent_sample(id: &str, site: i64, count: u32) -> Sample {
    Sample {
        zone_id: ZoneId::new(id.to_string()).unwrap(),
        site_id: SiteId::new(site).unwrap(),
        count,
        timestamp: Utc::now() - chrono::Duration::seconds(30),
    }
}

/// Site 7: Z1 at 92/100, Z2 with no capacity. Site 8: Z9 at 10/50.
fn seed() -> SeedData {
    SeedData {
        zones: vec![
            zone("Z1", 7, "Main Hall", 100),
            zone("Z2", 7, "Annex", 0),
            zone("Z9", 8, "Garden", 50),
        ],
        samples: vec![recent_sample("Z1", 7, 92), recent_sample("Z9", 8, 10)],
    }
}

async fn next_message(client: &mut Client) -> Message {
    loop {
        let msg = tokio::time::timeout(RECV_TIMEOUT, client.next())
            .await
            .expect("timed out waiting for a frame")
            .expect("stream ended")
            .expect("websocket error");
        match msg {
            Message::Ping(_) | Message::Pong(_) => continue,
            other => return other,
        }
    }
}

async fn next_json(client: &mut Client) -> Value {
    match next_message(client).await {
        Message::Text(text) => serde_json::from_str(text.as_str()).unwrap(),
        other => panic!("expected a text frame, got {:?}", other),
    }
}

/// Skips frames until one of the given type arrives
async fn next_of_type(client: &mut Client, message_type: &str) -> Value {
    loop {
        let frame = next_json(client).await;
        if frame["type"] == message_type {
            return frame;
        }
    }
}

async fn send_text(client: &mut Client, text: &str) {
    client
        .send(Message::Text(text.to_string().into()))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_connection_without_token_gets_error_and_4401() {
    // テスト項目: トークンなしの接続はエラーフレームとクローズコード 4401 を受け取り、登録されない
    // given (前提条件):
    let server = TestServer::start().await;

    // when (操作):
    let (mut client, _) = connect_async(server.ws_url("/api/socket", None))
        .await
        .unwrap();
    let error = next_json(&mut client).await;
    let close = next_message(&mut client).await;

    // then (期待する結果):
    assert_eq!(error, json!({"type": "error", "message": "Unauthorized"}));
    match close {
        Message::Close(Some(frame)) => assert_eq!(u16::from(frame.code), 4401),
        other => panic!("expected close frame, got {:?}", other),
    }
    assert_eq!(server.connections().await, 0);
}

#[tokio::test]
async fn test_connection_with_foreign_token_is_rejected() {
    // テスト項目: 別の秘密鍵で署名されたトークンは拒否される
    // given (前提条件):
    let server = TestServer::start().await;
    let token = issue_token(
        "someone-else",
        &UserId::new("42".to_string()).unwrap(),
        chrono::Duration::minutes(5),
    )
    .unwrap();

    // when (操作):
    let (mut client, _) = connect_async(server.ws_url("/api/socket", Some(&token)))
        .await
        .unwrap();
    let error = next_json(&mut client).await;

    // then (期待する結果):
    assert_eq!(error["message"], "Unauthorized");
    assert!(matches!(next_message(&mut client).await, Message::Close(_)));
}

#[tokio::test]
async fn test_subscribe_receives_zone_update_and_alert() {
    // テスト項目: サイト 7 を購読すると zone_update と Z1 の critical_alert が届く
    // given (前提条件):
    let server = TestServer::start().await;
    let mut client = server.connect("42").await;

    // when (操作):
    send_text(&mut client, r#"{"action":"subscribe","siteId":7}"#).await;

    // then (期待する結果):
    let subscribed = next_json(&mut client).await;
    assert_eq!(subscribed, json!({"type": "subscribed", "siteId": 7}));

    let update = next_of_type(&mut client, "zone_update").await;
    let data = update["data"].as_array().unwrap();
    assert_eq!(data.len(), 2);
    assert_eq!(data[0]["zone_id"], "Z1");
    assert_eq!(data[0]["current_count"], 92);
    assert_eq!(data[0]["density_percentage"], 92.0);
    assert_eq!(data[1]["zone_id"], "Z2");
    assert_eq!(data[1]["density_percentage"], 0.0);
    assert!(update["timestamp"].as_str().unwrap().ends_with('Z'));

    let alert = next_json(&mut client).await;
    assert_eq!(alert["type"], "critical_alert");
    assert_eq!(alert["zone_id"], "Z1");
    assert_eq!(alert["message"], "Overcrowding detected");
}

#[tokio::test]
async fn test_site_id_may_be_sent_as_string() {
    // テスト項目: siteId を文字列で送っても購読でき、返信は送った形のまま返る
    // given (前提条件):
    let server = TestServer::start().await;
    let mut client = server.connect("42").await;

    // when (操作):
    send_text(&mut client, r#"{"action":"subscribe","siteId":"8"}"#).await;

    // then (期待する結果):
    assert_eq!(
        next_json(&mut client).await,
        json!({"type": "subscribed", "siteId": "8"})
    );
    let update = next_of_type(&mut client, "zone_update").await;
    assert_eq!(update["data"][0]["zone_id"], "Z9");
}

#[tokio::test]
async fn test_invalid_messages_get_one_error_each_and_connection_survives() {
    // テスト項目: 不正なメッセージにはそれぞれ 1 つだけエラーが返り、接続は維持される
    // given (前提条件):
    let server = TestServer::start().await;
    let mut client = server.connect("42").await;

    // when (操作) / then (期待する結果):
    send_text(&mut client, "not json at all").await;
    assert_eq!(
        next_json(&mut client).await,
        json!({"type": "error", "message": "Invalid JSON payload"})
    );

    send_text(&mut client, r#"{"action":"teleport"}"#).await;
    assert_eq!(
        next_json(&mut client).await,
        json!({"type": "error", "message": "Unsupported action"})
    );

    send_text(&mut client, r#"{"action":"subscribe","siteId":"seven"}"#).await;
    assert_eq!(
        next_json(&mut client).await,
        json!({"type": "error", "message": "Invalid siteId"})
    );

    send_text(&mut client, r#"{"action":"unsubscribe"}"#).await;
    assert_eq!(
        next_json(&mut client).await,
        json!({"type": "unsubscribed"})
    );
}

#[tokio::test]
async fn test_subscribers_only_receive_their_own_site() {
    // テスト項目: 各購読者には自分のサイトの情報だけが届く
    // given (前提条件):
    let server = TestServer::start().await;
    let mut site_7 = server.connect("alice").await;
    let mut site_8 = server.connect("bob").await;
    send_text(&mut site_7, r#"{"action":"subscribe","siteId":7}"#).await;
    send_text(&mut site_8, r#"{"action":"subscribe","siteId":8}"#).await;
    next_of_type(&mut site_7, "subscribed").await;
    next_of_type(&mut site_8, "subscribed").await;

    // when (操作):
    let update_7 = next_of_type(&mut site_7, "zone_update").await;
    let update_8 = next_of_type(&mut site_8, "zone_update").await;

    // then (期待する結果):
    let zones_7: Vec<&str> = update_7["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|z| z["zone_id"].as_str().unwrap())
        .collect();
    let zones_8: Vec<&str> = update_8["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|z| z["zone_id"].as_str().unwrap())
        .collect();
    assert_eq!(zones_7, vec!["Z1", "Z2"]);
    assert_eq!(zones_8, vec!["Z9"]);
}

#[tokio::test]
async fn test_health_reports_subscribers_per_site() {
    // テスト項目: ヘルスチェックが接続数とサイトごとの購読者数を返す
    // given (前提条件):
    let server = TestServer::start().await;
    let mut alice = server.connect("alice").await;
    let mut bob = server.connect("bob").await;
    let _idle = server.connect("carol").await;
    send_text(&mut alice, r#"{"action":"subscribe","siteId":7}"#).await;
    send_text(&mut bob, r#"{"action":"subscribe","siteId":7}"#).await;
    next_of_type(&mut alice, "subscribed").await;
    next_of_type(&mut bob, "subscribed").await;

    // when (操作):
    let body: Value = reqwest::get(server.http_url("/api/health"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    // then (期待する結果):
    assert_eq!(body["status"], "ok");
    assert_eq!(body["connections"], 3);
    assert_eq!(body["sites"], json!([{"siteId": 7, "subscribers": 2}]));
}

#[tokio::test]
async fn test_unsubscribed_client_receives_no_updates() {
    // テスト項目: 購読解除後は配信が届かない
    // given (前提条件):
    let server = TestServer::start().await;
    let mut client = server.connect("42").await;
    send_text(&mut client, r#"{"action":"subscribe","siteId":7}"#).await;
    next_of_type(&mut client, "zone_update").await;

    // when (操作):
    send_text(&mut client, r#"{"action":"unsubscribe"}"#).await;
    next_of_type(&mut client, "unsubscribed").await;

    // then (期待する結果): 解除と同時に走っていたティックの分を読み捨てた後は何も届かない
    tokio::time::sleep(Duration::from_millis(300)).await;
    while let Ok(Some(_)) = tokio::time::timeout(Duration::from_millis(10), client.next()).await {}
    let quiet = tokio::time::timeout(Duration::from_millis(400), client.next()).await;
    assert!(quiet.is_err());
}

#[tokio::test]
async fn test_both_gateway_paths_are_served() {
    // テスト項目: /api/socket と /api/live/stream の両方で接続できる
    // given (前提条件):
    let server = TestServer::start().await;
    let token = token_for("42");

    for path in ["/api/socket", "/api/live/stream"] {
        // when (操作):
        let (mut client, _) = connect_async(server.ws_url(path, Some(&token)))
            .await
            .unwrap();

        // then (期待する結果):
        assert_eq!(next_json(&mut client).await["type"], "connected");
    }
}

#[tokio::test]
async fn test_closed_connection_is_unregistered() {
    // テスト項目: クライアントが切断すると登録が解除される
    // given (前提条件):
    let server = TestServer::start().await;
    let mut client = server.connect("42").await;
    assert_eq!(server.connections().await, 1);

    // when (操作):
    client.close(None).await.unwrap();

    // then (期待する結果):
    let mut remaining = 1;
    for _ in 0..50 {
        remaining = server.connections().await;
        if remaining == 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(remaining, 0);
}

#[tokio::test]
async fn test_monitor_zones_endpoint() {
    // テスト項目: 監視 API がゾーンごとの混雑度区分を返し、認証と siteId を検証する
    // given (前提条件):
    let server = TestServer::start().await;
    let http = reqwest::Client::new();
    let token = token_for("42");

    // when (操作):
    let ok = http
        .get(server.http_url("/api/monitor/zones?siteId=7"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    let bad_site = http
        .get(server.http_url("/api/monitor/zones?siteId=abc"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    let no_token = http
        .get(server.http_url("/api/monitor/zones?siteId=7"))
        .send()
        .await
        .unwrap();

    // then (期待する結果):
    assert_eq!(ok.status(), reqwest::StatusCode::OK);
    let body: Value = ok.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["data"][0]["status"], "high");
    assert_eq!(body["data"][1]["status"], "low");

    assert_eq!(bad_site.status(), reqwest::StatusCode::BAD_REQUEST);
    let body: Value = bad_site.json().await.unwrap();
    assert_eq!(body, json!({"success": false, "message": "Invalid siteId"}));

    assert_eq!(no_token.status(), reqwest::StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_ingested_sample_shows_up_in_next_update() {
    // テスト項目: 取り込んだサンプルが次の配信に反映され、未知のゾーンは 404 になる
    // given (前提条件):
    let server = TestServer::start().await;
    let http = reqwest::Client::new();
    let token = token_for("sensor");

    // when (操作):
    let created = http
        .post(server.http_url("/api/crowd-data"))
        .bearer_auth(&token)
        .json(&json!({"site_id": 8, "zone_id": "Z9", "count": 40}))
        .send()
        .await
        .unwrap();
    let unknown = http
        .post(server.http_url("/api/crowd-data"))
        .bearer_auth(&token)
        .json(&json!({"site_id": 8, "zone_id": "nope", "count": 1}))
        .send()
        .await
        .unwrap();
    let malformed = http
        .post(server.http_url("/api/crowd-data"))
        .bearer_auth(&token)
        .json(&json!({"site_id": 8}))
        .send()
        .await
        .unwrap();
    let future_dated = http
        .post(server.http_url("/api/crowd-data"))
        .bearer_auth(&token)
        .json(&json!({
            "site_id": 8,
            "zone_id": "Z9",
            "count": 1,
            "timestamp": (Utc::now() + chrono::Duration::days(365)).to_rfc3339(),
        }))
        .send()
        .await
        .unwrap();

    // then (期待する結果):
    assert_eq!(created.status(), reqwest::StatusCode::CREATED);
    assert_eq!(unknown.status(), reqwest::StatusCode::NOT_FOUND);
    assert_eq!(malformed.status(), reqwest::StatusCode::BAD_REQUEST);
    assert_eq!(future_dated.status(), reqwest::StatusCode::BAD_REQUEST);

    let mut client = server.connect("viewer").await;
    send_text(&mut client, r#"{"action":"subscribe","siteId":8}"#).await;
    let update = next_of_type(&mut client, "zone_update").await;
    assert_eq!(update["data"][0]["current_count"], 40);
    assert_eq!(update["data"][0]["density_percentage"], 80.0);
}

#[tokio::test]
async fn test_server_stops_on_shutdown() {
    // テスト項目: シャットダウン通知でサーバーとスケジューラーが停止する
    // given (前提条件):
    let server = TestServer::start().await;
    assert_eq!(server.connections().await, 0);

    // when (操作):
    let result = tokio::time::timeout(Duration::from_secs(5), server.stop()).await;

    // then (期待する結果):
    assert!(matches!(result, Ok(Ok(()))));
}
