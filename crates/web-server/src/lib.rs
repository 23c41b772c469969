// In crates/web-server/src/lib.rs

use analytics::PerformanceReport;
use app_config::types::ServerSettings;
use axum::{
    Router,
    extract::{
        Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::{IntoResponse, Json},
    routing::{get, post},
};
use core_types::ClosedTrade;
use engine::EngineHandle;
use events::{Command, EngineSnapshot, LogEntry, WsMessage};
use futures::{sink::SinkExt, stream::StreamExt};
use std::sync::Arc;
use tokio::net::TcpListener;
use types::{CommandAccepted, LimitParams};

pub mod error;
pub mod types;

// Re-export our custom error type for convenience.
pub use error::{Error, Result};

/// The shared application state that is available to all API handlers.
#[derive(Clone)]
pub struct AppState {
    pub engine: EngineHandle,
}

/// Creates the main application router with all routes and middleware.
pub fn create_router(app_state: AppState) -> Router {
    // The dashboard is served from elsewhere during development.
    let cors = tower_http::cors::CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods(tower_http::cors::Any)
        .allow_headers(tower_http::cors::Any);

    let api_router = Router::new()
        .route("/snapshot", get(get_snapshot_handler))
        .route("/metrics", get(get_metrics_handler))
        .route("/trades", get(get_trades_handler))
        .route("/logs", get(get_logs_handler))
        .route("/commands", post(post_command_handler));

    Router::new()
        .route("/ws", get(ws_handler))
        .route("/health", get(health_check_handler))
        .nest("/api", api_router)
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .layer(cors)
        .with_state(app_state)
}

async fn health_check_handler() -> &'static str {
    "OK"
}

/// Handler for `GET /api/snapshot`: the latest published engine state.
async fn get_snapshot_handler(State(state): State<AppState>) -> Json<Arc<EngineSnapshot>> {
    Json(state.engine.snapshot())
}

/// Handler for `GET /api/metrics`
async fn get_metrics_handler(State(state): State<AppState>) -> Json<PerformanceReport> {
    Json(state.engine.snapshot().metrics.clone())
}

/// Handler for `GET /api/trades`: closed trades, newest first.
async fn get_trades_handler(
    State(state): State<AppState>,
    Query(params): Query<LimitParams>,
) -> Json<Vec<ClosedTrade>> {
    let snapshot = state.engine.snapshot();
    Json(snapshot.history.iter().take(params.limit).cloned().collect())
}

/// Handler for `GET /api/logs`: activity log, newest first.
async fn get_logs_handler(
    State(state): State<AppState>,
    Query(params): Query<LimitParams>,
) -> Json<Vec<LogEntry>> {
    let snapshot = state.engine.snapshot();
    Json(snapshot.logs.iter().take(params.limit).cloned().collect())
}

/// Handler for `POST /api/commands`
///
/// Waits until the engine has applied the command. Invalid parameters come
/// back as `400`, a stopped engine as `503`.
async fn post_command_handler(
    State(state): State<AppState>,
    Json(command): Json<Command>,
) -> Result<Json<CommandAccepted>> {
    let label = command.to_string();
    tracing::info!(command = %label, "Command received.");

    state.engine.submit(command).await?;

    Ok(Json(CommandAccepted {
        command: label,
        version: state.engine.snapshot().version,
    }))
}

/// The handler for `GET /ws`.
async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

fn encode(snapshot: Arc<EngineSnapshot>) -> Option<Message> {
    match serde_json::to_string(&WsMessage::Snapshot(snapshot)) {
        Ok(json) => Some(Message::Text(json.into())),
        Err(e) => {
            tracing::error!(error = %e, "Failed to serialize snapshot.");
            None
        }
    }
}

/// Pushes the current snapshot, then every newer version, until the client
/// goes away. Text frames from the client are read as commands.
async fn handle_socket(socket: WebSocket, state: AppState) {
    tracing::info!("New WebSocket client connected.");
    let (mut sender, mut receiver) = socket.split();
    let mut snapshots = state.engine.subscribe();

    // Intermediate versions may be skipped; the latest one always arrives.
    let initial = snapshots.borrow_and_update().clone();
    if let Some(msg) = encode(initial) {
        if sender.send(msg).await.is_err() {
            tracing::info!("WebSocket client disconnected before the first snapshot.");
            return;
        }
    }

    loop {
        tokio::select! {
            changed = snapshots.changed() => {
                if changed.is_err() {
                    tracing::info!("Engine stopped; closing WebSocket.");
                    break;
                }
                let snapshot = snapshots.borrow_and_update().clone();
                let Some(msg) = encode(snapshot) else { continue };
                if sender.send(msg).await.is_err() {
                    tracing::info!("WebSocket client disconnected.");
                    break;
                }
            }
            incoming = receiver.next() => match incoming {
                Some(Ok(Message::Text(text))) => match serde_json::from_str::<Command>(&text) {
                    Ok(command) => {
                        if let Err(e) = state.engine.submit(command).await {
                            tracing::warn!(error = %e, "WebSocket command rejected.");
                        }
                    }
                    Err(e) => tracing::warn!(error = %e, "Ignoring malformed WebSocket frame."),
                },
                Some(Ok(Message::Close(_))) | None => {
                    tracing::info!("WebSocket client sent close frame.");
                    break;
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    tracing::warn!(error = %e, "WebSocket receive failed.");
                    break;
                }
            },
        }
    }
    tracing::info!("WebSocket client connection closed.");
}

/// Serves the read/command interface until the process is terminated.
pub async fn run(settings: &ServerSettings, engine: EngineHandle) -> Result<()> {
    let app = create_router(AppState { engine });

    let address = format!("{}:{}", settings.host, settings.port);
    let listener = TcpListener::bind(&address)
        .await
        .map_err(Error::ServerBindError)?;
    tracing::info!("Web server listening on {}", address);

    axum::serve(listener, app.into_make_service())
        .await
        .map_err(Error::ServeError)
}

#[cfg(test)]
mod tests {
    use super::*;
    use api_client::{BarStream, MarketSource};
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use chrono::FixedOffset;
    use core_types::{BotMode, BotParameters, Candle, Interval, MarketType, Symbol};
    use engine::{Engine, EngineConfig};
    use rust_decimal_macros::dec;
    use std::time::Duration;
    use strategies::StrategySettings;
    use tower::ServiceExt;

    /// A source that never delivers anything.
    struct SilentSource;

    #[async_trait]
    impl MarketSource for SilentSource {
        async fn fetch_history(
            &self,
            _symbol: &Symbol,
            _interval: Interval,
            _limit: u16,
        ) -> api_client::Result<Vec<Candle>> {
            futures::future::pending().await
        }

        async fn subscribe(&self, _symbol: &Symbol, _interval: Interval) -> api_client::Result<BarStream> {
            Ok(futures::stream::pending().boxed())
        }
    }

    fn router() -> Router {
        let config = EngineConfig {
            symbol: Symbol("BTCUSDT".to_string()),
            parameters: BotParameters {
                mode: BotMode::Simulated,
                market_type: MarketType::Futures,
                interval: Interval::OneMinute,
                margin_amount: dec!(100),
                leverage: 1,
                take_profit_percent: dec!(0.5),
                stop_loss_percent: dec!(0.3),
                trailing_stop_enabled: false,
                signal_exit_enabled: false,
            },
            strategy: StrategySettings::default(),
            initial_balance: dec!(10000),
            auto_start: false,
            max_candles: 1500,
            history_limit: 1000,
            reconnect_delay: Duration::from_secs(3),
            max_log_entries: 50,
            max_trade_history: 500,
            log_offset: FixedOffset::east_opt(0).unwrap(),
        };
        let (engine, handle) = Engine::new(config, Arc::new(SilentSource)).unwrap();
        tokio::spawn(engine.run());
        create_router(AppState { engine: handle })
    }

    fn command(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/commands")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_check_responds() {
        let response = router()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn accepted_command_is_visible_in_the_snapshot() {
        let app = router();

        let response = app
            .clone()
            .oneshot(command(r#"{"type":"setLeverage","payload":20}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let accepted: CommandAccepted = serde_json::from_value(json(response).await).unwrap();
        assert_eq!(accepted.command, "setLeverage(20)");

        let response = app
            .oneshot(Request::get("/api/snapshot").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let snapshot = json(response).await;
        assert_eq!(snapshot["parameters"]["leverage"], 20);
        assert!(snapshot["version"].as_u64().unwrap() >= accepted.version);
    }

    #[tokio::test]
    async fn invalid_command_is_a_bad_request() {
        let app = router();

        let response = app
            .clone()
            .oneshot(command(r#"{"type":"setLeverage","payload":0}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(json(response).await["error"].as_str().is_some());

        let response = app
            .oneshot(Request::get("/api/logs?limit=1").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let logs = json(response).await;
        assert_eq!(logs.as_array().unwrap().len(), 1);
        assert!(
            logs[0]["message"]
                .as_str()
                .unwrap()
                .starts_with("Command setLeverage(0) rejected")
        );
    }

    #[tokio::test]
    async fn metrics_and_trades_start_empty() {
        let app = router();

        let response = app
            .clone()
            .oneshot(Request::get("/api/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(json(response).await["totalTrades"], 0);

        let response = app
            .oneshot(Request::get("/api/trades").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(json(response).await, serde_json::json!([]));
    }
}
