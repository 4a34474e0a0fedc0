// WebSocket front end: one task per client connection, JSON in, JSON out

use std::net::SocketAddr;
use std::sync::Arc;

use futures::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, info, warn};

use crate::ai::{AiProfile, Difficulty, FrameInput};
use crate::protocol::{
    direction_for, ErrorResponse, GameDataRequest, InitGameRequest, JoinGameRequest, Response,
    DEFAULT_AREA_HEIGHT, DEFAULT_AREA_WIDTH, DEFAULT_PADDLE_HEIGHT,
};
use crate::registry::SessionRegistry;

/// Accept connections forever, one handler task per client.
pub async fn run(
    addr: &str,
    registry: Arc<SessionRegistry>,
    default_difficulty: Difficulty,
) -> anyhow::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!("🏓 AI server listening on {}", addr);

    while let Ok((stream, peer)) = listener.accept().await {
        let registry = registry.clone();
        tokio::spawn(handle_connection(stream, peer, registry, default_difficulty));
    }

    Ok(())
}

async fn handle_connection(
    stream: TcpStream,
    peer: SocketAddr,
    registry: Arc<SessionRegistry>,
    default_difficulty: Difficulty,
) {
    info!("📥 New connection from {}", peer);

    let ws_stream = match accept_async(stream).await {
        Ok(ws) => ws,
        Err(e) => {
            error!("WebSocket handshake failed: {}", e);
            return;
        }
    };

    // One address per TCP connection, so the peer address doubles as the
    // client identifier for the registry.
    let client_id = peer.to_string();

    let (mut ws_sender, mut ws_receiver) = ws_stream.split();
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();

    // Spawn task to write outbound messages to this client
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if ws_sender.send(msg).await.is_err() {
                break;
            }
        }
    });

    while let Some(msg) = ws_receiver.next().await {
        let msg = match msg {
            Ok(msg) => msg,
            Err(e) => {
                error!("Error receiving message from {}: {}", client_id, e);
                break;
            }
        };

        if let Message::Text(text) = msg {
            let reply = match serde_json::from_str::<Value>(&text) {
                Ok(value) => dispatch(value, &client_id, &registry, default_difficulty).await,
                Err(e) => {
                    warn!("Malformed JSON from {}: {}", client_id, e);
                    to_json(&ErrorResponse {
                        error: "Invalid JSON".to_string(),
                    })
                }
            };

            if tx.send(Message::Text(reply.to_string())).is_err() {
                break;
            }
        }
    }

    // Run the cleanup to completion before the task exits: drop this
    // client's binding, then reclaim any session left without one.
    registry.unbind_client(&client_id).await;
    registry.reap_orphans().await;
    info!("📤 Client {} disconnected", client_id);

    send_task.abort();
}

/// Route one inbound message and produce the reply to send back.
///
/// Messages without a `type` are decision frames; an unrecognized `type`
/// falls back to the legacy init form when `ai_config` is present, and to a
/// decision frame otherwise.
async fn dispatch(
    value: Value,
    client_id: &str,
    registry: &SessionRegistry,
    default_difficulty: Difficulty,
) -> Value {
    match value.get("type").and_then(Value::as_str) {
        Some("init_game") => handle_init_game(value, client_id, registry).await,
        Some("join_game") => handle_join_game(value, client_id, registry).await,
        Some("game_data") | None => {
            handle_game_data(value, client_id, registry, default_difficulty).await
        }
        Some(other) => {
            if value.get("ai_config").is_some() {
                debug!("Legacy init message (type {:?}) from {}", other, client_id);
                handle_legacy_init(value, client_id, registry, default_difficulty).await
            } else {
                handle_game_data(value, client_id, registry, default_difficulty).await
            }
        }
    }
}

async fn handle_init_game(value: Value, client_id: &str, registry: &SessionRegistry) -> Value {
    let request: InitGameRequest = match serde_json::from_value(value) {
        Ok(request) => request,
        Err(e) => return to_json(&Response::init_err(e.to_string())),
    };

    match init_session(request, client_id, registry).await {
        Ok((game_id, difficulty)) => {
            info!("✅ Game {} initialized for client {}", game_id, client_id);
            to_json(&Response::init_ok(game_id, difficulty))
        }
        Err(e) => to_json(&Response::init_err(e.to_string())),
    }
}

/// Resolve the profile and create+bind the session. Used by both the
/// current and the legacy init forms.
async fn init_session(
    request: InitGameRequest,
    client_id: &str,
    registry: &SessionRegistry,
) -> anyhow::Result<(String, String)> {
    let (difficulty_label, custom_settings) = match &request.ai_config {
        Some(config) => (config.difficulty.clone(), config.custom_settings.as_ref()),
        None => ("medium".to_string(), None),
    };

    let profile = AiProfile::resolve(&difficulty_label, custom_settings)?;
    let game_id = registry
        .create_and_bind(client_id, request.game_id, profile)
        .await;
    Ok((game_id, difficulty_label))
}

async fn handle_join_game(value: Value, client_id: &str, registry: &SessionRegistry) -> Value {
    let request: JoinGameRequest = match serde_json::from_value(value) {
        Ok(request) => request,
        Err(e) => return to_json(&Response::join_err(e.to_string())),
    };

    let Some(game_id) = request.game_id else {
        return to_json(&Response::join_err("join_game requires game_id".to_string()));
    };

    match registry.bind_client(client_id, &game_id).await {
        Ok(()) => {
            info!("✅ Client {} joined game {}", client_id, game_id);
            to_json(&Response::join_ok(game_id))
        }
        Err(e) => to_json(&Response::join_err(e.to_string())),
    }
}

async fn handle_game_data(
    value: Value,
    client_id: &str,
    registry: &SessionRegistry,
    default_difficulty: Difficulty,
) -> Value {
    let request: GameDataRequest = match serde_json::from_value(value) {
        Ok(request) => request,
        Err(e) => {
            warn!("Bad game_data from {}: {}", client_id, e);
            return to_json(&ErrorResponse {
                error: e.to_string(),
            });
        }
    };

    // Unknown or absent game ids never fail a decision frame; a default
    // session is provisioned on the spot.
    let (game_id, engine) = registry
        .engine_for_frame(
            client_id,
            request.game_id.as_deref(),
            AiProfile::preset(default_difficulty),
        )
        .await;

    let paddle_height = request.paddle.height.unwrap_or(DEFAULT_PADDLE_HEIGHT);

    let frame = match (
        request.ball.x,
        request.ball.y,
        request.ball.speed_x,
        request.ball.speed_y,
        request.paddle.ai_y,
    ) {
        (Some(ball_x), Some(ball_y), Some(ball_speed_x), Some(ball_speed_y), Some(paddle_y)) => {
            Some(FrameInput {
                ball_x,
                ball_y,
                ball_speed_x,
                ball_speed_y,
                paddle_y,
                paddle_height,
                screen_width: request.game_area.width.unwrap_or(DEFAULT_AREA_WIDTH),
                screen_height: request.game_area.height.unwrap_or(DEFAULT_AREA_HEIGHT),
                scored_for_me: request.scored_for_me(),
                scored_against_me: request.scored_against_me(),
            })
        }
        _ => None,
    };

    let (target_y, direction) = match frame {
        Some(frame) => {
            let mut engine = engine.lock().await;
            let target_y = engine.decide(&frame);
            let paddle_center = frame.paddle_y + frame.paddle_height / 2.0;
            let direction =
                direction_for(target_y, paddle_center, engine.profile().move_threshold());
            debug!(
                "Game {}: ball ({:.1}, {:.1}) v ({:.1}, {:.1}) -> target {:.1} ({})",
                game_id,
                frame.ball_x,
                frame.ball_y,
                frame.ball_speed_x,
                frame.ball_speed_y,
                target_y,
                direction
            );
            (target_y, direction)
        }
        None => {
            // Not enough data to decide: hold the current position
            let target_y = request
                .paddle
                .ai_y
                .map(|y| y + paddle_height / 2.0)
                .unwrap_or(0.0);
            debug!(
                "Game {}: incomplete frame from {}, holding at {:.1}",
                game_id, client_id, target_y
            );
            (target_y, "stable")
        }
    };

    to_json(&Response::AiDecision {
        target_y,
        direction,
        game_id,
    })
}

async fn handle_legacy_init(
    value: Value,
    client_id: &str,
    registry: &SessionRegistry,
    default_difficulty: Difficulty,
) -> Value {
    let request: InitGameRequest = match serde_json::from_value(value.clone()) {
        Ok(request) => request,
        Err(e) => {
            return to_json(&ErrorResponse {
                error: e.to_string(),
            })
        }
    };

    if let Err(e) = init_session(request, client_id, registry).await {
        return to_json(&ErrorResponse {
            error: e.to_string(),
        });
    }

    // The legacy form carries frame data in the same message; answer it
    // like a normal decision request.
    handle_game_data(value, client_id, registry, default_difficulty).await
}

fn to_json(response: &impl serde::Serialize) -> Value {
    serde_json::to_value(response).unwrap_or_else(|e| {
        error!("Failed to serialize response: {}", e);
        serde_json::json!({"error": "internal serialization error"})
    })
}
