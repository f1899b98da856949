mod config;
mod lobby;

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use clap::Parser;
use futures_util::{stream::StreamExt, SinkExt};
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use civitas_core::{ClientMessage, PlayResult, PlayerId, RoomCode, ServerMessage};

use crate::config::ServerConfig;
use crate::lobby::{Lobby, PlayerConnection, Room};

// 服务器全局状态，通过 axum 的 State 注入
struct AppState {
    lobby: Lobby,
}

type SharedState = Arc<AppState>;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = ServerConfig::parse();
    let state = SharedState::new(AppState { lobby: Lobby::new() });

    let app = Router::new()
        .route("/ws", get(websocket_handler))
        .route("/health", get(health))
        .with_state(state);

    info!("服务器正在监听 {}", config.addr);
    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// 处理 WebSocket 连接请求
async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<SharedState>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

/// 处理单个 WebSocket 连接的生命周期
async fn handle_socket(socket: WebSocket, state: SharedState) {
    let (mut sender, mut receiver) = socket.split();

    // 创建一个 MPSC 通道，用于从其他任务接收要发送的消息
    let (tx, mut rx) = mpsc::channel::<ServerMessage>(32);

    // 启动一个新任务，专门负责将 MPSC 通道中的消息发送到 WebSocket
    tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            let payload = match serde_json::to_string(&msg) {
                Ok(p) => p,
                Err(e) => {
                    warn!("序列化消息失败: {}", e);
                    continue;
                }
            };
            if sender.send(Message::Text(payload.into())).await.is_err() {
                // 发送失败，说明客户端已断开，退出任务
                break;
            }
        }
    });

    // 当前连接所在的房间和玩家，加入房间后填充
    let mut player_context: Option<(RoomCode, PlayerId)> = None;

    // 主循环，处理从客户端接收到的消息
    while let Some(Ok(msg)) = receiver.next().await {
        if let Message::Text(text) = msg {
            match serde_json::from_str::<ClientMessage>(&text) {
                Ok(client_msg) => {
                    handle_client_message(client_msg, state.clone(), &tx, &mut player_context).await;
                }
                Err(e) => {
                    warn!("解析消息失败: {}", e);
                }
            }
        }
    }

    // 客户端断开连接，执行清理工作
    if let Some((room_code, player_id)) = player_context {
        handle_disconnect(state, room_code, player_id).await;
    }
    info!("客户端连接关闭");
}

async fn send_error(tx: &mpsc::Sender<ServerMessage>, message: &str) {
    let _ = tx.send(ServerMessage::Error { message: message.to_string() }).await;
}

/// 核心消息处理逻辑
async fn handle_client_message(
    msg: ClientMessage,
    state: SharedState,
    tx: &mpsc::Sender<ServerMessage>,
    context: &mut Option<(RoomCode, PlayerId)>,
) {
    match msg {
        ClientMessage::CreateRoom { name } => {
            if context.is_some() {
                send_error(tx, "你已经在一个房间里了").await;
                return;
            }
            let (room_code, room) = state.lobby.create_room();
            info!("创建了新房间 {}", room_code);
            join_room(&room, room_code, name, tx, context).await;
        }
        ClientMessage::JoinRoom { room_code, name } => {
            if context.is_some() {
                send_error(tx, "你已经在一个房间里了").await;
                return;
            }
            let Some(room) = state.lobby.get(&room_code) else {
                send_error(tx, "房间不存在").await;
                return;
            };
            let room_code = room.game.lock().room_code.clone();
            join_room(&room, room_code, name, tx, context).await;
        }
        // ... 其他需要先加入房间才能执行的消息
        _ => {
            let Some((room_code, player_id)) = context.clone() else {
                send_error(tx, "请先加入或创建房间").await;
                return;
            };
            let Some(room) = state.lobby.get(&room_code) else {
                send_error(tx, "房间不存在").await;
                return;
            };
            handle_game_message(msg, &room, player_id, tx).await;
        }
    }
}

/// 新玩家进入房间：加入游戏、发初始手牌、登记连接
async fn join_room(
    room: &Room,
    room_code: RoomCode,
    name: String,
    tx: &mpsc::Sender<ServerMessage>,
    context: &mut Option<(RoomCode, PlayerId)>,
) {
    let (player_id, me, public) = {
        // connections write lock
        let mut connections = room.connections.write().await;
        // game lock 在 admit 内部获取；房间已被移除时拒绝加入
        let Some((player_id, me, public)) = room.admit(name) else {
            drop(connections);
            send_error(tx, "房间不存在").await;
            return;
        };
        connections.insert(player_id, PlayerConnection { sender: tx.clone() });
        (player_id, me, public)
    };

    info!("玩家 {} 加入了房间 {}", player_id, room_code);
    *context = Some((room_code.clone(), player_id));
    if let Some(me) = me {
        let _ = tx.send(ServerMessage::RoomJoined { room_code, your_id: player_id, me }).await;
    }
    broadcast(room.connections.read().await.iter(), &ServerMessage::GameUpdate(public)).await;
}

/// 房间内的游戏动作
async fn handle_game_message(
    msg: ClientMessage,
    room: &Room,
    player_id: PlayerId,
    tx: &mpsc::Sender<ServerMessage>,
) {
    let connections = room.connections.read().await;
    match msg {
        ClientMessage::DrawCards => {
            let (me, public) = {
                let mut game = room.game.lock();
                if let Err(e) = game.draw_up_to_limit(player_id) {
                    warn!("玩家 {} 抽牌失败: {}", player_id, e);
                }
                (game.private_view(player_id), game.public_view())
            };
            if let Some(me) = me {
                let _ = tx.send(ServerMessage::YourState(me)).await;
            }
            broadcast(connections.iter(), &ServerMessage::GameUpdate(public)).await;
        }
        ClientMessage::PlayCard { card_id, target_player_id, extra } => {
            let (result, personal, public) = {
                let mut game = room.game.lock();
                let result = PlayResult::from(game.play_card(player_id, card_id, target_player_id, extra.as_ref()));
                // 不论成功与否，出牌后都补满手牌
                if let Err(e) = game.draw_up_to_limit(player_id) {
                    warn!("玩家 {} 补牌失败: {}", player_id, e);
                }
                // 偷牌和接管会改变其他玩家的私有状态，所以每个人都要单独生成一份
                let personal: Vec<_> = connections
                    .iter()
                    .filter_map(|(pid, conn)| game.private_view(*pid).map(|view| (conn.sender.clone(), view)))
                    .collect();
                (result, personal, game.public_view())
            };
            let _ = tx.send(ServerMessage::ActionResult(result)).await;
            for (sender, view) in personal {
                let _ = sender.send(ServerMessage::YourState(view)).await;
            }
            broadcast(connections.iter(), &ServerMessage::GameUpdate(public)).await;
        }
        ClientMessage::ReshuffleDeck => {
            let (reshuffled, count, public) = {
                let mut game = room.game.lock();
                let reshuffled = game.reshuffle_now();
                (reshuffled, game.deck.reshuffle_count(), game.public_view())
            };
            if reshuffled {
                info!("房间 {} 手动洗牌，累计 {} 次", public.room_code, count);
                let note = ServerMessage::Info { message: format!("弃牌堆已洗回牌堆 (第 {} 次)", count) };
                broadcast(connections.iter(), &note).await;
            }
            broadcast(connections.iter(), &ServerMessage::GameUpdate(public)).await;
        }
        ClientMessage::CreateRoom { .. } | ClientMessage::JoinRoom { .. } => {
            send_error(tx, "你已经在一个房间里了").await;
        }
    }
}

/// 玩家断开连接后的处理
async fn handle_disconnect(state: SharedState, room_code: RoomCode, player_id: PlayerId) {
    info!("玩家 {} 从房间 {} 断开连接", player_id, room_code);
    let Some(room) = state.lobby.get(&room_code) else {
        return;
    };

    {
        // connections write lock
        let mut connections = room.connections.write().await;
        // 从连接映射中移除
        connections.remove(&player_id);

        // 玩家的手牌和建筑进入弃牌堆
        let public = {
            let mut game = room.game.lock();
            game.remove_player(player_id);
            game.public_view()
        };
        broadcast(connections.iter(), &ServerMessage::GameUpdate(public)).await;
    }

    // 判断是否清空房间
    if state.lobby.remove_if_empty(&room_code) {
        info!("房间 {} 已空，已被移除", room_code);
    }
}

/// 向房间内所有玩家广播消息
async fn broadcast(
    players: impl Iterator<Item = (&PlayerId, &PlayerConnection)>,
    message: &ServerMessage,
) {
    for (player_id, conn) in players {
        if conn.sender.send(message.clone()).await.is_err() {
            // 发送失败，说明该玩家也断开了，后续由其自己的 handle_socket 任务处理
            warn!("向玩家 {} 发送消息失败（可能已断开）", player_id);
        }
    }
}
