use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::Mutex as P_Mutex;
use rand::Rng;
use tokio::sync::{mpsc, RwLock};
use tracing::warn;

use civitas_core::{GameState, PlayerId, PrivateState, PublicState, RoomCode, ServerMessage};

/// 房间号长度
pub const ROOM_CODE_LEN: usize = 4;

// 单个房间的状态
// 重要‼️：严格规定使用锁的顺序，避免死锁：
// connections -> game
pub struct Room {
    pub game: P_Mutex<GameState>,
    // 将 PlayerId 映射到具体的网络连接
    pub connections: RwLock<HashMap<PlayerId, PlayerConnection>>,
    // 房间已从大厅移除。只在持有 game 锁时读写
    closed: AtomicBool,
}

// 玩家的网络连接信息
pub struct PlayerConnection {
    // 用于向该玩家的 WebSocket 任务发送消息的通道
    pub sender: mpsc::Sender<ServerMessage>,
}

impl Room {
    pub fn new(game: GameState) -> Self {
        Room {
            game: P_Mutex::new(game),
            connections: RwLock::new(HashMap::new()),
            closed: AtomicBool::new(false),
        }
    }

    /// 让新玩家加入并发初始手牌。房间已关闭时返回 None，
    /// 这时调用方拿到的是一个已经不在大厅里的旧房间。
    pub fn admit(&self, name: String) -> Option<(PlayerId, Option<PrivateState>, PublicState)> {
        let mut game = self.game.lock();
        if self.is_closed() {
            return None;
        }
        let player_id = game.add_player(name);
        if let Err(e) = game.deal_initial_hand(player_id) {
            warn!("为玩家 {} 发牌失败: {}", player_id, e);
        }
        Some((player_id, game.private_view(player_id), game.public_view()))
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Relaxed)
    }
}

/// 所有在线房间的目录。由服务器持有并注入到处理函数中，不是全局变量。
#[derive(Default)]
pub struct Lobby {
    rooms: DashMap<RoomCode, Arc<Room>>,
}

impl Lobby {
    pub fn new() -> Self {
        Self::default()
    }

    /// 用一个未被占用的房间号创建新房间
    pub fn create_room(&self) -> (RoomCode, Arc<Room>) {
        let mut rng = rand::rng();
        loop {
            let code = generate_room_code(&mut rng);
            if let Entry::Vacant(slot) = self.rooms.entry(code.clone()) {
                let room = Arc::new(Room::new(GameState::new(code.clone())));
                slot.insert(room.clone());
                return (code, room);
            }
        }
    }

    /// 房间号不区分大小写
    pub fn get(&self, code: &str) -> Option<Arc<Room>> {
        self.rooms.get(&normalize_code(code)).map(|r| Arc::clone(r.value()))
    }

    /// 房间内已经没有玩家时删除它并标记为关闭，返回是否删除
    pub fn remove_if_empty(&self, code: &str) -> bool {
        self.rooms
            .remove_if(&normalize_code(code), |_, room| {
                let game = room.game.lock();
                if !game.is_empty() {
                    return false;
                }
                room.closed.store(true, Ordering::Relaxed);
                true
            })
            .is_some()
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }
}

pub fn normalize_code(code: &str) -> RoomCode {
    code.trim().to_ascii_uppercase()
}

/// 生成由大写字母组成的房间号，例如 ABKF
pub fn generate_room_code<R: Rng + ?Sized>(rng: &mut R) -> RoomCode {
    (0..ROOM_CODE_LEN).map(|_| rng.random_range(b'A'..=b'Z') as char).collect()
}
