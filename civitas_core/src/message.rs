use crate::card::CardId;
use crate::error::GameError;
use crate::logic::PlayOutcome;
use crate::state::{PlayerId, PrivateState, PublicState, RoomCode};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// 出牌时客户端可以附带的额外参数，目前没有效果会读取它
pub type PlayExtra = HashMap<String, String>;

// --- 客户端 -> 服务器 的消息 ---
// 这些是客户端可以发送给服务器的指令或动作。

#[derive(Serialize, Deserialize, Debug, Clone)]
pub enum ClientMessage {
    // --- 房间管理消息 ---
    /// 客户端请求创建一个新房间
    CreateRoom { name: String },
    /// 客户端请求加入一个已存在的房间
    JoinRoom { room_code: RoomCode, name: String },

    // --- 游戏内消息 ---
    /// 把手牌补到上限
    DrawCards,
    /// 打出一张手牌
    PlayCard {
        card_id: CardId,
        target_player_id: Option<PlayerId>,
        #[serde(default)]
        extra: Option<PlayExtra>,
    },
    /// 手动把弃牌堆洗回抽牌堆
    ReshuffleDeck,
}

// --- 服务器 -> 客户端 的消息 ---

#[derive(Serialize, Deserialize, Debug, Clone)]
pub enum ServerMessage {
    /// 成功加入或创建房间后，服务器私密地发给该玩家
    RoomJoined {
        room_code: RoomCode,
        your_id: PlayerId,
        me: PrivateState,
    },
    /// 玩家自己的私有状态
    YourState(PrivateState),
    /// 房间内所有人可见的状态，广播给每个人
    GameUpdate(PublicState),
    /// 出牌结果，只发给出牌者
    ActionResult(PlayResult),

    Info { message: String },
    Error { message: String },
}

/// 出牌结果在线上的形状: `{ok, error?, info?}`
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct PlayResult {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub info: Option<String>,
}

impl From<Result<PlayOutcome, GameError>> for PlayResult {
    fn from(result: Result<PlayOutcome, GameError>) -> Self {
        match result {
            Ok(outcome) => PlayResult { ok: true, error: None, info: outcome.note().map(str::to_string) },
            Err(e) => PlayResult { ok: false, error: Some(e.to_string()), info: None },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_play_result_shapes() {
        let ok = PlayResult::from(Ok(PlayOutcome::Applied));
        assert_eq!(serde_json::to_string(&ok).unwrap(), r#"{"ok":true}"#);

        let canceled = PlayResult::from(Ok(PlayOutcome::AttackCanceled));
        assert!(canceled.ok);
        assert_eq!(canceled.info.as_deref(), Some("Attack canceled by defense"));

        let failed = PlayResult::from(Err(GameError::InsufficientResources));
        assert_eq!(
            serde_json::to_string(&failed).unwrap(),
            r#"{"ok":false,"error":"Not enough resources"}"#
        );
    }

    #[test]
    fn test_client_message_round_trip() {
        let json = r#"{"PlayCard":{"card_id":"67e55044-10b1-426f-9247-bb680e5fe0c8","target_player_id":null}}"#;
        let msg: ClientMessage = serde_json::from_str(json).unwrap();
        match msg {
            ClientMessage::PlayCard { target_player_id, extra, .. } => {
                assert!(target_player_id.is_none());
                assert!(extra.is_none());
            }
            other => panic!("unexpected message: {:?}", other),
        }

        let draw: ClientMessage = serde_json::from_str(r#""DrawCards""#).unwrap();
        assert!(matches!(draw, ClientMessage::DrawCards));
    }
}
