use crate::card::{Card, CardCategory, CardId, ResourceKind, Resources};
use crate::deck::Deck;
use crate::error::GameError;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

pub type RoomCode = String;
pub type PlayerId = Uuid;

/// 补牌时手牌的上限
pub const HAND_LIMIT: usize = 5;

/// 单个房间的完整游戏状态，只存在于服务端内存中。
/// 发给客户端的是 `public_view` / `private_view` 生成的视图。
#[derive(Debug, Clone)]
pub struct GameState {
    pub room_code: RoomCode,
    pub players: HashMap<PlayerId, Player>,  // 可以根据player id查找player
    // 玩家加入顺序，移除玩家时同步删除
    pub turn_order: Vec<PlayerId>,
    // 指向 turn_order 的当前玩家。目前不会推进，也不限制谁可以出牌。
    pub current_player_index: usize,
    pub deck: Deck,
    // 洗牌、交换资源、偷牌共用的随机源
    pub(crate) rng: StdRng,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub hand: Vec<Card>,
    pub resources: Resources,
    pub buildings: Vec<Card>,  // 按建造顺序，最后一个是最新的
    pub score: u32,
    pub has_defense: bool,
}

/// 接管牌交换的"城市"：资源、建筑和分数
#[derive(Debug, Default)]
pub(crate) struct City {
    resources: Resources,
    buildings: Vec<Card>,
    score: u32,
}

impl Player {
    pub fn new(id: PlayerId, name: impl Into<String>) -> Self {
        Player {
            id,
            name: name.into(),
            hand: Vec::new(),
            resources: ResourceKind::empty_pool(),
            buildings: Vec::new(),
            score: 0,
            has_defense: false,
        }
    }

    pub fn resource(&self, kind: ResourceKind) -> u32 {
        self.resources.get(&kind).copied().unwrap_or(0)
    }

    pub fn gain(&mut self, kind: ResourceKind, amount: u32) {
        *self.resources.entry(kind).or_insert(0) += amount;
    }

    /// 扣除资源，不足时扣到 0 为止
    pub fn spend(&mut self, kind: ResourceKind, amount: u32) {
        let count = self.resources.entry(kind).or_insert(0);
        *count = count.saturating_sub(amount);
    }

    /// 数量大于 0 的资源种类，按固定顺序
    pub fn held_kinds(&self) -> Vec<ResourceKind> {
        self.resources.iter().filter(|(_, n)| **n > 0).map(|(k, _)| *k).collect()
    }

    pub fn can_afford(&self, cost: &Resources) -> bool {
        cost.iter().all(|(kind, need)| self.resource(*kind) >= *need)
    }

    pub(crate) fn take_city(&mut self) -> City {
        City {
            resources: std::mem::replace(&mut self.resources, ResourceKind::empty_pool()),
            buildings: std::mem::take(&mut self.buildings),
            score: std::mem::take(&mut self.score),
        }
    }

    pub(crate) fn set_city(&mut self, city: City) {
        self.resources = city.resources;
        self.buildings = city.buildings;
        self.score = city.score;
    }
}

// --- 发给客户端的视图 ---

/// 桌面上的建筑，只有展示所需的信息
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildingView {
    pub id: CardId,
    pub name: String,
    pub image: String,
}

/// 自己手中的牌
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandCardView {
    pub id: CardId,
    pub name: String,
    pub category: CardCategory,
    pub image: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicPlayer {
    pub id: PlayerId,
    pub name: String,
    pub hand_size: usize,  // 只公开张数
    pub resources: Resources,
    pub buildings: Vec<BuildingView>,
    pub score: u32,
}

/// 所有人都能看到的状态
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicState {
    pub room_code: RoomCode,
    pub players: Vec<PublicPlayer>,
    pub current_player_id: Option<PlayerId>,
}

/// 只发给玩家本人的状态，包含完整手牌
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrivateState {
    pub id: PlayerId,
    pub name: String,
    pub hand_size: usize,
    pub hand: Vec<HandCardView>,
    pub resources: Resources,
    pub buildings: Vec<BuildingView>,
    pub score: u32,
    pub has_defense: bool,
}

impl From<&Card> for BuildingView {
    fn from(card: &Card) -> Self {
        BuildingView { id: card.id, name: card.name.clone(), image: card.image.clone() }
    }
}

impl From<&Card> for HandCardView {
    fn from(card: &Card) -> Self {
        HandCardView { id: card.id, name: card.name.clone(), category: card.category, image: card.image.clone() }
    }
}

impl From<&Player> for PublicPlayer {
    fn from(p: &Player) -> Self {
        PublicPlayer {
            id: p.id,
            name: p.name.clone(),
            hand_size: p.hand.len(),
            resources: p.resources.clone(),
            buildings: p.buildings.iter().map(BuildingView::from).collect(),
            score: p.score,
        }
    }
}

impl From<&Player> for PrivateState {
    fn from(p: &Player) -> Self {
        PrivateState {
            id: p.id,
            name: p.name.clone(),
            hand_size: p.hand.len(),
            hand: p.hand.iter().map(HandCardView::from).collect(),
            resources: p.resources.clone(),
            buildings: p.buildings.iter().map(BuildingView::from).collect(),
            score: p.score,
            has_defense: p.has_defense,
        }
    }
}

// --- GameState 的实现方法 ---

impl GameState {
    /// 新建房间，随机源取自操作系统
    pub fn new(room_code: impl Into<RoomCode>) -> Self {
        Self::with_rng(room_code, StdRng::from_os_rng())
    }

    /// 使用固定种子，便于复现
    pub fn with_seed(room_code: impl Into<RoomCode>, seed: u64) -> Self {
        Self::with_rng(room_code, StdRng::seed_from_u64(seed))
    }

    pub fn with_rng(room_code: impl Into<RoomCode>, mut rng: StdRng) -> Self {
        let deck = Deck::new(&mut rng);
        GameState {
            room_code: room_code.into(),
            players: HashMap::new(),
            turn_order: Vec::new(),
            current_player_index: 0,
            deck,
            rng,
        }
    }

    pub fn player(&self, player_id: PlayerId) -> Result<&Player, GameError> {
        self.players.get(&player_id).ok_or(GameError::PlayerNotFound)
    }

    pub fn player_mut(&mut self, player_id: PlayerId) -> Result<&mut Player, GameError> {
        self.players.get_mut(&player_id).ok_or(GameError::PlayerNotFound)
    }

    /// 获取 current_player_index 指向的玩家ID (如果存在)
    pub fn current_player_id(&self) -> Option<PlayerId> {
        self.turn_order.get(self.current_player_index).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// 按加入顺序遍历玩家
    pub fn players_in_order(&self) -> impl Iterator<Item = &Player> {
        self.turn_order.iter().filter_map(|id| self.players.get(id))
    }

    pub fn public_view(&self) -> PublicState {
        PublicState {
            room_code: self.room_code.clone(),
            players: self.players_in_order().map(PublicPlayer::from).collect(),
            current_player_id: self.current_player_id(),
        }
    }

    /// 只包含请求者自己的手牌，玩家不存在时返回 None
    pub fn private_view(&self, player_id: PlayerId) -> Option<PrivateState> {
        self.players.get(&player_id).map(PrivateState::from)
    }
}

// --- 单元测试 ---

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::Effect;

    fn building(name: &str) -> Card {
        Card::building(name, "x.png", &[ResourceKind::Stone], 1)
    }

    #[test]
    fn test_new_game_has_full_deck_and_no_players() {
        let state = GameState::with_seed("ABCD", 1);
        assert_eq!(state.room_code, "ABCD");
        assert_eq!(state.deck.draw_pile().len(), 63);
        assert!(state.is_empty());
        assert_eq!(state.current_player_id(), None);
    }

    #[test]
    fn test_player_resource_helpers() {
        let mut p = Player::new(Uuid::new_v4(), "Anna");
        assert!(p.held_kinds().is_empty());
        p.gain(ResourceKind::Gold, 2);
        p.gain(ResourceKind::Stone, 1);
        assert_eq!(p.held_kinds(), vec![ResourceKind::Stone, ResourceKind::Gold]);
        p.spend(ResourceKind::Gold, 5);
        assert_eq!(p.resource(ResourceKind::Gold), 0);
        assert!(p.can_afford(&Resources::from([(ResourceKind::Stone, 1)])));
        assert!(!p.can_afford(&Resources::from([(ResourceKind::Wood, 1)])));
    }

    #[test]
    fn test_take_city_leaves_empty_city() {
        let mut p = Player::new(Uuid::new_v4(), "Anna");
        p.gain(ResourceKind::Wood, 3);
        p.buildings.push(building("Mūris"));
        p.score = 1;

        let city = p.take_city();
        assert_eq!(p.resources, ResourceKind::empty_pool());
        assert!(p.buildings.is_empty());
        assert_eq!(p.score, 0);

        p.set_city(city);
        assert_eq!(p.resource(ResourceKind::Wood), 3);
        assert_eq!(p.score, 1);
    }

    #[test]
    fn test_views_hide_other_hands() {
        let mut state = GameState::with_seed("ROOM", 2);
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        for (id, name) in [(a, "A"), (b, "B")] {
            state.players.insert(id, Player::new(id, name));
            state.turn_order.push(id);
        }
        let secret = Card::action("Aizsardzība", "aizsardzība.png", CardCategory::Special, Effect::Defense);
        let secret_id = secret.id;
        state.players.get_mut(&b).unwrap().hand.push(secret);
        let wall = building("Mūris");
        let wall_id = wall.id;
        state.players.get_mut(&b).unwrap().buildings.push(wall);

        let public = state.public_view();
        assert_eq!(public.room_code, "ROOM");
        assert_eq!(public.current_player_id, Some(a));
        let names: Vec<&str> = public.players.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["A", "B"]);
        assert_eq!(public.players[1].hand_size, 1);
        assert_eq!(public.players[1].buildings[0].id, wall_id);

        let json = serde_json::to_string(&public).unwrap();
        assert!(!json.contains(&secret_id.to_string()));

        let private_a = state.private_view(a).unwrap();
        assert!(private_a.hand.is_empty());
        let private_b = state.private_view(b).unwrap();
        assert_eq!(private_b.hand[0].id, secret_id);
        assert_eq!(private_b.hand[0].category, CardCategory::Special);
        assert!(!private_b.has_defense);

        assert!(state.private_view(Uuid::new_v4()).is_none());
    }

    #[test]
    fn test_resources_serialize_as_map() {
        let p = Player::new(Uuid::new_v4(), "A");
        let json = serde_json::to_value(PublicPlayer::from(&p)).unwrap();
        assert_eq!(json["resources"]["stone"], 0);
        assert_eq!(json["resources"]["gold"], 0);
    }
}
