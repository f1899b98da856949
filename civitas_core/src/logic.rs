use crate::card::*;
use crate::error::GameError;
use crate::message::PlayExtra;
use crate::state::*;
use rand::seq::IndexedRandom;
use rand::Rng;
use tracing::debug;
use uuid::Uuid;

/// 出牌成功后的结果，部分结果会附带提示信息
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayOutcome {
    /// 效果已生效
    Applied,
    /// 目标的防御抵消了这次攻击
    AttackCanceled,
    /// 这张牌的效果标签没有对应的实现，牌已弃掉
    Unimplemented,
}

impl PlayOutcome {
    pub fn note(&self) -> Option<&'static str> {
        match self {
            PlayOutcome::Applied => None,
            PlayOutcome::AttackCanceled => Some("Attack canceled by defense"),
            PlayOutcome::Unimplemented => Some("Special card had no implemented effect"),
        }
    }
}

// --- 玩家管理 ---

impl GameState {
    /// 新玩家加入，排在出牌顺序末尾
    pub fn add_player(&mut self, name: impl Into<String>) -> PlayerId {
        let player_id = Uuid::new_v4();
        self.players.insert(player_id, Player::new(player_id, name));
        self.turn_order.push(player_id);
        player_id
    }

    /// 移除玩家。手牌和建筑全部进入弃牌堆，不会丢失任何牌。
    pub fn remove_player(&mut self, player_id: PlayerId) -> Option<PlayerId> {
        let player = self.players.remove(&player_id)?;
        self.deck.discard_all(player.hand);
        self.deck.discard_all(player.buildings);
        self.turn_order.retain(|id| *id != player_id);
        Some(player_id)
    }

    pub fn deal_initial_hand(&mut self, player_id: PlayerId) -> Result<usize, GameError> {
        self.draw_up_to_limit(player_id)
    }

    /// 把手牌补到 `HAND_LIMIT` 张。牌耗尽时提前停止，返回实际抽到的张数。
    pub fn draw_up_to_limit(&mut self, player_id: PlayerId) -> Result<usize, GameError> {
        let player = self.players.get_mut(&player_id).ok_or(GameError::PlayerNotFound)?;
        let mut drawn = 0;
        while player.hand.len() < HAND_LIMIT {
            let Some(card) = self.deck.draw(&mut self.rng) else { break };
            player.hand.push(card);
            drawn += 1;
        }
        Ok(drawn)
    }

    /// 手动洗牌，同样受损耗规则约束
    pub fn reshuffle_now(&mut self) -> bool {
        self.deck.reshuffle_now(&mut self.rng)
    }
}

// --- 核心出牌流程 ---

impl GameState {
    /// 打出一张手牌
    ///
    /// 牌先从手中移除，再按类别分派：
    /// - 资源牌：对应资源 +1
    /// - 建筑牌：支付造价，放上桌面并加分；资源不足时牌退回手中
    /// - 攻击牌：需要目标，目标有防御时只消耗防御
    /// - 特殊牌：按效果标签分派
    ///
    /// 除了建筑造价不足，打出的牌最终都会进入弃牌堆或桌面。
    pub fn play_card(
        &mut self,
        player_id: PlayerId,
        card_id: CardId,
        target: Option<PlayerId>,
        _extra: Option<&PlayExtra>,
    ) -> Result<PlayOutcome, GameError> {
        let player = self.player_mut(player_id)?;
        let pos = player.hand.iter().position(|c| c.id == card_id).ok_or(GameError::CardNotFound)?;
        let card = player.hand.remove(pos);
        debug!(player = %player_id, card = %card, target = ?target, "出牌");

        match card.category {
            CardCategory::Resource => self.play_resource(player_id, card),
            CardCategory::Building => self.play_building(player_id, card),
            CardCategory::Attack => self.play_attack(card, target),
            CardCategory::Special => self.play_special(player_id, card, target),
        }
    }

    fn play_resource(&mut self, player_id: PlayerId, card: Card) -> Result<PlayOutcome, GameError> {
        let player = self.players.get_mut(&player_id).ok_or(GameError::PlayerNotFound)?;
        if let Some(kind) = card.produces {
            player.gain(kind, 1);
        }
        // 资源只记数量，牌本身进入弃牌堆
        self.deck.discard(card);
        Ok(PlayOutcome::Applied)
    }

    fn play_building(&mut self, player_id: PlayerId, card: Card) -> Result<PlayOutcome, GameError> {
        let player = self.players.get_mut(&player_id).ok_or(GameError::PlayerNotFound)?;
        if !player.can_afford(&card.cost) {
            player.hand.push(card);
            return Err(GameError::InsufficientResources);
        }
        for (&kind, &amount) in &card.cost {
            player.spend(kind, amount);
        }
        player.score += card.points;
        player.buildings.push(card);
        Ok(PlayOutcome::Applied)
    }

    fn play_attack(&mut self, card: Card, target: Option<PlayerId>) -> Result<PlayOutcome, GameError> {
        let victim = match target {
            Some(id) => self.players.get_mut(&id),
            None => None,
        };
        let Some(victim) = victim else {
            self.deck.discard(card);
            return Err(GameError::InvalidTarget);
        };

        if victim.has_defense {
            victim.has_defense = false;
            self.deck.discard(card);
            return Ok(PlayOutcome::AttackCanceled);
        }

        match card.effect {
            Some(Effect::Riot) => {
                // 按 stone, wood, knowledge, gold 的顺序摧毁第一个非零资源
                if let Some(count) = victim.resources.values_mut().find(|n| **n > 0) {
                    *count -= 1;
                }
            }
            Some(Effect::Fire) => {
                if let Some(destroyed) = victim.buildings.pop() {
                    self.deck.discard(destroyed);
                }
            }
            _ => {}
        }

        self.deck.discard(card);
        Ok(PlayOutcome::Applied)
    }

    fn play_special(
        &mut self,
        player_id: PlayerId,
        card: Card,
        target: Option<PlayerId>,
    ) -> Result<PlayOutcome, GameError> {
        let outcome = match card.effect {
            Some(Effect::Defense) => {
                self.player_mut(player_id)?.has_defense = true;
                Ok(PlayOutcome::Applied)
            }
            Some(Effect::SwapResource) => self.swap_resource(player_id, target),
            Some(Effect::StealCard) => self.steal_card(player_id, target),
            Some(Effect::Takeover) => self.takeover(player_id, target),
            _ => Ok(PlayOutcome::Unimplemented),
        };
        self.deck.discard(card);
        outcome
    }

    fn resolve_target(&self, target: Option<PlayerId>) -> Result<PlayerId, GameError> {
        target.filter(|id| self.players.contains_key(id)).ok_or(GameError::InvalidTarget)
    }

    /// 双方各从自己持有的资源种类中随机选一种，交换一个单位。
    /// 两边选中同一种时数量不变。
    fn swap_resource(&mut self, player_id: PlayerId, target: Option<PlayerId>) -> Result<PlayOutcome, GameError> {
        let target_id = self.resolve_target(target)?;
        let mine = self.player(player_id)?.held_kinds();
        let theirs = self.player(target_id)?.held_kinds();

        let (Some(&my_kind), Some(&their_kind)) = (mine.choose(&mut self.rng), theirs.choose(&mut self.rng)) else {
            return Err(GameError::NoResourcesToSwap);
        };

        // 逐个修改，行动者和目标是同一人时效果互相抵消
        let actor = self.player_mut(player_id)?;
        actor.spend(my_kind, 1);
        actor.gain(their_kind, 1);
        let other = self.player_mut(target_id)?;
        other.spend(their_kind, 1);
        other.gain(my_kind, 1);

        debug!(player = %player_id, target = %target_id, gave = %my_kind, got = %their_kind, "交换资源");
        Ok(PlayOutcome::Applied)
    }

    fn steal_card(&mut self, player_id: PlayerId, target: Option<PlayerId>) -> Result<PlayOutcome, GameError> {
        let target_id = self.resolve_target(target)?;
        self.player(player_id)?;

        let hand_len = self.player(target_id)?.hand.len();
        if hand_len == 0 {
            return Ok(PlayOutcome::Applied);
        }
        let idx = self.rng.random_range(0..hand_len);
        let stolen = self.player_mut(target_id)?.hand.remove(idx);
        self.player_mut(player_id)?.hand.push(stolen);
        Ok(PlayOutcome::Applied)
    }

    /// 交换双方的全部资源、建筑和分数
    fn takeover(&mut self, player_id: PlayerId, target: Option<PlayerId>) -> Result<PlayOutcome, GameError> {
        let target_id = self.resolve_target(target)?;
        self.player(player_id)?;

        let mine = self.player_mut(player_id)?.take_city();
        let theirs = self.player_mut(target_id)?.take_city();
        self.player_mut(player_id)?.set_city(theirs);
        self.player_mut(target_id)?.set_city(mine);
        Ok(PlayOutcome::Applied)
    }
}

// --- 单元测试 ---
