use crate::card::{build_catalog_deck, Card, Effect};
use rand::prelude::SliceRandom;
use rand::Rng;
use tracing::debug;

/// 第几次洗回弃牌堆之后开始移除接管牌
pub const ATTRITION_THRESHOLD: u32 = 3;

/// 牌堆管理 (Deck)
///
/// 持有抽牌堆和弃牌堆。抽牌堆是一个栈，从末尾抽牌。
/// 弃牌堆的顺序没有意义。
#[derive(Debug, Clone, Default)]
pub struct Deck {
    draw_pile: Vec<Card>,
    discard_pile: Vec<Card>,
    reshuffle_count: u32,
    // 因损耗规则永久离开游戏的牌
    retired: Vec<Card>,
}

impl Deck {
    /// 按目录创建一副新牌并洗牌
    pub fn new<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let mut deck = Self::from_cards(build_catalog_deck());
        deck.draw_pile.shuffle(rng);
        deck
    }

    /// 用给定的牌作为抽牌堆 (不洗牌)，最后一张在顶部
    pub fn from_cards(cards: Vec<Card>) -> Self {
        Deck {
            draw_pile: cards,
            ..Default::default()
        }
    }

    pub fn draw_pile(&self) -> &[Card] {
        &self.draw_pile
    }

    pub fn discard_pile(&self) -> &[Card] {
        &self.discard_pile
    }

    pub fn retired(&self) -> &[Card] {
        &self.retired
    }

    pub fn reshuffle_count(&self) -> u32 {
        self.reshuffle_count
    }

    /// 抽一张牌。抽牌堆空时先尝试把弃牌堆洗回来；
    /// 仍然没有牌时返回 None，这表示牌已耗尽，不是错误。
    pub fn draw<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<Card> {
        if self.draw_pile.is_empty() {
            self.reshuffle_if_needed(rng);
        }
        self.draw_pile.pop()
    }

    pub fn discard(&mut self, card: Card) {
        self.discard_pile.push(card);
    }

    pub fn discard_all(&mut self, cards: impl IntoIterator<Item = Card>) {
        self.discard_pile.extend(cards);
    }

    /// 仅当抽牌堆为空且弃牌堆非空时，把弃牌堆洗回抽牌堆。
    /// 返回是否发生了洗牌。
    pub fn reshuffle_if_needed<R: Rng + ?Sized>(&mut self, rng: &mut R) -> bool {
        if !self.draw_pile.is_empty() || self.discard_pile.is_empty() {
            return false;
        }
        self.draw_pile = std::mem::take(&mut self.discard_pile);
        self.finish_reshuffle(rng);
        true
    }

    /// 手动洗牌：不管抽牌堆是否为空，都把弃牌堆并入抽牌堆后整体重洗。
    /// 弃牌堆为空时只打乱抽牌堆，不计入洗牌次数，返回 false。
    pub fn reshuffle_now<R: Rng + ?Sized>(&mut self, rng: &mut R) -> bool {
        if self.discard_pile.is_empty() {
            self.draw_pile.shuffle(rng);
            return false;
        }
        let discarded = std::mem::take(&mut self.discard_pile);
        self.draw_pile.extend(discarded);
        self.finish_reshuffle(rng);
        true
    }

    fn finish_reshuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.draw_pile.shuffle(rng);
        self.reshuffle_count += 1;
        debug!(
            reshuffle_count = self.reshuffle_count,
            draw_pile = self.draw_pile.len(),
            "弃牌堆已洗回抽牌堆"
        );
        if self.reshuffle_count >= ATTRITION_THRESHOLD {
            self.apply_attrition();
        }
    }

    /// 损耗规则：把接管牌从抽牌堆和弃牌堆中永久移除。
    /// 对已经过滤过的牌堆重复调用没有影响。
    fn apply_attrition(&mut self) {
        let before = self.retired.len();
        for pile in [&mut self.draw_pile, &mut self.discard_pile] {
            let (takeovers, kept): (Vec<Card>, Vec<Card>) =
                std::mem::take(pile).into_iter().partition(|c| c.effect == Some(Effect::Takeover));
            *pile = kept;
            self.retired.extend(takeovers);
        }
        let removed = self.retired.len() - before;
        if removed > 0 {
            debug!(removed, "接管牌已永久移出游戏");
        }
    }
}

// --- 单元测试 ---

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::{Card, CardCategory, ResourceKind};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    fn stone() -> Card {
        Card::resource("Akmens", "akmens.png", ResourceKind::Stone)
    }

    fn takeover() -> Card {
        Card::action("Pārņemšana", "pārņemšana.png", CardCategory::Special, Effect::Takeover)
    }

    #[test]
    fn test_new_deck_is_full_catalog() {
        let deck = Deck::new(&mut rng());
        assert_eq!(deck.draw_pile().len(), 63);
        assert!(deck.discard_pile().is_empty());
        assert_eq!(deck.reshuffle_count(), 0);
    }

    #[test]
    fn test_same_seed_same_order() {
        let a = Deck::new(&mut rng());
        let b = Deck::new(&mut rng());
        let names_a: Vec<&str> = a.draw_pile().iter().map(|c| c.name.as_str()).collect();
        let names_b: Vec<&str> = b.draw_pile().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names_a, names_b);
    }

    #[test]
    fn test_draw_from_top() {
        let first = stone();
        let top = takeover();
        let top_id = top.id;
        let mut deck = Deck::from_cards(vec![first, top]);
        assert_eq!(deck.draw(&mut rng()).map(|c| c.id), Some(top_id));
        assert_eq!(deck.draw_pile().len(), 1);
    }

    #[test]
    fn test_draw_exhausted_returns_none() {
        let mut deck = Deck::from_cards(vec![]);
        assert!(deck.draw(&mut rng()).is_none());
        assert_eq!(deck.reshuffle_count(), 0);
    }

    #[test]
    fn test_draw_reshuffles_discard_when_empty() {
        let mut r = rng();
        let mut deck = Deck::from_cards(vec![]);
        deck.discard(stone());
        deck.discard(stone());

        assert!(deck.draw(&mut r).is_some());
        assert_eq!(deck.reshuffle_count(), 1);
        assert!(deck.discard_pile().is_empty());
        assert_eq!(deck.draw_pile().len(), 1);
    }

    #[test]
    fn test_reshuffle_if_needed_requires_empty_draw_pile() {
        let mut r = rng();
        let mut deck = Deck::from_cards(vec![stone()]);
        deck.discard(stone());
        assert!(!deck.reshuffle_if_needed(&mut r));
        assert_eq!(deck.discard_pile().len(), 1);
        assert_eq!(deck.reshuffle_count(), 0);
    }

    // 把抽牌堆整体移到弃牌堆，模拟一轮出牌
    fn recycle(deck: &mut Deck) {
        let drained = std::mem::take(&mut deck.draw_pile);
        deck.discard_all(drained);
    }

    #[test]
    fn test_attrition_starts_on_third_reshuffle() {
        let mut r = rng();
        let mut deck = Deck::from_cards(vec![]);
        deck.discard(takeover());
        deck.discard(stone());

        for round in 1..=3 {
            recycle(&mut deck);
            assert!(deck.reshuffle_if_needed(&mut r));
            assert_eq!(deck.reshuffle_count(), round);
            let has_takeover = deck.draw_pile().iter().any(|c| c.effect == Some(Effect::Takeover));
            assert_eq!(has_takeover, round < ATTRITION_THRESHOLD, "第 {} 次洗牌", round);
        }

        assert_eq!(deck.draw_pile().len(), 1);
        assert_eq!(deck.retired().len(), 1);
    }

    #[test]
    fn test_attrition_is_idempotent() {
        let mut r = rng();
        let mut deck = Deck::from_cards(vec![]);
        deck.reshuffle_count = ATTRITION_THRESHOLD - 1;
        deck.discard(takeover());
        deck.discard(stone());
        deck.reshuffle_if_needed(&mut r);
        assert_eq!(deck.retired().len(), 1);

        for expected in 4..=6 {
            recycle(&mut deck);
            assert!(deck.reshuffle_if_needed(&mut r));
            assert_eq!(deck.reshuffle_count(), expected);
            assert_eq!(deck.draw_pile().len(), 1);
            assert_eq!(deck.retired().len(), 1);
        }
    }

    #[test]
    fn test_reshuffle_now_merges_piles() {
        let mut r = rng();
        let mut deck = Deck::from_cards(vec![stone(), stone()]);
        deck.discard(stone());
        assert!(deck.reshuffle_now(&mut r));
        assert_eq!(deck.draw_pile().len(), 3);
        assert!(deck.discard_pile().is_empty());
        assert_eq!(deck.reshuffle_count(), 1);
    }

    #[test]
    fn test_reshuffle_now_with_empty_discard_only_shuffles_draw_pile() {
        let mut r = rng();
        let mut deck = Deck::new(&mut r);
        let before: Vec<_> = deck.draw_pile().iter().map(|c| c.id).collect();

        assert!(!deck.reshuffle_now(&mut r));
        assert_eq!(deck.reshuffle_count(), 0);
        assert!(deck.discard_pile().is_empty());

        let after: Vec<_> = deck.draw_pile().iter().map(|c| c.id).collect();
        assert_ne!(after, before);
        let mut sorted_before = before.clone();
        let mut sorted_after = after.clone();
        sorted_before.sort();
        sorted_after.sort();
        assert_eq!(sorted_after, sorted_before);
    }

    #[test]
    fn test_reshuffle_now_applies_attrition_to_draw_pile() {
        let mut r = rng();
        let mut deck = Deck::from_cards(vec![takeover(), stone()]);
        deck.reshuffle_count = ATTRITION_THRESHOLD - 1;
        deck.discard(takeover());
        assert!(deck.reshuffle_now(&mut r));
        assert_eq!(deck.draw_pile().len(), 1);
        assert_eq!(deck.retired().len(), 2);
    }
}
