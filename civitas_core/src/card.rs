use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

pub type CardId = Uuid;

/// 资源数量表。`BTreeMap` 按 `ResourceKind` 的声明顺序迭代 (stone, wood, knowledge, gold)。
pub type Resources = BTreeMap<ResourceKind, u32>;

// --- 核心数据结构定义 ---

/// 资源种类 (ResourceKind)
/// 变体顺序即规则中的固定顺序，派生的 `Ord` 依赖于此。
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Stone,     // 石头 Akmens
    Wood,      // 木头 Koks
    Knowledge, // 知识 Zināšanas
    Gold,      // 金子 Zelts
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 4] = [
        ResourceKind::Stone,
        ResourceKind::Wood,
        ResourceKind::Knowledge,
        ResourceKind::Gold,
    ];

    /// 所有种类数量为 0 的资源表
    pub fn empty_pool() -> Resources {
        Self::ALL.iter().map(|&kind| (kind, 0)).collect()
    }
}

/// 卡牌类别 (CardCategory)
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardCategory {
    Resource, // 资源牌
    Building, // 建筑牌
    Attack,   // 攻击牌
    Special,  // 特殊牌
}

/// 攻击牌与特殊牌的效果标签 (Effect)
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Effect {
    Riot,         // 暴乱：摧毁目标一个资源
    Fire,         // 火灾：摧毁目标最后建造的建筑
    Defense,      // 防御：抵挡下一次攻击
    SwapResource, // 交换：双方随机交换一个资源
    StealCard,    // 密约：随机偷取目标一张手牌
    Takeover,     // 接管：交换整座城市
}

/// 单张卡牌 (Card)
/// 同名卡牌除 `id` 外完全相同。
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct Card {
    pub id: CardId,
    pub name: String,
    pub category: CardCategory,
    pub image: String,
    /// 资源牌产出的资源种类，其余类别为 None
    pub produces: Option<ResourceKind>,
    /// 建筑牌的造价，其余类别为空
    pub cost: Resources,
    /// 建筑牌的分值，其余类别为 0
    pub points: u32,
    pub effect: Option<Effect>,
}

impl Card {
    pub fn resource(name: &str, image: &str, kind: ResourceKind) -> Card {
        Card {
            id: Uuid::new_v4(),
            name: name.to_string(),
            category: CardCategory::Resource,
            image: image.to_string(),
            produces: Some(kind),
            cost: Resources::new(),
            points: 0,
            effect: None,
        }
    }

    pub fn building(name: &str, image: &str, cost: &[ResourceKind], points: u32) -> Card {
        Card {
            id: Uuid::new_v4(),
            name: name.to_string(),
            category: CardCategory::Building,
            image: image.to_string(),
            produces: None,
            cost: cost.iter().map(|&kind| (kind, 1)).collect(),
            points,
            effect: None,
        }
    }

    pub fn action(name: &str, image: &str, category: CardCategory, effect: Effect) -> Card {
        Card {
            id: Uuid::new_v4(),
            name: name.to_string(),
            category,
            image: image.to_string(),
            produces: None,
            cost: Resources::new(),
            points: 0,
            effect: Some(effect),
        }
    }
}

/// 卡牌目录中的一行：一种卡牌及其在牌堆中的张数
#[derive(Debug, Clone, Copy)]
pub struct CatalogEntry {
    pub name: &'static str,
    pub image: &'static str,
    pub kind: CatalogKind,
    pub copies: usize,
}

#[derive(Debug, Clone, Copy)]
pub enum CatalogKind {
    Resource(ResourceKind),
    Building { cost: &'static [ResourceKind], points: u32 },
    Attack(Effect),
    Special(Effect),
}

impl CatalogEntry {
    /// 生成一张新卡，每次调用都会分配新的 id
    pub fn instantiate(&self) -> Card {
        match self.kind {
            CatalogKind::Resource(kind) => Card::resource(self.name, self.image, kind),
            CatalogKind::Building { cost, points } => Card::building(self.name, self.image, cost, points),
            CatalogKind::Attack(effect) => Card::action(self.name, self.image, CardCategory::Attack, effect),
            CatalogKind::Special(effect) => Card::action(self.name, self.image, CardCategory::Special, effect),
        }
    }
}

use ResourceKind::{Gold, Knowledge, Stone, Wood};

/// 完整的卡牌目录，共 63 张。
/// 旧注释中写的 72 张与实际张数不符，以这里的张数为准。
#[rustfmt::skip]
pub const CATALOG: &[CatalogEntry] = &[
    // --- 资源牌 (25) ---
    CatalogEntry { name: "Akmens", image: "akmens.png", kind: CatalogKind::Resource(Stone), copies: 7 },
    CatalogEntry { name: "Koks", image: "koks.png", kind: CatalogKind::Resource(Wood), copies: 7 },
    CatalogEntry { name: "Zināšanas", image: "zināšanas.png", kind: CatalogKind::Resource(Knowledge), copies: 6 },
    CatalogEntry { name: "Zelts", image: "zelts.png", kind: CatalogKind::Resource(Gold), copies: 5 },
    // --- 建筑牌 (19) ---
    CatalogEntry { name: "Mūris", image: "mūris.png", kind: CatalogKind::Building { cost: &[Stone], points: 1 }, copies: 3 },
    CatalogEntry { name: "Tilts", image: "tilts.png", kind: CatalogKind::Building { cost: &[Stone, Knowledge], points: 2 }, copies: 3 },
    CatalogEntry { name: "Tornis", image: "tornis.png", kind: CatalogKind::Building { cost: &[Stone, Wood], points: 2 }, copies: 3 },
    CatalogEntry { name: "Bibliotēka", image: "bibliotēka.png", kind: CatalogKind::Building { cost: &[Knowledge, Wood], points: 2 }, copies: 3 },
    CatalogEntry { name: "Lielā zāle", image: "lielā_zāle.png", kind: CatalogKind::Building { cost: &[Stone, Gold, Wood], points: 3 }, copies: 3 },
    CatalogEntry { name: "Tirgus laukums", image: "tirgus_laukums.png", kind: CatalogKind::Building { cost: &[Gold, Knowledge, Wood], points: 3 }, copies: 2 },
    CatalogEntry { name: "Pils", image: "pils.png", kind: CatalogKind::Building { cost: &[Stone, Knowledge, Wood, Gold], points: 4 }, copies: 2 },
    // --- 攻击牌 (8) ---
    CatalogEntry { name: "Nemieri", image: "nemieri.png", kind: CatalogKind::Attack(Effect::Riot), copies: 4 },
    CatalogEntry { name: "Ugunsgrēks", image: "ugunsgrēks.png", kind: CatalogKind::Attack(Effect::Fire), copies: 4 },
    // --- 特殊牌 (11) ---
    CatalogEntry { name: "Aizsardzība", image: "aizsardzība.png", kind: CatalogKind::Special(Effect::Defense), copies: 3 },
    CatalogEntry { name: "Apmaiņa", image: "apmaiņa.png", kind: CatalogKind::Special(Effect::SwapResource), copies: 3 },
    CatalogEntry { name: "Slepenais darījums", image: "slepenais_darījums.png", kind: CatalogKind::Special(Effect::StealCard), copies: 3 },
    CatalogEntry { name: "Pārņemšana", image: "pārņemšana.png", kind: CatalogKind::Special(Effect::Takeover), copies: 2 },
];

/// 按目录生成一副完整 (未洗) 的牌
pub fn build_catalog_deck() -> Vec<Card> {
    let total = CATALOG.iter().map(|entry| entry.copies).sum();
    let mut deck = Vec::with_capacity(total);
    for entry in CATALOG {
        for _ in 0..entry.copies {
            deck.push(entry.instantiate());
        }
    }
    deck
}

// --- 实现辅助功能 ---

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", match self {
            ResourceKind::Stone => "stone",
            ResourceKind::Wood => "wood",
            ResourceKind::Knowledge => "knowledge",
            ResourceKind::Gold => "gold",
        })
    }
}

impl fmt::Display for CardCategory {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", match self {
            CardCategory::Resource => "资源",
            CardCategory::Building => "建筑",
            CardCategory::Attack => "攻击",
            CardCategory::Special => "特殊",
        })
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}[{}]", self.name, self.category)
    }
}

// --- 单元测试 ---
