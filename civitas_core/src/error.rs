use thiserror::Error;

/// 出牌或操作玩家时可能出现的错误。
/// 所有错误都可以在调用处恢复，不会破坏游戏状态。
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum GameError {
    /// 行动者手中没有这张牌
    #[error("Card not found in hand")]
    CardNotFound,
    /// 建筑造价不足，牌已退回手中
    #[error("Not enough resources")]
    InsufficientResources,
    /// 需要目标的牌没有给出目标，或目标不存在
    #[error("Invalid target")]
    InvalidTarget,
    /// 交换时某一方没有任何资源
    #[error("No resources to swap")]
    NoResourcesToSwap,
    #[error("Player not found")]
    PlayerNotFound,
}
