//! # Civitas 规则核心库
//!
//! 这个 `core` crate 包含了卡牌游戏的全部规则：卡牌目录、牌堆管理、
//! 玩家状态、出牌效果的结算，以及客户端-服务器通信消息的定义。
//! 它不关心房间和网络连接，服务器把已经解析好的 (游戏, 玩家) 交给它，
//! 再把它返回的结果和视图发出去。

mod card;
mod deck;
mod error;
mod logic;
mod message;
mod state;

pub use card::*;

pub use deck::*;

pub use error::*;

pub use logic::*;

pub use message::*;

pub use state::*;
