use std::net::SocketAddr;

use clap::Parser;

pub const ADDR_ENV: &str = "CIVITAS_ADDR";

pub const DEFAULT_ADDR: &str = "0.0.0.0:25917";

/// 服务器配置，启动时读取一次。
/// 优先级: 命令行参数 > 环境变量 > 默认值
#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(name = "civitas_server")]
#[command(about = "Civitas 房间服务器")]
pub struct ServerConfig {
    /// 监听地址
    #[arg(long, env = ADDR_ENV, default_value = DEFAULT_ADDR)]
    pub addr: SocketAddr,
}
