use clap::Parser;
use futures_util::{SinkExt, StreamExt};
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_tungstenite::{connect_async, tungstenite::protocol::Message};
use url::Url;
use uuid::Uuid;

use civitas_core::{ClientMessage, PlayerId, ServerMessage};

const URL_ENV: &str = "CIVITAS_URL";
const DEFAULT_URL: &str = "ws://127.0.0.1:25917/ws";

#[derive(Parser, Debug)]
#[command(name = "civitas_client")]
#[command(about = "Civitas 命令行客户端")]
struct Cli {
    /// 服务器的 WebSocket 地址 (命令行参数 > 环境变量 > 默认值)
    #[arg(env = URL_ENV, default_value = DEFAULT_URL)]
    url: Url,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let Cli { url } = Cli::parse();

    println!("正在连接到: {}", url);
    let (ws_stream, _) = connect_async(url.as_str()).await?;
    println!("连接成功!");

    let (mut write, mut read) = ws_stream.split();

    // 启动一个任务来处理从服务器接收的消息
    tokio::spawn(async move {
        while let Some(msg) = read.next().await {
            match msg {
                Ok(Message::Text(text)) => {
                    match serde_json::from_str::<ServerMessage>(&text) {
                        Ok(server_msg) => {
                            // 简单地将收到的消息打印到控制台
                            println!("\n<-- [服务器消息]:\n{:#?}\n", server_msg);
                            print!("> "); // 重新显示输入提示符
                            let _ = std::io::stdout().flush();
                        }
                        Err(e) => eprintln!("解析服务器消息失败: {}", e),
                    }
                }
                Ok(_) => {}
                Err(e) => {
                    eprintln!("接收消息时出错: {}", e);
                    break;
                }
            }
        }
    });

    // 主任务处理用户输入
    let mut stdin = BufReader::new(tokio::io::stdin()).lines();

    println!("--- Civitas 客户端 ---");
    println!("可用命令:");
    println!("  create <名字>                 - 创建一个新房间");
    println!("  join <房间号> <名字>          - 加入一个房间");
    println!("  draw                          - 把手牌补到 5 张");
    println!("  play <卡牌ID> [目标玩家ID]    - 打出一张手牌");
    println!("  reshuffle                     - 把弃牌堆洗回牌堆");
    println!("  exit                          - 退出");

    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let Some(line) = stdin.next_line().await? else { break };
        let parts: Vec<&str> = line.split_whitespace().collect();

        let client_msg = match parts.first().copied() {
            Some("create") => {
                let name = parts.get(1).copied().unwrap_or("Spēlētājs").to_string();
                ClientMessage::CreateRoom { name }
            }
            Some("join") => {
                if parts.len() < 3 {
                    println!("用法: join <房间号> <名字>");
                    continue;
                }
                ClientMessage::JoinRoom { room_code: parts[1].to_string(), name: parts[2].to_string() }
            }
            Some("draw") => ClientMessage::DrawCards,
            Some("play") => {
                let Some(card_id) = parts.get(1).and_then(|s| s.parse::<Uuid>().ok()) else {
                    println!("用法: play <卡牌ID> [目标玩家ID]");
                    continue;
                };
                let target_player_id = match parts.get(2) {
                    None => None,
                    Some(raw) => match raw.parse::<PlayerId>() {
                        Ok(id) => Some(id),
                        Err(_) => {
                            println!("无效的玩家ID: {}", raw);
                            continue;
                        }
                    },
                };
                ClientMessage::PlayCard { card_id, target_player_id, extra: None }
            }
            Some("reshuffle") => ClientMessage::ReshuffleDeck,
            Some("exit") => {
                println!("正在断开连接...");
                break;
            }
            _ => {
                println!("未知命令: {}", line);
                continue;
            }
        };

        let payload = serde_json::to_string(&client_msg)?;
        write.send(Message::Text(payload.into())).await?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_command_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_default_url() {
        if std::env::var_os(URL_ENV).is_some() {
            return;
        }
        let cli = Cli::try_parse_from(["civitas_client"]).unwrap();
        assert_eq!(cli.url.as_str(), DEFAULT_URL);
    }

    #[test]
    fn test_url_argument() {
        let cli = Cli::try_parse_from(["civitas_client", "ws://example.com:9000/ws"]).unwrap();
        assert_eq!(cli.url.host_str(), Some("example.com"));
        assert_eq!(cli.url.port(), Some(9000));
    }

    #[test]
    fn test_invalid_url_is_rejected() {
        assert!(Cli::try_parse_from(["civitas_client", "not a url"]).is_err());
    }
}
