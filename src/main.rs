//! Wren - Rust 中文对话助手
//!
//! 入口：加载配置、初始化日志、装配 Agent，然后在标准输入上逐行对话。

use std::io::Write;
use std::path::PathBuf;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader};
use wren::agent::{create_agent_components, create_long_term_store, create_session, process_message};
use wren::config::load_config;
use wren::observability;
use wren::speech::SpeechPlayer;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let cfg = load_config(config_path).context("Failed to load config")?;
    observability::init(&cfg.app.log_level);
    cfg.validate().context("Invalid config")?;

    let components = create_agent_components(&cfg);
    let mut session = create_session(&cfg, create_long_term_store(&cfg));
    let speech = SpeechPlayer::new(&cfg.speech);

    let name = cfg.app.name.as_deref().unwrap_or("wren");
    println!("{name} 已启动（模型：{}），输入问题开始对话，输入 exit 退出。", session.model);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("你: ");
        let _ = std::io::stdout().flush();

        let Some(line) = lines.next_line().await.context("Failed to read stdin")? else {
            break;
        };
        let input = line.trim();
        if input.eq_ignore_ascii_case("exit") {
            break;
        }
        if input.is_empty() {
            println!("请输入有效的问题");
            continue;
        }

        let (next, result) = process_message(&components, session, input).await;
        session = next;
        match result {
            Ok(answer) => {
                println!("Agent: {answer}");
                speech.speak(&answer).await;
            }
            Err(e) => println!("{}", e.user_message()),
        }
    }

    speech.stop().await;
    println!("再见！");
    Ok(())
}
