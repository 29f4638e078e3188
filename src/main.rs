//! Concierge 命令行入口
//!
//! 加载配置、创建并初始化一个会话，然后逐行读取标准输入作为用户提问。
//! `/yes`、`/no`、`/reason <文本>` 操作回答反馈，`/quit` 退出。

use anyhow::Context;
use concierge::config::load_config;
use concierge::react::ReactEvent;
use concierge::{Bootstrap, Session};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

const CANNOT_COMPLETE: &str = "回答を生成できませんでした。時間をおいて再度お試しください。";

fn print_event(ev: &ReactEvent) {
    match ev {
        ReactEvent::ToolCall { tool, input } => eprintln!("  → {tool}({input})"),
        ReactEvent::Observation { tool, preview } => eprintln!("  ← {tool}: {preview}"),
        ReactEvent::InvalidTool { observation, .. } => eprintln!("  ! {observation}"),
        ReactEvent::ParseError { detail } => eprintln!("  ! {detail}"),
        ReactEvent::IterationLimit { max_iterations } => {
            eprintln!("  ! iteration limit ({max_iterations}) reached")
        }
        _ => {}
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = load_config(std::env::args().nth(1).map(Into::into))
        .context("Failed to load config")?;

    let mut session = Session::new();
    session
        .initialize(&Bootstrap::new(cfg))
        .context("Failed to initialize session")?;

    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<ReactEvent>();
    tokio::spawn(async move {
        while let Some(ev) = event_rx.recv().await {
            print_event(&ev);
        }
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match line {
            "/quit" => break,
            "/yes" => {
                if session.feedback_mut().is_some_and(|f| f.press_yes()) {
                    println!("ご意見ありがとうございます。");
                }
            }
            "/no" => {
                if session.feedback_mut().is_some_and(|f| f.press_no()) {
                    println!("ご不満な点を /reason <内容> で教えてください。");
                }
            }
            _ if line.starts_with("/reason ") => {
                let reason = line.trim_start_matches("/reason ").trim();
                if session.feedback_mut().is_some_and(|f| f.submit_reason(reason)) {
                    println!("ご意見ありがとうございます。");
                }
            }
            question => match session.handle_input(question, Some(&event_tx)).await {
                Ok(outcome) => {
                    println!("{}", outcome.answer);
                    println!("(回答に満足しましたか？ /yes /no)");
                }
                Err(_) => println!("{CANNOT_COMPLETE}"),
            },
        }
    }

    session.teardown();
    Ok(())
}
