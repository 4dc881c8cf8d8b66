//! Ntfy-me Hub CLI
//!
//! 把集线器的五个流程动作暴露成子命令，外加配对/目标管理。

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

use ntfy_me_hub::{
    FlowActions, ImageMetadata, ImageRef, ImageStream, JsonAccumulator, RelayClient, RelayConfig,
    TargetStore,
};

#[derive(Parser)]
#[command(name = "ntfyme")]
#[command(about = "Ntfy-me Hub - 把集线器流程通知转发到 ntfy-me 中继")]
#[command(version)]
struct Cli {
    /// 目标设备（id 或显示名，默认取第一个已配对目标）
    #[arg(long, short, global = true)]
    target: Option<String>,

    /// 存储文件路径（默认在用户配置目录下）
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 发送普通消息（合法 JSON 原样透传）
    Send {
        /// 消息内容
        message: String,
    },
    /// 发送带流程名的消息
    SendFlow {
        /// 流程名（可省略）
        #[arg(long, short)]
        flow: Option<String>,
        /// 消息内容
        message: String,
    },
    /// 发送图片，caption 可以是文本或 JSON 片段
    SendImage {
        /// 图片文件路径
        file: PathBuf,
        /// caption（可省略）
        #[arg(long, short)]
        message: Option<String>,
    },
    /// 重置 JSON 累加器并写入第一对键值
    StartJson {
        /// 键
        key: String,
        /// 值
        value: String,
    },
    /// 向 JSON 累加器合并一对键值
    BuildJson {
        /// 键
        key: String,
        /// 值
        value: String,
    },
    /// 配对一个新目标
    Pair {
        /// 只预览候选，不落盘
        #[arg(long)]
        list: bool,
    },
    /// 列出已配对目标
    Targets {
        /// 输出 JSON 格式
        #[arg(long)]
        json: bool,
    },
    /// 设置目标的 bearer token
    SetToken {
        /// token 内容（空串表示清除）
        token: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // 通过 RUST_LOG 控制日志级别，默认 info，输出到 stderr
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("ntfy_me_hub=info,ntfyme=info"));

    fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .init();

    let cli = Cli::parse();

    let store_path = match &cli.store {
        Some(path) => path.clone(),
        None => TargetStore::default_path()?,
    };
    let mut store = TargetStore::load(&store_path)?;

    match cli.command {
        Commands::Send { message } => {
            let actions = build_actions(&store)?;
            let target = resolve_target(&store, cli.target.as_deref())?;
            actions.send_message(target, &message).await?;
            println!("消息已发送");
        }
        Commands::SendFlow { flow, message } => {
            let actions = build_actions(&store)?;
            let target = resolve_target(&store, cli.target.as_deref())?;
            actions
                .send_flow_message(target, flow.as_deref().unwrap_or(""), &message)
                .await?;
            println!("流程消息已发送");
        }
        Commands::SendImage { file, message } => {
            let actions = build_actions(&store)?;
            let target = resolve_target(&store, cli.target.as_deref())?;
            let image = open_image(&file).await?;
            actions
                .send_image(target, image, message.as_deref().unwrap_or(""))
                .await?;
            println!("图片已发送");
        }
        Commands::StartJson { key, value } => {
            let actions = build_actions(&store)?;
            let target = resolve_target(&store, cli.target.as_deref())?;
            let payload = actions.start_json(target, &key, &value)?;
            store.set_slots(actions.accumulator().snapshot());
            store.save()?;
            println!("{payload}");
        }
        Commands::BuildJson { key, value } => {
            let actions = build_actions(&store)?;
            let target = resolve_target(&store, cli.target.as_deref())?;
            let payload = actions.build_json(target, &key, &value)?;
            store.set_slots(actions.accumulator().snapshot());
            store.save()?;
            println!("{payload}");
        }
        Commands::Pair { list } => {
            let candidate = store.pairing_candidate();
            if list {
                println!("可配对目标: {} ({})", candidate.name, candidate.id);
            } else {
                println!("已配对: {} ({})", candidate.name, candidate.id);
                store.add_target(candidate);
                store.save()?;
            }
        }
        Commands::Targets { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(store.targets())?);
            } else if store.targets().is_empty() {
                println!("还没有配对目标，先运行 ntfyme pair");
            } else {
                for target in store.targets() {
                    let auth = if target.bearer_token().is_some() {
                        "token 已配置"
                    } else {
                        "无 token"
                    };
                    println!("  {} ({}) | {}", target.name, target.id, auth);
                }
            }
        }
        Commands::SetToken { token } => {
            let selector = match cli.target.as_deref() {
                Some(selector) => selector.to_string(),
                None => match store.targets().first() {
                    Some(target) => target.id.clone(),
                    None => bail!("还没有配对目标，先运行 ntfyme pair"),
                },
            };
            if !store.set_token(&selector, &token) {
                bail!("找不到目标: {selector}");
            }
            store.save()?;
            println!("token 已更新: {selector}");
        }
    }

    Ok(())
}

/// 用存储里的槽位状态组装动作层
fn build_actions(store: &TargetStore) -> Result<FlowActions> {
    let relay = RelayClient::new(RelayConfig::default())?;
    let accumulator = JsonAccumulator::with_slots(store.slots().clone());
    Ok(FlowActions::new(Arc::new(relay), Arc::new(accumulator)))
}

/// 解析目标：指定了 id/name 就精确匹配，否则取第一个已配对目标
fn resolve_target<'a>(
    store: &'a TargetStore,
    selector: Option<&str>,
) -> Result<Option<&'a ntfy_me_hub::Target>> {
    match selector {
        Some(selector) => match store.find(selector) {
            Some(target) => Ok(Some(target)),
            None => bail!("找不到目标: {selector}"),
        },
        None => Ok(store.targets().first()),
    }
}

/// 打开图片文件作为直接流句柄
async fn open_image(path: &PathBuf) -> Result<ImageRef> {
    let metadata = tokio::fs::metadata(path).await?;
    let file = tokio::fs::File::open(path).await?;

    let stream = ImageStream::new(file).with_metadata(ImageMetadata {
        filename: path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned()),
        content_type: None,
        length: Some(metadata.len()),
    });

    Ok(ImageRef::Stream(stream))
}
