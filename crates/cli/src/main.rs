mod config_commands;

use std::{io::IsTerminal, process::ExitCode, sync::Arc};

use {
    anyhow::{Context, Result, bail},
    clap::{Parser, Subcommand},
    notify_mcp_channels::{Dispatcher, Notifier, SenderRegistry},
    notify_mcp_config::ConfigStore,
    notify_mcp_desktop::DesktopSender,
    notify_mcp_mcp::{McpServer, NotifyTool},
    notify_mcp_telegram::TelegramSender,
    tokio_util::sync::CancellationToken,
    tracing::{info, warn},
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

use crate::config_commands::{ConfigArgs, SETUP_HINT};

#[derive(Parser)]
#[command(
    name = "notify-mcp",
    version,
    about = "MCP server that notifies you when an AI task needs attention"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    /// Custom config directory (overrides the default <user-config-dir>/notify-mcp/).
    #[arg(long, global = true, env = "NOTIFY_MCP_CONFIG_DIR")]
    config_dir: Option<std::path::PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the `notify` tool over MCP stdio (default when no subcommand is provided).
    Serve,
    /// Show or update the notification settings.
    Config(ConfigArgs),
    /// Send one notification now, as the `notify` tool would.
    Send {
        /// Short title of the current task.
        #[arg(long, default_value = "")]
        task: String,
    },
}

impl Commands {
    fn failure_prefix(&self) -> &'static str {
        match self {
            Self::Serve => "服务启动失败",
            Self::Config(_) => "配置命令失败",
            Self::Send { .. } => "发送通知失败",
        }
    }
}

/// Logs go to stderr: stdout carries the MCP protocol.
fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    if cli.json_logs {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(std::io::stderr().is_terminal())
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

fn build_notifier(store: ConfigStore) -> Result<Notifier> {
    let telegram = TelegramSender::new().context("build telegram client")?;
    let registry = SenderRegistry::new()
        .with(Arc::new(telegram))
        .with(Arc::new(DesktopSender::new()));
    Ok(Notifier::new(store, Dispatcher::new(registry)))
}

async fn serve(store: ConfigStore) -> Result<()> {
    let settings = match store.load() {
        Ok(settings) => settings,
        Err(e) if e.is_not_configured() => bail!("尚未配置通知方式，请运行 `{SETUP_HINT}`"),
        Err(e) => return Err(e.into()),
    };
    if settings.methods.is_empty() {
        bail!("当前通知配置为空，请运行 `notify-mcp config --method ...` 添加至少一种通知方式");
    }

    info!(path = %store.path().display(), "loaded notification settings");
    info!(methods = ?settings.method_types(), "settings validated");

    let server = McpServer::new().with_tool(Arc::new(NotifyTool::new(build_notifier(store)?)));
    info!("notify-mcp ready, waiting for an MCP client on stdio");
    notify_mcp_mcp::serve_stdio(server).await?;
    info!("stdin closed, shutting down");
    Ok(())
}

async fn send(store: ConfigStore, task: &str) -> Result<()> {
    let notifier = build_notifier(store)?;
    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupted, cancelling notification");
            on_interrupt.cancel();
        }
    });

    let outcome = notifier.notify(task, &cancel).await?;
    if !outcome.is_success() {
        bail!("{}", outcome.summary());
    }
    println!("{}", outcome.summary());
    Ok(())
}

async fn run(command: Commands) -> Result<()> {
    let store = ConfigStore::from_default_location()?;
    match command {
        Commands::Serve => serve(store).await,
        Commands::Config(args) => config_commands::handle_config(&store, args),
        Commands::Send { task } => send(store, &task).await,
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_telemetry(&cli);

    info!(version = env!("CARGO_PKG_VERSION"), "notify-mcp starting");

    if let Some(ref dir) = cli.config_dir {
        notify_mcp_config::set_config_dir(dir.clone());
    }

    let command = cli.command.unwrap_or(Commands::Serve);
    let prefix = command.failure_prefix();
    match run(command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{prefix}: {e:#}");
            ExitCode::FAILURE
        },
    }
}
