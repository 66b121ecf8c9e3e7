use {
    anyhow::{Result, bail},
    clap::Args,
    notify_mcp_config::{ConfigStore, Method, MethodType, Settings, TelegramConfig},
};

/// Hint printed when nothing has been configured yet.
pub const SETUP_HINT: &str = "notify-mcp config --method telegram --chat-id ... --token ... [--api-url ...] 或 --method os";

#[derive(Args, Debug, Default)]
pub struct ConfigArgs {
    /// Notification method to update or remove (telegram, os).
    #[arg(long)]
    pub method: Option<String>,
    /// Telegram API base URL, defaults to https://api.telegram.org.
    #[arg(long)]
    pub api_url: Option<String>,
    /// Telegram chat id.
    #[arg(long)]
    pub chat_id: Option<String>,
    /// Telegram bot token.
    #[arg(long)]
    pub token: Option<String>,
    /// Notification body. An empty value restores the default text.
    #[arg(long)]
    pub message: Option<String>,
    /// Remove the method given by --method.
    #[arg(long)]
    pub remove: bool,
}

impl ConfigArgs {
    fn api_url(&self) -> Option<&str> {
        non_empty(&self.api_url)
    }

    fn chat_id(&self) -> Option<&str> {
        non_empty(&self.chat_id)
    }

    fn token(&self) -> Option<&str> {
        non_empty(&self.token)
    }

    fn has_telegram_flags(&self) -> bool {
        self.api_url().is_some() || self.chat_id().is_some() || self.token().is_some()
    }

    fn method_change_requested(&self) -> bool {
        non_empty(&self.method).is_some() || self.has_telegram_flags() || self.remove
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

/// What `config` did, for the caller to report.
#[derive(Debug, PartialEq, Eq)]
pub enum ConfigOutcome {
    /// Current settings, pretty-printed.
    Shown(String),
    Saved,
}

pub fn handle_config(store: &ConfigStore, args: ConfigArgs) -> Result<()> {
    match run(store, args)? {
        ConfigOutcome::Shown(json) => println!("{json}"),
        ConfigOutcome::Saved => eprintln!("配置已保存。"),
    }
    Ok(())
}

pub fn run(store: &ConfigStore, args: ConfigArgs) -> Result<ConfigOutcome> {
    let method_change = args.method_change_requested();
    if !method_change && args.message.is_none() {
        return show(store).map(ConfigOutcome::Shown);
    }

    let method = non_empty(&args.method);
    if method_change && method.is_none() {
        bail!("更新通知配置时必须通过 --method 指定通知方式");
    }

    let mut settings = match store.load() {
        Ok(settings) => settings,
        Err(e) if e.is_not_configured() => {
            if args.remove {
                bail!("当前尚未配置任何通知方式，无法移除");
            }
            Settings::default()
        },
        Err(e) => return Err(e.into()),
    };

    if let Some(method) = method {
        let Ok(kind) = method.parse::<MethodType>() else {
            bail!("不支持的通知方式: {method}");
        };
        if args.remove {
            if args.has_telegram_flags() {
                bail!("移除通知方式时无需提供 --api-url/--chat-id/--token 参数");
            }
            if !settings.remove(kind) {
                bail!("通知方式 {kind} 尚未配置");
            }
        } else {
            settings.upsert(build_method(kind, &args)?);
        }
    }

    if let Some(message) = args.message {
        settings.notification_message = message;
    }

    if settings.methods.is_empty() {
        bail!("请至少指定一种通知方式（例如 Telegram 或 os）");
    }

    store.save(&settings)?;
    Ok(ConfigOutcome::Saved)
}

fn build_method(kind: MethodType, args: &ConfigArgs) -> Result<Method> {
    match kind {
        MethodType::Telegram => {
            let (Some(chat_id), Some(token)) = (args.chat_id(), args.token()) else {
                bail!("更新 Telegram 配置时必须提供 --chat-id, --token，可选 --api-url");
            };
            let config = TelegramConfig::new(args.api_url().map(str::to_string), chat_id, token);
            Ok(Method::telegram(config)?)
        },
        MethodType::Os => {
            if args.has_telegram_flags() {
                bail!("操作系统通知无需 --api-url/--chat-id/--token 参数");
            }
            Ok(Method::os())
        },
    }
}

fn show(store: &ConfigStore) -> Result<String> {
    let settings = match store.load() {
        Ok(settings) => settings,
        Err(e) if e.is_not_configured() => bail!("尚未配置通知方式，请运行 `{SETUP_HINT}`"),
        Err(e) => return Err(e.into()),
    };
    Ok(serde_json::to_string_pretty(&settings)?)
}
