//! Settings schema: the configured notification methods and their payloads.

use std::{fmt, str::FromStr};

use {
    secrecy::{ExposeSecret, Secret},
    serde::{Deserialize, Deserializer, Serialize, Serializer, ser::SerializeMap},
};

use crate::error::{Error, Result};

/// Body used when the stored notification message is blank.
pub const DEFAULT_NOTIFICATION_MESSAGE: &str = "即将进行汇报，请注意查看...";

/// Public Telegram Bot API endpoint.
pub const DEFAULT_TELEGRAM_API_BASE_URL: &str = "https://api.telegram.org";

/// Kind of delivery channel. Acts as the unique key of a [`Method`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MethodType {
    Telegram,
    Os,
}

impl MethodType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Telegram => "telegram",
            Self::Os => "os",
        }
    }
}

impl fmt::Display for MethodType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MethodType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "telegram" => Ok(Self::Telegram),
            "os" => Ok(Self::Os),
            "" => Err(Error::validation("missing method type")),
            other => Err(Error::validation(format!(
                "unsupported method type {other:?}"
            ))),
        }
    }
}

/// Telegram bot credentials and endpoint.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TelegramConfig {
    #[serde(deserialize_with = "null_as_empty")]
    pub api_base_url: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub chat_id: String,
    /// Bot token from @BotFather.
    #[serde(
        serialize_with = "serialize_secret",
        deserialize_with = "null_as_empty_secret"
    )]
    pub token: Secret<String>,
}

impl TelegramConfig {
    /// Build a config, falling back to the public API endpoint when no base URL is given.
    pub fn new(
        api_base_url: Option<String>,
        chat_id: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        let api_base_url = api_base_url
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_TELEGRAM_API_BASE_URL.to_string());
        Self {
            api_base_url,
            chat_id: chat_id.into(),
            token: Secret::new(token.into()),
        }
    }

    /// All three fields must be present. Nothing is defaulted here.
    pub fn validate(&self) -> Result<()> {
        if self.api_base_url.is_empty() {
            return Err(Error::validation("missing telegram api base url"));
        }
        if self.chat_id.is_empty() {
            return Err(Error::validation("missing telegram chat id"));
        }
        if self.token.expose_secret().is_empty() {
            return Err(Error::validation("missing telegram token"));
        }
        Ok(())
    }
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            api_base_url: String::new(),
            chat_id: String::new(),
            token: Secret::new(String::new()),
        }
    }
}

impl PartialEq for TelegramConfig {
    fn eq(&self, other: &Self) -> bool {
        self.api_base_url == other.api_base_url
            && self.chat_id == other.chat_id
            && self.token.expose_secret() == other.token.expose_secret()
    }
}

impl Eq for TelegramConfig {}

impl fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("api_base_url", &self.api_base_url)
            .field("chat_id", &self.chat_id)
            .field("token", &"[REDACTED]")
            .finish()
    }
}

fn serialize_secret<S: Serializer>(
    secret: &Secret<String>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(secret.expose_secret())
}

/// Read a string field, treating an explicit `null` like an absent one.
pub(crate) fn null_as_empty<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

fn null_as_empty_secret<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Secret<String>, D::Error> {
    null_as_empty(deserializer).map(Secret::new)
}

/// One configured delivery channel with its decoded payload.
///
/// On disk a method is `{"type": "...", "config": {...}}`; `os` carries no
/// payload and is written without a `config` key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Method {
    Telegram(TelegramConfig),
    Os,
}

impl Method {
    /// Validate the config and wrap it as a Telegram method.
    pub fn telegram(config: TelegramConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::Telegram(config))
    }

    pub fn os() -> Self {
        Self::Os
    }

    pub fn method_type(&self) -> MethodType {
        match self {
            Self::Telegram(_) => MethodType::Telegram,
            Self::Os => MethodType::Os,
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            Self::Telegram(config) => config.validate(),
            Self::Os => Ok(()),
        }
    }

    pub fn as_telegram(&self) -> Option<&TelegramConfig> {
        match self {
            Self::Telegram(config) => Some(config),
            Self::Os => None,
        }
    }
}

impl Serialize for Method {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("type", &self.method_type())?;
        if let Self::Telegram(config) = self {
            map.serialize_entry("config", config)?;
        }
        map.end()
    }
}

/// Root settings document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub methods: Vec<Method>,
    /// Stored verbatim; see [`Settings::effective_notification_message`].
    #[serde(skip_serializing_if = "String::is_empty")]
    pub notification_message: String,
}

impl Settings {
    /// The message body to send, falling back to the default when blank.
    pub fn effective_notification_message(&self) -> &str {
        if self.notification_message.trim().is_empty() {
            DEFAULT_NOTIFICATION_MESSAGE
        } else {
            &self.notification_message
        }
    }

    pub fn method_types(&self) -> Vec<MethodType> {
        self.methods.iter().map(Method::method_type).collect()
    }

    /// Replace the method of the same type in place, or append it.
    pub fn upsert(&mut self, method: Method) {
        let kind = method.method_type();
        match self.methods.iter_mut().find(|m| m.method_type() == kind) {
            Some(slot) => *slot = method,
            None => self.methods.push(method),
        }
    }

    /// Remove the method of the given type. Returns whether one was removed.
    pub fn remove(&mut self, kind: MethodType) -> bool {
        let before = self.methods.len();
        self.methods.retain(|m| m.method_type() != kind);
        self.methods.len() != before
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    fn telegram(chat_id: &str) -> Method {
        Method::telegram(TelegramConfig::new(None, chat_id, "tok")).unwrap()
    }

    #[test]
    fn new_telegram_config_defaults_base_url() {
        let cfg = TelegramConfig::new(None, "42", "abc");
        assert_eq!(cfg.api_base_url, DEFAULT_TELEGRAM_API_BASE_URL);

        let cfg = TelegramConfig::new(Some("https://tg.example.com".into()), "42", "abc");
        assert_eq!(cfg.api_base_url, "https://tg.example.com");
    }

    #[test]
    fn validate_does_not_default_base_url() {
        let cfg = TelegramConfig {
            api_base_url: String::new(),
            chat_id: "42".into(),
            token: Secret::new("abc".into()),
        };
        let err = cfg.validate().unwrap_err();
        assert!(err.is_validation());
        assert!(err.to_string().contains("api base url"));
    }

    #[test]
    fn telegram_method_requires_token() {
        let err = Method::telegram(TelegramConfig::new(None, "42", "")).unwrap_err();
        assert_eq!(err.to_string(), "missing telegram token");
    }

    #[test]
    fn method_type_parse() {
        assert_eq!("telegram".parse::<MethodType>().unwrap(), MethodType::Telegram);
        assert_eq!("os".parse::<MethodType>().unwrap(), MethodType::Os);
        assert!("slack".parse::<MethodType>().unwrap_err().is_validation());
        assert_eq!(
            "".parse::<MethodType>().unwrap_err().to_string(),
            "missing method type"
        );
    }

    #[test]
    fn effective_message_falls_back_on_blank() {
        let mut settings = Settings::default();
        assert_eq!(
            settings.effective_notification_message(),
            DEFAULT_NOTIFICATION_MESSAGE
        );
        settings.notification_message = "   ".into();
        assert_eq!(
            settings.effective_notification_message(),
            DEFAULT_NOTIFICATION_MESSAGE
        );
        settings.notification_message = "done".into();
        assert_eq!(settings.effective_notification_message(), "done");
    }

    #[test]
    fn upsert_replaces_in_place() {
        let mut settings = Settings {
            methods: vec![telegram("1"), Method::os()],
            ..Default::default()
        };
        settings.upsert(telegram("2"));
        assert_eq!(settings.methods.len(), 2);
        assert_eq!(settings.methods[0], telegram("2"));
        assert_eq!(settings.methods[1], Method::Os);
    }

    #[test]
    fn upsert_appends_new_type() {
        let mut settings = Settings {
            methods: vec![Method::os()],
            ..Default::default()
        };
        settings.upsert(telegram("1"));
        assert_eq!(
            settings.method_types(),
            vec![MethodType::Os, MethodType::Telegram]
        );
    }

    #[test]
    fn remove_reports_absence() {
        let mut settings = Settings {
            methods: vec![Method::os()],
            ..Default::default()
        };
        assert!(!settings.remove(MethodType::Telegram));
        assert_eq!(settings.methods, vec![Method::Os]);
        assert!(settings.remove(MethodType::Os));
        assert!(settings.methods.is_empty());
    }

    #[test]
    fn serialize_shape() {
        let settings = Settings {
            methods: vec![telegram("42"), Method::os()],
            notification_message: String::new(),
        };
        let json = serde_json::to_value(&settings).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "methods": [
                    {
                        "type": "telegram",
                        "config": {
                            "apiBaseUrl": "https://api.telegram.org",
                            "chatId": "42",
                            "token": "tok"
                        }
                    },
                    { "type": "os" }
                ]
            })
        );
    }

    #[test]
    fn debug_redacts_token() {
        let cfg = TelegramConfig::new(None, "42", "super-secret");
        let rendered = format!("{cfg:?}");
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("[REDACTED]"));
    }
}
