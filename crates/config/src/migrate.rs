//! Document decoding with transparent upgrade of the legacy single-channel shape.
//!
//! Current shape: `{"methods": [...], "notificationMessage": "..."}`.
//! Legacy shape: `{"apiBaseUrl": "...", "chatId": "...", "token": "..."}`,
//! implicitly one Telegram channel. Detection is by presence of the
//! `methods` key.

use {
    serde::Deserialize,
    serde_json::{Map, Value},
    tracing::debug,
};

use crate::{
    error::{Error, Result},
    schema::{Method, Settings, TelegramConfig, null_as_empty},
    validate::{decode_method, validate_methods},
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawMethod {
    #[serde(rename = "type", default, deserialize_with = "null_as_empty")]
    kind: String,
    #[serde(default)]
    config: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSettings {
    #[serde(default)]
    methods: Option<Vec<RawMethod>>,
    #[serde(default, deserialize_with = "null_as_empty")]
    notification_message: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct LegacySettings {
    #[serde(deserialize_with = "null_as_empty")]
    api_base_url: String,
    #[serde(deserialize_with = "null_as_empty")]
    chat_id: String,
    #[serde(deserialize_with = "null_as_empty")]
    token: String,
    #[serde(deserialize_with = "null_as_empty")]
    notification_message: String,
}

impl LegacySettings {
    fn into_settings(self) -> Result<Settings> {
        let config = TelegramConfig {
            api_base_url: self.api_base_url,
            chat_id: self.chat_id,
            token: secrecy::Secret::new(self.token),
        };
        Ok(Settings {
            methods: vec![Method::telegram(config)?],
            notification_message: self.notification_message,
        })
    }
}

/// Decode a settings document of either shape and validate it fully.
pub fn decode_settings(data: &[u8]) -> Result<Settings> {
    let document: Map<String, Value> =
        serde_json::from_slice(data).map_err(|e| Error::decode("decode config", e))?;

    if document.contains_key("methods") {
        return decode_current(document);
    }

    let legacy: LegacySettings = serde_json::from_value(Value::Object(document))
        .map_err(|e| Error::decode("decode legacy config", e))?;
    let settings = legacy.into_settings()?;
    debug!("upgraded legacy single-channel config to method list");
    Ok(settings)
}

fn decode_current(document: Map<String, Value>) -> Result<Settings> {
    let raw: RawSettings = serde_json::from_value(Value::Object(document))
        .map_err(|e| Error::decode("decode config", e))?;

    let methods = raw
        .methods
        .unwrap_or_default()
        .into_iter()
        .enumerate()
        .map(|(index, m)| decode_method(&m.kind, m.config).map_err(|e| e.at_method(index)))
        .collect::<Result<Vec<_>>>()?;
    validate_methods(&methods)?;

    Ok(Settings {
        methods,
        notification_message: raw.notification_message,
    })
}
