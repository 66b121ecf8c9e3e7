//! Settings validation, run on every decode and before every save.

use std::collections::HashSet;

use serde_json::Value;

use crate::{
    error::{Error, Result},
    schema::{Method, MethodType, Settings, TelegramConfig},
};

/// Decode and validate a single raw method entry.
///
/// `os` accepts any payload (absent, `null` or `{}`); the type tag alone is
/// the whole configuration.
pub fn decode_method(kind: &str, config: Option<Value>) -> Result<Method> {
    match kind.parse::<MethodType>()? {
        MethodType::Telegram => {
            let Some(raw) = config else {
                return Err(Error::validation("missing telegram config"));
            };
            let config: TelegramConfig = serde_json::from_value(raw)
                .map_err(|e| Error::validation(format!("decode telegram config: {e}")))?;
            Method::telegram(config)
        },
        MethodType::Os => Ok(Method::Os),
    }
}

/// Each method must validate and no type may appear twice.
pub fn validate_methods(methods: &[Method]) -> Result<()> {
    let mut seen = HashSet::new();
    for (index, method) in methods.iter().enumerate() {
        method.validate().map_err(|e| e.at_method(index))?;
        if !seen.insert(method.method_type()) {
            return Err(Error::validation(format!(
                "duplicate method type {:?}",
                method.method_type().as_str()
            ))
            .at_method(index));
        }
    }
    Ok(())
}

/// Checks applied before persisting: at least one method, all valid.
pub fn validate_for_save(settings: &Settings) -> Result<()> {
    if settings.methods.is_empty() {
        return Err(Error::validation(
            "at least one notification method is required",
        ));
    }
    validate_methods(&settings.methods)
}
