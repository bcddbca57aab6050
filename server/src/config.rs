//! Server Configuration
//!
//! Loads configuration from environment variables.

use anyhow::{bail, Context, Result};
use std::env;
use wx_crypto::MessageCrypto;

use crate::message::EchoHandler;

/// Server configuration loaded from environment variables.
#[derive(Clone)]
pub struct Config {
    /// Application id issued by the platform
    pub appid: String,

    /// Application secret
    pub appsecret: String,

    /// Push verification token (required in encrypted mode)
    pub token: Option<String>,

    /// 43-character AES key from the platform console (required in encrypted mode)
    pub encoding_aes_key: Option<String>,

    /// Whether push bodies are encrypted (default: false)
    pub encrypted: bool,

    /// Registry names of the handlers to run, in order (default: "echo")
    pub handlers: Vec<String>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let config = Self {
            appid: env::var("WX_APPID").context("WX_APPID must be set")?,
            appsecret: env::var("WX_APPSECRET").context("WX_APPSECRET must be set")?,
            token: env::var("WX_TOKEN").ok(),
            encoding_aes_key: env::var("WX_ENCODING_AES_KEY").ok(),
            encrypted: env::var("WX_ENCRYPTED")
                .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true"))
                .unwrap_or(false),
            handlers: env::var("WX_HANDLERS").map_or_else(
                |_| vec![EchoHandler::NAME.to_string()],
                |s| {
                    s.split(',')
                        .map(|t| t.trim().to_string())
                        .filter(|t| !t.is_empty())
                        .collect()
                },
            ),
        };

        if config.encrypted {
            if config.token.is_none() {
                bail!("WX_TOKEN must be set when WX_ENCRYPTED is enabled");
            }
            if config.encoding_aes_key.is_none() {
                bail!("WX_ENCODING_AES_KEY must be set when WX_ENCRYPTED is enabled");
            }
        }

        Ok(config)
    }

    /// Build the crypto instance for encrypted mode, or `None` in plaintext mode.
    pub fn message_crypto(&self) -> Result<Option<MessageCrypto>> {
        if !self.encrypted {
            return Ok(None);
        }
        let token = self.token.as_deref().context("WX_TOKEN is not configured")?;
        let key = self
            .encoding_aes_key
            .as_deref()
            .context("WX_ENCODING_AES_KEY is not configured")?;

        MessageCrypto::new(token, key, &self.appid)
            .map(Some)
            .context("Invalid WX_ENCODING_AES_KEY")
    }

    /// Create a default configuration for testing.
    ///
    /// Encrypted mode with the platform's published sample key.
    #[must_use]
    pub fn default_for_test() -> Self {
        Self {
            appid: "wx2c2769f8efd9abc2".into(),
            appsecret: "test-secret".into(),
            token: Some("faketoken".into()),
            encoding_aes_key: Some("abcdefghijklmnopqrstuvwxyz0123456789ABCDEFG".into()),
            encrypted: true,
            handlers: vec![EchoHandler::NAME.into()],
        }
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("appid", &self.appid)
            .field("encrypted", &self.encrypted)
            .field("handlers", &self.handlers)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const VARS: [&str; 6] = [
        "WX_APPID",
        "WX_APPSECRET",
        "WX_TOKEN",
        "WX_ENCODING_AES_KEY",
        "WX_ENCRYPTED",
        "WX_HANDLERS",
    ];

    fn clear_env() {
        for var in VARS {
            env::remove_var(var);
        }
    }

    #[test]
    #[serial]
    fn plaintext_defaults() {
        clear_env();
        env::set_var("WX_APPID", "wxappid");
        env::set_var("WX_APPSECRET", "secret");

        let config = Config::from_env().unwrap();
        assert!(!config.encrypted);
        assert_eq!(config.handlers, vec!["echo"]);
        assert!(config.message_crypto().unwrap().is_none());
        clear_env();
    }

    #[test]
    #[serial]
    fn missing_appid_fails() {
        clear_env();
        env::set_var("WX_APPSECRET", "secret");

        let err = Config::from_env().unwrap_err();
        assert!(err.to_string().contains("WX_APPID"));
        clear_env();
    }

    #[test]
    #[serial]
    fn encrypted_mode_requires_key() {
        clear_env();
        env::set_var("WX_APPID", "wxappid");
        env::set_var("WX_APPSECRET", "secret");
        env::set_var("WX_ENCRYPTED", "true");
        env::set_var("WX_TOKEN", "token");

        let err = Config::from_env().unwrap_err();
        assert!(err.to_string().contains("WX_ENCODING_AES_KEY"));
        clear_env();
    }

    #[test]
    #[serial]
    fn handler_list_is_trimmed() {
        clear_env();
        env::set_var("WX_APPID", "wxappid");
        env::set_var("WX_APPSECRET", "secret");
        env::set_var("WX_HANDLERS", " audit, echo ,,");

        let config = Config::from_env().unwrap();
        assert_eq!(config.handlers, vec!["audit", "echo"]);
        clear_env();
    }

    #[test]
    fn test_config_builds_crypto() {
        let config = Config::default_for_test();
        let crypto = config.message_crypto().unwrap().unwrap();
        assert_eq!(crypto.appid(), "wx2c2769f8efd9abc2");
    }

    #[test]
    fn debug_hides_secrets() {
        let debug = format!("{:?}", Config::default_for_test());
        assert!(!debug.contains("test-secret"));
        assert!(!debug.contains("faketoken"));
    }
}
