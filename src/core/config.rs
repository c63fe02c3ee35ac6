/// Gateway configuration.
///
/// Everything is read once from the process environment at startup (after
/// `dotenvy` has loaded an optional `.env`). Downstream endpoints and keys are
/// not validated here: a missing value makes the corresponding tool call
/// fail with a downstream error.

use std::fmt;

/// Server metadata and bind settings.
#[derive(Debug, Clone)]
pub struct ServerSettings {
    /// Name reported in `initialize` and `/health`
    pub name: String,
    /// Version reported in `initialize`
    pub version: String,
    pub host: String,
    pub port: u16,
    pub workers: usize,
}

/// Endpoint and query token of the text-to-speech service.
#[derive(Clone, Default)]
pub struct TtsCredential {
    pub url: String,
    pub token: String,
}

/// Endpoint and bearer key of the image generation service.
#[derive(Clone, Default)]
pub struct ImageCredential {
    pub url: String,
    pub api_key: String,
}

/// Endpoint of the translation service. The URL itself may carry auth.
#[derive(Clone, Default)]
pub struct TranslateCredential {
    pub url: String,
}

impl fmt::Debug for TtsCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TtsCredential")
            .field("url", &self.url)
            .field("token", &redacted(&self.token))
            .finish()
    }
}

impl fmt::Debug for ImageCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageCredential")
            .field("url", &self.url)
            .field("api_key", &redacted(&self.api_key))
            .finish()
    }
}

impl fmt::Debug for TranslateCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Pre-authenticated URLs may carry a key in the query string.
        let shown = self.url.split('?').next().unwrap_or_default();
        f.debug_struct("TranslateCredential")
            .field("url", &shown)
            .finish()
    }
}

fn redacted(secret: &str) -> &'static str {
    if secret.is_empty() { "<unset>" } else { "<redacted>" }
}

/// Complete process configuration.
#[derive(Clone)]
pub struct GatewayConfig {
    pub server: ServerSettings,
    /// Shared secret every request must present
    pub hub_secret: String,
    pub tts: TtsCredential,
    pub image: ImageCredential,
    pub translate: TranslateCredential,
}

impl fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("server", &self.server)
            .field("hub_secret", &redacted(&self.hub_secret))
            .field("tts", &self.tts)
            .field("image", &self.image)
            .field("translate", &self.translate)
            .finish()
    }
}

impl GatewayConfig {
    /// Load from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load through an arbitrary key lookup; unset and empty are equivalent.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).unwrap_or_default();
        let or = |key: &str, default: &str| {
            let value = get(key);
            if value.is_empty() { default.to_string() } else { value }
        };

        // Defaults to CPU count, capped at 16 to avoid excessive context switching
        let workers = get("WORKER_THREADS")
            .parse::<usize>()
            .ok()
            .filter(|w| *w > 0)
            .unwrap_or_else(|| num_cpus::get().clamp(1, 16));

        Self {
            server: ServerSettings {
                name: or("SERVER_NAME", "media-tool-hub"),
                version: or("SERVER_VERSION", env!("CARGO_PKG_VERSION")),
                host: or("HOST", "0.0.0.0"),
                port: get("PORT").parse::<u16>().unwrap_or(3000),
                workers,
            },
            hub_secret: get("MCP_HUB_SECRET"),
            tts: TtsCredential {
                url: get("TTS_URL"),
                token: get("TTS_TOKEN"),
            },
            image: ImageCredential {
                url: get("IMAGE_URL"),
                api_key: get("IMAGE_KEY"),
            },
            translate: TranslateCredential {
                url: get("TRANSLATE_URL"),
            },
        }
    }

    /// Names of settings that are unset and will make requests fail.
    pub fn missing_settings(&self) -> Vec<&'static str> {
        let checks = [
            ("MCP_HUB_SECRET", &self.hub_secret),
            ("TTS_URL", &self.tts.url),
            ("TTS_TOKEN", &self.tts.token),
            ("IMAGE_URL", &self.image.url),
            ("IMAGE_KEY", &self.image.api_key),
            ("TRANSLATE_URL", &self.translate.url),
        ];
        checks
            .into_iter()
            .filter(|(_, value)| value.is_empty())
            .map(|(name, _)| name)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn applies_defaults() {
        let config = GatewayConfig::from_lookup(lookup(&[]));
        assert_eq!(config.server.name, "media-tool-hub");
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 3000);
        assert!(config.server.workers >= 1 && config.server.workers <= 16);
        assert_eq!(config.missing_settings().len(), 6);
    }

    #[test]
    fn reads_values_and_ignores_bad_port() {
        let config = GatewayConfig::from_lookup(lookup(&[
            ("PORT", "not-a-port"),
            ("WORKER_THREADS", "3"),
            ("MCP_HUB_SECRET", " s3cret "),
            ("TTS_URL", "http://tts"),
        ]));
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.server.workers, 3);
        assert_eq!(config.hub_secret, "s3cret");
        assert_eq!(config.tts.url, "http://tts");
        assert!(!config.missing_settings().contains(&"MCP_HUB_SECRET"));
    }

    #[test]
    fn debug_output_never_contains_secrets() {
        let config = GatewayConfig::from_lookup(lookup(&[
            ("MCP_HUB_SECRET", "hub-secret-value"),
            ("TTS_TOKEN", "tts-token-value"),
            ("IMAGE_KEY", "image-key-value"),
            ("TRANSLATE_URL", "https://tr.example/api?key=translate-key-value"),
        ]));
        let rendered = format!("{config:?}");
        for secret in [
            "hub-secret-value",
            "tts-token-value",
            "image-key-value",
            "translate-key-value",
        ] {
            assert!(!rendered.contains(secret), "{secret} leaked");
        }
    }
}
