// Application configuration, loaded from environment variables and CLI flags.

use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_PORT: u16 = 8888;
pub const DEFAULT_FRONTEND_URL: &str = "http://localhost:3000";
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_OPENAI_TIMEOUT_SECS: u64 = 30;

/// Application configuration.
///
/// Built once at startup and shared read-only with every handler through
/// [`crate::api::AppState`].
#[derive(Debug, Clone)]
pub struct Config {
    /// Port to bind the HTTP server to.
    pub port: u16,
    /// Origin allowed by CORS and reported by `/api/test-cors`.
    pub frontend_url: String,
    /// Completion service credentials. `None` means every submission falls back.
    pub openai_api_key: Option<String>,
    /// Base URL of the OpenAI-compatible API (without the trailing `/chat/completions`).
    pub openai_base_url: String,
    pub openai_model: String,
    /// Upper bound on a single completion call.
    pub openai_timeout: Duration,
    /// Directory containing pre-built frontend files to serve.
    pub static_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            port: DEFAULT_PORT,
            frontend_url: DEFAULT_FRONTEND_URL.to_string(),
            openai_api_key: None,
            openai_base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            openai_model: DEFAULT_OPENAI_MODEL.to_string(),
            openai_timeout: Duration::from_secs(DEFAULT_OPENAI_TIMEOUT_SECS),
            static_dir: None,
        }
    }
}

impl Config {
    /// Load configuration from environment variables and CLI arguments.
    ///
    /// Environment variables:
    /// - `PORT` - HTTP server port (default: 8888)
    /// - `FRONTEND_URL` - allowed CORS origin (default: `http://localhost:3000`)
    /// - `OPENAI_API_KEY` - completion service key (optional)
    /// - `OPENAI_BASE_URL` - completion service base URL (default: `https://api.openai.com/v1`)
    /// - `OPENAI_MODEL` - model name (default: `gpt-3.5-turbo`)
    /// - `OPENAI_TIMEOUT_SECS` - completion call timeout (default: 30)
    /// - `STATIC_DIR` - Path to frontend dist directory for static file serving
    ///
    /// CLI flags:
    /// - `--port <PORT>` - Override the port
    pub fn load() -> Self {
        let args: Vec<String> = std::env::args().collect();
        Self::from_sources(&args, |key| std::env::var(key).ok())
    }

    /// Build a config from explicit argument and variable sources.
    pub fn from_sources<F>(args: &[String], var: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();

        // Port: CLI flag --port takes precedence, then env var, then default
        let port = Self::parse_cli_value(args, "--port")
            .and_then(|v| v.parse().ok())
            .or_else(|| var("PORT").and_then(|v| v.parse().ok()))
            .unwrap_or(defaults.port);

        let frontend_url = var("FRONTEND_URL")
            .map(|v| v.trim_end_matches('/').to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or(defaults.frontend_url);

        let openai_api_key = var("OPENAI_API_KEY")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());

        let openai_base_url = var("OPENAI_BASE_URL")
            .map(|v| v.trim_end_matches('/').to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or(defaults.openai_base_url);

        let openai_model = var("OPENAI_MODEL")
            .filter(|v| !v.is_empty())
            .unwrap_or(defaults.openai_model);

        let openai_timeout = var("OPENAI_TIMEOUT_SECS")
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
            .unwrap_or(defaults.openai_timeout);

        let static_dir = var("STATIC_DIR").map(PathBuf::from);

        Config {
            port,
            frontend_url,
            openai_api_key,
            openai_base_url,
            openai_model,
            openai_timeout,
            static_dir,
        }
    }

    /// Parse a CLI flag value like `--port 8080`.
    pub fn parse_cli_value(args: &[String], flag: &str) -> Option<String> {
        args.windows(2).find_map(|pair| {
            if pair[0] == flag {
                Some(pair[1].clone())
            } else {
                None
            }
        })
    }
}
