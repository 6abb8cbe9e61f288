use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Every variable has a default, so the site starts with an empty environment.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    /// Locale served when the visitor has not chosen one.
    pub default_locale: String,
    /// JPEG or PNG embedded in the PDF header. Missing files fall back to initials.
    pub profile_image_path: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            port: env_or("PORT", "8080")
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: env_or("RUST_LOG", "info"),
            default_locale: env_or("DEFAULT_LOCALE", "es"),
            profile_image_path: env_or("PROFILE_IMAGE_PATH", "assets/profile.jpeg"),
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
