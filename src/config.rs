// src/config.rs

use dotenvy::dotenv;
use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub jwt_expiration: u64,
    /// The single allow-listed administrator address. Admin status is
    /// derived from email equality against this value, nothing else.
    pub admin_email: String,
    pub rust_log: String,

    pub openai_api_key: String,
    pub openai_base_url: String,
    pub openai_model: String,
    pub openai_vision_model: String,

    /// Identity provider token-info endpoint used to verify sign-in tokens.
    pub tokeninfo_url: String,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");

        let jwt_secret = env::var("JWT_SECRET").expect("JWT_SECRET must be set");

        let jwt_expiration = env::var("JWT_EXPIRATION")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(86400);

        let admin_email = env::var("ADMIN_EMAIL").expect("ADMIN_EMAIL must be set");

        let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        let openai_api_key = env::var("OPENAI_API_KEY").expect("OPENAI_API_KEY must be set");

        let openai_base_url =
            env::var("OPENAI_BASE_URL").unwrap_or_else(|_| "https://api.openai.com/v1".to_string());

        let openai_model = env::var("OPENAI_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string());

        let openai_vision_model =
            env::var("OPENAI_VISION_MODEL").unwrap_or_else(|_| "gpt-4o".to_string());

        let tokeninfo_url = env::var("TOKENINFO_URL")
            .unwrap_or_else(|_| "https://oauth2.googleapis.com/tokeninfo".to_string());

        Self {
            database_url,
            jwt_secret,
            jwt_expiration,
            admin_email,
            rust_log,
            openai_api_key,
            openai_base_url,
            openai_model,
            openai_vision_model,
            tokeninfo_url,
        }
    }
}
