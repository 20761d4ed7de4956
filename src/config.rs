use crate::error::{Error, Result};
use dotenvy::dotenv;
use std::env;
use std::sync::OnceLock;

#[derive(Debug, Clone)]
pub struct Config {
    pub server_address: String,
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub supabase_service_role_key: String,
    pub jwt_secret: String,
    pub app_token_ttl_seconds: i64,
    pub admin_token_ttl_seconds: i64,
    pub app_token_issuer: String,
    pub admin_token_issuer: String,
    pub http_timeout_seconds: u64,
}

pub static CONFIG: OnceLock<Config> = OnceLock::new();

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        Ok(Self {
            server_address: get_env_or("SERVER_ADDRESS", "0.0.0.0:8080".to_string())?,
            supabase_url: get_env("SUPABASE_URL")?
                .trim_end_matches('/')
                .to_string(),
            supabase_anon_key: get_env("SUPABASE_ANON_KEY")?,
            supabase_service_role_key: get_env("SUPABASE_SERVICE_ROLE_KEY")?,
            jwt_secret: get_env("JWT_SECRET")?,
            app_token_ttl_seconds: get_env_or("APP_TOKEN_TTL_SECONDS", 3600)?,
            admin_token_ttl_seconds: get_env_or("ADMIN_TOKEN_TTL_SECONDS", 7200)?,
            app_token_issuer: get_env_or("APP_TOKEN_ISSUER", "app".to_string())?,
            admin_token_issuer: get_env_or("ADMIN_TOKEN_ISSUER", "app-admin".to_string())?,
            http_timeout_seconds: get_env_or("HTTP_TIMEOUT_SECONDS", 30)?,
        })
    }
}

fn get_env(name: &str) -> Result<String> {
    env::var(name).map_err(|_| Error::Config(format!("Missing environment variable: {}", name)))
}

fn get_env_or<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => parse_value(name, &raw),
        Err(_) => Ok(default),
    }
}

fn parse_value<T>(name: &str, raw: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e| Error::Config(format!("Invalid value for {}: {}", name, e)))
}

pub fn init_config() -> Result<()> {
    let config = Config::from_env()?;
    CONFIG
        .set(config)
        .map_err(|_| Error::Config("Configuration has already been initialized".to_string()))?;
    Ok(())
}

pub fn get_config() -> &'static Config {
    CONFIG
        .get()
        .expect("Configuration has not been initialized")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_value_reports_variable_name() {
        let err = parse_value::<i64>("APP_TOKEN_TTL_SECONDS", "soon").unwrap_err();
        assert!(err.to_string().contains("APP_TOKEN_TTL_SECONDS"));
    }

    #[test]
    fn parse_value_trims_whitespace() {
        let ttl: i64 = parse_value("ADMIN_TOKEN_TTL_SECONDS", " 7200 ").unwrap();
        assert_eq!(ttl, 7200);
    }
}
