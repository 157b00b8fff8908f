use anyhow::Result;
use std::env;
use std::time::Duration;

const DEFAULT_GEOCODER_URL: &str = "https://nominatim.openstreetmap.org";
const DEFAULT_GEOCODER_TIMEOUT_SECS: u64 = 5;

#[derive(Debug, Clone)]
pub struct Config {
    pub discord_token: String,
    pub database_url: String,
    pub admin_role_id: Option<String>,
    pub geocoder_url: String,
    pub geocoder_timeout: Duration,
    pub geocoder_user_agent: String,
    pub display_utc_offset_hours: i32,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();

        let discord_token = env::var("DISCORD_TOKEN")
            .map_err(|_| anyhow::anyhow!("DISCORD_TOKEN environment variable is required"))?;

        let database_url =
            env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite:timeclock.db".to_string());

        let admin_role_id = env::var("ADMIN_ROLE_ID").ok();

        let geocoder_url =
            env::var("GEOCODER_URL").unwrap_or_else(|_| DEFAULT_GEOCODER_URL.to_string());

        let geocoder_timeout = Duration::from_secs(parse_var(
            "GEOCODER_TIMEOUT_SECS",
            env::var("GEOCODER_TIMEOUT_SECS").ok(),
            DEFAULT_GEOCODER_TIMEOUT_SECS,
        )?);

        let geocoder_user_agent = env::var("GEOCODER_USER_AGENT")
            .unwrap_or_else(|_| format!("timeclock-bot/{}", env!("CARGO_PKG_VERSION")));

        let display_utc_offset_hours = parse_var(
            "DISPLAY_UTC_OFFSET_HOURS",
            env::var("DISPLAY_UTC_OFFSET_HOURS").ok(),
            0,
        )?;

        Ok(Config {
            discord_token,
            database_url,
            admin_role_id,
            geocoder_url,
            geocoder_timeout,
            geocoder_user_agent,
            display_utc_offset_hours,
        })
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, raw: Option<String>, default: T) -> Result<T> {
    match raw {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| anyhow::anyhow!("{} must be a number, got {:?}", name, value)),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_values_use_default() {
        assert_eq!(parse_var("X", None, 5u64).unwrap(), 5);
    }

    #[test]
    fn numbers_are_parsed() {
        assert_eq!(parse_var("X", Some(" -9 ".to_string()), 0i32).unwrap(), -9);
    }

    #[test]
    fn garbage_is_rejected() {
        let err = parse_var("GEOCODER_TIMEOUT_SECS", Some("soon".to_string()), 5u64).unwrap_err();
        assert!(err.to_string().contains("GEOCODER_TIMEOUT_SECS"));
    }
}
