use anyhow::anyhow;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::{env, path::PathBuf, str::FromStr};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub storage_path: PathBuf,
    pub bind_addr: String,
    pub server_name: String,
    pub admin_email: String,
    pub admin_password: String,
    pub page_limit: u32,
    pub frontend_url: String,
    pub time_zone: Tz,
    pub invite_sweep_hour: u32,
    pub reset_sweep_hour: u32,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let storage_path = PathBuf::from(
            env::var("STORAGE_PATH").unwrap_or_else(|_| "./adminkit.db".to_string()),
        );
        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
        let server_name = env::var("SERVER_NAME").unwrap_or_else(|_| "adminkit".to_string());
        let admin_email =
            env::var("ADMIN_EMAIL").unwrap_or_else(|_| "admin@localhost".to_string());
        let admin_password =
            env::var("ADMIN_PASSWORD").unwrap_or_else(|_| "change-me".to_string());
        let frontend_url = env::var("FRONTEND_URL")
            .unwrap_or_else(|_| "http://localhost:8080".to_string())
            .trim_end_matches('/')
            .to_string();

        let page_limit = parse_var("PAGE_LIMIT", 20u32)?;
        if page_limit == 0 {
            return Err(anyhow!("PAGE_LIMIT must be greater than zero"));
        }

        let time_zone_name = env::var("APP_TIMEZONE").unwrap_or_else(|_| "UTC".to_string());
        let time_zone: Tz = time_zone_name
            .parse()
            .map_err(|_| anyhow!("Invalid APP_TIMEZONE value: {}", time_zone_name))?;

        let invite_sweep_hour = parse_hour("INVITE_SWEEP_HOUR", 20)?;
        let reset_sweep_hour = parse_hour("RESET_SWEEP_HOUR", 21)?;

        Ok(Config {
            storage_path,
            bind_addr,
            server_name,
            admin_email,
            admin_password,
            page_limit,
            frontend_url,
            time_zone,
            invite_sweep_hour,
            reset_sweep_hour,
        })
    }
}

fn parse_var<T: FromStr>(name: &str, default: T) -> anyhow::Result<T> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| anyhow!("Invalid {} value: {}", name, raw)),
        Err(_) => Ok(default),
    }
}

fn parse_hour(name: &str, default: u32) -> anyhow::Result<u32> {
    let hour = parse_var(name, default)?;
    validate_hour(name, hour)
}

fn validate_hour(name: &str, hour: u32) -> anyhow::Result<u32> {
    if hour < 24 {
        Ok(hour)
    } else {
        Err(anyhow!("{} must be between 0 and 23, got {}", name, hour))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_hour_accepts_clock_hours_only() {
        assert_eq!(validate_hour("H", 0).unwrap(), 0);
        assert_eq!(validate_hour("H", 23).unwrap(), 23);
        assert!(validate_hour("H", 24).is_err());
    }

    #[test]
    fn parse_var_falls_back_when_unset() {
        let value: u32 = parse_var("ADMINKIT_TEST_UNSET_VARIABLE", 7).unwrap();
        assert_eq!(value, 7);
    }
}
