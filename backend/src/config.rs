use anyhow::anyhow;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub time_zone: Tz,
    /// Approval chain depth per request type, clamped to 1..=3.
    pub leave_approval_levels: usize,
    pub overtime_approval_levels: usize,
    pub correction_approval_levels: usize,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL")
            .unwrap_or_else(|_| "postgres://localhost/hrdesk".to_string());

        let port = env::var("PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse()
            .unwrap_or(3000);

        let time_zone_name = env::var("APP_TIMEZONE").unwrap_or_else(|_| "UTC".to_string());
        let time_zone: Tz = time_zone_name
            .parse()
            .map_err(|_| anyhow!("Invalid APP_TIMEZONE value: {}", time_zone_name))?;

        let leave_approval_levels = parse_levels("LEAVE_APPROVAL_LEVELS", 2);
        let overtime_approval_levels = parse_levels("OVERTIME_APPROVAL_LEVELS", 1);
        let correction_approval_levels = parse_levels("CORRECTION_APPROVAL_LEVELS", 1);

        Ok(Config {
            database_url,
            port,
            time_zone,
            leave_approval_levels,
            overtime_approval_levels,
            correction_approval_levels,
        })
    }
}

fn parse_levels(var: &str, default: usize) -> usize {
    env::var(var)
        .ok()
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(default)
        .clamp(1, 3)
}
