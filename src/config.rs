use anyhow::{Context, Result};
use std::env;

use crate::service::TableNames;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub person_table: String,
    pub history_table: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let host = env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());

        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse::<u16>()
            .context("APP_PORT must be a valid u16")?;

        let person_table = env::var("PERSON_TABLE").unwrap_or_else(|_| "Person".to_string());
        let history_table =
            env::var("PERSON_HISTORY_TABLE").unwrap_or_else(|_| "PersonHistory".to_string());

        Ok(Self {
            host,
            port,
            person_table,
            history_table,
        })
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn table_names(&self) -> TableNames {
        TableNames {
            person: self.person_table.clone(),
            history: self.history_table.clone(),
        }
    }
}
