use crate::error::{AppError, Result};
use dotenvy::dotenv;
use std::env;

#[derive(Clone, Debug)]
pub struct Config {
    pub base_url: String,
    pub application_key: String,
}

impl Config {
    pub fn load() -> Result<Self> {
        // Load .env file if it exists, ignore if it doesn't
        let _ = dotenv();

        let base_url = env::var("PROFILE_BASE_URL").map_err(|_| {
            AppError::Config("PROFILE_BASE_URL must be set in environment or .env file".to_string())
        })?;

        let application_key = env::var("PROFILE_APPLICATION_KEY").map_err(|_| {
            AppError::Config(
                "PROFILE_APPLICATION_KEY must be set in environment or .env file".to_string(),
            )
        })?;

        Ok(Self {
            base_url,
            application_key,
        })
    }
}
