use serde::{Deserialize, Serialize};
use std::env;
use uuid::Uuid;

pub use fridge_core::{Categorized, ExpirationKind, ExpirationStatus, Item, ItemId, WasteStats, WastedItem};

pub const DEFAULT_DATABASE_URL: &str = "sqlite://fridge.db";
pub const DEFAULT_OPENAI_API_URL: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_DAILY_CALORIE_INTAKE: u32 = 2000;

/// Message shown to the user whenever a recipe request fails, whatever the cause.
pub const RECIPE_FAILURE_MESSAGE: &str = "Failed to generate recipe suggestions. Please try again.";

#[derive(Debug, Clone)]
pub struct RecipeConfig {
    pub api_url: String,
    pub api_key: Option<String>,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub timeout_seconds: u64,
}

impl Default for RecipeConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_OPENAI_API_URL.to_string(),
            api_key: None,
            model: DEFAULT_OPENAI_MODEL.to_string(),
            max_tokens: 1500,
            temperature: 0.7,
            timeout_seconds: 30,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TrackerConfig {
    pub database_url: String,
    pub recipes: RecipeConfig,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            recipes: RecipeConfig::default(),
        }
    }
}

impl TrackerConfig {
    /// Defaults overridden by `FRIDGE_DATABASE_URL`, `OPENAI_API_KEY`,
    /// `OPENAI_MODEL`, `OPENAI_API_URL` and `RECIPE_TIMEOUT_SECONDS`.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(url) = env::var("FRIDGE_DATABASE_URL") {
            config.database_url = url;
        }
        config.recipes.api_key = env::var("OPENAI_API_KEY").ok().filter(|key| !key.trim().is_empty());
        if let Ok(model) = env::var("OPENAI_MODEL") {
            config.recipes.model = model;
        }
        if let Ok(api_url) = env::var("OPENAI_API_URL") {
            config.recipes.api_url = api_url;
        }
        if let Ok(timeout) = env::var("RECIPE_TIMEOUT_SECONDS") {
            config.recipes.timeout_seconds = timeout.parse().map_err(|_| {
                TrackerError::Config(format!("RECIPE_TIMEOUT_SECONDS must be a number, got {:?}", timeout))
            })?;
        }

        Ok(config)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub username: String,
    pub daily_calorie_intake: u32,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            username: String::new(),
            daily_calorie_intake: DEFAULT_DAILY_CALORIE_INTAKE,
        }
    }
}

/// Partial profile update; `None` fields are left unchanged.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub username: Option<String>,
    pub daily_calorie_intake: Option<u32>,
}

#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Item name must not be empty")]
    EmptyName,

    #[error("Invalid expiration date {input:?}: expected YYYY-MM-DD")]
    InvalidDate { input: String },

    #[error("Item not found: {id}")]
    ItemNotFound { id: Uuid },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("OpenAI API key not configured")]
    MissingApiKey,

    #[error("Recipe service returned HTTP {status}")]
    RecipeService { status: u16 },

    #[error("Recipe service returned no content")]
    EmptyRecipeResponse,

    #[error("Unsupported snapshot version {found} (newest supported is {supported})")]
    UnsupportedSnapshot { found: u32, supported: u32 },

    #[error("Corrupt stored data: {0}")]
    Corrupt(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, TrackerError>;
