use std::env;
use std::time::Duration;

use crate::domain::DomainError;

pub const DEFAULT_SHEETS_API_BASE: &str = "https://sheets.googleapis.com";
pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
pub const DEFAULT_OPENLIBRARY_BASE: &str = "https://openlibrary.org";

/// How requests to the Sheets API are authorised
#[derive(Clone)]
pub enum Credentials {
    /// Service account; a signed assertion is exchanged for an access token
    ServiceAccount {
        client_email: String,
        private_key: String,
    },
    /// Pre-issued bearer token (local development, tests)
    AccessToken(String),
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Credentials::ServiceAccount { client_email, .. } => f
                .debug_struct("ServiceAccount")
                .field("client_email", client_email)
                .finish_non_exhaustive(),
            Credentials::AccessToken(_) => f.write_str("AccessToken(..)"),
        }
    }
}

/// Everything needed to reach one spreadsheet
#[derive(Clone, Debug)]
pub struct SheetsConfig {
    pub spreadsheet_id: String,
    pub credentials: Credentials,
    pub api_base: String,
    pub token_uri: String,
    pub timeout: Duration,
}

impl SheetsConfig {
    pub fn new(spreadsheet_id: impl Into<String>, credentials: Credentials) -> Self {
        Self {
            spreadsheet_id: spreadsheet_id.into(),
            credentials,
            api_base: DEFAULT_SHEETS_API_BASE.to_string(),
            token_uri: DEFAULT_TOKEN_URI.to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    pub port: u16,
    pub cors_allowed_origins: Vec<String>,
    /// Tab used when a request names none
    pub default_sheet: String,
    pub openlibrary_base: String,
    pub sheets: SheetsConfig,
}

impl Config {
    pub fn from_env() -> Result<Self, DomainError> {
        let spreadsheet_id = non_empty_var("SHEET_ID")
            .ok_or_else(|| DomainError::MissingField("SHEET_ID".to_string()))?;

        let credentials = match (
            non_empty_var("GOOGLE_CLIENT_EMAIL"),
            non_empty_var("GOOGLE_PRIVATE_KEY"),
        ) {
            (Some(client_email), Some(private_key)) => Credentials::ServiceAccount {
                client_email,
                // Keys pasted into env files usually carry literal "\n"
                private_key: private_key.replace("\\n", "\n"),
            },
            _ => match non_empty_var("GOOGLE_ACCESS_TOKEN") {
                Some(token) => Credentials::AccessToken(token),
                None => {
                    return Err(DomainError::MissingField(
                        "GOOGLE_CLIENT_EMAIL and GOOGLE_PRIVATE_KEY".to_string(),
                    ));
                }
            },
        };

        let timeout = Duration::from_secs(
            env::var("HTTP_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(10),
        );

        let sheets = SheetsConfig {
            spreadsheet_id,
            credentials,
            api_base: non_empty_var("SHEETS_API_BASE")
                .unwrap_or_else(|| DEFAULT_SHEETS_API_BASE.to_string()),
            token_uri: non_empty_var("GOOGLE_TOKEN_URI")
                .unwrap_or_else(|| DEFAULT_TOKEN_URI.to_string()),
            timeout,
        };

        Ok(Self {
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8000),
            cors_allowed_origins: env::var("CORS_ALLOWED_ORIGINS")
                .ok()
                .map(|s| {
                    s.split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or_default(),
            default_sheet: non_empty_var("INVENTORY_SHEET")
                .unwrap_or_else(|| "Inventory".to_string()),
            openlibrary_base: non_empty_var("OPENLIBRARY_BASE")
                .unwrap_or_else(|| DEFAULT_OPENLIBRARY_BASE.to_string()),
            sheets,
        })
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
