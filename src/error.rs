use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid API token ({status} {body})")]
    Auth { status: u16, body: String },

    #[error("Malformed response from {url}: {source} ({body})")]
    Malformed {
        url: String,
        body: String,
        source: serde_json::Error,
    },

    #[error("Error getting URL {url}: {status}")]
    Status { url: String, status: u16 },

    #[error("Request error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Invalid branch pattern: {0}")]
    BranchPattern(#[from] regex::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
