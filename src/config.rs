use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, Default, serde::Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Circle,
    Travis,
    Jenkins,
}

impl Mode {
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Circle => "Circle CI",
            Self::Travis => "Travis CI",
            Self::Jenkins => "Jenkins CI",
        }
    }

    /// Public endpoint used when no `url` is configured. Jenkins has none.
    pub fn default_url(&self) -> Option<&'static str> {
        match self {
            Self::Circle => Some("https://circleci.com/api/v1/projects"),
            Self::Travis => Some("https://api.travis-ci.com/repos"),
            Self::Jenkins => None,
        }
    }
}

#[derive(Debug, Default, serde::Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default)]
    pub mode: Mode,
    pub url: Option<String>,
    pub token: Option<String>,
    pub branch: Option<String>,
    pub repositories: Option<String>,
}

impl Settings {
    pub fn server_url(&self) -> Result<String> {
        let configured = self.url.as_deref().filter(|u| !u.is_empty());
        match configured.or(self.mode.default_url()) {
            Some(url) => Ok(url.trim_end_matches('/').to_string()),
            None => Err(Error::Config(format!(
                "{} needs a server url",
                self.mode.display_name()
            ))),
        }
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref().filter(|t| !t.is_empty())
    }
}

static ENV_VARIABLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{env\.([A-Za-z_][A-Za-z0-9_]*)\}").unwrap());

fn substitute_variables(s: &str, replacer: fn(&str) -> Option<String>) -> String {
    ENV_VARIABLE
        .replace_all(s, |caps: &Captures| replacer(&caps[1]).unwrap_or_default())
        .into_owned()
}

pub fn env_replacer(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

pub fn load_config(s: &str, replacer: fn(&str) -> Option<String>) -> Result<Settings> {
    let sub = substitute_variables(s, replacer);
    serde_json::from_str::<Settings>(&sub).map_err(|e| Error::Config(format!("JSON error {e}")))
}
