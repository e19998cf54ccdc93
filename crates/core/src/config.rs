use serde::{Deserialize, Serialize};
use std::{
    fmt,
    path::PathBuf,
    str::FromStr,
    time::Duration,
};

pub const DEFAULT_INPUT_PATH: &str = "./languages/data.csv";
pub const DEFAULT_OUTPUT_DIR: &str = "./languages";
pub const DEFAULT_EXTENSION: &str = "js";
pub const DEFAULT_REGION: &str = "us-west-2";
pub const DEFAULT_MAX_ATTEMPTS: u32 = 1;
pub const ENV_AWS_ACCESS_KEY_ID: &str = "AWS_ACCESS_KEY_ID";
pub const ENV_AWS_SECRET_ACCESS_KEY: &str = "AWS_SECRET_ACCESS_KEY";
pub const ENV_AWS_SESSION_TOKEN: &str = "AWS_SESSION_TOKEN";

/// A language the generator can emit a module for.
///
/// `English` is the source language: its text comes straight from the CSV and
/// is never sent to the translation service.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    English,
    Russian,
    French,
    German,
    Spanish,
    Japanese,
    Chinese,
    Italian,
    Korean,
}

impl Language {
    /// Emission order of the generated modules.
    pub const ALL: [Language; 9] = [
        Language::English,
        Language::Russian,
        Language::French,
        Language::German,
        Language::Spanish,
        Language::Japanese,
        Language::Chinese,
        Language::Italian,
        Language::Korean,
    ];

    /// Order in which a row's translations are requested.
    pub const TRANSLATION_ORDER: [Language; 8] = [
        Language::French,
        Language::German,
        Language::Russian,
        Language::Spanish,
        Language::Japanese,
        Language::Chinese,
        Language::Korean,
        Language::Italian,
    ];

    pub const SOURCE: Language = Language::English;

    /// Module variable name and file stem.
    pub fn name(self) -> &'static str {
        match self {
            Language::English => "english",
            Language::Russian => "russian",
            Language::French => "french",
            Language::German => "german",
            Language::Spanish => "spanish",
            Language::Japanese => "japanese",
            Language::Chinese => "chinese",
            Language::Italian => "italian",
            Language::Korean => "korean",
        }
    }

    /// Language code understood by the translation service.
    pub fn code(self) -> &'static str {
        match self {
            Language::English => "en",
            Language::Russian => "ru",
            Language::French => "fr",
            Language::German => "de",
            Language::Spanish => "es",
            Language::Japanese => "ja",
            Language::Chinese => "zh",
            Language::Italian => "it",
            Language::Korean => "ko",
        }
    }

    pub fn is_source(self) -> bool {
        self == Self::SOURCE
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Language {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Language::ALL
            .into_iter()
            .find(|lang| lang.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| ConfigError::UnknownLanguage(wanted.to_owned()))
    }
}

/// Parses a comma-separated list of module names, keeping the order of
/// [`Language::ALL`] and dropping duplicates.
pub fn parse_languages(list: &str) -> Result<Vec<Language>, ConfigError> {
    let mut wanted = Vec::new();
    for part in list.split(',').filter(|p| !p.trim().is_empty()) {
        wanted.push(part.parse::<Language>()?);
    }
    if wanted.is_empty() {
        return Err(ConfigError::NoLanguages);
    }
    Ok(Language::ALL
        .into_iter()
        .filter(|lang| wanted.contains(lang))
        .collect())
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Region(String);

impl Region {
    pub fn new<S: Into<String>>(value: S) -> Result<Self, ConfigError> {
        let v = value.into();
        if v.trim().is_empty() {
            return Err(ConfigError::EmptyRegion);
        }
        Ok(Self(v))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    access_key_id: String,
    secret_access_key: String,
    session_token: Option<String>,
}

impl Credentials {
    pub fn new<S: Into<String>>(
        access_key_id: S,
        secret_access_key: S,
        session_token: Option<String>,
    ) -> Result<Self, ConfigError> {
        let access_key_id = access_key_id.into();
        let secret_access_key = secret_access_key.into();
        if access_key_id.trim().is_empty() {
            return Err(ConfigError::MissingCredential(ENV_AWS_ACCESS_KEY_ID));
        }
        if secret_access_key.trim().is_empty() {
            return Err(ConfigError::MissingCredential(ENV_AWS_SECRET_ACCESS_KEY));
        }
        Ok(Self {
            access_key_id,
            secret_access_key,
            session_token: session_token.filter(|t| !t.trim().is_empty()),
        })
    }

    pub fn access_key_id(&self) -> &str {
        &self.access_key_id
    }

    pub fn expose_secret(&self) -> &str {
        &self.secret_access_key
    }

    pub fn session_token(&self) -> Option<&str> {
        self.session_token.as_deref()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"**redacted**")
            .field("session_token", &self.session_token.as_ref().map(|_| "**redacted**"))
            .finish()
    }
}

/// Attempts, backoff and timeout applied to each translation request.
#[derive(Clone, Debug, PartialEq)]
pub struct CallPolicy {
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub backoff_multiplier: f64,
    pub max_delay: Duration,
    pub request_timeout: Option<Duration>,
}

impl CallPolicy {
    pub fn new(max_attempts: u32, request_timeout: Option<Duration>) -> Result<Self, ConfigError> {
        if max_attempts == 0 {
            return Err(ConfigError::ZeroAttempts);
        }
        if request_timeout.is_some_and(|t| t.is_zero()) {
            return Err(ConfigError::ZeroTimeout);
        }
        Ok(Self {
            max_attempts,
            request_timeout,
            ..Default::default()
        })
    }
}

impl Default for CallPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            initial_delay: Duration::from_millis(500),
            backoff_multiplier: 2.0,
            max_delay: Duration::from_secs(10),
            request_timeout: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct OutputConfig {
    pub dir: PathBuf,
    pub extension: String,
}

impl OutputConfig {
    pub fn new<P: Into<PathBuf>, S: Into<String>>(dir: P, extension: S) -> Result<Self, ConfigError> {
        let extension = extension.into();
        let extension = extension.trim().trim_start_matches('.').to_owned();
        if extension.is_empty() {
            return Err(ConfigError::EmptyExtension);
        }
        Ok(Self {
            dir: dir.into(),
            extension,
        })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct AppConfig {
    pub input: PathBuf,
    pub output: OutputConfig,
    pub languages: Vec<Language>,
    pub region: Region,
    pub credentials: Credentials,
    pub policy: CallPolicy,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("unknown language `{0}`")]
    UnknownLanguage(String),
    #[error("at least one language must be selected")]
    NoLanguages,
    #[error("region must not be empty")]
    EmptyRegion,
    #[error("output extension must not be empty")]
    EmptyExtension,
    #[error("environment variable {0} is not set")]
    MissingCredential(&'static str),
    #[error("max attempts must be > 0")]
    ZeroAttempts,
    #[error("request timeout must be > 0")]
    ZeroTimeout,
}

pub trait Env {
    fn var(&self, key: &str) -> Option<String>;
}

#[derive(Clone, Debug, Default)]
pub struct StdEnv;

impl Env for StdEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

#[derive(Clone, Debug, Default)]
pub struct MapEnv {
    vars: std::collections::BTreeMap<String, String>,
}

impl MapEnv {
    pub fn with_var(mut self, key: &str, value: &str) -> Self {
        self.vars.insert(key.to_owned(), value.to_owned());
        self
    }
}

impl Env for MapEnv {
    fn var(&self, key: &str) -> Option<String> {
        self.vars.get(key).cloned()
    }
}

pub fn resolve_credentials(env: &impl Env) -> Result<Credentials, ConfigError> {
    let access_key_id = env
        .var(ENV_AWS_ACCESS_KEY_ID)
        .ok_or(ConfigError::MissingCredential(ENV_AWS_ACCESS_KEY_ID))?;
    let secret_access_key = env
        .var(ENV_AWS_SECRET_ACCESS_KEY)
        .ok_or(ConfigError::MissingCredential(ENV_AWS_SECRET_ACCESS_KEY))?;
    Credentials::new(
        access_key_id,
        secret_access_key,
        env.var(ENV_AWS_SESSION_TOKEN),
    )
}
