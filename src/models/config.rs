//! Application configuration structures.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Upstream page and HTTP behavior
    #[serde(default)]
    pub source: SourceConfig,

    /// Markup selectors for the listing
    #[serde(default)]
    pub selectors: SelectorConfig,

    /// Messenger Send API credentials
    #[serde(default)]
    pub messenger: MessengerConfig,

    /// Notification text
    #[serde(default)]
    pub messages: MessagesConfig,

    /// Snapshot persistence
    #[serde(default)]
    pub storage: StorageConfig,

    /// Local watch loop cadence
    #[serde(default)]
    pub schedule: ScheduleConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Override secrets and deployment knobs from the environment.
    pub fn apply_env(&mut self) {
        self.apply_env_with(|key| std::env::var(key).ok());
    }

    fn apply_env_with(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup("SLOTWATCH_URL") {
            self.source.url = url;
        }
        if let Some(token) = lookup("PAGE_ACCESS_TOKEN") {
            self.messenger.access_token = token;
        }
        if let Some(id) = lookup("RECIPIENT_ID") {
            self.messenger.recipient_id = id;
        }
        if let Some(token) = lookup("VERIFY_TOKEN") {
            self.messenger.verify_token = token;
        }
        if let Some(secs) = lookup("REQUEST_TIMEOUT_SECS").and_then(|s| s.parse().ok()) {
            self.source.timeout_secs = secs;
        }
    }

    /// Validate configuration values for basic sanity.
    ///
    /// Credentials are opaque and only checked by the send endpoint.
    pub fn validate(&self) -> Result<()> {
        url::Url::parse(&self.source.url)
            .map_err(|e| AppError::config(format!("source.url is invalid: {e}")))?;
        url::Url::parse(&self.messenger.endpoint)
            .map_err(|e| AppError::config(format!("messenger.endpoint is invalid: {e}")))?;
        if self.source.user_agent.trim().is_empty() {
            return Err(AppError::config("source.user_agent is empty"));
        }
        if self.source.timeout_secs == 0 {
            return Err(AppError::config("source.timeout_secs must be > 0"));
        }
        if self.schedule.interval_secs == 0 {
            return Err(AppError::config("schedule.interval_secs must be > 0"));
        }
        for (name, value) in self.selectors.named() {
            if value.trim().is_empty() {
                return Err(AppError::config(format!("selectors.{name} is empty")));
            }
        }
        Ok(())
    }
}

/// Upstream page settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Page listing the available slots
    #[serde(default = "defaults::source_url")]
    pub url: String,

    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            url: defaults::source_url(),
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
        }
    }
}

/// CSS selectors describing the listing markup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectorConfig {
    /// Text shown by the page when nothing is published
    #[serde(default = "defaults::no_slots_marker")]
    pub no_slots_marker: String,

    /// Element wrapping the whole listing
    #[serde(default = "defaults::container")]
    pub container: String,

    /// One group per day, inside the container
    #[serde(default = "defaults::day")]
    pub day: String,

    /// Day label, inside a day group
    #[serde(default = "defaults::date")]
    pub date: String,

    /// One group per slot, inside a day group
    #[serde(default = "defaults::slot")]
    pub slot: String,

    /// Time text, inside a slot
    #[serde(default = "defaults::time")]
    pub time: String,

    /// Instructor label, inside a slot
    #[serde(default = "defaults::instructor")]
    pub instructor: String,

    /// Booking link element, inside a slot
    #[serde(default = "defaults::link")]
    pub link: String,

    /// HTML attribute holding the booking URL
    #[serde(default = "defaults::link_attr")]
    pub link_attr: String,
}

impl SelectorConfig {
    /// Selector fields by name, for validation messages.
    pub fn named(&self) -> [(&'static str, &str); 8] {
        [
            ("container", self.container.as_str()),
            ("day", self.day.as_str()),
            ("date", self.date.as_str()),
            ("slot", self.slot.as_str()),
            ("time", self.time.as_str()),
            ("instructor", self.instructor.as_str()),
            ("link", self.link.as_str()),
            ("link_attr", self.link_attr.as_str()),
        ]
    }
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            no_slots_marker: defaults::no_slots_marker(),
            container: defaults::container(),
            day: defaults::day(),
            date: defaults::date(),
            slot: defaults::slot(),
            time: defaults::time(),
            instructor: defaults::instructor(),
            link: defaults::link(),
            link_attr: defaults::link_attr(),
        }
    }
}

/// Messenger Send API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessengerConfig {
    /// Send endpoint
    #[serde(default = "defaults::messenger_endpoint")]
    pub endpoint: String,

    /// Page-scoped id of the subscriber
    #[serde(default)]
    pub recipient_id: String,

    /// Page access token, sent as `access_token` query parameter
    #[serde(default)]
    pub access_token: String,

    /// Token expected during webhook subscription
    #[serde(default)]
    pub verify_token: String,
}

impl Default for MessengerConfig {
    fn default() -> Self {
        Self {
            endpoint: defaults::messenger_endpoint(),
            recipient_id: String::new(),
            access_token: String::new(),
            verify_token: String::new(),
        }
    }
}

/// Notification text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessagesConfig {
    #[serde(default = "defaults::header")]
    pub header: String,

    /// Per-entry block; placeholders `{date}`, `{time}`, `{instructor}`, `{link}`
    #[serde(default = "defaults::entry_template")]
    pub entry_template: String,

    /// Closing line; `{source}` is replaced with the page URL
    #[serde(default = "defaults::footer")]
    pub footer: String,
}

impl Default for MessagesConfig {
    fn default() -> Self {
        Self {
            header: defaults::header(),
            entry_template: defaults::entry_template(),
            footer: defaults::footer(),
        }
    }
}

/// Snapshot persistence settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding `snapshot.json`
    #[serde(default = "defaults::storage_dir")]
    pub dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            dir: defaults::storage_dir(),
        }
    }
}

/// Watch loop settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// Seconds between ticks
    #[serde(default = "defaults::interval")]
    pub interval_secs: u64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            interval_secs: defaults::interval(),
        }
    }
}

mod defaults {
    use std::path::PathBuf;

    // Source defaults
    pub fn source_url() -> String {
        "https://www.rezervujsi.sk/autino".into()
    }
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; slotwatch/0.1)".into()
    }
    pub fn timeout() -> u64 {
        30
    }

    // Selector defaults
    pub fn no_slots_marker() -> String {
        "V najbližšom období nie sú zverejnené ďalšie termíny".into()
    }
    pub fn container() -> String {
        "div.terms".into()
    }
    pub fn day() -> String {
        "div.day".into()
    }
    pub fn date() -> String {
        ".day-title".into()
    }
    pub fn slot() -> String {
        ".term".into()
    }
    pub fn time() -> String {
        ".term-time".into()
    }
    pub fn instructor() -> String {
        ".term-instructor".into()
    }
    pub fn link() -> String {
        "a".into()
    }
    pub fn link_attr() -> String {
        "href".into()
    }

    // Messenger defaults
    pub fn messenger_endpoint() -> String {
        "https://graph.facebook.com/v18.0/me/messages".into()
    }

    // Message defaults
    pub fn header() -> String {
        "Nové voľné termíny jázd:".into()
    }
    pub fn entry_template() -> String {
        "📅 {date}\n🕒 {time}\n👤 {instructor}\n🔗 {link}".into()
    }
    pub fn footer() -> String {
        "Všetky termíny: {source}".into()
    }

    // Storage defaults
    pub fn storage_dir() -> PathBuf {
        PathBuf::from("storage")
    }

    // Schedule defaults
    pub fn interval() -> u64 {
        60
    }
}
