//! Schedule entry data structure.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::utils::{collapse_whitespace, resolve_url, strip_whitespace};

/// Two `HH:MM` clock values written back to back, e.g. `08:0009:30`.
static CONCATENATED_RANGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{2}:\d{2})(\d{2}:\d{2})$").expect("static regex is valid")
});

/// Raw text fragments of one slot, as pulled out of the page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawSlot {
    pub date: String,
    pub time: String,
    pub instructor: String,
    pub href: String,
}

/// One bookable lesson slot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScheduleEntry {
    /// Identity key: date, time range and instructor with all whitespace removed
    pub id: String,

    /// Day label as shown on the page
    pub date: String,

    /// `HH:MM - HH:MM` when recognizable, otherwise the raw text
    pub time_range: String,

    /// Instructor label
    pub instructor: String,

    /// Absolute URL of the booking page for this slot
    pub link: String,
}

impl ScheduleEntry {
    /// Build an entry from display fields; the id is derived.
    pub fn new(
        date: impl Into<String>,
        time_range: impl Into<String>,
        instructor: impl Into<String>,
        link: impl Into<String>,
    ) -> Self {
        let date = date.into();
        let time_range = time_range.into();
        let instructor = instructor.into();
        let id = Self::derive_id(&date, &time_range, &instructor);

        Self {
            id,
            date,
            time_range,
            instructor,
            link: link.into(),
        }
    }

    /// Build an entry from raw page fragments. Never fails.
    pub fn from_fragments(raw: &RawSlot, base: &Url) -> Self {
        Self::new(
            collapse_whitespace(&raw.date),
            normalize_time_range(&collapse_whitespace(&raw.time)),
            collapse_whitespace(&raw.instructor),
            resolve_url(base, raw.href.trim()),
        )
    }

    /// Plain concatenation without separators; the three fields already
    /// disambiguate real listings.
    pub fn derive_id(date: &str, time_range: &str, instructor: &str) -> String {
        let mut id = String::with_capacity(date.len() + time_range.len() + instructor.len());
        id.push_str(&strip_whitespace(date));
        id.push_str(&strip_whitespace(time_range));
        id.push_str(&strip_whitespace(instructor));
        id
    }

    /// Format entry for display using a template.
    ///
    /// Supported placeholders: `{date}`, `{time}`, `{instructor}`, `{link}`
    pub fn format(&self, template: &str) -> String {
        template
            .replace("{date}", &self.date)
            .replace("{time}", &self.time_range)
            .replace("{instructor}", &self.instructor)
            .replace("{link}", &self.link)
    }
}

/// Split `08:0009:30` into `08:00 - 09:30`; anything else passes through
/// unchanged.
pub fn normalize_time_range(raw: &str) -> String {
    let compact = strip_whitespace(raw);
    match CONCATENATED_RANGE.captures(&compact) {
        Some(caps) => format!("{} - {}", &caps[1], &caps[2]),
        None => raw.to_string(),
    }
}
