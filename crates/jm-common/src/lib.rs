pub mod api;
pub mod cancellation;
pub mod date;
pub mod directory;
pub mod logging;
pub mod matching;
pub mod semantic;
pub mod service;
pub mod skill_normalizer;
pub mod taxonomy;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use strum::{AsRefStr, Display, EnumString};

use taxonomy::Proficiency;

// Commonly used data models for matching functions.
//
// Enumerated fields (proficiency, levels, remote option) and dates are kept as
// the raw strings produced upstream and parsed inside the matchers, so one bad
// value never rejects a whole profile.

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Location {
    pub city: Option<String>,
    pub region: Option<String>,
    pub country: Option<String>,
}

impl Location {
    pub fn new(
        city: impl Into<String>,
        region: impl Into<String>,
        country: impl Into<String>,
    ) -> Self {
        Self {
            city: Some(city.into()),
            region: Some(region.into()),
            country: Some(country.into()),
        }
    }

    pub fn is_empty(&self) -> bool {
        [&self.city, &self.region, &self.country]
            .iter()
            .all(|part| part.as_deref().map(str::trim).unwrap_or("").is_empty())
    }

    /// "Austin, TX, USA"
    pub fn display(&self) -> String {
        [&self.city, &self.region, &self.country]
            .iter()
            .filter_map(|part| part.as_deref().map(str::trim))
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SkillRecord {
    pub name: String,
    pub category: Option<String>,
    pub proficiency: Option<String>,
    pub years: Option<f64>,
}

impl SkillRecord {
    pub fn new(name: impl Into<String>, proficiency: Proficiency) -> Self {
        Self {
            name: name.into(),
            proficiency: Some(proficiency.as_ref().to_string()),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperienceRecord {
    pub title: String,
    pub organization: String,
    pub domain_tags: Vec<String>,
    /// `YYYY-MM-DD` / `YYYY-MM` / `YYYY`
    pub start: Option<String>,
    /// None or "present" means the position is current.
    pub end: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CandidateProfile {
    pub id: String,
    pub name: Option<String>,
    pub summary: String,
    pub skills: Vec<SkillRecord>,
    pub experience: Vec<ExperienceRecord>,
    /// Declared domain expertise, merged with the tags of each experience record.
    pub domain_tags: Vec<String>,
    pub location: Option<Location>,
    pub remote_preference: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SkillRequirement {
    pub name: String,
    pub category: Option<String>,
    pub min_proficiency: Option<String>,
}

impl SkillRequirement {
    pub fn new(name: impl Into<String>, min_proficiency: Option<Proficiency>) -> Self {
        Self {
            name: name.into(),
            category: None,
            min_proficiency: min_proficiency.map(|p| p.as_ref().to_string()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperienceRequirement {
    pub level: Option<String>,
    pub min_years: Option<f64>,
    pub max_years: Option<f64>,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, AsRefStr, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum RemoteOption {
    RemoteOnly,
    Hybrid,
    OnSiteOnly,
    Flexible,
}

impl RemoteOption {
    /// Accepts "remote-only", "Remote Only" and "remote_only" alike.
    pub fn parse_label(raw: &str) -> Option<Self> {
        let key = raw.trim().replace(['-', ' '], "_");
        match key.to_ascii_lowercase().as_str() {
            "remote" => Some(Self::RemoteOnly),
            "onsite" | "on_site" | "office" => Some(Self::OnSiteOnly),
            other => other.parse().ok(),
        }
    }

    pub fn allows_full_remote(self) -> bool {
        matches!(self, Self::RemoteOnly | Self::Flexible)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum JobStatus {
    #[default]
    Active,
    Paused,
    Closed,
}

impl JobStatus {
    pub fn parse_label(raw: &str) -> Option<Self> {
        let key = raw.trim().to_ascii_lowercase().replace([' ', '-'], "_");
        match key.as_str() {
            "active" | "open" | "published" => Some(Self::Active),
            "paused" | "draft" | "on_hold" => Some(Self::Paused),
            "closed" | "filled" | "archived" => Some(Self::Closed),
            _ => None,
        }
    }
}

/// Missing or null means active; an unrecognised label rejects the posting.
impl<'de> Deserialize<'de> for JobStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let Some(raw) = Option::<String>::deserialize(deserializer)? else {
            return Ok(Self::default());
        };
        Self::parse_label(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown job status `{raw}`")))
    }
}

/// RFC 3339 timestamp or bare `YYYY-MM-DD` (midnight UTC); anything else is dropped.
fn lenient_timestamp<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<DateTime<Utc>>, D::Error> {
    let Some(raw) = Option::<String>::deserialize(deserializer)? else {
        return Ok(None);
    };
    let trimmed = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(Some(parsed.with_timezone(&Utc)));
    }
    let midnight = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc());
    if midnight.is_none() && !trimmed.is_empty() {
        tracing::debug!(posted_at = trimmed, "ignoring unparseable posting timestamp");
    }
    Ok(midnight)
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobPosting {
    pub id: String,
    pub title: String,
    pub company: Option<String>,
    /// Owning recruiter; candidate ranking for this posting is restricted to them.
    pub recruiter_id: Option<String>,
    pub description: String,
    pub requirements: String,
    pub required_skills: Vec<SkillRequirement>,
    pub experience: ExperienceRequirement,
    pub domain_tags: Vec<String>,
    pub location: Option<Location>,
    pub remote_option: Option<String>,
    pub status: JobStatus,
    #[serde(deserialize_with = "lenient_timestamp")]
    pub posted_at: Option<DateTime<Utc>>,
}

impl JobPosting {
    pub fn remote_option_parsed(&self) -> Option<RemoteOption> {
        self.remote_option.as_deref().and_then(RemoteOption::parse_label)
    }
}
