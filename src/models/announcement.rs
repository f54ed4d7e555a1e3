use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnnouncementKind {
    General,
    Event,
    Eid,
    Ramadan,
}

impl AnnouncementKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnnouncementKind::General => "general",
            AnnouncementKind::Event => "event",
            AnnouncementKind::Eid => "eid",
            AnnouncementKind::Ramadan => "ramadan",
        }
    }
}

impl FromStr for AnnouncementKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "general" => Ok(AnnouncementKind::General),
            "event" => Ok(AnnouncementKind::Event),
            "eid" => Ok(AnnouncementKind::Eid),
            "ramadan" => Ok(AnnouncementKind::Ramadan),
            _ => Err(anyhow::anyhow!("Unknown announcement type: {}", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Announcement {
    pub id: String,
    pub mosque_id: String,
    pub title: String,
    pub content: String,
    /// RFC 3339 timestamp
    pub date_posted: String,
    /// ISO "YYYY-MM-DD"; the announcement is hidden after this date.
    pub expiry_date: Option<String>,
    pub kind: AnnouncementKind,
    pub event_date: Option<String>,
    pub event_time: Option<String>,
}

impl Announcement {
    /// Title and content are required; events also need a date and a time.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.title.trim().is_empty() || self.content.trim().is_empty() {
            anyhow::bail!("Title and content are required");
        }
        if self.kind == AnnouncementKind::Event {
            let missing = |v: &Option<String>| v.as_deref().is_none_or(|s| s.trim().is_empty());
            if missing(&self.event_date) || missing(&self.event_time) {
                anyhow::bail!("Event date and time are required for event announcements");
            }
        }
        Ok(())
    }

    pub fn is_expired_on(&self, date: &str) -> bool {
        self.expiry_date
            .as_deref()
            .is_some_and(|expiry| expiry < date)
    }
}
