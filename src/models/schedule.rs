use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// The five daily congregational prayers, in the order they fall in a day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DailyPrayer {
    Fajr,
    Dhuhr,
    Asr,
    Maghrib,
    Isha,
}

impl DailyPrayer {
    pub const ALL: [DailyPrayer; 5] = [
        DailyPrayer::Fajr,
        DailyPrayer::Dhuhr,
        DailyPrayer::Asr,
        DailyPrayer::Maghrib,
        DailyPrayer::Isha,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DailyPrayer::Fajr => "fajr",
            DailyPrayer::Dhuhr => "dhuhr",
            DailyPrayer::Asr => "asr",
            DailyPrayer::Maghrib => "maghrib",
            DailyPrayer::Isha => "isha",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            DailyPrayer::Fajr => "Fajr",
            DailyPrayer::Dhuhr => "Dhuhr",
            DailyPrayer::Asr => "Asr",
            DailyPrayer::Maghrib => "Maghrib",
            DailyPrayer::Isha => "Isha",
        }
    }
}

impl std::fmt::Display for DailyPrayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

impl FromStr for DailyPrayer {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "fajr" => Ok(DailyPrayer::Fajr),
            "dhuhr" | "zuhr" | "dhuhur" => Ok(DailyPrayer::Dhuhr),
            "asr" => Ok(DailyPrayer::Asr),
            "maghrib" => Ok(DailyPrayer::Maghrib),
            "isha" => Ok(DailyPrayer::Isha),
            _ => Err(anyhow::anyhow!("Unknown prayer: {}", s)),
        }
    }
}

/// Adhan and iqamah clock times for one prayer, as "HH:MM" strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrayerSession {
    pub adhan: String,
    pub iqamah: String,
}

impl PrayerSession {
    pub fn new(adhan: impl Into<String>, iqamah: impl Into<String>) -> Self {
        Self {
            adhan: adhan.into(),
            iqamah: iqamah.into(),
        }
    }
}

/// One Friday congregation: sermon followed by prayer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JummahSession {
    pub khutbah: String,
    pub prayer: String,
}

impl JummahSession {
    pub fn new(khutbah: impl Into<String>, prayer: impl Into<String>) -> Self {
        Self {
            khutbah: khutbah.into(),
            prayer: prayer.into(),
        }
    }

    pub fn is_complete(&self) -> bool {
        !self.khutbah.is_empty() && !self.prayer.is_empty()
    }
}

/// All prayer times of one mosque on one calendar date.
///
/// `(mosque_id, date)` is the storage key. `jummah` is `None` rather than an
/// empty list when no session was filled in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailySchedule {
    pub mosque_id: String,
    /// ISO "YYYY-MM-DD"
    pub date: String,
    pub fajr: PrayerSession,
    pub dhuhr: PrayerSession,
    pub asr: PrayerSession,
    pub maghrib: PrayerSession,
    pub isha: PrayerSession,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jummah: Option<Vec<JummahSession>>,
}

impl DailySchedule {
    pub fn session(&self, prayer: DailyPrayer) -> &PrayerSession {
        match prayer {
            DailyPrayer::Fajr => &self.fajr,
            DailyPrayer::Dhuhr => &self.dhuhr,
            DailyPrayer::Asr => &self.asr,
            DailyPrayer::Maghrib => &self.maghrib,
            DailyPrayer::Isha => &self.isha,
        }
    }

    /// Iqamah times in fixed Fajr..Isha order.
    pub fn iqamah_times(&self) -> [&str; 5] {
        DailyPrayer::ALL.map(|p| self.session(p).iqamah.as_str())
    }

    pub fn first_jummah(&self) -> Option<&JummahSession> {
        self.jummah.as_ref().and_then(|j| j.first())
    }
}
