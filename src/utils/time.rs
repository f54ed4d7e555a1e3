use anyhow::{anyhow, Result};
use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use crate::models::{DailyPrayer, DailySchedule};

/// Convert "HH:MM" to "H:MM AM/PM".
///
/// Blank input gives a blank string. Input whose hour does not parse is
/// returned unchanged.
pub fn format_to_12_hour(time: &str) -> String {
    if time.is_empty() {
        return String::new();
    }
    let (hour, minute) = time.split_once(':').unwrap_or((time, ""));
    let Ok(hour) = hour.trim().parse::<u32>() else {
        return time.to_string();
    };
    let period = if hour < 12 { "AM" } else { "PM" };
    let hour12 = match hour % 12 {
        0 => 12,
        h => h,
    };
    format!("{}:{} {}", hour12, minute, period)
}

/// Current wall-clock time as zero-padded "HH:MM".
pub fn now_hhmm(now: NaiveTime) -> String {
    now.format("%H:%M").to_string()
}

/// Strict "HH:MM" parser: two-digit hour 00-23, two-digit minute.
///
/// Zero padding matters because times are compared as strings.
pub fn parse_time_of_day(s: &str) -> Result<NaiveTime> {
    let b = s.as_bytes();
    if b.len() != 5 || b[2] != b':' {
        return Err(anyhow!("Bad time '{}': expected HH:MM", s));
    }
    NaiveTime::parse_from_str(s, "%H:%M").map_err(|e| anyhow!("Bad time '{}': {}", s, e))
}

/// Whether `candidate` is the iqamah of the first prayer, in fixed daily
/// order, that has not yet started at `now`.
///
/// Once every prayer has passed nothing is "next" and this returns false.
pub fn is_next_prayer(candidate: &str, iqamah_times: &[&str], now: &str) -> bool {
    iqamah_times
        .iter()
        .find(|t| **t > now)
        .is_some_and(|next| *next == candidate)
}

/// What [`next_prayer`] returns once Isha has passed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NextPrayerFallback {
    /// Report tomorrow's Fajr, assuming tomorrow mirrors today.
    #[default]
    TomorrowFajr,
    None,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NextPrayer {
    pub prayer: DailyPrayer,
    pub iqamah: String,
    pub tomorrow: bool,
}

/// First prayer in Fajr..Isha order whose iqamah is later than `now`.
///
/// Blank iqamah fields are skipped.
pub fn next_prayer(
    schedule: &DailySchedule,
    now: &str,
    fallback: NextPrayerFallback,
) -> Option<NextPrayer> {
    let upcoming = DailyPrayer::ALL
        .iter()
        .map(|p| (*p, schedule.session(*p).iqamah.as_str()))
        .filter(|(_, t)| !t.is_empty())
        .find(|(_, t)| *t > now);

    if let Some((prayer, iqamah)) = upcoming {
        return Some(NextPrayer {
            prayer,
            iqamah: iqamah.to_string(),
            tomorrow: false,
        });
    }

    match fallback {
        NextPrayerFallback::TomorrowFajr => Some(NextPrayer {
            prayer: DailyPrayer::Fajr,
            iqamah: schedule.fajr.iqamah.clone(),
            tomorrow: true,
        }),
        NextPrayerFallback::None => None,
    }
}
