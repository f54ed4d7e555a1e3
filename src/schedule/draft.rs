use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::models::{DailyPrayer, DailySchedule, JummahSession, PrayerSession};
use crate::utils::time::parse_time_of_day;

/// How much checking a draft gets before it is saved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationMode {
    /// Anything goes, blank fields included.
    #[default]
    Permissive,
    /// Every field must be a zero-padded 24-hour "HH:MM" and iqamah may not
    /// precede adhan.
    Strict,
}

/// Editable form state for one day's schedule.
///
/// Holds a single Jummah pair; it only becomes part of the saved schedule
/// when both of its fields are filled in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScheduleDraft {
    pub fajr: PrayerSession,
    pub dhuhr: PrayerSession,
    pub asr: PrayerSession,
    pub maghrib: PrayerSession,
    pub isha: PrayerSession,
    pub jummah: JummahSession,
}

impl ScheduleDraft {
    pub fn blank() -> Self {
        Self::default()
    }

    /// Seed from a stored schedule, keeping only its first Jummah session.
    pub fn from_schedule(schedule: &DailySchedule) -> Self {
        Self {
            fajr: schedule.fajr.clone(),
            dhuhr: schedule.dhuhr.clone(),
            asr: schedule.asr.clone(),
            maghrib: schedule.maghrib.clone(),
            isha: schedule.isha.clone(),
            jummah: schedule.first_jummah().cloned().unwrap_or_default(),
        }
    }

    pub fn session_mut(&mut self, prayer: DailyPrayer) -> &mut PrayerSession {
        match prayer {
            DailyPrayer::Fajr => &mut self.fajr,
            DailyPrayer::Dhuhr => &mut self.dhuhr,
            DailyPrayer::Asr => &mut self.asr,
            DailyPrayer::Maghrib => &mut self.maghrib,
            DailyPrayer::Isha => &mut self.isha,
        }
    }

    pub fn session(&self, prayer: DailyPrayer) -> &PrayerSession {
        match prayer {
            DailyPrayer::Fajr => &self.fajr,
            DailyPrayer::Dhuhr => &self.dhuhr,
            DailyPrayer::Asr => &self.asr,
            DailyPrayer::Maghrib => &self.maghrib,
            DailyPrayer::Isha => &self.isha,
        }
    }

    pub fn set_session(&mut self, prayer: DailyPrayer, adhan: &str, iqamah: &str) {
        *self.session_mut(prayer) = PrayerSession::new(adhan.trim(), iqamah.trim());
    }

    pub fn set_jummah(&mut self, khutbah: &str, prayer: &str) {
        self.jummah = JummahSession::new(khutbah.trim(), prayer.trim());
    }

    pub fn to_schedule(&self, mosque_id: &str, date: &str) -> DailySchedule {
        DailySchedule {
            mosque_id: mosque_id.to_string(),
            date: date.to_string(),
            fajr: self.fajr.clone(),
            dhuhr: self.dhuhr.clone(),
            asr: self.asr.clone(),
            maghrib: self.maghrib.clone(),
            isha: self.isha.clone(),
            jummah: self.jummah.is_complete().then(|| vec![self.jummah.clone()]),
        }
    }

    pub fn validate(&self, mode: ValidationMode) -> Result<(), ValidationError> {
        if mode == ValidationMode::Permissive {
            return Ok(());
        }

        for prayer in DailyPrayer::ALL {
            let session = self.session(prayer);
            let adhan = check_time(&format!("{} adhan", prayer), &session.adhan)?;
            let iqamah = check_time(&format!("{} iqamah", prayer), &session.iqamah)?;
            if iqamah < adhan {
                return Err(ValidationError::IqamahBeforeAdhan {
                    prayer: prayer.display_name().to_string(),
                    adhan: session.adhan.clone(),
                    iqamah: session.iqamah.clone(),
                });
            }
        }

        // Jummah is optional, but half a pair is a typo rather than "no Jummah".
        let j = &self.jummah;
        if !j.khutbah.is_empty() || !j.prayer.is_empty() {
            check_time("Jummah khutbah", &j.khutbah)?;
            check_time("Jummah prayer", &j.prayer)?;
        }
        Ok(())
    }
}

fn check_time(field: &str, value: &str) -> Result<chrono::NaiveTime, ValidationError> {
    if value.is_empty() {
        return Err(ValidationError::Missing {
            field: field.to_string(),
        });
    }
    parse_time_of_day(value).map_err(|_| ValidationError::BadTime {
        field: field.to_string(),
        value: value.to_string(),
    })
}
