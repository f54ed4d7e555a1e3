use anyhow::Result;
use chrono::{Datelike, Duration, NaiveDate};
use hijri_date::HijriDate;

/// Islamic month names in English (index 0 = Muharram = month 1)
const HIJRI_MONTH_NAMES: &[&str] = &[
    "Muharram",
    "Safar",
    "Rabi' al-Awwal",
    "Rabi' al-Thani",
    "Jumada al-Awwal",
    "Jumada al-Thani",
    "Rajab",
    "Sha'ban",
    "Ramadan",
    "Shawwal",
    "Dhu al-Qi'dah",
    "Dhu al-Hijjah",
];

fn hijri_month_name(month: usize) -> &'static str {
    if (1..=12).contains(&month) {
        HIJRI_MONTH_NAMES[month - 1]
    } else {
        "Unknown"
    }
}

pub struct HijriInfo {
    pub day: usize,
    pub year: usize,
    pub month_name: &'static str,
}

impl HijriInfo {
    pub fn formatted(&self) -> String {
        format!("{} {} {}", self.day, self.month_name, self.year)
    }
}

/// Hijri date for a Gregorian date, shifted by `offset_days` for local moon
/// sighting (e.g. -1 where the month starts a day after Saudi Arabia).
pub fn to_hijri(date: NaiveDate, offset_days: i32) -> Result<HijriInfo> {
    let adjusted = date + Duration::days(offset_days as i64);
    let hd = HijriDate::from_gr(
        adjusted.year() as usize,
        adjusted.month() as usize,
        adjusted.day() as usize,
    )
    .map_err(|e| anyhow::anyhow!("Hijri conversion error: {}", e))?;

    Ok(HijriInfo {
        day: hd.day(),
        year: hd.year(),
        month_name: hijri_month_name(hd.month()),
    })
}

/// Display string for the schedule header; empty when the date is outside
/// the converter's range.
pub fn hijri_string(date: NaiveDate, offset_days: i32) -> String {
    match to_hijri(date, offset_days) {
        Ok(info) => info.formatted(),
        Err(e) => {
            log::debug!("no hijri date for {}: {}", date, e);
            String::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn month_names_are_bounded() {
        assert_eq!(hijri_month_name(1), "Muharram");
        assert_eq!(hijri_month_name(9), "Ramadan");
        assert_eq!(hijri_month_name(0), "Unknown");
        assert_eq!(hijri_month_name(13), "Unknown");
    }

    #[test]
    fn offset_moves_the_day() {
        let d = NaiveDate::from_ymd_opt(2024, 3, 20).unwrap();
        let base = to_hijri(d, 0).unwrap();
        let next = to_hijri(d, 1).unwrap();
        assert_eq!(base.month_name, "Ramadan");
        assert_ne!(base.day, next.day);
    }
}
