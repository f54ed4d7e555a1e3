use anyhow::Result;
use chrono::NaiveDate;
use rusqlite::Connection;

use crate::db::repository::{AnnouncementRepo, MosqueRepo};
use crate::db::schedule_store::{ScheduleRepo, ScheduleStore};
use crate::models::{Announcement, DailySchedule, Mosque};
use crate::schedule::manager::iso;

/// Everything the public page of one mosque shows.
#[derive(Debug, Clone, PartialEq)]
pub struct MosqueDetails {
    pub mosque: Mosque,
    pub prayer_times: Option<DailySchedule>,
    /// Unexpired on `day`, newest first.
    pub announcements: Vec<Announcement>,
}

/// Public view of an approved mosque on `day`.
///
/// Unknown and unapproved mosques give `None`. A failure loading the times
/// or the announcements is logged and leaves that part empty.
pub fn details(conn: &Connection, id: &str, day: NaiveDate) -> Result<Option<MosqueDetails>> {
    let Some(mosque) = MosqueRepo::get_by_id(conn, id)?.filter(|m| m.approved) else {
        return Ok(None);
    };
    let day = iso(day);

    let prayer_times = match ScheduleRepo::new(conn).find_by_mosque_and_date(id, Some(&day)) {
        Ok(rows) => rows.into_iter().next(),
        Err(e) => {
            log::warn!("failed to load prayer times for {} on {}: {}", id, day, e);
            None
        }
    };

    let announcements = match AnnouncementRepo::list_by_mosque(conn, id) {
        Ok(all) => all.into_iter().filter(|a| !a.is_expired_on(&day)).collect(),
        Err(e) => {
            log::warn!("failed to load announcements for {}: {}", id, e);
            Vec::new()
        }
    };

    Ok(Some(MosqueDetails {
        mosque,
        prayer_times,
        announcements,
    }))
}
