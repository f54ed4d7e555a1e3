use rusqlite::{params, Connection, ErrorCode};
use serde::de::DeserializeOwned;

use crate::error::StoreError;
use crate::models::{DailySchedule, JummahSession, PrayerSession};

/// Persistence boundary for daily schedules, keyed by `(mosque_id, date)`.
pub trait ScheduleStore {
    /// All schedules of a mosque, or only the one for `date` when given.
    /// An empty result is not an error.
    fn find_by_mosque_and_date(
        &self,
        mosque_id: &str,
        date: Option<&str>,
    ) -> Result<Vec<DailySchedule>, StoreError>;

    /// Fails with [`StoreError::Conflict`] if the key is taken.
    fn insert(&self, schedule: &DailySchedule) -> Result<(), StoreError>;

    /// Replaces the session fields of the row with the same key.
    /// Fails with [`StoreError::NotFound`] if there is no such row.
    fn update(&self, schedule: &DailySchedule) -> Result<(), StoreError>;

    fn delete(&self, mosque_id: &str, date: &str) -> Result<(), StoreError>;
}

pub struct ScheduleRepo<'c> {
    conn: &'c Connection,
}

impl<'c> ScheduleRepo<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }
}

fn encode_session(session: &PrayerSession) -> String {
    serde_json::json!({ "adhan": session.adhan, "iqamah": session.iqamah }).to_string()
}

/// `None` (SQL NULL) when there are no sessions.
fn encode_jummah(jummah: Option<&Vec<JummahSession>>) -> Result<Option<String>, StoreError> {
    match jummah {
        Some(sessions) if !sessions.is_empty() => serde_json::to_string(sessions)
            .map(Some)
            .map_err(|e| StoreError::Encode {
                column: "jummah".to_string(),
                reason: e.to_string(),
            }),
        _ => Ok(None),
    }
}

fn decode<T: DeserializeOwned>(column: &str, raw: &str) -> Result<T, StoreError> {
    serde_json::from_str(raw).map_err(|e| StoreError::Decode {
        column: column.to_string(),
        reason: e.to_string(),
    })
}

struct RawRow {
    mosque_id: String,
    date: String,
    sessions: [String; 5],
    jummah: Option<String>,
}

impl RawRow {
    fn into_schedule(self) -> Result<DailySchedule, StoreError> {
        let [fajr, dhuhr, asr, maghrib, isha] = self.sessions;
        let jummah = match self.jummah {
            None => None,
            Some(raw) => {
                let sessions: Vec<JummahSession> = decode("jummah", &raw)?;
                (!sessions.is_empty()).then_some(sessions)
            }
        };
        Ok(DailySchedule {
            mosque_id: self.mosque_id,
            date: self.date,
            fajr: decode("fajr", &fajr)?,
            dhuhr: decode("dhuhr", &dhuhr)?,
            asr: decode("asr", &asr)?,
            maghrib: decode("maghrib", &maghrib)?,
            isha: decode("isha", &isha)?,
            jummah,
        })
    }
}

fn map_raw(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawRow> {
    Ok(RawRow {
        mosque_id: row.get(0)?,
        date: row.get(1)?,
        sessions: [row.get(2)?, row.get(3)?, row.get(4)?, row.get(5)?, row.get(6)?],
        jummah: row.get(7)?,
    })
}

const SELECT_COLUMNS: &str =
    "SELECT mosque_id, date, fajr, dhuhr, asr, maghrib, isha, jummah FROM prayer_times";

impl ScheduleStore for ScheduleRepo<'_> {
    fn find_by_mosque_and_date(
        &self,
        mosque_id: &str,
        date: Option<&str>,
    ) -> Result<Vec<DailySchedule>, StoreError> {
        let mut stmt = self.conn.prepare(&format!(
            "{} WHERE mosque_id = ?1 AND (?2 IS NULL OR date = ?2) ORDER BY date",
            SELECT_COLUMNS
        ))?;
        let raws = stmt
            .query_map(params![mosque_id, date], map_raw)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        log::debug!(
            "fetched {} schedule(s) for mosque {} date {:?}",
            raws.len(),
            mosque_id,
            date
        );
        raws.into_iter().map(RawRow::into_schedule).collect()
    }

    fn insert(&self, schedule: &DailySchedule) -> Result<(), StoreError> {
        let jummah = encode_jummah(schedule.jummah.as_ref())?;
        let result = self.conn.execute(
            "INSERT INTO prayer_times (mosque_id, date, fajr, dhuhr, asr, maghrib, isha, jummah)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                schedule.mosque_id,
                schedule.date,
                encode_session(&schedule.fajr),
                encode_session(&schedule.dhuhr),
                encode_session(&schedule.asr),
                encode_session(&schedule.maghrib),
                encode_session(&schedule.isha),
                jummah,
            ],
        );
        match result {
            Ok(_) => {
                log::info!("inserted schedule {}/{}", schedule.mosque_id, schedule.date);
                Ok(())
            }
            Err(rusqlite::Error::SqliteFailure(e, _)) if e.code == ErrorCode::ConstraintViolation => {
                Err(StoreError::Conflict {
                    mosque_id: schedule.mosque_id.clone(),
                    date: schedule.date.clone(),
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    fn update(&self, schedule: &DailySchedule) -> Result<(), StoreError> {
        let jummah = encode_jummah(schedule.jummah.as_ref())?;
        let changed = self.conn.execute(
            "UPDATE prayer_times
             SET fajr = ?3, dhuhr = ?4, asr = ?5, maghrib = ?6, isha = ?7, jummah = ?8,
                 updated_at = datetime('now')
             WHERE mosque_id = ?1 AND date = ?2",
            params![
                schedule.mosque_id,
                schedule.date,
                encode_session(&schedule.fajr),
                encode_session(&schedule.dhuhr),
                encode_session(&schedule.asr),
                encode_session(&schedule.maghrib),
                encode_session(&schedule.isha),
                jummah,
            ],
        )?;
        if changed == 0 {
            return Err(StoreError::schedule_not_found(&schedule.mosque_id, &schedule.date));
        }
        log::info!("updated schedule {}/{}", schedule.mosque_id, schedule.date);
        Ok(())
    }

    fn delete(&self, mosque_id: &str, date: &str) -> Result<(), StoreError> {
        let changed = self.conn.execute(
            "DELETE FROM prayer_times WHERE mosque_id = ?1 AND date = ?2",
            params![mosque_id, date],
        )?;
        if changed == 0 {
            return Err(StoreError::schedule_not_found(mosque_id, date));
        }
        log::info!("deleted schedule {}/{}", mosque_id, date);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations::run_migrations;

    fn conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        conn
    }

    fn schedule(date: &str) -> DailySchedule {
        DailySchedule {
            mosque_id: "m1".into(),
            date: date.into(),
            fajr: PrayerSession::new("05:15", "05:30"),
            dhuhr: PrayerSession::new("12:45", "13:00"),
            asr: PrayerSession::new("16:00", "16:15"),
            maghrib: PrayerSession::new("18:50", "18:55"),
            isha: PrayerSession::new("20:15", "20:30"),
            jummah: None,
        }
    }

    #[test]
    fn insert_then_find_returns_the_same_record() {
        let conn = conn();
        let repo = ScheduleRepo::new(&conn);
        let mut s = schedule("2024-06-07");
        s.jummah = Some(vec![JummahSession::new("13:00", "13:30")]);
        repo.insert(&s).unwrap();

        let found = repo.find_by_mosque_and_date("m1", Some("2024-06-07")).unwrap();
        assert_eq!(found, vec![s]);
    }

    #[test]
    fn missing_date_is_empty_not_error() {
        let conn = conn();
        let repo = ScheduleRepo::new(&conn);
        assert!(repo.find_by_mosque_and_date("m1", Some("2024-06-02")).unwrap().is_empty());
    }

    #[test]
    fn find_without_date_lists_all_in_order() {
        let conn = conn();
        let repo = ScheduleRepo::new(&conn);
        repo.insert(&schedule("2024-06-03")).unwrap();
        repo.insert(&schedule("2024-06-01")).unwrap();
        let mut other = schedule("2024-06-01");
        other.mosque_id = "m2".into();
        repo.insert(&other).unwrap();

        let all = repo.find_by_mosque_and_date("m1", None).unwrap();
        let dates: Vec<_> = all.iter().map(|s| s.date.as_str()).collect();
        assert_eq!(dates, ["2024-06-01", "2024-06-03"]);
    }

    #[test]
    fn duplicate_insert_is_a_conflict() {
        let conn = conn();
        let repo = ScheduleRepo::new(&conn);
        repo.insert(&schedule("2024-06-02")).unwrap();
        let err = repo.insert(&schedule("2024-06-02")).unwrap_err();
        assert!(matches!(err, StoreError::Conflict { .. }), "{:?}", err);
    }

    #[test]
    fn empty_jummah_is_stored_as_null() {
        let conn = conn();
        let repo = ScheduleRepo::new(&conn);
        let mut s = schedule("2024-06-02");
        s.jummah = Some(vec![]);
        repo.insert(&s).unwrap();

        let raw: Option<String> = conn
            .query_row("SELECT jummah FROM prayer_times", [], |row| row.get(0))
            .unwrap();
        assert_eq!(raw, None);
        let found = repo.find_by_mosque_and_date("m1", Some("2024-06-02")).unwrap();
        assert_eq!(found[0].jummah, None);
    }

    #[test]
    fn jummah_encodes_to_json_list_or_null() {
        assert_eq!(encode_jummah(None).unwrap(), None);
        assert_eq!(encode_jummah(Some(&vec![])).unwrap(), None);
        let sessions = vec![JummahSession::new("13:00", "13:30")];
        assert_eq!(
            encode_jummah(Some(&sessions)).unwrap().as_deref(),
            Some(r#"[{"khutbah":"13:00","prayer":"13:30"}]"#)
        );
    }

    #[test]
    fn update_is_idempotent() {
        let conn = conn();
        let repo = ScheduleRepo::new(&conn);
        repo.insert(&schedule("2024-06-02")).unwrap();
        let mut s = schedule("2024-06-02");
        s.isha = PrayerSession::new("20:20", "20:40");

        repo.update(&s).unwrap();
        let after_first = repo.find_by_mosque_and_date("m1", Some("2024-06-02")).unwrap();
        repo.update(&s).unwrap();
        let after_second = repo.find_by_mosque_and_date("m1", Some("2024-06-02")).unwrap();
        assert_eq!(after_first, after_second);
        assert_eq!(after_second, vec![s]);
    }

    #[test]
    fn update_and_delete_of_missing_row_report_not_found() {
        let conn = conn();
        let repo = ScheduleRepo::new(&conn);
        let s = schedule("2024-06-02");
        assert!(matches!(repo.update(&s), Err(StoreError::NotFound { .. })));
        assert!(matches!(repo.delete("m1", "2024-06-02"), Err(StoreError::NotFound { .. })));

        repo.insert(&s).unwrap();
        repo.delete("m1", "2024-06-02").unwrap();
        assert!(repo.find_by_mosque_and_date("m1", Some("2024-06-02")).unwrap().is_empty());
    }

    #[test]
    fn malformed_row_is_a_decode_error() {
        let conn = conn();
        conn.execute(
            "INSERT INTO prayer_times (mosque_id, date, fajr, dhuhr, asr, maghrib, isha)
             VALUES ('m1', '2024-06-02', '\"05:30\"', '{}', '{}', '{}', '{}')",
            [],
        )
        .unwrap();
        let repo = ScheduleRepo::new(&conn);
        let err = repo.find_by_mosque_and_date("m1", Some("2024-06-02")).unwrap_err();
        match err {
            StoreError::Decode { column, .. } => assert_eq!(column, "fajr"),
            other => panic!("unexpected {:?}", other),
        }
    }
}
