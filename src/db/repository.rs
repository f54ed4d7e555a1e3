use anyhow::Result;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension};
use std::str::FromStr;

use crate::error::StoreError;
use crate::models::{Announcement, AnnouncementKind, Coordinates, Mosque, School};

// ─── Mosque repo ─────────────────────────────────────────────────────────────

const MOSQUE_COLUMNS: &str = "SELECT id, name, address, city, state, country, latitude, longitude,
        school, facilities, contact_number, email, website, image, approved
     FROM mosques";

fn map_mosque(row: &rusqlite::Row<'_>) -> rusqlite::Result<Mosque> {
    let school: String = row.get(8)?;
    let facilities: String = row.get(9)?;
    Ok(Mosque {
        id: row.get(0)?,
        name: row.get(1)?,
        address: row.get(2)?,
        city: row.get(3)?,
        state: row.get(4)?,
        country: row.get(5)?,
        coordinates: Coordinates {
            latitude: row.get(6)?,
            longitude: row.get(7)?,
        },
        school: School::from_str(&school)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(8, Type::Text, e.into()))?,
        facilities: serde_json::from_str(&facilities)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(9, Type::Text, Box::new(e)))?,
        contact_number: row.get(10)?,
        email: row.get(11)?,
        website: row.get(12)?,
        image: row.get(13)?,
        approved: row.get::<_, i32>(14)? != 0,
        distance: None,
    })
}

pub struct MosqueRepo;

impl MosqueRepo {
    /// Store a new registration. It stays unapproved until an administrator
    /// approves it, whatever `mosque.approved` says.
    pub fn register(conn: &Connection, mosque: &Mosque) -> Result<String> {
        let id = if mosque.id.is_empty() {
            uuid::Uuid::new_v4().to_string()
        } else {
            mosque.id.clone()
        };
        conn.execute(
            "INSERT INTO mosques (id, name, address, city, state, country, latitude, longitude,
                school, facilities, contact_number, email, website, image, approved)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, 0)",
            params![
                id,
                mosque.name,
                mosque.address,
                mosque.city,
                mosque.state,
                mosque.country,
                mosque.coordinates.latitude,
                mosque.coordinates.longitude,
                mosque.school.as_str(),
                serde_json::to_string(&mosque.facilities)?,
                mosque.contact_number,
                mosque.email,
                mosque.website,
                mosque.image,
            ],
        )?;
        log::info!("registered mosque {} ({})", mosque.name, id);
        Ok(id)
    }

    pub fn approve(conn: &Connection, id: &str) -> Result<()> {
        let changed = conn.execute("UPDATE mosques SET approved = 1 WHERE id = ?1", params![id])?;
        if changed == 0 {
            return Err(StoreError::NotFound {
                entity: "mosque",
                key: id.to_string(),
            }
            .into());
        }
        Ok(())
    }

    pub fn get_by_id(conn: &Connection, id: &str) -> Result<Option<Mosque>> {
        conn.query_row(&format!("{} WHERE id = ?1", MOSQUE_COLUMNS), params![id], map_mosque)
            .optional()
            .map_err(anyhow::Error::from)
    }

    pub fn list_approved(conn: &Connection, limit: Option<u32>) -> Result<Vec<Mosque>> {
        let sql = match limit {
            Some(n) => format!("{} WHERE approved = 1 ORDER BY name LIMIT {}", MOSQUE_COLUMNS, n),
            None => format!("{} WHERE approved = 1 ORDER BY name", MOSQUE_COLUMNS),
        };
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map([], map_mosque)?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(anyhow::Error::from)
    }

    pub fn update(conn: &Connection, mosque: &Mosque) -> Result<()> {
        let changed = conn.execute(
            "UPDATE mosques SET name = ?2, address = ?3, city = ?4, state = ?5, country = ?6,
                latitude = ?7, longitude = ?8, school = ?9, facilities = ?10,
                contact_number = ?11, email = ?12, website = ?13, image = ?14
             WHERE id = ?1",
            params![
                mosque.id,
                mosque.name,
                mosque.address,
                mosque.city,
                mosque.state,
                mosque.country,
                mosque.coordinates.latitude,
                mosque.coordinates.longitude,
                mosque.school.as_str(),
                serde_json::to_string(&mosque.facilities)?,
                mosque.contact_number,
                mosque.email,
                mosque.website,
                mosque.image,
            ],
        )?;
        if changed == 0 {
            return Err(StoreError::NotFound {
                entity: "mosque",
                key: mosque.id.clone(),
            }
            .into());
        }
        Ok(())
    }
}

// ─── Announcement repo ───────────────────────────────────────────────────────

const ANNOUNCEMENT_COLUMNS: &str = "SELECT id, mosque_id, title, content, date_posted, expiry_date, kind,
        event_date, event_time
     FROM announcements";

fn map_announcement(row: &rusqlite::Row<'_>) -> rusqlite::Result<Announcement> {
    let kind: String = row.get(6)?;
    Ok(Announcement {
        id: row.get(0)?,
        mosque_id: row.get(1)?,
        title: row.get(2)?,
        content: row.get(3)?,
        date_posted: row.get(4)?,
        expiry_date: row.get(5)?,
        kind: AnnouncementKind::from_str(&kind)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(6, Type::Text, e.into()))?,
        event_date: row.get(7)?,
        event_time: row.get(8)?,
    })
}

pub struct AnnouncementRepo;

impl AnnouncementRepo {
    /// Newest first.
    pub fn list_by_mosque(conn: &Connection, mosque_id: &str) -> Result<Vec<Announcement>> {
        let mut stmt = conn.prepare(&format!(
            "{} WHERE mosque_id = ?1 ORDER BY date_posted DESC",
            ANNOUNCEMENT_COLUMNS
        ))?;
        let rows = stmt.query_map(params![mosque_id], map_announcement)?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(anyhow::Error::from)
    }

    /// Validates, assigns an id and a posting time if missing, and returns the id.
    pub fn create(conn: &Connection, announcement: &Announcement) -> Result<String> {
        announcement.validate()?;
        let id = uuid::Uuid::new_v4().to_string();
        let date_posted = if announcement.date_posted.is_empty() {
            chrono::Local::now().to_rfc3339()
        } else {
            announcement.date_posted.clone()
        };
        conn.execute(
            "INSERT INTO announcements
                (id, mosque_id, title, content, date_posted, expiry_date, kind, event_date, event_time)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                id,
                announcement.mosque_id,
                announcement.title,
                announcement.content,
                date_posted,
                announcement.expiry_date,
                announcement.kind.as_str(),
                announcement.event_date,
                announcement.event_time,
            ],
        )?;
        Ok(id)
    }

    /// Replaces everything except the owning mosque and the posting time.
    pub fn update(conn: &Connection, announcement: &Announcement) -> Result<()> {
        announcement.validate()?;
        let changed = conn.execute(
            "UPDATE announcements
             SET title = ?2, content = ?3, expiry_date = ?4, kind = ?5,
                 event_date = ?6, event_time = ?7
             WHERE id = ?1",
            params![
                announcement.id,
                announcement.title,
                announcement.content,
                announcement.expiry_date,
                announcement.kind.as_str(),
                announcement.event_date,
                announcement.event_time,
            ],
        )?;
        if changed == 0 {
            return Err(StoreError::NotFound {
                entity: "announcement",
                key: announcement.id.clone(),
            }
            .into());
        }
        Ok(())
    }

    pub fn delete(conn: &Connection, id: &str) -> Result<()> {
        let changed = conn.execute("DELETE FROM announcements WHERE id = ?1", params![id])?;
        if changed == 0 {
            return Err(StoreError::NotFound {
                entity: "announcement",
                key: id.to_string(),
            }
            .into());
        }
        Ok(())
    }

    pub fn get_by_id(conn: &Connection, id: &str) -> Result<Option<Announcement>> {
        conn.query_row(
            &format!("{} WHERE id = ?1", ANNOUNCEMENT_COLUMNS),
            params![id],
            map_announcement,
        )
        .optional()
        .map_err(anyhow::Error::from)
    }
}

// ─── Favourites ──────────────────────────────────────────────────────────────

/// Mosques a user has starred, keyed by user name.
pub struct FavoriteRepo;

impl FavoriteRepo {
    /// Star or unstar `mosque_id`. Returns whether it is a favourite now.
    pub fn toggle(conn: &Connection, user: &str, mosque_id: &str) -> Result<bool> {
        let removed = conn.execute(
            "DELETE FROM favorites WHERE user = ?1 AND mosque_id = ?2",
            params![user, mosque_id],
        )?;
        if removed > 0 {
            return Ok(false);
        }
        if MosqueRepo::get_by_id(conn, mosque_id)?.is_none() {
            return Err(StoreError::NotFound {
                entity: "mosque",
                key: mosque_id.to_string(),
            }
            .into());
        }
        conn.execute(
            "INSERT INTO favorites (user, mosque_id) VALUES (?1, ?2)",
            params![user, mosque_id],
        )?;
        Ok(true)
    }

    pub fn is_favorite(conn: &Connection, user: &str, mosque_id: &str) -> Result<bool> {
        let found: Option<i64> = conn
            .query_row(
                "SELECT 1 FROM favorites WHERE user = ?1 AND mosque_id = ?2",
                params![user, mosque_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    /// The user's approved favourites, by name.
    pub fn list(conn: &Connection, user: &str) -> Result<Vec<Mosque>> {
        let mut stmt = conn.prepare(&format!(
            "{} WHERE approved = 1
                AND id IN (SELECT mosque_id FROM favorites WHERE user = ?1)
             ORDER BY name",
            MOSQUE_COLUMNS
        ))?;
        let rows = stmt.query_map(params![user], map_mosque)?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(anyhow::Error::from)
    }
}

// ─── App meta ────────────────────────────────────────────────────────────────

pub struct MetaRepo;

impl MetaRepo {
    pub fn get(conn: &Connection, key: &str) -> Result<Option<String>> {
        conn.query_row(
            "SELECT value FROM app_meta WHERE key = ?1",
            params![key],
            |row| row.get(0),
        )
        .optional()
        .map_err(anyhow::Error::from)
    }

    pub fn set(conn: &Connection, key: &str, value: &str) -> Result<()> {
        conn.execute(
            "INSERT INTO app_meta (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = ?2",
            params![key, value],
        )?;
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

    fn mosque(name: &str, city: &str, school: School) -> Mosque {
        Mosque {
            id: String::new(),
            name: name.into(),
            address: "1 Main Road".into(),
            city: city.into(),
            state: String::new(),
            country: "Pakistan".into(),
            coordinates: Coordinates {
                latitude: 33.7,
                longitude: 73.0,
            },
            school,
            facilities: vec!["Wudu area".into(), "Parking".into()],
            contact_number: None,
            email: Some("info@example.org".into()),
            website: None,
            image: None,
            approved: true,
            distance: None,
        }
    }

    #[test]
    fn registration_is_hidden_until_approved() {
        let conn = conn();
        let id = MosqueRepo::register(&conn, &mosque("Faisal Mosque", "Islamabad", School::Hanafi))
            .unwrap();
        assert!(MosqueRepo::list_approved(&conn, None).unwrap().is_empty());

        MosqueRepo::approve(&conn, &id).unwrap();
        let listed = MosqueRepo::list_approved(&conn, None).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].facilities, ["Wudu area", "Parking"]);
        assert_eq!(listed[0].school, School::Hanafi);
    }

    #[test]
    fn approve_unknown_mosque_fails() {
        let conn = conn();
        assert!(MosqueRepo::approve(&conn, "nope").is_err());
    }

    #[test]
    fn update_mosque_changes_fields() {
        let conn = conn();
        let id = MosqueRepo::register(&conn, &mosque("Old", "Lahore", School::Other)).unwrap();
        let mut m = MosqueRepo::get_by_id(&conn, &id).unwrap().unwrap();
        m.name = "Badshahi Mosque".into();
        m.school = School::Shafii;
        MosqueRepo::update(&conn, &m).unwrap();
        let m = MosqueRepo::get_by_id(&conn, &id).unwrap().unwrap();
        assert_eq!(m.name, "Badshahi Mosque");
        assert_eq!(m.school, School::Shafii);
    }

    fn announcement(title: &str, posted: &str) -> Announcement {
        Announcement {
            id: String::new(),
            mosque_id: "m1".into(),
            title: title.into(),
            content: "Details inside".into(),
            date_posted: posted.into(),
            expiry_date: None,
            kind: AnnouncementKind::General,
            event_date: None,
            event_time: None,
        }
    }

    #[test]
    fn announcements_list_newest_first() {
        let conn = conn();
        AnnouncementRepo::create(&conn, &announcement("First", "2024-03-01T10:00:00+00:00"))
            .unwrap();
        AnnouncementRepo::create(&conn, &announcement("Second", "2024-03-05T10:00:00+00:00"))
            .unwrap();
        let titles: Vec<_> = AnnouncementRepo::list_by_mosque(&conn, "m1")
            .unwrap()
            .into_iter()
            .map(|a| a.title)
            .collect();
        assert_eq!(titles, ["Second", "First"]);
    }

    #[test]
    fn invalid_announcement_is_not_stored() {
        let conn = conn();
        let mut a = announcement("", "2024-03-01T10:00:00+00:00");
        a.title.clear();
        assert!(AnnouncementRepo::create(&conn, &a).is_err());
        assert!(AnnouncementRepo::list_by_mosque(&conn, "m1").unwrap().is_empty());
    }

    #[test]
    fn announcement_update_and_delete() {
        let conn = conn();
        let id = AnnouncementRepo::create(&conn, &announcement("Eid", "")).unwrap();
        let mut a = AnnouncementRepo::get_by_id(&conn, &id).unwrap().unwrap();
        assert!(!a.date_posted.is_empty());
        a.kind = AnnouncementKind::Eid;
        a.content = "Eid prayer at 07:30".into();
        AnnouncementRepo::update(&conn, &a).unwrap();
        let stored = AnnouncementRepo::get_by_id(&conn, &id).unwrap().unwrap();
        assert_eq!(stored.kind, AnnouncementKind::Eid);

        AnnouncementRepo::delete(&conn, &id).unwrap();
        assert!(AnnouncementRepo::get_by_id(&conn, &id).unwrap().is_none());
        assert!(AnnouncementRepo::delete(&conn, &id).is_err());
    }

    #[test]
    fn update_unknown_mosque_is_not_found() {
        let conn = conn();
        let mut m = mosque("Ghost", "Quetta", School::Other);
        m.id = "missing".into();
        let err = MosqueRepo::update(&conn, &m).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<StoreError>(),
            Some(StoreError::NotFound { entity: "mosque", .. })
        ));
    }

    #[test]
    fn bad_stored_school_is_a_conversion_error() {
        let conn = conn();
        let id = MosqueRepo::register(&conn, &mosque("Odd", "Multan", School::Other)).unwrap();
        conn.execute_batch("PRAGMA ignore_check_constraints = ON;").unwrap();
        conn.execute("UPDATE mosques SET school = 'Zahiri' WHERE id = ?1", params![id])
            .unwrap();
        let err = MosqueRepo::get_by_id(&conn, &id).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<rusqlite::Error>(),
            Some(rusqlite::Error::FromSqlConversionFailure(8, Type::Text, _))
        ));
    }

    #[test]
    fn announcement_lookup_by_id_ignores_other_rows() {
        let conn = conn();
        let first = AnnouncementRepo::create(&conn, &announcement("First", "2024-03-01T10:00:00+00:00"))
            .unwrap();
        let mut other = announcement("Elsewhere", "2024-03-02T10:00:00+00:00");
        other.mosque_id = "m2".into();
        AnnouncementRepo::create(&conn, &other).unwrap();

        let found = AnnouncementRepo::get_by_id(&conn, &first).unwrap().unwrap();
        assert_eq!(found.title, "First");
        assert_eq!(found.mosque_id, "m1");
        assert!(AnnouncementRepo::get_by_id(&conn, "missing").unwrap().is_none());
    }

    #[test]
    fn favourites_toggle_per_user() {
        let conn = conn();
        let a = MosqueRepo::register(&conn, &mosque("Faisal Mosque", "Islamabad", School::Hanafi))
            .unwrap();
        let b = MosqueRepo::register(&conn, &mosque("Badshahi Mosque", "Lahore", School::Hanafi))
            .unwrap();
        MosqueRepo::approve(&conn, &a).unwrap();
        MosqueRepo::approve(&conn, &b).unwrap();

        assert!(FavoriteRepo::toggle(&conn, "amina", &a).unwrap());
        assert!(FavoriteRepo::toggle(&conn, "amina", &b).unwrap());
        assert!(FavoriteRepo::is_favorite(&conn, "amina", &a).unwrap());
        assert!(!FavoriteRepo::is_favorite(&conn, "yusuf", &a).unwrap());

        let names: Vec<_> = FavoriteRepo::list(&conn, "amina")
            .unwrap()
            .into_iter()
            .map(|m| m.name)
            .collect();
        assert_eq!(names, ["Badshahi Mosque", "Faisal Mosque"]);

        assert!(!FavoriteRepo::toggle(&conn, "amina", &a).unwrap());
        assert!(!FavoriteRepo::is_favorite(&conn, "amina", &a).unwrap());
        assert_eq!(FavoriteRepo::list(&conn, "amina").unwrap().len(), 1);
    }

    #[test]
    fn favouriting_unknown_mosque_fails() {
        let conn = conn();
        assert!(FavoriteRepo::toggle(&conn, "amina", "nope").is_err());
        assert!(FavoriteRepo::list(&conn, "amina").unwrap().is_empty());
    }

    #[test]
    fn meta_round_trip() {
        let conn = conn();
        assert_eq!(MetaRepo::get(&conn, "k").unwrap(), None);
        MetaRepo::set(&conn, "k", "1").unwrap();
        MetaRepo::set(&conn, "k", "2").unwrap();
        assert_eq!(MetaRepo::get(&conn, "k").unwrap().as_deref(), Some("2"));
    }
}
