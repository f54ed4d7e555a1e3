use anyhow::{anyhow, bail, Context, Result};
use chrono::{Local, NaiveDate};
use rusqlite::Connection;
use std::str::FromStr;

use crate::cli::args::{AnnounceCommands, MosqueArg, MosqueCommands, MosqueDateArgs, TimesCommands};
use crate::config::AppConfig;
use crate::db::repository::{AnnouncementRepo, FavoriteRepo, MetaRepo, MosqueRepo};
use crate::db::schedule_store::{ScheduleRepo, ScheduleStore};
use crate::directory;
use crate::error::{ManagerError, ValidationError};
use crate::models::{
    Announcement, AnnouncementKind, Coordinates, DailyPrayer, DailySchedule, Mosque, School,
};
use crate::schedule::manager::iso;
use crate::schedule::{SaveOutcome, ScheduleDraft, ScheduleManager, Session};
use crate::utils::format::{format_date, format_date_str, format_distance};
use crate::utils::hijri::hijri_string;
use crate::utils::maps::extract_coordinates;
use crate::utils::time::{format_to_12_hour, is_next_prayer, next_prayer, now_hhmm, parse_time_of_day};

// ─── ANSI helpers ────────────────────────────────────────────────────────────

macro_rules! println_colored {
    ($color:expr, $($arg:tt)*) => {{
        print!("{}", $color);
        print!($($arg)*);
        println!("\x1b[0m");
    }};
}

const GREEN: &str = "\x1b[32m";
const AMBER: &str = "\x1b[33m";
const RED: &str = "\x1b[31m";
const DIM: &str = "\x1b[2m";
const BOLD: &str = "\x1b[1m";
const GOLD: &str = "\x1b[38;2;196;160;68m";

const ACTIVE_MOSQUE_KEY: &str = "active_mosque";

// ─── Mosque resolution ───────────────────────────────────────────────────────

/// `--mosque`, else the mosque chosen with `mosque use`, else the config default.
fn resolve_mosque(conn: &Connection, config: &AppConfig, arg: &MosqueArg) -> Result<Mosque> {
    let id = match &arg.mosque {
        Some(id) => id.clone(),
        None => MetaRepo::get(conn, ACTIVE_MOSQUE_KEY)?
            .or_else(|| config.admin.mosque_id.clone())
            .ok_or_else(|| {
                anyhow!("No mosque selected. Pass --mosque <id> or run `masjid mosque use <id>`")
            })?,
    };
    MosqueRepo::get_by_id(conn, &id)?.ok_or_else(|| anyhow!("Mosque '{}' not found", id))
}

fn parse_date(s: Option<&str>) -> Result<NaiveDate> {
    match s {
        None => Ok(Local::now().date_naive()),
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map_err(|_| anyhow::Error::from(ValidationError::BadDate(s.to_string()))),
    }
}

fn parse_optional_date(s: Option<&str>) -> Result<Option<String>> {
    s.map(|d| parse_date(Some(d)).map(iso)).transpose()
}

// ─── Mosque ──────────────────────────────────────────────────────────────────

pub fn handle_mosque(conn: &Connection, config: &AppConfig, action: MosqueCommands) -> Result<()> {
    match action {
        MosqueCommands::Register {
            name,
            address,
            city,
            state,
            country,
            school,
            facilities,
            phone,
            email,
            website,
            image,
            map_link,
            lat,
            lng,
        } => {
            let school = School::from_str(&school)?;
            let coordinates = match (map_link.as_deref(), lat, lng) {
                (_, Some(latitude), Some(longitude)) => Coordinates {
                    latitude,
                    longitude,
                },
                (Some(link), _, _) => extract_coordinates(link)
                    .ok_or_else(|| anyhow!("No coordinates found in map link '{}'", link))?,
                _ => bail!("Location is required: pass --map-link or both --lat and --lng"),
            };
            let mosque = Mosque {
                id: String::new(),
                name,
                address,
                city,
                state,
                country,
                coordinates,
                school,
                facilities,
                contact_number: phone,
                email,
                website,
                image,
                approved: false,
                distance: None,
            };
            let id = MosqueRepo::register(conn, &mosque)?;
            println_colored!(GREEN, "  ✓ Registered {} ({})", mosque.name, id);
            println_colored!(DIM, "  It will appear in the directory once approved.");
        }
        MosqueCommands::Edit {
            id,
            name,
            address,
            city,
            facilities,
            phone,
            email,
            website,
        } => {
            let mut mosque =
                MosqueRepo::get_by_id(conn, &id)?.ok_or_else(|| anyhow!("Mosque '{}' not found", id))?;
            if let Some(name) = name {
                mosque.name = name;
            }
            if let Some(address) = address {
                mosque.address = address;
            }
            if let Some(city) = city {
                mosque.city = city;
            }
            if !facilities.is_empty() {
                mosque.facilities = facilities;
            }
            if phone.is_some() {
                mosque.contact_number = phone;
            }
            if email.is_some() {
                mosque.email = email;
            }
            if website.is_some() {
                mosque.website = website;
            }
            MosqueRepo::update(conn, &mosque)?;
            println_colored!(GREEN, "  ✓ Updated {}", mosque.name);
        }
        MosqueCommands::Approve { id } => {
            MosqueRepo::approve(conn, &id)?;
            println_colored!(GREEN, "  ✓ Approved {}", id);
        }
        MosqueCommands::Show { id } => {
            let today = Local::now().date_naive();
            let details = directory::details(conn, &id, today)?
                .ok_or_else(|| anyhow!("Mosque '{}' not found", id))?;
            print_mosque_details(&details.mosque);
            if FavoriteRepo::is_favorite(conn, &config.admin.name, &details.mosque.id)? {
                println_colored!(GOLD, "  ★ In your favourites");
            }
            print_schedule(config, &details.mosque, today, details.prayer_times.as_ref());
            print_announcements(&details.announcements, &iso(today));
        }
        MosqueCommands::Inspect { id } => {
            let mosque =
                MosqueRepo::get_by_id(conn, &id)?.ok_or_else(|| anyhow!("Mosque '{}' not found", id))?;
            print_mosque_details(&mosque);
        }
        MosqueCommands::Favorite { id } => {
            if FavoriteRepo::toggle(conn, &config.admin.name, &id)? {
                println_colored!(GREEN, "  ★ Added to favourites");
            } else {
                println_colored!(AMBER, "  Removed from favourites");
            }
        }
        MosqueCommands::Favorites => {
            let favourites = FavoriteRepo::list(conn, &config.admin.name)?;
            print_mosque_list(&favourites);
        }
        MosqueCommands::Search { query, school } => {
            let school = school.as_deref().map(School::from_str).transpose()?;
            let hits = directory::search(conn, &query, school, config.directory.default_limit)?;
            print_mosque_list(&hits);
        }
        MosqueCommands::Nearby { lat, lng, radius } => {
            let origin = Coordinates {
                latitude: lat,
                longitude: lng,
            };
            let radius = radius.unwrap_or(config.directory.nearby_radius_km);
            let hits = directory::nearby(conn, origin, radius)?;
            print_mosque_list(&hits);
        }
        MosqueCommands::Use { id } => {
            let mosque =
                MosqueRepo::get_by_id(conn, &id)?.ok_or_else(|| anyhow!("Mosque '{}' not found", id))?;
            MetaRepo::set(conn, ACTIVE_MOSQUE_KEY, &mosque.id)?;
            println_colored!(GREEN, "  ✓ Now managing {}", mosque.name);
        }
    }
    Ok(())
}

fn print_mosque_list(mosques: &[Mosque]) {
    println!();
    if mosques.is_empty() {
        println_colored!(DIM, "  No mosques found");
    }
    for m in mosques {
        let distance = m.distance.map(format_distance).unwrap_or_default();
        println_colored!(BOLD, "  {:<30}  {:<8}  {}", m.name, m.school.as_str(), distance);
        println_colored!(DIM, "  {}  [{}]", m.location_line(), m.id);
    }
    println!();
}

fn print_mosque_details(m: &Mosque) {
    println!();
    println_colored!(GOLD, "  {}", m.name);
    println!("  {}", m.location_line());
    println!("  School:     {}", m.school);
    println!(
        "  Location:   {:.4}, {:.4}",
        m.coordinates.latitude, m.coordinates.longitude
    );
    if !m.facilities.is_empty() {
        println!("  Facilities: {}", m.facilities.join(", "));
    }
    for (label, value) in [
        ("Phone", &m.contact_number),
        ("Email", &m.email),
        ("Website", &m.website),
    ] {
        if let Some(v) = value {
            println!("  {:<11} {}", format!("{}:", label), v);
        }
    }
    if !m.approved {
        println_colored!(AMBER, "  Awaiting approval");
    }
    println!();
}

// ─── Times ───────────────────────────────────────────────────────────────────

fn manager<'a>(
    config: &AppConfig,
    store: &'a dyn ScheduleStore,
    mosque: &Mosque,
    date: NaiveDate,
) -> ScheduleManager<'a> {
    ScheduleManager::new(
        Session::new(config.admin.name.clone(), store),
        mosque.id.clone(),
        date,
        config.schedule.validation_mode(),
    )
}

/// Split "ADHAN/IQAMAH" (or "KHUTBAH/PRAYER").
fn parse_pair(field: &str, value: &str) -> Result<(String, String)> {
    let (a, b) = value
        .split_once('/')
        .ok_or_else(|| anyhow!("--{} expects two times separated by '/', e.g. 05:15/05:30", field))?;
    Ok((a.trim().to_string(), b.trim().to_string()))
}

pub fn handle_times(conn: &Connection, config: &AppConfig, action: TimesCommands) -> Result<()> {
    let repo = ScheduleRepo::new(conn);

    match action {
        TimesCommands::Show { target } => {
            let (mosque, date) = resolve_target(conn, config, &target)?;
            let mut m = manager(config, &repo, &mosque, date);
            m.select_date(date)?;
            print_schedule(config, &mosque, date, m.current());
        }
        TimesCommands::Set {
            target,
            fajr,
            dhuhr,
            asr,
            maghrib,
            isha,
            jummah,
            copy_prev,
        } => {
            let (mosque, date) = resolve_target(conn, config, &target)?;
            let mut m = manager(config, &repo, &mosque, date);
            m.select_date(date)?;

            if copy_prev {
                m.copy_from_previous_day().map_err(describe_manager_error)?;
            } else {
                m.begin_edit()?;
            }
            let fields = [&fajr, &dhuhr, &asr, &maghrib, &isha, &jummah];
            if !copy_prev && fields.iter().all(|f| f.is_none()) {
                m.cancel_edit()?;
                println_colored!(DIM, "  Nothing to change; pass --fajr, --isha, --jummah ...");
                return Ok(());
            }

            let draft = m
                .draft_mut()
                .ok_or_else(|| anyhow!("Schedule editor did not open"))?;
            for (prayer, value) in [
                (DailyPrayer::Fajr, fajr),
                (DailyPrayer::Dhuhr, dhuhr),
                (DailyPrayer::Asr, asr),
                (DailyPrayer::Maghrib, maghrib),
                (DailyPrayer::Isha, isha),
            ] {
                if let Some(value) = value {
                    let (adhan, iqamah) = parse_pair(prayer.as_str(), &value)?;
                    draft.set_session(prayer, &adhan, &iqamah);
                }
            }
            if let Some(value) = jummah {
                let (khutbah, prayer) = parse_pair("jummah", &value)?;
                draft.set_jummah(&khutbah, &prayer);
            }
            if let Some(draft) = m.draft() {
                warn_blank_fields(draft);
            }

            let outcome = m.save().map_err(describe_manager_error)?;
            let verb = match outcome {
                SaveOutcome::Inserted => "Created",
                SaveOutcome::Updated => "Updated",
            };
            println_colored!(GREEN, "  ✓ {} prayer times for {}", verb, format_date(m.date()));
            print_schedule(config, &mosque, m.date(), m.current());
        }
        TimesCommands::CopyPrev { target } => {
            let (mosque, date) = resolve_target(conn, config, &target)?;
            let mut m = manager(config, &repo, &mosque, date);
            m.select_date(date)?;
            m.copy_from_previous_day().map_err(describe_manager_error)?;
            m.save().map_err(describe_manager_error)?;
            println_colored!(GREEN, "  ✓ Prayer times copied from previous day");
            print_schedule(config, &mosque, date, m.current());
        }
        TimesCommands::Delete { target } => {
            let (mosque, date) = resolve_target(conn, config, &target)?;
            let mut m = manager(config, &repo, &mosque, date);
            m.select_date(date)?;
            m.delete_current().map_err(describe_manager_error)?;
            println_colored!(AMBER, "  Deleted prayer times for {}", format_date(date));
        }
        TimesCommands::Next { mosque, at } => {
            let mosque = resolve_mosque(conn, config, &mosque)?;
            let now = match at {
                Some(t) => now_hhmm(parse_time_of_day(&t)?),
                None => now_hhmm(Local::now().time()),
            };
            let today = Local::now().date_naive();
            let mut m = manager(config, &repo, &mosque, today);
            m.select_date(today)?;
            let Some(schedule) = m.current() else {
                println_colored!(DIM, "  No prayer times set for today at {}", mosque.name);
                return Ok(());
            };
            match next_prayer(schedule, &now, config.schedule.next_prayer_fallback) {
                Some(next) => {
                    let when = if next.tomorrow { " tomorrow" } else { "" };
                    println_colored!(
                        AMBER,
                        "  Next: {} at {}{}",
                        next.prayer.display_name(),
                        format_to_12_hour(&next.iqamah),
                        when
                    );
                }
                None => println_colored!(DIM, "  All prayers for today have passed"),
            }
        }
        TimesCommands::Export { mosque } => {
            let mosque = resolve_mosque(conn, config, &mosque)?;
            let all = repo.find_by_mosque_and_date(&mosque.id, None)?;
            println!("{}", serde_json::to_string_pretty(&all)?);
        }
    }
    Ok(())
}

fn resolve_target(
    conn: &Connection,
    config: &AppConfig,
    target: &MosqueDateArgs,
) -> Result<(Mosque, NaiveDate)> {
    let mosque = resolve_mosque(conn, config, &target.mosque)?;
    let date = parse_date(target.date.as_deref())?;
    Ok((mosque, date))
}

fn describe_manager_error(e: ManagerError) -> anyhow::Error {
    match e {
        ManagerError::ScheduleExists => {
            anyhow!("This date already has prayer times; edit them with `masjid times set`")
        }
        ManagerError::Store(e) => anyhow::Error::new(e).context("Failed to save prayer times"),
        other => anyhow::Error::new(other),
    }
}

fn warn_blank_fields(draft: &ScheduleDraft) {
    let blank: Vec<&str> = DailyPrayer::ALL
        .iter()
        .filter(|p| {
            let s = draft.session(**p);
            s.adhan.is_empty() || s.iqamah.is_empty()
        })
        .map(|p| p.display_name())
        .collect();
    if !blank.is_empty() {
        println_colored!(AMBER, "  Note: no times given for {}", blank.join(", "));
    }
}

fn print_schedule(
    config: &AppConfig,
    mosque: &Mosque,
    date: NaiveDate,
    schedule: Option<&DailySchedule>,
) {
    println!();
    let hijri = hijri_string(date, config.schedule.hijri_offset);
    if hijri.is_empty() {
        println_colored!(GOLD, "  Prayer Times — {} ({})", mosque.name, format_date(date));
    } else {
        println_colored!(
            GOLD,
            "  Prayer Times — {} ({} · {})",
            mosque.name,
            format_date(date),
            hijri
        );
    }
    println!();

    let Some(schedule) = schedule else {
        println_colored!(DIM, "  No prayer times set for this date");
        println_colored!(DIM, "  Add them with `masjid times set` or `masjid times copy-prev`");
        println!();
        return;
    };

    let is_today = date == Local::now().date_naive();
    let now = now_hhmm(Local::now().time());
    let iqamahs = schedule.iqamah_times();

    println_colored!(DIM, "  {:<10}  {:>9}  {:>9}", "", "Adhan", "Iqamah");
    for prayer in DailyPrayer::ALL {
        let session = schedule.session(prayer);
        let line = format!(
            "  {:<10}  {:>9}  {:>9}",
            prayer.display_name(),
            format_to_12_hour(&session.adhan),
            format_to_12_hour(&session.iqamah)
        );
        if is_today && is_next_prayer(&session.iqamah, &iqamahs, &now) {
            println_colored!(AMBER, "{}  ← next", line);
        } else if is_today && !session.iqamah.is_empty() && session.iqamah.as_str() <= now.as_str() {
            println_colored!(DIM, "{}", line);
        } else {
            println_colored!(BOLD, "{}", line);
        }
    }

    if let Some(sessions) = &schedule.jummah {
        println!();
        for (i, j) in sessions.iter().enumerate() {
            println!(
                "  {:<10}  {:>9}  {:>9}",
                format!("Jummah {}", i + 1),
                format_to_12_hour(&j.khutbah),
                format_to_12_hour(&j.prayer)
            );
        }
    }
    println!();
}

// ─── Announcements ───────────────────────────────────────────────────────────

fn print_announcements(items: &[Announcement], today: &str) {
    println!();
    if items.is_empty() {
        println_colored!(DIM, "  Nothing posted");
    }
    for a in items {
        let posted = a.date_posted.get(..10).unwrap_or(&a.date_posted);
        println_colored!(BOLD, "  {}  [{}]", a.title, a.kind.as_str());
        println!("  {}", a.content);
        if let (Some(d), Some(t)) = (&a.event_date, &a.event_time) {
            println_colored!(AMBER, "  When: {} at {}", format_date_str(d), format_to_12_hour(t));
        }
        let expired = if a.is_expired_on(today) { " · expired" } else { "" };
        println_colored!(DIM, "  Posted {}{}  ({})", format_date_str(posted), expired, a.id);
        println!();
    }
}

pub fn handle_announce(conn: &Connection, config: &AppConfig, action: AnnounceCommands) -> Result<()> {
    match action {
        AnnounceCommands::List { mosque, all } => {
            let mosque = resolve_mosque(conn, config, &mosque)?;
            let today = iso(Local::now().date_naive());
            let items: Vec<Announcement> = AnnouncementRepo::list_by_mosque(conn, &mosque.id)?
                .into_iter()
                .filter(|a| all || !a.is_expired_on(&today))
                .collect();

            println!();
            println_colored!(GOLD, "  Announcements — {}", mosque.name);
            print_announcements(&items, &today);
        }
        AnnounceCommands::Add {
            mosque,
            title,
            content,
            kind,
            expires,
            event_date,
            event_time,
        } => {
            let mosque = resolve_mosque(conn, config, &mosque)?;
            let announcement = Announcement {
                id: String::new(),
                mosque_id: mosque.id.clone(),
                title,
                content,
                date_posted: Local::now().to_rfc3339(),
                expiry_date: parse_optional_date(expires.as_deref())?,
                kind: AnnouncementKind::from_str(&kind)?,
                event_date: parse_optional_date(event_date.as_deref())?,
                event_time,
            };
            let id = AnnouncementRepo::create(conn, &announcement)
                .context("Failed to save announcement")?;
            println_colored!(GREEN, "  ✓ Announcement posted ({})", id);
        }
        AnnounceCommands::Update {
            id,
            title,
            content,
            kind,
            expires,
            event_date,
            event_time,
        } => {
            let mut a = AnnouncementRepo::get_by_id(conn, &id)?
                .ok_or_else(|| anyhow!("Announcement '{}' not found", id))?;
            if let Some(title) = title {
                a.title = title;
            }
            if let Some(content) = content {
                a.content = content;
            }
            if let Some(kind) = kind {
                a.kind = AnnouncementKind::from_str(&kind)?;
            }
            if expires.is_some() {
                a.expiry_date = parse_optional_date(expires.as_deref())?;
            }
            if event_date.is_some() {
                a.event_date = parse_optional_date(event_date.as_deref())?;
            }
            if event_time.is_some() {
                a.event_time = event_time;
            }
            AnnouncementRepo::update(conn, &a).context("Failed to save announcement")?;
            println_colored!(GREEN, "  ✓ Announcement updated");
        }
        AnnounceCommands::Delete { id } => match AnnouncementRepo::delete(conn, &id) {
            Ok(()) => println_colored!(GREEN, "  ✓ Announcement deleted"),
            Err(e) => {
                println_colored!(RED, "  ✗ Failed to delete announcement");
                return Err(e);
            }
        },
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pairs_split_on_slash() {
        assert_eq!(
            parse_pair("fajr", "05:15/05:30").unwrap(),
            ("05:15".to_string(), "05:30".to_string())
        );
        assert_eq!(
            parse_pair("fajr", " 05:15 / ").unwrap(),
            ("05:15".to_string(), String::new())
        );
        assert!(parse_pair("fajr", "05:15").is_err());
    }

    #[test]
    fn dates_must_be_iso() {
        assert_eq!(iso(parse_date(Some("2024-06-02")).unwrap()), "2024-06-02");
        assert!(parse_date(Some("02/06/2024")).is_err());
        assert_eq!(parse_optional_date(None).unwrap(), None);
    }

    fn listed_mosque() -> Mosque {
        Mosque {
            id: "m1".into(),
            name: "Masjid One".into(),
            address: String::new(),
            city: String::new(),
            state: String::new(),
            country: String::new(),
            coordinates: Coordinates {
                latitude: 0.0,
                longitude: 0.0,
            },
            school: School::Other,
            facilities: vec![],
            contact_number: None,
            email: None,
            website: None,
            image: None,
            approved: false,
            distance: None,
        }
    }

    fn db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::migrations::run_migrations(&conn).unwrap();
        conn
    }

    #[test]
    fn times_set_without_fields_writes_nothing() {
        let conn = db();
        MosqueRepo::register(&conn, &listed_mosque()).unwrap();
        let mut config = AppConfig::default();
        config.admin.mosque_id = Some("m1".into());
        let target = MosqueDateArgs {
            mosque: MosqueArg::default(),
            date: Some("2024-06-02".into()),
        };
        let set = |fajr: Option<String>| TimesCommands::Set {
            target: target.clone(),
            fajr,
            dhuhr: None,
            asr: None,
            maghrib: None,
            isha: None,
            jummah: None,
            copy_prev: false,
        };

        handle_times(&conn, &config, set(None)).unwrap();
        let repo = ScheduleRepo::new(&conn);
        assert!(repo.find_by_mosque_and_date("m1", Some("2024-06-02")).unwrap().is_empty());

        handle_times(&conn, &config, set(Some("05:15/05:30".into()))).unwrap();
        let stored = repo.find_by_mosque_and_date("m1", Some("2024-06-02")).unwrap();
        assert_eq!(stored[0].fajr.iqamah, "05:30");
    }

    #[test]
    fn public_page_requires_approval() {
        let conn = db();
        MosqueRepo::register(&conn, &listed_mosque()).unwrap();
        let config = AppConfig::default();
        let show = || MosqueCommands::Show { id: "m1".into() };

        assert!(handle_mosque(&conn, &config, show()).is_err());
        handle_mosque(&conn, &config, MosqueCommands::Inspect { id: "m1".into() }).unwrap();

        MosqueRepo::approve(&conn, "m1").unwrap();
        handle_mosque(&conn, &config, show()).unwrap();
    }

    #[test]
    fn mosque_resolution_prefers_flag_then_active_then_config() {
        let conn = db();
        let base = listed_mosque();
        MosqueRepo::register(&conn, &base).unwrap();
        MosqueRepo::register(&conn, &Mosque { id: "m2".into(), ..base.clone() }).unwrap();

        let mut config = AppConfig::default();
        assert!(resolve_mosque(&conn, &config, &MosqueArg::default()).is_err());

        config.admin.mosque_id = Some("m1".into());
        assert_eq!(resolve_mosque(&conn, &config, &MosqueArg::default()).unwrap().id, "m1");

        MetaRepo::set(&conn, ACTIVE_MOSQUE_KEY, "m2").unwrap();
        assert_eq!(resolve_mosque(&conn, &config, &MosqueArg::default()).unwrap().id, "m2");

        let flag = MosqueArg {
            mosque: Some("m1".into()),
        };
        assert_eq!(resolve_mosque(&conn, &config, &flag).unwrap().id, "m1");
    }
}
