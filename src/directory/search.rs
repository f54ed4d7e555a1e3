use anyhow::Result;
use rusqlite::Connection;

use crate::db::repository::MosqueRepo;
use crate::models::{Coordinates, Mosque, School};
use crate::utils::maps::distance_km;

/// Case-insensitive substring match on name, address or city, ANDed with an
/// exact school filter.
pub fn filter_mosques<'m>(
    mosques: &'m [Mosque],
    query: &str,
    school: Option<School>,
) -> Vec<&'m Mosque> {
    let query = query.trim().to_lowercase();
    mosques
        .iter()
        .filter(|m| {
            query.is_empty()
                || m.name.to_lowercase().contains(&query)
                || m.address.to_lowercase().contains(&query)
                || m.city.to_lowercase().contains(&query)
        })
        .filter(|m| school.is_none_or(|s| m.school == s))
        .collect()
}

/// Public directory search over approved mosques. A blank query browses the
/// first `browse_limit` entries instead.
pub fn search(
    conn: &Connection,
    query: &str,
    school: Option<School>,
    browse_limit: u32,
) -> Result<Vec<Mosque>> {
    let approved = if query.trim().is_empty() {
        MosqueRepo::list_approved(conn, Some(browse_limit))?
    } else {
        MosqueRepo::list_approved(conn, None)?
    };
    let hits: Vec<Mosque> = filter_mosques(&approved, query, school)
        .into_iter()
        .cloned()
        .collect();
    log::debug!("search '{}' matched {} mosque(s)", query, hits.len());
    Ok(hits)
}

/// Approved mosques within `radius_km`, nearest first, with `distance` set.
pub fn nearby(conn: &Connection, origin: Coordinates, radius_km: f64) -> Result<Vec<Mosque>> {
    let mut hits: Vec<Mosque> = MosqueRepo::list_approved(conn, None)?
        .into_iter()
        .filter_map(|mut m| {
            let d = distance_km(origin, m.coordinates);
            (d <= radius_km).then(|| {
                m.distance = Some(d);
                m
            })
        })
        .collect();
    hits.sort_by(|a, b| a.distance.unwrap_or(f64::MAX).total_cmp(&b.distance.unwrap_or(f64::MAX)));
    Ok(hits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations::run_migrations;

    fn mosque(name: &str, address: &str, city: &str, school: School, lat: f64, lng: f64) -> Mosque {
        Mosque {
            id: String::new(),
            name: name.into(),
            address: address.into(),
            city: city.into(),
            state: String::new(),
            country: "Pakistan".into(),
            coordinates: Coordinates {
                latitude: lat,
                longitude: lng,
            },
            school,
            facilities: vec![],
            contact_number: None,
            email: None,
            website: None,
            image: None,
            approved: true,
            distance: None,
        }
    }

    fn seeded() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        for m in [
            mosque("Faisal Mosque", "Shah Faisal Ave", "Islamabad", School::Hanafi, 33.7296, 73.0372),
            mosque("Lal Masjid", "G-6/4", "Islamabad", School::Other, 33.7125, 73.0867),
            mosque("Badshahi Mosque", "Walled City", "Lahore", School::Hanafi, 31.5880, 74.3106),
        ] {
            let id = MosqueRepo::register(&conn, &m).unwrap();
            MosqueRepo::approve(&conn, &id).unwrap();
        }
        MosqueRepo::register(
            &conn,
            &mosque("Pending Masjid", "Blue Area", "Islamabad", School::Hanafi, 33.71, 73.06),
        )
        .unwrap();
        conn
    }

    #[test]
    fn filter_matches_name_address_and_city() {
        let list = vec![
            mosque("Faisal Mosque", "Shah Faisal Ave", "Islamabad", School::Hanafi, 0.0, 0.0),
            mosque("Masjid Noor", "Canal Road", "Lahore", School::Shafii, 0.0, 0.0),
        ];
        assert_eq!(filter_mosques(&list, "faisal", None).len(), 1);
        assert_eq!(filter_mosques(&list, "CANAL", None)[0].name, "Masjid Noor");
        assert_eq!(filter_mosques(&list, "lahore", None).len(), 1);
        assert_eq!(filter_mosques(&list, "", Some(School::Shafii)).len(), 1);
        assert!(filter_mosques(&list, "faisal", Some(School::Shafii)).is_empty());
    }

    #[test]
    fn search_only_lists_approved() {
        let conn = seeded();
        let hits = search(&conn, "islamabad", None, 20).unwrap();
        let names: Vec<_> = hits.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, ["Faisal Mosque", "Lal Masjid"]);
    }

    #[test]
    fn blank_query_browses_with_limit() {
        let conn = seeded();
        assert_eq!(search(&conn, "  ", None, 2).unwrap().len(), 2);
        assert_eq!(search(&conn, "", Some(School::Hanafi), 20).unwrap().len(), 2);
    }

    #[test]
    fn nearby_sorts_by_distance_within_radius() {
        let conn = seeded();
        let origin = Coordinates {
            latitude: 33.7200,
            longitude: 73.0800,
        };
        let hits = nearby(&conn, origin, 10.0).unwrap();
        let names: Vec<_> = hits.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, ["Lal Masjid", "Faisal Mosque"]);
        assert!(hits.iter().all(|m| m.distance.unwrap() <= 10.0));
    }
}
