use chrono::NaiveDate;

/// Format an ISO date as "Sun, Jun 2, 2024"
pub fn format_date(date: NaiveDate) -> String {
    date.format("%a, %b %-d, %Y").to_string()
}

/// Parse an ISO "YYYY-MM-DD" date and format it for display; unparseable
/// input is returned unchanged.
pub fn format_date_str(date: &str) -> String {
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map(format_date)
        .unwrap_or_else(|_| date.to_string())
}

/// Format a distance in kilometres: metres below 1 km, one decimal above.
pub fn format_distance(km: f64) -> String {
    if km < 1.0 {
        format!("{:.0} m", km * 1000.0)
    } else {
        format!("{:.1} km", km)
    }
}
