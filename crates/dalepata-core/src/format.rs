use chrono::{DateTime, Datelike, Utc};

const MONTHS: [&str; 12] = [
    "ene", "feb", "mar", "abr", "may", "jun", "jul", "ago", "sep", "oct", "nov", "dic",
];

/// Human-friendly age of a date, in Spanish
///
/// "Ahora", "Hace 5 min", "Hace 3h", "Hace 2 días", then the plain date
/// (`05 ene 2025`) from a week on. Future dates count as "Ahora".
pub fn relative_time(date: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let diff = now - date;
    let minutes = diff.num_minutes();
    let hours = minutes / 60;
    let days = hours / 24;

    if minutes < 1 {
        return "Ahora".to_string();
    }
    if minutes < 60 {
        return format!("Hace {} min", minutes);
    }
    if hours < 24 {
        return format!("Hace {}h", hours);
    }
    if days < 7 {
        return format!("Hace {} días", days);
    }

    format!(
        "{:02} {} {}",
        date.day(),
        MONTHS[date.month0() as usize],
        date.year()
    )
}
