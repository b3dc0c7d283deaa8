use anyhow::{Context, Result, bail};
use chrono::{DateTime, Duration, Local, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::Serialize;
use std::io::{self, Write};
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use matlog_core::models::Food;

/// Resolve a day argument against `today`: a keyword or `YYYY-MM-DD`.
fn resolve_day(arg: &str, today: NaiveDate) -> Result<NaiveDate> {
    let offset = match arg.trim().to_lowercase().as_str() {
        "today" => 0,
        "yesterday" => -1,
        "tomorrow" => 1,
        other => {
            return NaiveDate::parse_from_str(other, "%Y-%m-%d").with_context(|| {
                format!("Invalid date '{arg}'. Use YYYY-MM-DD or today/yesterday/tomorrow")
            });
        }
    };
    Ok(today + Duration::days(offset))
}

/// The day named on the command line, or today when none was given.
pub(crate) fn parse_date(arg: Option<String>) -> Result<NaiveDate> {
    let today = Local::now().date_naive();
    arg.map_or(Ok(today), |s| resolve_day(&s, today))
}

/// Parse a session start like `18:30` on `date`, in local time.
pub(crate) fn parse_session_start(date: NaiveDate, time: &str) -> Result<DateTime<Utc>> {
    let time = NaiveTime::parse_from_str(time.trim(), "%H:%M")
        .with_context(|| format!("Invalid time '{time}'. Use HH:MM"))?;
    let local = Local
        .from_local_datetime(&date.and_time(time))
        .earliest()
        .with_context(|| format!("{date} {time} does not exist in the local time zone"))?;
    Ok(local.with_timezone(&Utc))
}

/// Parse `YYYY-MM` into a year and month.
pub(crate) fn parse_month(s: &str) -> Result<(i32, u32)> {
    let (year, month) = s
        .split_once('-')
        .with_context(|| format!("Invalid month '{s}'. Use YYYY-MM"))?;
    let year: i32 = year
        .parse()
        .with_context(|| format!("Invalid year in '{s}'"))?;
    let month: u32 = month
        .parse()
        .with_context(|| format!("Invalid month in '{s}'"))?;
    Ok((year, month))
}

/// Ask on stderr which of `count` listed foods to use. Returns a 0-based index.
pub(crate) fn prompt_choice(count: usize) -> Result<usize> {
    eprint!("\nWhich one? [1-{count}]: ");
    io::stderr().flush()?;
    let mut answer = String::new();
    if io::stdin().read_line(&mut answer)? == 0 {
        bail!("No selection made");
    }
    match answer.trim().parse::<usize>() {
        Ok(n) if (1..=count).contains(&n) => Ok(n - 1),
        _ => bail!("Pick a number between 1 and {count}"),
    }
}

pub(crate) fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub(crate) fn print_food_table(foods: &[Food]) {
    #[derive(Tabled)]
    struct FoodRow {
        #[tabled(rename = "#")]
        idx: usize,
        #[tabled(rename = "FDC ID")]
        fdc_id: i64,
        #[tabled(rename = "Name")]
        name: String,
        #[tabled(rename = "Cal/100g")]
        calories: String,
        #[tabled(rename = "P/100g")]
        protein: String,
        #[tabled(rename = "F/100g")]
        fat: String,
        #[tabled(rename = "C/100g")]
        carbs: String,
    }

    let rows: Vec<FoodRow> = foods
        .iter()
        .enumerate()
        .map(|(i, f)| FoodRow {
            idx: i + 1,
            fdc_id: f.fdc_id,
            name: truncate(&f.name, 40),
            calories: format!("{:.0}", f.calories_per_100g),
            protein: format!("{:.1}", f.protein_per_100g),
            fat: format!("{:.1}", f.fat_per_100g),
            carbs: format!("{:.1}", f.carbs_per_100g),
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(3..7)).with(Alignment::right()))
        .to_string();
    println!("{table}");
}

/// Shorten `s` to at most `max` characters, marking the cut with `...`.
pub(crate) fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let kept: String = s.chars().take(max.saturating_sub(3)).collect();
    format!("{kept}...")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn test_resolve_day_keywords() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        assert_eq!(resolve_day("today", today).unwrap(), today);
        assert_eq!(
            resolve_day("Yesterday", today).unwrap(),
            NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()
        );
        assert_eq!(
            resolve_day("tomorrow", today).unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 2).unwrap()
        );
    }

    #[test]
    fn test_resolve_day_iso_and_invalid() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        assert_eq!(
            resolve_day("2024-01-15", today).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
        );
        let err = resolve_day("someday", today).unwrap_err();
        assert!(err.to_string().contains("someday"));
        assert_eq!(parse_date(None).unwrap(), Local::now().date_naive());
    }

    #[test]
    fn test_parse_session_start() {
        let date = NaiveDate::from_ymd_opt(2024, 6, 3).unwrap();
        let start = parse_session_start(date, "18:30").unwrap();
        let local = start.with_timezone(&Local);
        assert_eq!(local.date_naive(), date);
        assert_eq!((local.hour(), local.minute()), (18, 30));
        assert!(parse_session_start(date, "25:00").is_err());
        assert!(parse_session_start(date, "evening").is_err());
    }

    #[test]
    fn test_parse_month() {
        assert_eq!(parse_month("2024-02").unwrap(), (2024, 2));
        assert!(parse_month("2024").is_err());
        assert!(parse_month("2024-xx").is_err());
    }

    #[test]
    fn test_truncate_counts_chars() {
        assert_eq!(truncate("Kimura", 10), "Kimura");
        assert_eq!(truncate("Single leg takedown", 10), "Single ...");
        assert_eq!(truncate("Açaí na tigela com granola", 10), "Açaí na...");
    }
}
