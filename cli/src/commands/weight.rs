use std::str::FromStr;

use anyhow::{Result, bail};
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use matlog_core::models::{TimePeriod, WeightEntry};
use matlog_core::service::TrackerService;

use super::helpers::{parse_date, print_json};

const KG_PER_LB: f64 = 0.453_592_37;

#[derive(Debug, Clone, Copy, PartialEq)]
enum WeightUnit {
    Kg,
    Lbs,
}

impl WeightUnit {
    fn to_kg(self, value: f64) -> f64 {
        match self {
            WeightUnit::Kg => value,
            WeightUnit::Lbs => value * KG_PER_LB,
        }
    }
}

impl FromStr for WeightUnit {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "kg" | "kgs" => Ok(WeightUnit::Kg),
            "lb" | "lbs" => Ok(WeightUnit::Lbs),
            _ => bail!("Invalid unit '{s}'. Use 'kg' or 'lbs'"),
        }
    }
}

fn lbs(kg: f64) -> f64 {
    kg / KG_PER_LB
}

pub(crate) fn cmd_weight_log(
    svc: &TrackerService,
    value: f64,
    unit: &str,
    date: Option<String>,
    note: Option<String>,
    json: bool,
) -> Result<()> {
    let unit: WeightUnit = unit.parse()?;
    let weight_kg = unit.to_kg(value);
    if unit == WeightUnit::Lbs {
        eprintln!("{value:.1} lbs = {weight_kg:.2} kg");
    }

    let entry = svc.add_weight_entry(weight_kg, parse_date(date)?, note)?;

    if json {
        return print_json(&entry);
    }
    println!(
        "Weighed in at {:.1} kg on {}",
        entry.weight_kg,
        entry.date.format("%a %Y-%m-%d")
    );
    if let Some(note) = &entry.note {
        println!("  {note}");
    }
    Ok(())
}

#[derive(Tabled)]
struct WeightRow {
    #[tabled(rename = "ID")]
    id: i64,
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "kg")]
    kg: String,
    #[tabled(rename = "lbs")]
    lbs: String,
    #[tabled(rename = "Change")]
    change: String,
    #[tabled(rename = "Note")]
    note: String,
}

/// Rows newest first, each with the change from the weigh-in before it.
fn history_rows(oldest_first: &[WeightEntry]) -> Vec<WeightRow> {
    let mut previous: Option<f64> = None;
    let mut rows: Vec<WeightRow> = oldest_first
        .iter()
        .map(|e| {
            let change = previous.map_or_else(String::new, |p| format!("{:+.1}", e.weight_kg - p));
            previous = Some(e.weight_kg);
            WeightRow {
                id: e.id,
                date: e.date.format("%Y-%m-%d").to_string(),
                kg: format!("{:.1}", e.weight_kg),
                lbs: format!("{:.1}", lbs(e.weight_kg)),
                change,
                note: e.note.clone().unwrap_or_default(),
            }
        })
        .collect();
    rows.reverse();
    rows
}

pub(crate) fn cmd_weight_history(svc: &TrackerService, period: &str, json: bool) -> Result<()> {
    let period: TimePeriod = period.parse()?;
    let entries = svc.weight_history(period).get()?;

    if json {
        let newest_first: Vec<_> = entries.iter().rev().collect();
        return print_json(&newest_first);
    }
    if entries.is_empty() {
        eprintln!("No weigh-ins in this period. Record one with `matlog weight log <kg>`.");
        return Ok(());
    }

    let table = Table::new(history_rows(&entries))
        .with(Style::rounded())
        .with(Modify::new(Columns::new(2..5)).with(Alignment::right()))
        .to_string();
    println!("{table}");
    Ok(())
}

pub(crate) fn cmd_weight_delete(svc: &TrackerService, id: i64, json: bool) -> Result<()> {
    svc.delete_weight_entry(id)?;
    if json {
        println!("{}", serde_json::json!({ "deleted": id }));
    } else {
        println!("Removed weigh-in {id}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn entry(id: i64, d: u32, kg: f64) -> WeightEntry {
        WeightEntry {
            id,
            weight_kg: kg,
            date: NaiveDate::from_ymd_opt(2024, 5, d).unwrap(),
            note: None,
        }
    }

    #[test]
    fn test_unit_parsing_and_conversion() {
        assert_eq!("KG".parse::<WeightUnit>().unwrap(), WeightUnit::Kg);
        let unit: WeightUnit = "lbs".parse().unwrap();
        assert!((unit.to_kg(176.0) - 79.83).abs() < 0.01);
        assert!("stone".parse::<WeightUnit>().is_err());
    }

    #[test]
    fn test_history_rows_newest_first_with_change() {
        let rows = history_rows(&[entry(1, 1, 80.0), entry(2, 3, 79.4), entry(3, 5, 79.9)]);
        let ids: Vec<_> = rows.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![3, 2, 1]);
        assert_eq!(rows[0].change, "+0.5");
        assert_eq!(rows[1].change, "-0.6");
        assert_eq!(rows[2].change, "");
    }
}
