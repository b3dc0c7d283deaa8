use anyhow::{Result, bail};
use chrono::{Datelike, Local};
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use matlog_core::models::{NewTraining, Training, TrainingType};
use matlog_core::service::TrackerService;

use super::helpers::{parse_date, parse_month, parse_session_start, print_json, truncate};

pub(crate) struct TrainingArgs {
    pub training_type: String,
    pub minutes: i64,
    pub date: Option<String>,
    pub time: String,
    pub notes: Option<String>,
}

pub(crate) fn cmd_training_add(svc: &TrackerService, args: TrainingArgs, json: bool) -> Result<()> {
    let training_type: TrainingType = args.training_type.parse()?;
    let date = parse_session_start(parse_date(args.date)?, &args.time)?;
    let training = svc.add_training(&NewTraining {
        date,
        training_type,
        duration_minutes: args.minutes,
        notes: args.notes.filter(|n| !n.trim().is_empty()),
    })?;

    if json {
        print_json(&training)?;
    } else {
        println!(
            "Added {} session on {} ({} min)",
            training.training_type,
            training.date.with_timezone(&Local).format("%Y-%m-%d %H:%M"),
            training.duration_minutes
        );
    }
    Ok(())
}

pub(crate) fn cmd_training_list(
    svc: &TrackerService,
    month: Option<&str>,
    training_type: Option<&str>,
    json: bool,
) -> Result<()> {
    let trainings = match (month, training_type) {
        (Some(_), Some(_)) => bail!("Use either --month or --type, not both"),
        (_, Some(t)) => svc.trainings_by_type(t.parse()?).get()?,
        (Some(m), None) => {
            let (year, month) = parse_month(m)?;
            svc.trainings_for_month(year, month)?.get()?
        }
        (None, None) => {
            let today = Local::now().date_naive();
            svc.trainings_for_month(today.year(), today.month())?
                .get()?
        }
    };

    if json {
        return print_json(&trainings);
    }
    if trainings.is_empty() {
        eprintln!("No trainings found. Use `matlog training add` to record one.");
        return Ok(());
    }
    print_training_table(&trainings);
    Ok(())
}

pub(crate) fn cmd_training_upcoming(svc: &TrackerService, json: bool) -> Result<()> {
    let trainings = svc.upcoming_trainings().get()?;
    if json {
        return print_json(&trainings);
    }
    if trainings.is_empty() {
        eprintln!("No upcoming trainings");
        return Ok(());
    }
    print_training_table(&trainings);
    Ok(())
}

pub(crate) fn cmd_training_delete(svc: &TrackerService, id: i64, json: bool) -> Result<()> {
    if !svc.delete_training(id)? {
        bail!("Training {id} not found");
    }
    if json {
        println!("{}", serde_json::json!({ "deleted": id }));
    } else {
        println!("Deleted training {id}");
    }
    Ok(())
}

fn print_training_table(trainings: &[Training]) {
    #[derive(Tabled)]
    struct TrainingRow {
        #[tabled(rename = "ID")]
        id: i64,
        #[tabled(rename = "When")]
        when: String,
        #[tabled(rename = "Type")]
        kind: String,
        #[tabled(rename = "Minutes")]
        minutes: i64,
        #[tabled(rename = "Notes")]
        notes: String,
    }

    let rows: Vec<TrainingRow> = trainings
        .iter()
        .map(|t| TrainingRow {
            id: t.id,
            when: t
                .date
                .with_timezone(&Local)
                .format("%Y-%m-%d %H:%M")
                .to_string(),
            kind: t.training_type.to_string(),
            minutes: t.duration_minutes,
            notes: t
                .notes
                .as_deref()
                .map(|n| truncate(n, 40))
                .unwrap_or_default(),
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(3..4)).with(Alignment::right()))
        .to_string();
    println!("{table}");
}
