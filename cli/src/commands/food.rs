use anyhow::{Result, bail};
use std::process;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use matlog_core::models::{Food, MealType};
use matlog_core::service::TrackerService;

use super::helpers::{parse_date, print_food_table, print_json, prompt_choice, truncate};

/// Run the remote search on a blocking thread.
async fn search(svc: &TrackerService, query: &str) -> Result<Vec<Food>> {
    let svc = svc.clone();
    let query = query.to_string();
    let foods = tokio::task::spawn_blocking(move || svc.search_foods(&query)).await??;
    Ok(foods)
}

pub(crate) async fn cmd_food_search(svc: &TrackerService, query: &str, json: bool) -> Result<()> {
    let foods = search(svc, query).await?;

    if foods.is_empty() {
        if json {
            println!("[]");
        } else {
            eprintln!("No foods found for '{query}'");
        }
        process::exit(2);
    }

    if json {
        print_json(&foods)?;
    } else {
        print_food_table(&foods);
    }
    Ok(())
}

pub(crate) struct LogArgs {
    pub query: String,
    pub grams: f64,
    pub meal: String,
    pub date: Option<String>,
    pub fdc_id: Option<i64>,
}

pub(crate) async fn cmd_food_log(svc: &TrackerService, args: LogArgs, json: bool) -> Result<()> {
    let meal: MealType = args.meal.parse()?;
    let date = parse_date(args.date)?;

    let mut foods = search(svc, &args.query).await?;
    if let Some(id) = args.fdc_id {
        foods.retain(|f| f.fdc_id == id);
    }
    let food = match foods.len() {
        0 => bail!("No food found for '{}'", args.query),
        1 => foods.swap_remove(0),
        n => {
            print_food_table(&foods);
            foods.swap_remove(prompt_choice(n)?)
        }
    };

    let log = svc.add_food_log(&food, args.grams, meal, date)?;
    if json {
        print_json(&log)?;
    } else {
        println!(
            "Logged {:.0}g of {} to {} on {} ({:.0} kcal)",
            log.grams,
            log.name,
            log.meal_type,
            log.date.format("%Y-%m-%d"),
            log.calories
        );
    }
    Ok(())
}

pub(crate) struct CustomFoodArgs {
    pub name: String,
    pub grams: f64,
    pub calories: f64,
    pub protein: f64,
    pub fat: f64,
    pub carbs: f64,
    pub meal: String,
    pub date: Option<String>,
}

/// Log a food that is not in the remote database, from per-100g values.
pub(crate) fn cmd_food_add(svc: &TrackerService, args: CustomFoodArgs, json: bool) -> Result<()> {
    if args.name.trim().is_empty() {
        bail!("Food name cannot be empty");
    }
    if args.calories < 0.0 || args.protein < 0.0 || args.fat < 0.0 || args.carbs < 0.0 {
        bail!("Nutrition values cannot be negative");
    }
    let meal: MealType = args.meal.parse()?;
    let date = parse_date(args.date)?;
    let food = Food::custom(
        args.name.trim(),
        args.calories,
        args.protein,
        args.fat,
        args.carbs,
    );

    let log = svc.add_food_log(&food, args.grams, meal, date)?;
    if json {
        print_json(&log)?;
    } else {
        println!(
            "Logged {:.0}g of {} (custom) to {} ({:.0} kcal)",
            log.grams, log.name, log.meal_type, log.calories
        );
    }
    Ok(())
}

pub(crate) fn cmd_food_list(
    svc: &TrackerService,
    date: Option<String>,
    meal: Option<&str>,
    json: bool,
) -> Result<()> {
    let date = parse_date(date)?;
    let meal = meal.map(str::parse::<MealType>).transpose()?;
    let mut day = svc.daily_nutrition(date).get()?;
    if let Some(meal) = meal {
        day.logs.retain(|l| l.meal_type == meal);
    }

    if json {
        return print_json(&day);
    }

    let date_str = date.format("%Y-%m-%d");
    if day.logs.is_empty() {
        eprintln!("Nothing logged on {date_str}");
        return Ok(());
    }

    #[derive(Tabled)]
    struct LogRow {
        #[tabled(rename = "ID")]
        id: i64,
        #[tabled(rename = "Meal")]
        meal: String,
        #[tabled(rename = "Food")]
        name: String,
        #[tabled(rename = "Grams")]
        grams: String,
        #[tabled(rename = "Cal")]
        calories: String,
        #[tabled(rename = "P")]
        protein: String,
        #[tabled(rename = "F")]
        fat: String,
        #[tabled(rename = "C")]
        carbs: String,
    }

    let rows: Vec<LogRow> = day
        .logs
        .iter()
        .map(|l| LogRow {
            id: l.id,
            meal: l.meal_type.to_string(),
            name: truncate(&l.name, 35),
            grams: format!("{:.0}", l.grams),
            calories: format!("{:.0}", l.calories),
            protein: format!("{:.1}", l.protein),
            fat: format!("{:.1}", l.fat),
            carbs: format!("{:.1}", l.carbs),
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(3..8)).with(Alignment::right()))
        .to_string();
    println!("{date_str}");
    println!("{table}");
    let t = day.totals;
    println!(
        "Total: {:.0} kcal | P {:.1}g | F {:.1}g | C {:.1}g",
        t.calories, t.protein, t.fat, t.carbs
    );
    Ok(())
}

pub(crate) fn cmd_food_update(
    svc: &TrackerService,
    id: i64,
    grams: f64,
    meal: Option<&str>,
    json: bool,
) -> Result<()> {
    let meal = match meal {
        Some(m) => m.parse()?,
        None => svc.nutrition().get_food_log(id)?.meal_type,
    };
    let log = svc.update_food_log(id, grams, meal)?;
    if json {
        print_json(&log)?;
    } else {
        println!(
            "Updated entry {id}: {:.0}g of {} ({:.0} kcal)",
            log.grams, log.name, log.calories
        );
    }
    Ok(())
}

pub(crate) fn cmd_food_delete(svc: &TrackerService, id: i64, json: bool) -> Result<()> {
    let deleted = svc.delete_food_log(id)?;
    if !deleted {
        bail!("Food log {id} not found");
    }
    if json {
        println!("{}", serde_json::json!({ "deleted": id }));
    } else {
        println!("Deleted food log {id}");
    }
    Ok(())
}

pub(crate) fn cmd_food_prune(svc: &TrackerService, keep_days: i64, json: bool) -> Result<()> {
    let removed = svc.prune_food_logs(keep_days)?;
    if json {
        println!("{}", serde_json::json!({ "removed": removed }));
    } else {
        println!("Removed {removed} food log(s) older than {keep_days} days");
    }
    Ok(())
}
