use anyhow::Result;
use chrono::Local;
use serde::Serialize;

use matlog_core::dashboard::{DashboardData, is_goal_achieved, remaining_kg};
use matlog_core::service::TrackerService;

use super::helpers::print_json;

#[derive(Serialize)]
struct DashboardView<'a> {
    #[serde(flatten)]
    data: &'a DashboardData,
    weight_progress: f64,
    calories_target: i64,
    calories_remaining: i64,
    calories_progress: f64,
    remaining_kg: f64,
    goal_achieved: bool,
}

pub(crate) fn cmd_dashboard(svc: &TrackerService, json: bool) -> Result<()> {
    let data = svc.dashboard().get()?;
    let target = data.target_weight();
    let view = DashboardView {
        data: &data,
        weight_progress: data.weight_progress(),
        calories_target: data.calories_target(),
        calories_remaining: data.calories_remaining(),
        calories_progress: data.calories_progress(),
        remaining_kg: remaining_kg(data.current_weight, target),
        goal_achieved: is_goal_achieved(data.current_weight, target),
    };

    if json {
        return print_json(&view);
    }

    let name = data.profile.as_ref().map_or("User", |p| p.name.as_str());
    println!("Hi, {name}!");
    println!();

    match (data.current_weight, target) {
        (Some(current), Some(target)) => {
            println!(
                "Weight:    {current:.1} kg → {target:.1} kg ({:.1} kg to go, {:.0}% of the way)",
                view.remaining_kg, view.weight_progress
            );
            if view.goal_achieved {
                println!("           Target reached.");
            }
        }
        (Some(current), None) => println!("Weight:    {current:.1} kg"),
        _ => println!("Weight:    no entries this week"),
    }

    let n = data.nutrition;
    if view.calories_target > 0 {
        println!(
            "Calories:  {:.0} / {} kcal ({} left, {:.0}%)",
            n.calories, view.calories_target, view.calories_remaining, view.calories_progress
        );
    } else {
        println!("Calories:  {:.0} kcal", n.calories);
    }
    println!(
        "Macros:    P {:.1}g | F {:.1}g | C {:.1}g over {} log(s)",
        n.protein, n.fat, n.carbs, data.food_log_count
    );

    match &data.next_training {
        Some(t) => println!(
            "Next:      {} on {} ({} min)",
            t.training_type,
            t.date.with_timezone(&Local).format("%a %Y-%m-%d %H:%M"),
            t.duration_minutes
        ),
        None => println!("Next:      no training scheduled"),
    }
    Ok(())
}
