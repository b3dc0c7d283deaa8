use anyhow::Result;

use matlog_core::models::{Gender, ProfileInput, UserProfile, tdee};
use matlog_core::service::TrackerService;

use super::helpers::print_json;

pub(crate) struct ProfileArgs {
    pub name: String,
    pub age: i64,
    pub height_cm: f64,
    pub weight_kg: f64,
    pub target_kg: f64,
    pub weight_class: String,
    pub gender: String,
}

pub(crate) fn cmd_profile_set(svc: &TrackerService, args: ProfileArgs, json: bool) -> Result<()> {
    let gender: Gender = args.gender.parse()?;
    let profile = svc.save_profile(ProfileInput {
        name: args.name,
        age: args.age,
        height_cm: args.height_cm,
        current_weight_kg: args.weight_kg,
        target_weight_kg: args.target_kg,
        weight_class: args.weight_class,
        gender,
    })?;

    if json {
        print_json(&profile)?;
    } else {
        println!(
            "Saved profile for {} (daily target {} kcal)",
            profile.name, profile.daily_calories
        );
    }
    Ok(())
}

pub(crate) fn cmd_profile_show(svc: &TrackerService, json: bool) -> Result<()> {
    let profile = svc.get_profile()?;
    match (profile, json) {
        (Some(p), true) => print_json(&p)?,
        (Some(p), false) => print_profile(&p),
        (None, true) => println!("null"),
        (None, false) => {
            eprintln!("No profile yet. Use `matlog profile set` to create one.");
        }
    }
    Ok(())
}

fn print_profile(p: &UserProfile) {
    println!("{}", p.name);
    println!("  Age:          {}", p.age);
    println!("  Gender:       {}", p.gender);
    println!("  Height:       {:.0} cm", p.height_cm);
    println!("  Weight:       {:.1} kg", p.current_weight_kg);
    println!("  Target:       {:.1} kg", p.target_weight_kg);
    if !p.weight_class.is_empty() {
        println!("  Weight class: {}", p.weight_class);
    }
    println!("  Daily target: {} kcal", p.daily_calories);
    println!("  Since:        {}", p.created_at.format("%Y-%m-%d"));
}

pub(crate) fn cmd_profile_delete(svc: &TrackerService, json: bool) -> Result<()> {
    let deleted = svc.delete_profile()?;
    if json {
        println!("{}", serde_json::json!({ "deleted": deleted }));
    } else if deleted {
        println!("Deleted profile");
    } else {
        eprintln!("No profile to delete");
    }
    Ok(())
}

pub(crate) fn cmd_tdee(weight_kg: f64, json: bool) -> Result<()> {
    let calories = tdee(weight_kg)?;
    if json {
        println!(
            "{}",
            serde_json::json!({ "weight_kg": weight_kg, "daily_calories": calories })
        );
    } else {
        println!("{calories} kcal/day at {weight_kg:.1} kg (weight x 30 estimate)");
    }
    Ok(())
}
