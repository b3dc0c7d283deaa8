mod commands;
mod config;
mod usda;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::process;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use crate::commands::{
    CustomFoodArgs, LogArgs, ProfileArgs, TrainingArgs, cmd_dashboard, cmd_food_add,
    cmd_food_delete, cmd_food_list, cmd_food_log, cmd_food_prune, cmd_food_search,
    cmd_food_update, cmd_profile_delete, cmd_profile_set, cmd_profile_show, cmd_tdee,
    cmd_technique_add, cmd_technique_delete, cmd_technique_list, cmd_technique_show, cmd_theme,
    cmd_training_add, cmd_training_delete, cmd_training_list, cmd_training_upcoming,
    cmd_weight_delete, cmd_weight_history, cmd_weight_log,
};
use crate::config::Config;
use crate::usda::UsdaClient;
use matlog_core::service::TrackerService;

#[derive(Parser)]
#[command(
    name = "matlog",
    version,
    about = "Weight, nutrition and training log for grapplers"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage your profile
    Profile {
        #[command(subcommand)]
        command: ProfileCommands,
    },
    /// Estimate daily calorie needs for a body weight
    Tdee {
        /// Body weight in kg
        weight: f64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Track body weight
    Weight {
        #[command(subcommand)]
        command: WeightCommands,
    },
    /// Search and log food
    Food {
        #[command(subcommand)]
        command: FoodCommands,
    },
    /// Record training sessions
    Training {
        #[command(subcommand)]
        command: TrainingCommands,
    },
    /// Keep notes on techniques
    Technique {
        #[command(subcommand)]
        command: TechniqueCommands,
    },
    /// Show today's overview
    Dashboard {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show or set the display theme
    Theme {
        /// dark or light
        mode: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum ProfileCommands {
    /// Create or replace the profile
    Set {
        /// Your name
        #[arg(long)]
        name: String,
        /// Age in years
        #[arg(long)]
        age: i64,
        /// Height in cm
        #[arg(long)]
        height: f64,
        /// Current weight in kg
        #[arg(long)]
        weight: f64,
        /// Target weight in kg
        #[arg(long)]
        target: f64,
        /// Competition weight class
        #[arg(long, default_value = "")]
        class: String,
        /// Gender: male, female, other
        #[arg(long, default_value = "other")]
        gender: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the profile
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete the profile
    Delete {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum WeightCommands {
    /// Log a weight entry (replaces any entry on the same day)
    Log {
        /// Weight value (number)
        value: f64,
        /// Unit: kg or lbs (default: kg)
        #[arg(short, long, default_value = "kg")]
        unit: String,
        /// Date (YYYY-MM-DD or today/yesterday, default: today)
        #[arg(long)]
        date: Option<String>,
        /// Optional note
        #[arg(long)]
        note: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show weight history
    History {
        /// Period: week, month, three_months, six_months, year, all
        #[arg(short, long, default_value = "month")]
        period: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete a weight entry by ID
    Delete {
        /// Weight entry ID
        id: i64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum FoodCommands {
    /// Search FoodData Central
    Search {
        /// Search query
        query: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Search for a food and log a portion of it
    Log {
        /// Food name to search for
        query: String,
        /// Portion in grams
        grams: f64,
        /// Meal type: breakfast, lunch, dinner, snack
        #[arg(short, long, default_value = "snack")]
        meal: String,
        /// Date to log for (YYYY-MM-DD, default: today)
        #[arg(long)]
        date: Option<String>,
        /// Pick the result with this FDC ID instead of prompting
        #[arg(long)]
        fdc_id: Option<i64>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Log a custom food from per-100g values
    Add {
        /// Food name
        name: String,
        /// Portion in grams
        grams: f64,
        /// Calories per 100g
        #[arg(long)]
        calories: f64,
        /// Protein per 100g
        #[arg(long, default_value = "0")]
        protein: f64,
        /// Fat per 100g
        #[arg(long, default_value = "0")]
        fat: f64,
        /// Carbs per 100g
        #[arg(long, default_value = "0")]
        carbs: f64,
        /// Meal type: breakfast, lunch, dinner, snack
        #[arg(short, long, default_value = "snack")]
        meal: String,
        /// Date to log for (YYYY-MM-DD, default: today)
        #[arg(long)]
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List a day's food logs with totals
    List {
        /// Date to show (YYYY-MM-DD, default: today)
        date: Option<String>,
        /// Only this meal type
        #[arg(short, long)]
        meal: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Change the portion or meal of a food log
    Update {
        /// Food log ID
        id: i64,
        /// New portion in grams
        grams: f64,
        /// New meal type
        #[arg(short, long)]
        meal: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete a food log by ID
    Delete {
        /// Food log ID
        id: i64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Remove food logs older than a number of days
    Prune {
        /// Days of history to keep
        #[arg(long, default_value = "90")]
        keep_days: i64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum TrainingCommands {
    /// Record a session
    Add {
        /// Type: grappling, sparring, strength, cardio
        #[arg(value_name = "TYPE")]
        training_type: String,
        /// Duration in minutes
        minutes: i64,
        /// Date (YYYY-MM-DD or today/yesterday/tomorrow, default: today)
        #[arg(long)]
        date: Option<String>,
        /// Start time (HH:MM)
        #[arg(long, default_value = "19:00")]
        time: String,
        /// Optional notes
        #[arg(long)]
        notes: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List sessions for a month (default: this month) or of one type
    List {
        /// Month (YYYY-MM)
        #[arg(long)]
        month: Option<String>,
        /// Only this training type
        #[arg(long = "type")]
        training_type: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the next scheduled sessions
    Upcoming {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete a session by ID
    Delete {
        /// Training ID
        id: i64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum TechniqueCommands {
    /// Add a technique
    Add {
        /// Technique name
        name: String,
        /// Category: takedown, submission, sweep, defense, control
        #[arg(short, long)]
        category: String,
        /// Description or notes
        #[arg(short, long)]
        description: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List techniques, optionally by category or search text
    List {
        /// Only this category
        #[arg(short, long)]
        category: Option<String>,
        /// Search names and descriptions
        #[arg(short, long)]
        search: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show one technique
    Show {
        /// Technique ID
        id: i64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete a technique by ID
    Delete {
        /// Technique ID
        id: i64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("MATLOG_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() {
    init_tracing();
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

#[allow(clippy::too_many_lines)]
async fn run(cli: Cli) -> Result<()> {
    if let Commands::Tdee { weight, json } = cli.command {
        return cmd_tdee(weight, json);
    }

    let config = Config::load()?;
    tracing::debug!(db = %config.db_path.display(), "opening database");
    let provider = Arc::new(UsdaClient::new(&config.usda_api_key)?);
    let svc = TrackerService::open(&config.db_path, Arc::new(mockable::DefaultClock), provider)?;

    match cli.command {
        Commands::Tdee { weight, json } => cmd_tdee(weight, json),
        Commands::Profile { command } => match command {
            ProfileCommands::Set {
                name,
                age,
                height,
                weight,
                target,
                class,
                gender,
                json,
            } => cmd_profile_set(
                &svc,
                ProfileArgs {
                    name,
                    age,
                    height_cm: height,
                    weight_kg: weight,
                    target_kg: target,
                    weight_class: class,
                    gender,
                },
                json,
            ),
            ProfileCommands::Show { json } => cmd_profile_show(&svc, json),
            ProfileCommands::Delete { json } => cmd_profile_delete(&svc, json),
        },
        Commands::Weight { command } => match command {
            WeightCommands::Log {
                value,
                unit,
                date,
                note,
                json,
            } => cmd_weight_log(&svc, value, &unit, date, note, json),
            WeightCommands::History { period, json } => cmd_weight_history(&svc, &period, json),
            WeightCommands::Delete { id, json } => cmd_weight_delete(&svc, id, json),
        },
        Commands::Food { command } => match command {
            FoodCommands::Search { query, json } => cmd_food_search(&svc, &query, json).await,
            FoodCommands::Log {
                query,
                grams,
                meal,
                date,
                fdc_id,
                json,
            } => {
                cmd_food_log(
                    &svc,
                    LogArgs {
                        query,
                        grams,
                        meal,
                        date,
                        fdc_id,
                    },
                    json,
                )
                .await
            }
            FoodCommands::Add {
                name,
                grams,
                calories,
                protein,
                fat,
                carbs,
                meal,
                date,
                json,
            } => cmd_food_add(
                &svc,
                CustomFoodArgs {
                    name,
                    grams,
                    calories,
                    protein,
                    fat,
                    carbs,
                    meal,
                    date,
                },
                json,
            ),
            FoodCommands::List { date, meal, json } => {
                cmd_food_list(&svc, date, meal.as_deref(), json)
            }
            FoodCommands::Update {
                id,
                grams,
                meal,
                json,
            } => cmd_food_update(&svc, id, grams, meal.as_deref(), json),
            FoodCommands::Delete { id, json } => cmd_food_delete(&svc, id, json),
            FoodCommands::Prune { keep_days, json } => cmd_food_prune(&svc, keep_days, json),
        },
        Commands::Training { command } => match command {
            TrainingCommands::Add {
                training_type,
                minutes,
                date,
                time,
                notes,
                json,
            } => cmd_training_add(
                &svc,
                TrainingArgs {
                    training_type,
                    minutes,
                    date,
                    time,
                    notes,
                },
                json,
            ),
            TrainingCommands::List {
                month,
                training_type,
                json,
            } => cmd_training_list(&svc, month.as_deref(), training_type.as_deref(), json),
            TrainingCommands::Upcoming { json } => cmd_training_upcoming(&svc, json),
            TrainingCommands::Delete { id, json } => cmd_training_delete(&svc, id, json),
        },
        Commands::Technique { command } => match command {
            TechniqueCommands::Add {
                name,
                category,
                description,
                json,
            } => cmd_technique_add(&svc, &name, &category, description, json),
            TechniqueCommands::List {
                category,
                search,
                json,
            } => cmd_technique_list(&svc, category.as_deref(), search.as_deref(), json),
            TechniqueCommands::Show { id, json } => cmd_technique_show(&svc, id, json),
            TechniqueCommands::Delete { id, json } => cmd_technique_delete(&svc, id, json),
        },
        Commands::Dashboard { json } => cmd_dashboard(&svc, json),
        Commands::Theme { mode, json } => cmd_theme(&svc, mode.as_deref(), json),
    }
}
