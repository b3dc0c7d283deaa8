mod dashboard;
mod food;
mod helpers;
mod profile;
mod technique;
mod theme;
mod training;
mod weight;

pub(crate) use dashboard::cmd_dashboard;
pub(crate) use food::{
    CustomFoodArgs, LogArgs, cmd_food_add, cmd_food_delete, cmd_food_list, cmd_food_log,
    cmd_food_prune, cmd_food_search, cmd_food_update,
};
pub(crate) use profile::{
    ProfileArgs, cmd_profile_delete, cmd_profile_set, cmd_profile_show, cmd_tdee,
};
pub(crate) use technique::{
    cmd_technique_add, cmd_technique_delete, cmd_technique_list, cmd_technique_show,
};
pub(crate) use theme::cmd_theme;
pub(crate) use training::{
    TrainingArgs, cmd_training_add, cmd_training_delete, cmd_training_list,
    cmd_training_upcoming,
};
pub(crate) use weight::{cmd_weight_delete, cmd_weight_history, cmd_weight_log};
