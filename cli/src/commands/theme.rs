use anyhow::{Result, bail};

use matlog_core::service::TrackerService;

/// Show the theme, or switch it when `mode` is given.
pub(crate) fn cmd_theme(svc: &TrackerService, mode: Option<&str>, json: bool) -> Result<()> {
    if let Some(mode) = mode {
        let dark = match mode.to_lowercase().as_str() {
            "dark" => true,
            "light" => false,
            _ => bail!("Invalid theme '{mode}'. Use 'dark' or 'light'"),
        };
        svc.set_dark_theme(dark)?;
    }

    let dark = svc.is_dark_theme().get()?;
    let name = if dark { "dark" } else { "light" };
    if json {
        println!("{}", serde_json::json!({ "theme": name, "dark": dark }));
    } else {
        println!("Theme: {name}");
    }
    Ok(())
}
