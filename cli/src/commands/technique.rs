use anyhow::{Result, bail};
use std::process;
use tabled::{Table, Tabled, settings::Style};

use matlog_core::models::{NewTechnique, Technique, TechniqueCategory};
use matlog_core::service::TrackerService;

use super::helpers::{print_json, truncate};

pub(crate) fn cmd_technique_add(
    svc: &TrackerService,
    name: &str,
    category: &str,
    description: Option<String>,
    json: bool,
) -> Result<()> {
    let technique = svc.add_technique(&NewTechnique {
        name: name.to_string(),
        category: category.parse()?,
        description,
    })?;

    if json {
        print_json(&technique)?;
    } else {
        println!(
            "Added {} ({}) as #{}",
            technique.name, technique.category, technique.id
        );
    }
    Ok(())
}

pub(crate) fn cmd_technique_list(
    svc: &TrackerService,
    category: Option<&str>,
    search: Option<&str>,
    json: bool,
) -> Result<()> {
    let techniques = match search {
        Some(query) => svc.search_techniques(query).get()?,
        None => {
            let category = category.map(str::parse::<TechniqueCategory>).transpose()?;
            svc.techniques(category).get()?
        }
    };

    if let Some(query) = search.filter(|_| techniques.is_empty()) {
        if json {
            println!("[]");
        } else {
            eprintln!("No techniques match '{query}'");
        }
        process::exit(2);
    }
    if json {
        return print_json(&techniques);
    }
    if techniques.is_empty() {
        eprintln!("No techniques found. Use `matlog technique add` to record one.");
        return Ok(());
    }

    #[derive(Tabled)]
    struct TechniqueRow {
        #[tabled(rename = "ID")]
        id: i64,
        #[tabled(rename = "Name")]
        name: String,
        #[tabled(rename = "Category")]
        category: String,
        #[tabled(rename = "Description")]
        description: String,
        #[tabled(rename = "Added")]
        added: String,
    }

    let rows: Vec<TechniqueRow> = techniques
        .iter()
        .map(|t| TechniqueRow {
            id: t.id,
            name: truncate(&t.name, 30),
            category: t.category.to_string(),
            description: t
                .description
                .as_deref()
                .map(|d| truncate(d, 40))
                .unwrap_or_default(),
            added: t.created_at.format("%Y-%m-%d").to_string(),
        })
        .collect();

    println!("{}", Table::new(&rows).with(Style::rounded()));
    Ok(())
}

pub(crate) fn cmd_technique_show(svc: &TrackerService, id: i64, json: bool) -> Result<()> {
    let Some(technique) = svc.get_technique(id)? else {
        bail!("Technique {id} not found");
    };
    if json {
        print_json(&technique)
    } else {
        print_technique(&technique);
        Ok(())
    }
}

fn print_technique(t: &Technique) {
    println!("{} [{}]", t.name, t.category);
    println!("  Added: {}", t.created_at.format("%Y-%m-%d"));
    if let Some(ref d) = t.description {
        println!();
        println!("{d}");
    }
}

pub(crate) fn cmd_technique_delete(svc: &TrackerService, id: i64, json: bool) -> Result<()> {
    if !svc.delete_technique(id)? {
        bail!("Technique {id} not found");
    }
    if json {
        println!("{}", serde_json::json!({ "deleted": id }));
    } else {
        println!("Deleted technique {id}");
    }
    Ok(())
}
