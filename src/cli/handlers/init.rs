use std::fs;

use crate::cli::commands::InitArgs;
use crate::repo::json_file::{self, JsonFileRepository, ProjectFile, CONFIG_FILE};

const CONFIG_TEMPLATE: &str = r##"[project]
name = "{name}"
# Repository-side project id (defaults to the name)
# id = "p42"

[schedule]
# How L1 weights combine into project progress:
#   "normalize" divides by the actual weight sum
#   "literal"   divides by 100 (can read over 100% when weights over-commit)
# weight_mode = "normalize"

# Initial timeline zoom: "day", "week", or "month"
# zoom = "week"

# --- UI Customization ---
# Uncomment and edit to override defaults.

[ui]
# show_key_hints = true
#
# [ui.colors]
# background = "#101521"
# text = "#C8D3F5"
# highlight = "#FFC777"
# dim = "#545C7E"
# red = "#FF757F"
# green = "#C3E88D"
# cyan = "#86E1FC"
"##;

/// Infer a project name from a directory name: replace hyphens with
/// spaces, title-case.
fn infer_name(dir_name: &str) -> String {
    dir_name
        .split('-')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                None => String::new(),
                Some(c) => {
                    let upper: String = c.to_uppercase().collect();
                    upper + &chars.collect::<String>()
                }
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn cmd_init(args: InitArgs) -> Result<(), Box<dyn std::error::Error>> {
    let cwd = std::env::current_dir()?;

    if cwd.join(CONFIG_FILE).exists() {
        return Err(format!("beam project already exists in {}", cwd.display()).into());
    }
    if let Some(parent) = cwd.parent()
        && let Some(found) = json_file::discover_root(parent)
    {
        eprintln!("Note: parent project found at {}/", found.display());
        eprintln!("Creating new project here anyway");
    }

    let name = args.name.unwrap_or_else(|| {
        cwd.file_name()
            .and_then(|n| n.to_str())
            .map(infer_name)
            .unwrap_or_else(|| "Untitled".to_string())
    });

    fs::write(
        cwd.join(CONFIG_FILE),
        CONFIG_TEMPLATE.replace("{name}", &name),
    )?;
    JsonFileRepository::init(&cwd, ProjectFile::default())?;

    println!("Initialized beam project: {}", name);
    println!("  next: beam add \"First work package\"");
    Ok(())
}
