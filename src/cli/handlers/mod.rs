mod init;
pub use init::cmd_init;

use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;

use chrono::NaiveDate;

use crate::cli::commands::*;
use crate::cli::output::*;
use crate::model::config::ProjectConfig;
use crate::model::item::{Level, Status};
use crate::ops::check;
use crate::repo::json_file::{self, JsonFileRepository};
use crate::session::Session;

/// Global override for project directory (set by -C flag)
static PROJECT_DIR_OVERRIDE: Mutex<Option<PathBuf>> = Mutex::new(None);

type CliSession = Session<JsonFileRepository>;

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

pub fn dispatch(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let json = cli.json;
    let today = parse_today(cli.today.as_deref())?;

    // Store -C override for open_session()
    if let Some(ref dir) = cli.project_dir {
        let abs = std::fs::canonicalize(dir)
            .map_err(|e| format!("cannot resolve -C path '{}': {}", dir, e))?;
        PROJECT_DIR_OVERRIDE.lock().unwrap().replace(abs);
    }

    match cli.command {
        None => {
            eprintln!("no subcommand (try `beam --help`)");
            Ok(())
        }
        Some(cmd) => match cmd {
            // Init is handled in main.rs before project discovery
            Commands::Init(args) => cmd_init(args),

            // Read commands
            Commands::Tree(args) => cmd_tree(args, today, json),
            Commands::Show(args) => cmd_show(args, today, json),
            Commands::Stats => cmd_stats(today, json),
            Commands::Check => cmd_check(json),
            Commands::People => cmd_people(json),

            // Write commands
            Commands::Add(args) => cmd_add(args),
            Commands::Schedule(args) => cmd_schedule(args),
            Commands::Actual(args) => cmd_actual(args),
            Commands::Progress(args) => cmd_progress(args),
            Commands::Status(args) => cmd_status(args),
            Commands::Weight(args) => cmd_weight(args),
            Commands::Rename(args) => cmd_rename(args),
            Commands::Deliverable(args) => cmd_deliverable(args),
            Commands::Mv(args) => cmd_mv(args),
            Commands::Promote(args) => cmd_promote(args),
            Commands::Demote(args) => cmd_demote(args),
            Commands::Rm(args) => cmd_rm(args),

            // Bulk commands
            Commands::Assign(args) => cmd_assign(args),
            Commands::Register(args) => cmd_register(args, json),
        },
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn open_session() -> Result<(ProjectConfig, CliSession), Box<dyn std::error::Error>> {
    let start = match PROJECT_DIR_OVERRIDE.lock().unwrap().as_ref() {
        Some(dir) => dir.clone(),
        None => std::env::current_dir()?,
    };
    let root = json_file::discover_root(&start)
        .ok_or("no beam project found (beam.toml missing; run `beam init`)")?;
    let config = json_file::load_config(&root)?;
    let repo = JsonFileRepository::open(&root)?;
    let session = Session::open(repo, config.project_id(), config.schedule.weight_mode)?;
    Ok((config, session))
}

fn parse_today(arg: Option<&str>) -> Result<NaiveDate, Box<dyn std::error::Error>> {
    match arg {
        Some(s) => s
            .parse()
            .map_err(|_| format!("invalid --today date '{}' (expected YYYY-MM-DD)", s).into()),
        None => Ok(chrono::Local::now().date_naive()),
    }
}

fn parse_date(s: &str) -> Result<NaiveDate, Box<dyn std::error::Error>> {
    s.parse()
        .map_err(|_| format!("invalid date '{}' (expected YYYY-MM-DD)", s).into())
}

fn parse_status(s: &str) -> Result<Status, Box<dyn std::error::Error>> {
    match s {
        "pending" => Ok(Status::Pending),
        "in_progress" | "active" => Ok(Status::InProgress),
        "holding" => Ok(Status::Holding),
        "completed" | "done" => Ok(Status::Completed),
        "cancelled" => Ok(Status::Cancelled),
        _ => Err(format!(
            "unknown status '{}' (pending, in_progress, holding, completed, cancelled)",
            s
        )
        .into()),
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

// ---------------------------------------------------------------------------
// Read command handlers
// ---------------------------------------------------------------------------

fn cmd_tree(args: TreeArgs, today: NaiveDate, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let (config, session) = open_session()?;
    let tree = session.tree();

    let roots: Vec<String> = match &args.id {
        Some(id) => {
            if !tree.contains(id) {
                return Err(format!("item not found: {}", id).into());
            }
            vec![id.clone()]
        }
        None => tree.roots().to_vec(),
    };

    if json {
        let items = roots
            .iter()
            .filter_map(|id| item_to_json(tree, id, today, args.depth))
            .collect();
        return print_json(&TreeJson {
            project: config.project.name.clone(),
            progress: session.project_progress(),
            items,
        });
    }

    if tree.is_empty() {
        println!("(empty project — add an item with `beam add`)");
        return Ok(());
    }
    let mut lines = Vec::new();
    for id in &roots {
        format_subtree(tree, id, today, args.depth, &mut lines);
    }
    for line in lines {
        println!("{}", line);
    }
    println!();
    println!("project progress: {}%", session.project_progress());
    Ok(())
}

fn cmd_show(args: ShowArgs, today: NaiveDate, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let (_, session) = open_session()?;
    let tree = session.tree();
    let item = tree
        .get(&args.id)
        .ok_or_else(|| format!("item not found: {}", args.id))?;

    if json {
        // Detail view stops at immediate children
        let child_depth = item.level.child().map(|l| l.depth());
        return print_json(&item_to_json(tree, &args.id, today, child_depth));
    }
    for line in format_item_detail(tree, item, today) {
        println!("{}", line);
    }
    Ok(())
}

fn cmd_stats(today: NaiveDate, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let (config, session) = open_session()?;
    let tree = session.tree();

    let mut leaves = 0usize;
    let mut delayed = 0usize;
    let mut completed = 0usize;
    for id in tree.preorder() {
        let item = tree.get(&id).ok_or("tree changed during stats")?;
        if item.is_leaf() {
            leaves += 1;
        }
        match crate::ops::rollup::display_status(item, today) {
            crate::model::item::DisplayStatus::Delayed => delayed += 1,
            crate::model::item::DisplayStatus::Completed => completed += 1,
            _ => {}
        }
    }
    let roots: Vec<RootStatsJson> = tree
        .roots()
        .iter()
        .filter_map(|id| tree.get(id))
        .map(|item| RootStatsJson {
            id: item.id.clone(),
            code: item.code.clone(),
            name: item.name.clone(),
            weight: item.weight,
            progress: item.progress,
        })
        .collect();

    let stats = StatsJson {
        project: config.project.name.clone(),
        progress: session.project_progress(),
        items: tree.len(),
        leaves,
        delayed,
        completed,
        roots,
    };

    if json {
        return print_json(&stats);
    }
    println!("{}: {}% complete", stats.project, stats.progress);
    println!(
        "  {} items ({} leaves), {} delayed, {} completed",
        stats.items, stats.leaves, stats.delayed, stats.completed
    );
    for root in &stats.roots {
        println!(
            "  {:<4} {:<30} weight {:>3}  {:>3}%",
            root.code, root.name, root.weight, root.progress
        );
    }
    Ok(())
}

fn cmd_check(json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let (_, session) = open_session()?;
    let report = check::check_tree(session.tree());

    if json {
        print_json(&CheckJson {
            ok: report.is_ok(),
            errors: report.errors.clone(),
            warnings: report.warnings.clone(),
        })?;
    } else {
        for e in &report.errors {
            println!("error: {}", e);
        }
        for w in &report.warnings {
            println!("warning: {}", w);
        }
        if report.is_ok() && report.warnings.is_empty() {
            println!("ok");
        }
    }
    if report.is_ok() {
        Ok(())
    } else {
        Err(format!("{} integrity error(s)", report.errors.len()).into())
    }
}

fn cmd_people(json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let (_, session) = open_session()?;
    let people = session.people()?;

    if json {
        let out: Vec<PersonJson> = people.iter().map(person_to_json).collect();
        return print_json(&out);
    }
    if people.is_empty() {
        println!("(no people in the directory)");
    }
    for p in &people {
        match &p.email {
            Some(email) => println!("{:<8} {} <{}>", p.id, p.name, email),
            None => println!("{:<8} {}", p.id, p.name),
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Write command handlers
// ---------------------------------------------------------------------------

fn cmd_add(args: AddArgs) -> Result<(), Box<dyn std::error::Error>> {
    let (_, mut session) = open_session()?;
    let level = match &args.parent {
        None => Level::Level1,
        Some(pid) => {
            let parent = session
                .tree()
                .get(pid)
                .ok_or_else(|| format!("item not found: {}", pid))?;
            parent
                .level
                .child()
                .ok_or_else(|| format!("{} is L4 and cannot have children", pid))?
        }
    };
    let id = session.add_child(args.parent.as_deref(), level, &args.name)?;
    let item = session.tree().get(&id).ok_or("created item vanished")?;
    println!("added {} {} ({})", item.code, item.name, id);
    Ok(())
}

fn cmd_schedule(args: ScheduleArgs) -> Result<(), Box<dyn std::error::Error>> {
    let (_, mut session) = open_session()?;
    let (start, end) = if args.clear {
        (None, None)
    } else {
        let current = session
            .tree()
            .get(&args.id)
            .ok_or_else(|| format!("item not found: {}", args.id))?;
        (
            match &args.start {
                Some(s) => Some(parse_date(s)?),
                None => current.planned_start,
            },
            match &args.end {
                Some(s) => Some(parse_date(s)?),
                None => current.planned_end,
            },
        )
    };
    session.set_schedule(&args.id, start, end)?;
    println!("scheduled {}", args.id);
    Ok(())
}

fn cmd_actual(args: ActualArgs) -> Result<(), Box<dyn std::error::Error>> {
    let (_, mut session) = open_session()?;
    let (start, end) = if args.clear {
        (None, None)
    } else {
        let current = session
            .tree()
            .get(&args.id)
            .ok_or_else(|| format!("item not found: {}", args.id))?;
        (
            match &args.start {
                Some(s) => Some(parse_date(s)?),
                None => current.actual_start,
            },
            match &args.end {
                Some(s) => Some(parse_date(s)?),
                None => current.actual_end,
            },
        )
    };
    session.set_actual(&args.id, start, end)?;
    println!("recorded actuals for {}", args.id);
    Ok(())
}

fn cmd_progress(args: ProgressArgs) -> Result<(), Box<dyn std::error::Error>> {
    let (_, mut session) = open_session()?;
    session.set_progress(&args.id, args.value)?;
    println!("{} at {}%", args.id, args.value);
    Ok(())
}

fn cmd_status(args: StatusArgs) -> Result<(), Box<dyn std::error::Error>> {
    let (_, mut session) = open_session()?;
    let status = parse_status(&args.status)?;
    session.set_status(&args.id, status)?;
    println!("{} is now {}", args.id, args.status);
    Ok(())
}

fn cmd_weight(args: WeightArgs) -> Result<(), Box<dyn std::error::Error>> {
    let (_, mut session) = open_session()?;
    session.set_weight(&args.id, args.value)?;
    let total: u32 = session
        .tree()
        .roots()
        .iter()
        .filter_map(|id| session.tree().get(id))
        .map(|i| i.weight as u32)
        .sum();
    println!("{} weighted {}", args.id, args.value);
    if total != 100 {
        eprintln!("note: L1 weights now total {} (expected 100)", total);
    }
    Ok(())
}

fn cmd_rename(args: RenameArgs) -> Result<(), Box<dyn std::error::Error>> {
    let (_, mut session) = open_session()?;
    session.rename(&args.id, &args.name)?;
    println!("renamed {}", args.id);
    Ok(())
}

fn cmd_deliverable(args: DeliverableArgs) -> Result<(), Box<dyn std::error::Error>> {
    let (_, mut session) = open_session()?;
    if args.clear {
        session.set_deliverable(&args.id, None, None)?;
        println!("cleared deliverable on {}", args.id);
        return Ok(());
    }
    if args.name.is_none() && args.link.is_none() {
        return Err("nothing to set (use --name/--link, or --clear)".into());
    }
    let current = session
        .tree()
        .get(&args.id)
        .ok_or_else(|| format!("item not found: {}", args.id))?;
    let name = args.name.or_else(|| current.deliverable_name.clone());
    let link = args.link.or_else(|| current.deliverable_link.clone());
    session.set_deliverable(&args.id, name, link)?;
    println!("set deliverable on {}", args.id);
    Ok(())
}

fn cmd_mv(args: MvArgs) -> Result<(), Box<dyn std::error::Error>> {
    let (_, mut session) = open_session()?;
    let new_parent = match &args.parent {
        Some(p) => Some(p.clone()),
        None => session
            .tree()
            .get(&args.id)
            .ok_or_else(|| format!("item not found: {}", args.id))?
            .parent
            .clone(),
    };
    let position = args.position.unwrap_or(usize::MAX);
    session.move_item(&args.id, new_parent.as_deref(), position)?;
    let code = session
        .tree()
        .get(&args.id)
        .map(|i| i.code.clone())
        .unwrap_or_default();
    println!("moved {} to {}", args.id, code);
    Ok(())
}

fn cmd_promote(args: PromoteArgs) -> Result<(), Box<dyn std::error::Error>> {
    let (_, mut session) = open_session()?;
    session.promote(&args.id)?;
    let item = session.tree().get(&args.id).ok_or("item vanished")?;
    println!("{} is now {} at {}", args.id, item.level, item.code);
    Ok(())
}

fn cmd_demote(args: DemoteArgs) -> Result<(), Box<dyn std::error::Error>> {
    let (_, mut session) = open_session()?;
    session.demote(&args.id)?;
    let item = session.tree().get(&args.id).ok_or("item vanished")?;
    println!("{} is now {} at {}", args.id, item.level, item.code);
    Ok(())
}

fn cmd_rm(args: RmArgs) -> Result<(), Box<dyn std::error::Error>> {
    let (_, mut session) = open_session()?;
    let mut doomed = 0usize;
    for id in &args.ids {
        if !session.tree().contains(id) {
            return Err(format!("item not found: {}", id).into());
        }
        doomed += 1 + session.tree().descendants_of(id).len();
    }

    if !args.yes {
        print!("Delete {} item(s) including subtrees? [y/N] ", doomed);
        std::io::stdout().flush()?;
        let mut answer = String::new();
        std::io::stdin().read_line(&mut answer)?;
        if !matches!(answer.trim(), "y" | "Y" | "yes") {
            println!("aborted");
            return Ok(());
        }
    }

    let mut removed = 0usize;
    for id in &args.ids {
        // An earlier delete may have taken this one down with its parent
        if session.tree().contains(id) {
            removed += session.delete(id)?.len();
        }
    }
    println!("deleted {} item(s)", removed);
    Ok(())
}

// ---------------------------------------------------------------------------
// Bulk command handlers
// ---------------------------------------------------------------------------

fn cmd_assign(args: AssignArgs) -> Result<(), Box<dyn std::error::Error>> {
    let (_, mut session) = open_session()?;
    // Unknown people are a hard error; the directory is authoritative
    let known = session.people()?;
    for pid in &args.people {
        if !known.iter().any(|p| &p.id == pid) {
            return Err(format!("unknown person: {}", pid).into());
        }
    }
    let report = session.assign(&args.ids, &args.people)?;
    println!(
        "assigned {} person(s) to {} item(s) ({} already had them)",
        args.people.len(),
        report.changed.len(),
        report.unchanged.len()
    );
    Ok(())
}

fn cmd_register(args: RegisterArgs, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let (_, mut session) = open_session()?;
    let report = session.register_tasks(&args.ids)?;

    if json {
        #[derive(serde::Serialize)]
        struct RegisterJson<'a> {
            registered: &'a [String],
            skipped: &'a [String],
            failed: &'a [(String, String)],
        }
        return print_json(&RegisterJson {
            registered: &report.registered,
            skipped: &report.skipped,
            failed: &report.failed,
        });
    }

    for id in &report.registered {
        println!("registered {}", id);
    }
    for id in &report.skipped {
        println!("skipped {} (not L4)", id);
    }
    for (id, why) in &report.failed {
        eprintln!("failed {}: {}", id, why);
    }
    if report.failed.is_empty() {
        Ok(())
    } else {
        Err(format!("{} registration(s) failed", report.failed.len()).into())
    }
}
