use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "beam", about = concat!("beam v", env!("CARGO_PKG_VERSION"), " - WBS planning from the terminal"), version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Run against a different project directory
    #[arg(short = 'C', long = "project-dir", global = true)]
    pub project_dir: Option<String>,

    /// Override today's date for delay detection (YYYY-MM-DD)
    #[arg(long, global = true)]
    pub today: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new beam project in the current directory
    Init(InitArgs),
    /// Print the WBS tree (whole project or one subtree)
    Tree(TreeArgs),
    /// Show one item in detail
    Show(ShowArgs),
    /// Show project progress and per-L1 breakdown
    Stats,
    /// Validate project integrity
    Check,
    /// Add an item under a parent (or a new L1 root)
    Add(AddArgs),
    /// Set or clear a leaf's planned dates
    Schedule(ScheduleArgs),
    /// Record actual start/end dates
    Actual(ActualArgs),
    /// Set a leaf's progress percentage
    Progress(ProgressArgs),
    /// Change an item's status
    Status(StatusArgs),
    /// Set an L1 item's progress weight
    Weight(WeightArgs),
    /// Rename an item
    Rename(RenameArgs),
    /// Set or clear an item's deliverable
    Deliverable(DeliverableArgs),
    /// Move an item among its level (reorder or reparent)
    Mv(MvArgs),
    /// Move an item up one level (with its subtree)
    Promote(PromoteArgs),
    /// Move an item down one level, under its preceding sibling
    Demote(DemoteArgs),
    /// Delete items and their subtrees
    Rm(RmArgs),
    /// Assign people to items (set union, repeatable on both sides)
    Assign(AssignArgs),
    /// Register L4 items as schedulable tasks
    Register(RegisterArgs),
    /// List assignable people
    People,
}

// ---------------------------------------------------------------------------
// Init
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct InitArgs {
    /// Project name (default: inferred from directory name)
    #[arg(long)]
    pub name: Option<String>,
}

// ---------------------------------------------------------------------------
// Read commands
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct TreeArgs {
    /// Item ID to root the listing at (default: whole project)
    pub id: Option<String>,
    /// Limit display to this WBS depth (1-4)
    #[arg(long)]
    pub depth: Option<u8>,
}

#[derive(Args)]
pub struct ShowArgs {
    /// Item ID to show
    pub id: String,
}

// ---------------------------------------------------------------------------
// Write commands
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct AddArgs {
    /// Item name
    pub name: String,
    /// Parent item ID (omit to create an L1 root)
    #[arg(long)]
    pub parent: Option<String>,
}

#[derive(Args)]
pub struct ScheduleArgs {
    /// Item ID (must be a leaf)
    pub id: String,
    /// Planned start (YYYY-MM-DD)
    #[arg(long)]
    pub start: Option<String>,
    /// Planned end (YYYY-MM-DD)
    #[arg(long)]
    pub end: Option<String>,
    /// Clear both planned dates
    #[arg(long)]
    pub clear: bool,
}

#[derive(Args)]
pub struct ActualArgs {
    /// Item ID
    pub id: String,
    /// Actual start (YYYY-MM-DD)
    #[arg(long)]
    pub start: Option<String>,
    /// Actual end (YYYY-MM-DD)
    #[arg(long)]
    pub end: Option<String>,
    /// Clear both actual dates
    #[arg(long)]
    pub clear: bool,
}

#[derive(Args)]
pub struct ProgressArgs {
    /// Item ID (must be a leaf)
    pub id: String,
    /// Progress percentage (0-100)
    pub value: u8,
}

#[derive(Args)]
pub struct StatusArgs {
    /// Item ID
    pub id: String,
    /// New status (pending, in_progress, holding, completed, cancelled)
    pub status: String,
}

#[derive(Args)]
pub struct WeightArgs {
    /// L1 item ID
    pub id: String,
    /// Weight (1-100); weights should total 100 across L1 items
    pub value: u8,
}

#[derive(Args)]
pub struct RenameArgs {
    /// Item ID
    pub id: String,
    /// New name
    pub name: String,
}

#[derive(Args)]
pub struct DeliverableArgs {
    /// Item ID
    pub id: String,
    /// Deliverable name
    #[arg(long)]
    pub name: Option<String>,
    /// Deliverable link (URL or path)
    #[arg(long)]
    pub link: Option<String>,
    /// Clear the deliverable
    #[arg(long)]
    pub clear: bool,
}

#[derive(Args)]
pub struct MvArgs {
    /// Item ID
    pub id: String,
    /// New sibling position (0-indexed; default: last)
    pub position: Option<usize>,
    /// Reparent under this item (same level rules apply)
    #[arg(long)]
    pub parent: Option<String>,
}

#[derive(Args)]
pub struct PromoteArgs {
    /// Item ID
    pub id: String,
}

#[derive(Args)]
pub struct DemoteArgs {
    /// Item ID
    pub id: String,
}

#[derive(Args)]
pub struct RmArgs {
    /// Item IDs to delete (subtrees go with them)
    #[arg(required = true)]
    pub ids: Vec<String>,
    /// Skip confirmation prompt
    #[arg(long, short)]
    pub yes: bool,
}

// ---------------------------------------------------------------------------
// Bulk commands
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct AssignArgs {
    /// Item IDs to assign to
    #[arg(required = true)]
    pub ids: Vec<String>,
    /// Person ID (repeatable)
    #[arg(long = "person", required = true)]
    pub people: Vec<String>,
}

#[derive(Args)]
pub struct RegisterArgs {
    /// Item IDs (L4 items register; ancestors in a selection are skipped)
    #[arg(required = true)]
    pub ids: Vec<String>,
}
