use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "clb", about = concat!("collabify v", env!("CARGO_PKG_VERSION"), " - projects, boards, and discussions from the terminal"), version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Read config and session from this directory
    #[arg(long = "config-dir", global = true)]
    pub config_dir: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create an account
    Register(RegisterArgs),
    /// Log in and store a session token
    Login(LoginArgs),
    /// Forget the stored session
    Logout,
    /// Show the logged-in user
    Whoami,
    /// Show or edit client configuration
    Config(ConfigCmd),
    /// List known users
    Users,
    /// List your projects
    Projects,
    /// Show, create, or manage a project
    Project(ProjectCmd),
    /// List a project's tasks
    Tasks(TasksArgs),
    /// Show a project's kanban board
    Board(BoardArgs),
    /// Create, move, assign, or delete a task
    Task(TaskCmd),
    /// Show a project's discussion thread
    Comments(ProjectArg),
    /// Post a comment or reply
    Comment(CommentCmd),
    /// Summary of your tasks across all projects
    Dashboard,
}

// ---------------------------------------------------------------------------
// Session and config
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct RegisterArgs {
    /// Account email
    pub email: String,
    #[arg(long)]
    pub firstname: String,
    #[arg(long)]
    pub lastname: String,
    /// Account role
    #[arg(long, default_value = "USER")]
    pub role: String,
    /// Password (read from stdin when omitted)
    #[arg(long)]
    pub password: Option<String>,
}

#[derive(Args)]
pub struct LoginArgs {
    /// Account email
    pub email: String,
    /// Password (read from stdin when omitted)
    #[arg(long)]
    pub password: Option<String>,
}

#[derive(Args)]
pub struct ConfigCmd {
    #[command(subcommand)]
    pub action: Option<ConfigAction>,
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print the effective configuration (default)
    Show,
    /// Set a value, e.g. `clb config set api.base_url https://pm.example.com`
    Set(ConfigSetArgs),
    /// Write a commented config.toml
    Init(ConfigInitArgs),
    /// Print the config directory
    Path,
}

#[derive(Args)]
pub struct ConfigSetArgs {
    /// Dotted key (api.base_url, api.timeout_secs, ui.column_width, ui.show_ids)
    pub key: String,
    pub value: String,
}

#[derive(Args)]
pub struct ConfigInitArgs {
    /// Overwrite an existing config.toml
    #[arg(long)]
    pub force: bool,
}

// ---------------------------------------------------------------------------
// Projects
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct ProjectArg {
    /// Project ID
    pub project: String,
}

#[derive(Args)]
pub struct ProjectCmd {
    #[command(subcommand)]
    pub action: ProjectAction,
}

#[derive(Subcommand)]
pub enum ProjectAction {
    /// Show project details and team
    Show(ProjectArg),
    /// Create a project led by you
    Create(ProjectCreateArgs),
    /// Add a user to the team
    AddMember(MemberArgs),
    /// Remove a user from the team
    RemoveMember(MemberArgs),
}

#[derive(Args)]
pub struct ProjectCreateArgs {
    /// Project name
    pub title: String,
    #[arg(long)]
    pub description: Option<String>,
    /// Team member user ID (repeatable)
    #[arg(long = "member", value_name = "USER_ID")]
    pub members: Vec<String>,
}

#[derive(Args)]
pub struct MemberArgs {
    /// Project ID
    pub project: String,
    /// User ID
    pub user: String,
}

// ---------------------------------------------------------------------------
// Tasks
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct TasksArgs {
    /// Project ID
    pub project: String,
    /// Match title, assignee, or status (case-insensitive substring)
    #[arg(long, short)]
    pub query: Option<String>,
    /// Treat --query as a regular expression
    #[arg(long)]
    pub regex: bool,
    /// Only tasks with this status (todo, in_progress, done)
    #[arg(long)]
    pub status: Option<String>,
}

#[derive(Args)]
pub struct BoardArgs {
    /// Project ID
    pub project: String,
    /// Column width in cells (default from config)
    #[arg(long)]
    pub width: Option<usize>,
}

#[derive(Args)]
pub struct TaskCmd {
    #[command(subcommand)]
    pub action: TaskAction,
}

#[derive(Subcommand)]
pub enum TaskAction {
    /// Create a task in the To Do column
    Add(TaskAddArgs),
    /// Move a task to another status (assignee only)
    Move(TaskMoveArgs),
    /// Assign a task to a user
    Assign(TaskAssignArgs),
    /// Clear a task's assignee
    Unassign(TaskRefArgs),
    /// Delete a task
    Delete(TaskRefArgs),
}

#[derive(Args)]
pub struct TaskAddArgs {
    /// Project ID
    pub project: String,
    /// Task name
    pub title: String,
    #[arg(long)]
    pub description: Option<String>,
    /// low, medium, or high (default: medium)
    #[arg(long)]
    pub priority: Option<String>,
    /// Assignee user ID
    #[arg(long)]
    pub assignee: Option<String>,
    /// Due date (YYYY-MM-DD)
    #[arg(long)]
    pub due: Option<String>,
}

#[derive(Args)]
pub struct TaskRefArgs {
    /// Project ID
    pub project: String,
    /// Task ID
    pub task: String,
}

#[derive(Args)]
pub struct TaskMoveArgs {
    /// Project ID
    pub project: String,
    /// Task ID
    pub task: String,
    /// Target status (todo, in_progress, done)
    pub status: String,
}

#[derive(Args)]
pub struct TaskAssignArgs {
    /// Project ID
    pub project: String,
    /// Task ID
    pub task: String,
    /// User ID
    pub user: String,
}

// ---------------------------------------------------------------------------
// Comments
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct CommentCmd {
    #[command(subcommand)]
    pub action: CommentAction,
}

#[derive(Subcommand)]
pub enum CommentAction {
    /// Post a comment, or a reply with --reply-to
    Add(CommentAddArgs),
}

#[derive(Args)]
pub struct CommentAddArgs {
    /// Project ID
    pub project: String,
    /// Comment text
    pub text: String,
    /// ID of the comment being replied to
    #[arg(long, value_name = "COMMENT_ID")]
    pub reply_to: Option<String>,
}
