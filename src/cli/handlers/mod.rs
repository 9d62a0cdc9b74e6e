mod config;
pub use config::cmd_config;

use std::io::BufRead;
use std::path::{Path, PathBuf};

use chrono::{Local, Utc};
use serde::Serialize;

use crate::cli::commands::*;
use crate::cli::output::*;
use crate::io::api::{Backend, Credentials};
use crate::io::config_io;
use crate::io::http::HttpBackend;
use crate::io::session::{self, Session};
use crate::model::config::ClientConfig;
use crate::model::id::Id;
use crate::ops::account::{self, RegisterForm};
use crate::ops::board::count_by_status;
use crate::ops::dashboard::load_dashboard;
use crate::ops::project_ops;
use crate::ops::project_view::ProjectView;
use crate::ops::search::TaskQuery;
use crate::ops::task_ops::TaskForm;

type CmdResult = Result<(), Box<dyn std::error::Error>>;

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

pub fn dispatch(cli: Cli) -> CmdResult {
    let json = cli.json;
    let config_dir = cli
        .config_dir
        .map(PathBuf::from)
        .unwrap_or_else(config_io::default_config_dir);

    match cli.command {
        // Local-only commands
        Commands::Config(args) => cmd_config(&config_dir, args, json),
        Commands::Logout => cmd_logout(&config_dir, json),
        Commands::Register(args) => cmd_register(&config_dir, args, json),
        Commands::Login(args) => cmd_login(&config_dir, args, json),

        // Everything else needs a session
        Commands::Whoami => cmd_whoami(&connect(config_dir)?, json),
        Commands::Users => cmd_users(&connect(config_dir)?, json),
        Commands::Projects => cmd_projects(&connect(config_dir)?, json),
        Commands::Project(args) => cmd_project(&connect(config_dir)?, args, json),
        Commands::Tasks(args) => cmd_tasks(&connect(config_dir)?, args, json),
        Commands::Board(args) => cmd_board(&connect(config_dir)?, args, json),
        Commands::Task(args) => cmd_task(&connect(config_dir)?, args, json),
        Commands::Comments(args) => cmd_comments(&connect(config_dir)?, args, json),
        Commands::Comment(args) => cmd_comment(&connect(config_dir)?, args, json),
        Commands::Dashboard => cmd_dashboard(&connect(config_dir)?, json),
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// A logged-in backend, the user it acts as, and the client config
struct Client {
    backend: HttpBackend,
    user_id: Id,
    config: ClientConfig,
}

/// Build a backend from the stored session. Fails without contacting the
/// backend when there is no usable session.
fn connect(config_dir: PathBuf) -> Result<Client, Box<dyn std::error::Error>> {
    let config = config_io::read_config(&config_dir)?;
    let session = session::read_session(&config_dir).ok_or("not logged in (run `clb login <email>`)")?;
    if session.is_expired() {
        return Err("session expired, log in again with `clb login <email>`".into());
    }
    let backend = HttpBackend::new(&config.api, Some(session.token.clone()))?;
    let user_id = match session.user_id {
        Some(id) => id,
        None => backend.current_user()?.id,
    };
    Ok(Client {
        backend,
        user_id,
        config,
    })
}

fn print_json<T: Serialize>(value: &T) -> CmdResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn load_view(client: &Client, project: &str) -> Result<ProjectView, Box<dyn std::error::Error>> {
    Ok(ProjectView::load(
        &client.backend,
        &Id::from(project),
        client.user_id.clone(),
    )?)
}

fn read_password() -> Result<String, Box<dyn std::error::Error>> {
    eprint!("password: ");
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

fn cmd_register(config_dir: &Path, args: RegisterArgs, json: bool) -> CmdResult {
    let config = config_io::read_config(config_dir)?;
    let password = match args.password {
        Some(p) => p,
        None => read_password()?,
    };
    let form = RegisterForm {
        firstname: args.firstname,
        lastname: args.lastname,
        email: args.email,
        password,
        role: Some(args.role),
    };
    // Validate before touching the network
    account::validate_registration(&form)?;
    let anonymous = HttpBackend::new(&config.api, None)?;
    let created = account::register(&anonymous, &form)?;

    if json {
        return print_json(&serde_json::json!({
            "email": created.email,
            "role": created.role,
            "registered": true,
        }));
    }
    println!("Registered {}. Log in with `clb login {}`", created.email, created.email);
    Ok(())
}

fn cmd_login(config_dir: &Path, args: LoginArgs, json: bool) -> CmdResult {
    let config = config_io::read_config(config_dir)?;
    let password = match args.password {
        Some(p) => p,
        None => read_password()?,
    };
    let anonymous = HttpBackend::new(&config.api, None)?;
    let response = anonymous.login(&Credentials {
        email: args.email.trim().to_string(),
        password,
    })?;
    let token = response.token.ok_or("login failed: no token in response")?;

    let backend = HttpBackend::new(&config.api, Some(token.clone()))?;
    let user = backend.current_user()?;
    let mut session = Session::new(token);
    session.user_id = Some(user.id.clone());
    session::write_session(config_dir, &session)?;
    tracing::info!(user = %user.id, "logged in");

    if json {
        return print_json(&user_to_json(&user));
    }
    println!("Logged in as {}", user.display_name());
    Ok(())
}

fn cmd_logout(config_dir: &Path, json: bool) -> CmdResult {
    let existed = session::clear_session(config_dir)?;
    if json {
        return print_json(&serde_json::json!({ "logged_out": existed }));
    }
    println!("{}", if existed { "Logged out" } else { "Not logged in" });
    Ok(())
}

fn cmd_whoami(client: &Client, json: bool) -> CmdResult {
    let user = client.backend.current_user()?;
    if json {
        return print_json(&user_to_json(&user));
    }
    match &user.email {
        Some(email) => println!("{} ({}) <{}>", user.display_name(), user.id, email),
        None => println!("{} ({})", user.display_name(), user.id),
    }
    Ok(())
}

fn cmd_users(client: &Client, json: bool) -> CmdResult {
    let users = client.backend.list_users()?;
    if json {
        return print_json(&users.iter().map(user_to_json).collect::<Vec<_>>());
    }
    for user in &users {
        println!("{} {}", user.id, user.display_name());
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Projects
// ---------------------------------------------------------------------------

fn cmd_projects(client: &Client, json: bool) -> CmdResult {
    let projects = client.backend.my_projects()?;
    if json {
        return print_json(&projects.iter().map(project_to_json).collect::<Vec<_>>());
    }
    if projects.is_empty() {
        println!("No projects yet. Create one with `clb project create <name>`.");
    }
    for project in &projects {
        let team = project_ops::available_assignees(project).len();
        if client.config.ui.show_ids {
            println!("{} {} ({} people)", project.id, project.title, team);
        } else {
            println!("{} ({} people)", project.title, team);
        }
    }
    Ok(())
}

fn cmd_project(client: &Client, args: ProjectCmd, json: bool) -> CmdResult {
    let backend = &client.backend;
    match args.action {
        ProjectAction::Show(a) => {
            let project = backend.get_project(&Id::from(a.project.as_str()))?;
            if json {
                return print_json(&project_to_json(&project));
            }
            for line in format_project(&project, client.config.ui.show_ids) {
                println!("{}", line);
            }
        }
        ProjectAction::Create(a) => {
            let members: Vec<Id> = a.members.iter().map(|m| Id::from(m.as_str())).collect();
            let project = project_ops::create_project(backend, &a.title, a.description.as_deref(), &members)?;
            if json {
                return print_json(&project_to_json(&project));
            }
            println!("Created project {} ({})", project.title, project.id);
        }
        ProjectAction::AddMember(a) => {
            backend.add_member(&Id::from(a.project.as_str()), &Id::from(a.user.as_str()))?;
            if json {
                return print_json(&membership_to_json(&a.project, &a.user, "added"));
            }
            println!("Added {} to project {}", a.user, a.project);
        }
        ProjectAction::RemoveMember(a) => {
            backend.remove_member(&Id::from(a.project.as_str()), &Id::from(a.user.as_str()))?;
            if json {
                return print_json(&membership_to_json(&a.project, &a.user, "removed"));
            }
            println!("Removed {} from project {}", a.user, a.project);
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tasks
// ---------------------------------------------------------------------------

fn cmd_tasks(client: &Client, args: TasksArgs, json: bool) -> CmdResult {
    let status = args
        .status
        .as_deref()
        .map(parse_status_arg)
        .transpose()
        .map_err(Box::<dyn std::error::Error>::from)?;
    let raw = args.query.unwrap_or_default();
    let query = if args.regex {
        TaskQuery::regex(&raw)?
    } else {
        TaskQuery::text(&raw)
    };

    let view = load_view(client, &args.project)?;
    let tasks = view.filtered_tasks(&query, status);
    if json {
        return print_json(&tasks.iter().map(|t| task_to_json(t)).collect::<Vec<_>>());
    }
    let counts = count_by_status(tasks.iter().copied());
    for task in tasks {
        println!("{}", format_task_line(task, client.config.ui.show_ids));
    }
    println!(
        "{} tasks ({} to do, {} in progress, {} done)",
        counts.total(),
        counts.todo,
        counts.in_progress,
        counts.done
    );
    Ok(())
}

fn cmd_board(client: &Client, args: BoardArgs, json: bool) -> CmdResult {
    let view = load_view(client, &args.project)?;
    let board = view.board();
    if json {
        return print_json(&board_to_json(&board));
    }
    println!("== {} ==", view.project.title);
    let width = args.width.unwrap_or(client.config.ui.column_width);
    for line in format_board(&board, width, client.config.ui.show_ids) {
        println!("{}", line);
    }
    Ok(())
}

fn cmd_task(client: &Client, args: TaskCmd, json: bool) -> CmdResult {
    let backend = &client.backend;
    match args.action {
        TaskAction::Add(a) => {
            let priority = a
                .priority
                .as_deref()
                .map(parse_priority_arg)
                .transpose()
                .map_err(Box::<dyn std::error::Error>::from)?;
            let form = TaskForm {
                title: a.title,
                description: a.description.unwrap_or_default(),
                priority,
                assignee_id: a.assignee.map(Id::from),
                due_date: a.due,
            };
            let mut view = load_view(client, &a.project)?;
            let created = view.create_task(backend, &form)?;
            let shown = view.task(&created.id).unwrap_or(&created);
            if json {
                return print_json(&task_to_json(shown));
            }
            println!("{}", format_task_line(shown, true));
        }
        TaskAction::Move(a) => {
            let status = parse_status_arg(&a.status)?;
            let mut view = load_view(client, &a.project)?;
            let task = view.move_task(backend, &Id::from(a.task.as_str()), status)?;
            if json {
                return print_json(&task_to_json(task));
            }
            println!("{}", format_task_line(task, client.config.ui.show_ids));
        }
        TaskAction::Assign(a) => {
            let mut view = load_view(client, &a.project)?;
            let user = Id::from(a.user.as_str());
            let task = view.reassign_task(backend, &Id::from(a.task.as_str()), Some(&user))?;
            if json {
                return print_json(&task_to_json(task));
            }
            println!("{}", format_task_line(task, client.config.ui.show_ids));
        }
        TaskAction::Unassign(a) => {
            let mut view = load_view(client, &a.project)?;
            let task = view.reassign_task(backend, &Id::from(a.task.as_str()), None)?;
            if json {
                return print_json(&task_to_json(task));
            }
            println!("{}", format_task_line(task, client.config.ui.show_ids));
        }
        TaskAction::Delete(a) => {
            let mut view = load_view(client, &a.project)?;
            let removed = view.delete_task(backend, &Id::from(a.task.as_str()))?;
            if json {
                return print_json(&task_to_json(&removed));
            }
            println!("Deleted {} {}", removed.id, removed.title);
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Comments and dashboard
// ---------------------------------------------------------------------------

fn cmd_comments(client: &Client, args: ProjectArg, json: bool) -> CmdResult {
    let view = load_view(client, &args.project)?;
    if json {
        return print_json(&view.comments.iter().map(comment_to_json).collect::<Vec<_>>());
    }
    if view.comments.is_empty() {
        println!("No comments yet.");
    }
    for line in format_comment_tree(&view.comments, Utc::now(), client.config.ui.show_ids) {
        println!("{}", line);
    }
    Ok(())
}

fn cmd_comment(client: &Client, args: CommentCmd, json: bool) -> CmdResult {
    match args.action {
        CommentAction::Add(a) => {
            let mut view = load_view(client, &a.project)?;
            let created = match a.reply_to {
                Some(parent) => view.reply_to(&client.backend, &Id::from(parent), &a.text)?,
                None => view.add_comment(&client.backend, &a.text)?,
            };
            if json {
                return print_json(&comment_to_json(&created));
            }
            println!("Posted comment {}", created.id);
        }
    }
    Ok(())
}

fn cmd_dashboard(client: &Client, json: bool) -> CmdResult {
    let user = client.backend.current_user()?;
    let summary = load_dashboard(&client.backend, &client.user_id, Local::now().date_naive())?;
    if json {
        return print_json(&DashboardJson {
            user: user.display_name(),
            summary: &summary,
        });
    }
    for line in format_dashboard(&user.display_name(), &summary) {
        println!("{}", line);
    }
    Ok(())
}
