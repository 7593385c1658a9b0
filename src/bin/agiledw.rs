use agiledw::analytics::contribution::ALL_PROJECTS;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "agiledw", about = "Agile workspace analytics CLI")]
struct Cli {
    /// Database path (default: ~/.agiledw/agiledw.db)
    #[arg(long)]
    db: Option<String>,

    /// Increase logging verbosity
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load workspaces, projects, members and tasks from a JSON document
    Import {
        /// Path to the JSON snapshot document
        file: String,
    },
    /// Compute dashboard analytics
    Analytics {
        #[command(subcommand)]
        target: AnalyticsTarget,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Show store status
    Status,
}

#[derive(Subcommand)]
enum AnalyticsTarget {
    /// Analytics for a whole workspace
    Workspace {
        /// Workspace ID
        #[arg(value_name = "WORKSPACE_ID")]
        workspace_id: String,
        /// Requesting user ID (default: the `user_id` config value)
        #[arg(long)]
        user: Option<String>,
        /// Evaluate as of this instant (RFC 3339 or YYYY-MM-DD) instead of now
        #[arg(long)]
        now: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Analytics for a single project
    Project {
        /// Project ID
        #[arg(value_name = "PROJECT_ID")]
        project_id: String,
        #[arg(long)]
        user: Option<String>,
        #[arg(long)]
        now: Option<String>,
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Get a config value
    Get { key: String },
    /// Set a config value
    Set { key: String, value: String },
    /// List all config values
    List,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let db = match &cli.db {
        Some(path) => agiledw::Database::open_at(path).await?,
        None => agiledw::Database::open().await?,
    };
    let dw = agiledw::AgileDW::new(db);

    match cli.command {
        Commands::Status => print_status(&dw).await?,
        Commands::Config { action } => handle_config(&dw, action).await?,
        Commands::Import { file } => {
            let report = dw.import_file(&file).await?;
            println!("Imported {file}");
            println!("  Workspaces: {}", report.workspaces);
            println!("  Projects:   {}", report.projects);
            println!("  Members:    {}", report.members);
            println!("  Tasks:      {}", report.tasks);
        }
        Commands::Analytics { target } => handle_analytics(&dw, target).await?,
    }

    Ok(())
}

/// Resolve the requesting user: explicit flag first, then the `user_id` config key.
async fn resolve_user(dw: &agiledw::AgileDW, user: Option<String>) -> anyhow::Result<String> {
    match user {
        Some(u) => Ok(u),
        None => dw.default_user_id().await?.ok_or_else(|| {
            anyhow::anyhow!("No user given. Pass --user or run 'agiledw config set user_id <USER_ID>'.")
        }),
    }
}

fn parse_now(now: Option<&str>) -> anyhow::Result<chrono::DateTime<chrono::Utc>> {
    match now {
        Some(s) => agiledw::date_util::parse_timestamp(s)
            .ok_or_else(|| anyhow::anyhow!("Invalid --now value: {s}")),
        None => Ok(chrono::Utc::now()),
    }
}

async fn handle_analytics(dw: &agiledw::AgileDW, target: AnalyticsTarget) -> anyhow::Result<()> {
    match target {
        AnalyticsTarget::Workspace { workspace_id, user, now, json } => {
            let user_id = resolve_user(dw, user).await?;
            let now = parse_now(now.as_deref())?;
            let a = dw.workspace_analytics_at(&workspace_id, &user_id, now).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&a)?);
            } else {
                println!("Workspace Analytics: {workspace_id} (as of {})", now.format("%Y-%m-%d"));
                print_summary(&a.summary);
                let o = &a.task_completion_overview;
                println!("  Completion:");
                println!("    Active:      {}", o.active_tasks);
                println!("    Completed:   {}", o.completed_tasks);
                println!("    Not started: {}", o.not_started_tasks);
                println!("  Created per month:");
                for point in &a.monthly_task_distribution {
                    println!("    {:<10} {}", point.month, point.task_count);
                }
                println!("  Projects:");
                for p in &a.projects_task_distribution {
                    println!("    {:<20} {} tasks, {} completed", p.project, p.task_count, p.completed_task_count);
                }
                println!("  Members:");
                for m in &a.member_task_contribution {
                    let total: u64 = agiledw::TaskStatus::ALL
                        .iter()
                        .filter_map(|s| m.count(*s, ALL_PROJECTS))
                        .sum();
                    println!("    {:<20} {} tasks", m.member, total);
                }
            }
        }
        AnalyticsTarget::Project { project_id, user, now, json } => {
            let user_id = resolve_user(dw, user).await?;
            let now = parse_now(now.as_deref())?;
            let a = dw.project_analytics_at(&project_id, &user_id, now).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&a)?);
            } else {
                println!("Project Analytics: {project_id} (as of {})", now.format("%Y-%m-%d"));
                print_summary(&a);
            }
        }
    }
    Ok(())
}

fn print_summary(s: &agiledw::AnalyticsSummary) {
    println!("  This month (vs last):");
    println!("    Tasks:      {} ({:+})", s.task_count, s.task_diff);
    println!("    Assigned:   {} ({:+})", s.assigned_task_count, s.assigned_task_diff);
    println!("    Incomplete: {} ({:+})", s.incomplete_task_count, s.incomplete_task_diff);
    println!("    Completed:  {} ({:+})", s.completed_task_count, s.completed_task_diff);
    println!("    Overdue:    {} ({:+})", s.overdue_task_count, s.overdue_task_diff);
    println!("  By priority:");
    for b in &s.tasks_by_priority {
        println!("    {:<12} {}", b.priority, b.task_count);
    }
    println!("  By status:");
    for b in &s.tasks_by_status {
        println!("    {:<12} {}", b.status, b.task_count);
    }
}

async fn print_status(dw: &agiledw::AgileDW) -> anyhow::Result<()> {
    let counts = dw.status().await?;
    println!("Store Status");
    println!("  Workspaces: {}", counts.workspaces);
    println!("  Projects:   {}", counts.projects);
    println!("  Members:    {}", counts.members);
    println!("  Tasks:      {}", counts.tasks);
    Ok(())
}

async fn handle_config(dw: &agiledw::AgileDW, action: ConfigAction) -> anyhow::Result<()> {
    match action {
        ConfigAction::Get { key } => match dw.config_get(&key).await? {
            Some(v) => println!("{key} = {v}"),
            None => println!("{key} is not set"),
        },
        ConfigAction::Set { key, value } => {
            dw.config_set(&key, &value).await?;
            println!("Config updated.");
        }
        ConfigAction::List => {
            let items = dw.config_list().await?;
            if items.is_empty() {
                println!("No configuration set.");
            } else {
                for (k, v) in items {
                    println!("{k} = {v}");
                }
            }
        }
    }
    Ok(())
}
