use std::io::Write;
use std::path::PathBuf;

use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand};
use comfy_table::presets::UTF8_FULL;
use comfy_table::Table;

use common::schedule::split_time_of_day;
use common::{Action, Clusters, HistoryEntry, JobId, Server};
use wasctl_console::dispatcher::Dispatch;
use wasctl_console::input::is_yes;
use wasctl_console::poller::RefreshOrigin;
use wasctl_console::render;
use wasctl_console::scheduler::{Deletion, JobDraft, Submission};
use wasctl_console::was::WasContext;
use wasctl_console::{
    ApiClient, AppState, AutoConfirm, Config, Controller, Prompt, Target, Toasts,
};

#[derive(Parser)]
#[command(author, version, about = "Control WAS servers and their schedules", long_about = None)]
struct Cli {
    /// Config file (.yaml, .yml or .toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Backend base URL
    #[arg(long, global = true)]
    url: Option<String>,
    /// WAS environment to act on
    #[arg(long, global = true)]
    was: Option<String>,
    /// Answer yes to every confirmation
    #[arg(short, long, global = true)]
    yes: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List servers of the active WAS
    Servers,
    /// Start servers (several names act on them as one selection)
    Start {
        #[arg(required = true)]
        names: Vec<String>,
    },
    /// Stop servers
    Stop {
        #[arg(required = true)]
        names: Vec<String>,
    },
    /// Restart servers
    Restart {
        #[arg(required = true)]
        names: Vec<String>,
    },
    /// Query server status
    Status {
        #[arg(required = true)]
        names: Vec<String>,
    },
    /// List scheduled tasks
    Jobs,
    /// Schedule a daily action
    Schedule {
        /// start, stop or restart
        #[arg(long)]
        action: String,
        /// Time of day, HH:MM
        #[arg(long)]
        at: String,
        /// Comma separated server names
        #[arg(long, value_delimiter = ',')]
        servers: Vec<String>,
        #[arg(long)]
        cluster_aware: bool,
    },
    /// Cancel a scheduled task
    Unschedule {
        id: String,
    },
    /// Show execution history
    History {
        /// Write CSV instead of a table
        #[arg(long)]
        csv: bool,
    },
    /// Show the backend's current time
    Time,
    /// Show cluster membership
    Clusters,
    /// Ask the backend to reload its WAS configuration
    ReloadConfig,
}

/// Reads the answer from the terminal.
struct StdinPrompt;

impl Prompt for StdinPrompt {
    async fn confirm(&self, message: &str) -> bool {
        print!("{} [y/N] ", message);
        let _ = std::io::stdout().flush();
        let answer = tokio::task::spawn_blocking(|| {
            let mut line = String::new();
            std::io::stdin().read_line(&mut line).map(|_| line)
        })
        .await;
        match answer {
            Ok(Ok(line)) => is_yes(&line),
            _ => false,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref())?;
    config.apply_overrides(cli.url, cli.was);

    let ok = if cli.yes {
        run(controller(&config, AutoConfirm)?, cli.command).await?
    } else {
        run(controller(&config, StdinPrompt)?, cli.command).await?
    };
    if !ok {
        std::process::exit(1);
    }
    Ok(())
}

fn controller<P: Prompt>(config: &Config, prompt: P) -> anyhow::Result<Controller<ApiClient, P>> {
    let backend = ApiClient::new(config.backend.base_url.clone(), config.backend.timeout())
        .context("Failed to build HTTP client")?;
    log::debug!("Using backend {} with WAS {}", backend.base_url(), config.was.default);
    let was = WasContext::new(config.was.default.clone(), config.was_variants());
    Ok(Controller::new(
        AppState::new(was, config.selection.policy),
        backend,
        prompt,
        std::sync::Arc::new(Toasts::new(config.notifications.channels.clone())),
    ))
}

/// Run one command. `Ok(false)` means the backend reported a failure.
async fn run<P: Prompt>(c: Controller<ApiClient, P>, command: Commands) -> anyhow::Result<bool> {
    match command {
        Commands::Servers => {
            c.refresh_inventory(RefreshOrigin::Manual).await?;
            println!("{}", c.with_state(|s| servers_table(&s.inventory)));
            Ok(true)
        }
        Commands::Start { names } => act(&c, Action::Start, names).await,
        Commands::Stop { names } => act(&c, Action::Stop, names).await,
        Commands::Restart { names } => act(&c, Action::Restart, names).await,
        Commands::Status { names } => act(&c, Action::Status, names).await,
        Commands::Jobs => {
            c.refresh_jobs().await?;
            println!("{}", c.with_state(|s| render::jobs(&s.jobs)));
            Ok(true)
        }
        Commands::Schedule { action, at, servers, cluster_aware } => {
            let (hour, minute) = split_time_of_day(&at)?;
            let draft = JobDraft {
                action: action.parse()?,
                servers,
                hour: hour.to_string(),
                minute: minute.to_string(),
                cluster_aware,
            };
            c.open_job_dialog();
            match c.submit_job(draft).await {
                Submission::Created(id) => {
                    if let Some(id) = id {
                        println!("Created job {}", id);
                    }
                    Ok(true)
                }
                Submission::Invalid(_) | Submission::Failed(_) => Ok(false),
            }
        }
        Commands::Unschedule { id } => match c.delete_job(&JobId(id)).await {
            Deletion::Deleted | Deletion::Declined => Ok(true),
            Deletion::Failed => Ok(false),
        },
        Commands::History { csv } => {
            c.refresh_history().await?;
            let history = c.with_state(|s| s.history.clone());
            if csv {
                write_csv(std::io::stdout().lock(), &history)?;
            } else {
                println!("{}", render::history(&history));
            }
            Ok(true)
        }
        Commands::Time => {
            if !c.sync_time().await {
                return Err(anyhow!("Could not read the backend time"));
            }
            println!("{}", c.with_state(|s| render::clock(&s.clock)));
            Ok(true)
        }
        Commands::Clusters => {
            let clusters = c.clusters().await?;
            println!("{}", clusters_table(&clusters));
            Ok(true)
        }
        Commands::ReloadConfig => {
            c.reload_was_config().await?;
            Ok(true)
        }
    }
}

/// One name acts on that server; several go through the selection as a bulk action.
async fn act<P: Prompt>(
    c: &Controller<ApiClient, P>,
    action: Action,
    names: Vec<String>,
) -> anyhow::Result<bool> {
    c.refresh_inventory(RefreshOrigin::Manual).await?;

    let target = match names.as_slice() {
        [name] => {
            if !c.with_state(|s| s.has_server(name)) {
                let was = c.with_state(|s| s.was.current().clone());
                return Err(anyhow!("No such server in {}: {}", was, name));
            }
            Target::Server(name.clone())
        }
        _ => {
            for name in &names {
                c.toggle_server(name, true)?;
            }
            Target::Bulk
        }
    };

    match c.dispatch(action, target).await {
        Dispatch::Completed => {
            if action == Action::Status {
                println!("{}", c.with_state(|s| servers_table(&s.inventory)));
            }
            Ok(true)
        }
        Dispatch::Declined => {
            println!("Cancelled.");
            Ok(true)
        }
        Dispatch::Failed(_) | Dispatch::NoTargets | Dispatch::Busy => Ok(false),
    }
}

fn servers_table(servers: &[Server]) -> String {
    if servers.is_empty() {
        return render::NO_SERVERS.to_string();
    }
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Name", "Status", "Class"]);
    for server in servers {
        table.add_row(vec![
            server.name.clone(),
            server.status.clone(),
            server.class().to_string(),
        ]);
    }
    table.to_string()
}

fn clusters_table(clusters: &Clusters) -> String {
    if clusters.is_empty() {
        return "No clusters defined.".to_string();
    }
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Cluster", "Members"]);
    for (name, members) in clusters {
        table.add_row(vec![name.clone(), members.join(", ")]);
    }
    table.to_string()
}

fn write_csv<W: Write>(out: W, history: &[HistoryEntry]) -> anyhow::Result<()> {
    let mut writer = csv::Writer::from_writer(out);
    writer.write_record(["timestamp", "action", "targets", "status", "detail", "job_id"])?;
    for entry in history {
        writer.write_record([
            entry.timestamp_label().as_str(),
            entry.action.as_str(),
            entry.targets.join(" ").as_str(),
            entry.status.as_str(),
            entry.detail.as_str(),
            entry.job_id.as_deref().unwrap_or(""),
        ])?;
    }
    writer.flush()?;
    Ok(())
}
