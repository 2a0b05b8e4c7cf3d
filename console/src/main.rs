use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use common::Action;
use tokio::task::JoinSet;

use wasctl_console::command::{Command, HELP};
use wasctl_console::dispatcher::Dispatch;
use wasctl_console::input::{LinePrompt, Lines};
use wasctl_console::poller::RefreshOrigin;
use wasctl_console::render;
use wasctl_console::scheduler::{Submission, DELETE_CONFIRMATION};
use wasctl_console::was::WasContext;
use wasctl_console::{ApiClient, AppState, Config, Controller, Prompt, Target, Toasts};

type Console = Controller<ApiClient, LinePrompt>;

#[derive(Parser)]
#[command(author, version, about = "Interactive control panel for WAS server fleets", long_about = None)]
struct Args {
    /// Config file (.yaml, .yml or .toml)
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Backend base URL, overrides the config file
    #[arg(long)]
    url: Option<String>,
    /// WAS to open with, overrides the config file
    #[arg(long)]
    was: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = Config::load(args.config.as_deref())?;
    config.apply_overrides(args.url, args.was);

    setup_logging(&config)?;

    let backend = ApiClient::new(config.backend.base_url.clone(), config.backend.timeout())
        .context("Failed to build HTTP client")?;
    log::info!("Starting wasctl-console against {}", backend.base_url());
    let notifier = Arc::new(Toasts::new(config.notifications.channels.clone()));
    let lines = Lines::stdin();

    let was = WasContext::new(config.was.default.clone(), config.was_variants());
    let controller = Controller::new(
        AppState::new(was, config.selection.policy),
        backend,
        LinePrompt::new(lines.clone()),
        notifier,
    );

    controller.load().await;
    println!("{}", controller.with_state(|s| render::screen(s)));
    println!("Type 'help' for commands.");

    let mut timers = controller.start(&config.timers);
    let mut tasks = JoinSet::new();

    loop {
        match lines.next_command().await {
            Ok(Command::Quit) => break,
            Ok(command) => handle(&controller, command, &mut tasks).await,
            Err(e) => eprintln!("{}", e),
        }
        // Reap finished commands.
        while tasks.try_join_next().is_some() {}
    }

    if !tasks.is_empty() {
        println!("Waiting for {} running command(s)...", tasks.len());
    }
    while tasks.join_next().await.is_some() {}

    timers.shutdown();
    log::info!("wasctl-console stopped");
    Ok(())
}

/// Prompts are answered here, in input order. Anything that sends a change to the
/// backend then runs in `tasks` so the next command can be read meanwhile.
async fn handle(c: &Console, command: Command, tasks: &mut JoinSet<()>) {
    match command {
        Command::Help => println!("{}", HELP),
        Command::Show => println!("{}", c.with_state(|s| render::screen(s))),
        Command::Servers => print_servers(c),
        Command::Jobs => println!("{}", c.with_state(|s| render::jobs(&s.jobs))),
        Command::History => println!("{}", c.with_state(|s| render::history(&s.history))),
        Command::Clock => println!("{}", c.with_state(|s| render::clock(&s.clock))),
        Command::Was(id) => match c.select_was(id).await {
            Ok(()) => print_servers(c),
            Err(e) => eprintln!("{}", e),
        },
        Command::Select(name) => match c.toggle_server(&name, true) {
            Ok(()) => print_servers(c),
            Err(e) => eprintln!("{}", e),
        },
        Command::Unselect(name) => match c.toggle_server(&name, false) {
            Ok(()) => print_servers(c),
            Err(e) => eprintln!("{}", e),
        },
        Command::SelectAll => {
            c.toggle_all(true);
            print_servers(c);
        }
        Command::SelectNone => {
            c.toggle_all(false);
            print_servers(c);
        }
        Command::Run(action, name) => {
            if !c.with_state(|s| s.has_server(&name)) {
                eprintln!("No such server in the current list: {}", name);
                return;
            }
            start(c, action, Target::Server(name), tasks).await;
        }
        Command::Bulk(action) => start(c, action, Target::Bulk, tasks).await,
        Command::Refresh => {
            if c.refresh_inventory(RefreshOrigin::Manual).await.is_ok() {
                print_servers(c);
            }
        }
        Command::Schedule(draft) => {
            let c = c.clone();
            tasks.spawn(async move {
                c.open_job_dialog();
                match c.submit_job(draft).await {
                    Submission::Created(_) => {
                        println!("{}", c.with_state(|s| render::jobs(&s.jobs)));
                    }
                    Submission::Invalid(_) | Submission::Failed(_) => c.close_job_dialog(),
                }
            });
        }
        Command::Unschedule(id) => {
            if !c.prompt().confirm(DELETE_CONFIRMATION).await {
                println!("Cancelled.");
                return;
            }
            let c = c.clone();
            tasks.spawn(async move {
                c.remove_job(&id).await;
            });
        }
        Command::Clusters => {
            if let Ok(clusters) = c.clusters().await {
                if clusters.is_empty() {
                    println!("No clusters defined.");
                }
                for (name, members) in clusters {
                    println!("{}: {}", name, members.join(", "));
                }
            }
        }
        Command::Reload => {
            if c.reload_was_config().await.is_ok() {
                print_servers(c);
            }
        }
        Command::Quit => {}
    }
}

/// Confirm now, send in the background. The control shows as busy until it finishes.
async fn start(c: &Console, action: Action, target: Target, tasks: &mut JoinSet<()>) {
    match c.claim(action, target).await {
        Ok(claim) => {
            let c = c.clone();
            tasks.spawn(async move { report(c.run_claimed(claim).await) });
        }
        Err(outcome) => report(outcome),
    }
}

fn print_servers(c: &Console) {
    println!("{}", c.with_state(|s| format!("{}\n{}", render::summary(s), render::inventory(s))));
}

fn report(outcome: Dispatch) {
    match outcome {
        Dispatch::NoTargets => println!("No servers selected."),
        Dispatch::Declined => println!("Cancelled."),
        Dispatch::Busy => println!("That command is already running."),
        // Completion and failure are announced through notices.
        Dispatch::Completed | Dispatch::Failed(_) => {}
    }
}

fn setup_logging(config: &Config) -> anyhow::Result<()> {
    let log_file = std::env::var("WASCTL_LOG")
        .map(PathBuf::from)
        .ok()
        .or_else(|| config.logging.output.clone())
        .unwrap_or_else(|| PathBuf::from(common::DEFAULT_LOG_FILE));

    // Non-root users usually cannot write the system log location.
    let output = match fern::log_file(&log_file) {
        Ok(file) => file,
        Err(e) => {
            let fallback = Path::new(common::USER_LOG_FILE);
            eprintln!("Cannot open {:?} ({}), logging to {:?}", log_file, e, fallback);
            fern::log_file(fallback)
                .with_context(|| format!("Failed to open log file {:?}", fallback))?
        }
    };

    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{}][{}][{}] {}",
                chrono::Local::now().format("%Y-%m-%d][%H:%M:%S"),
                record.target(),
                record.level(),
                message
            ))
        })
        .level(config.logging.level_filter())
        .chain(output)
        .apply()?;

    Ok(())
}
