//! Line commands understood by the interactive console.

use anyhow::{anyhow, bail, Result};

use common::schedule::split_time_of_day;
use common::{Action, JobId, WasId};

use crate::scheduler::JobDraft;

pub const HELP: &str = "\
Commands:
  show                          redraw everything
  servers | jobs | history      redraw one view
  clock                         show the server time
  was <id>                      switch WAS (clears the selection)
  select <name> | unselect <name>
  all | none                    header checkbox
  start|stop|restart|status <name>
  bulk <action>                 run an action on the selection
  refresh                       reload the server list now
  schedule <action> <HH:MM> [--cluster] <server>...
  unschedule <id>
  clusters                      show cluster membership
  reload                        ask the backend to reload its WAS config
  help | quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Show,
    Servers,
    Jobs,
    History,
    Clock,
    Was(WasId),
    Select(String),
    Unselect(String),
    SelectAll,
    SelectNone,
    Run(Action, String),
    Bulk(Action),
    Refresh,
    Schedule(JobDraft),
    Unschedule(JobId),
    Clusters,
    Reload,
    Quit,
}

fn one_arg<'a>(name: &str, args: &[&'a str]) -> Result<&'a str> {
    match args {
        [arg] => Ok(*arg),
        _ => bail!("usage: {} <arg>", name),
    }
}

fn schedule(args: &[&str]) -> Result<Command> {
    let (action, at, rest) = match args {
        [action, at, rest @ ..] => (action, at, rest),
        _ => bail!("usage: schedule <action> <HH:MM> [--cluster] <server>..."),
    };
    let action: Action = action.parse()?;
    let (hour, minute) = split_time_of_day(at)?;

    let mut cluster_aware = false;
    let mut servers = Vec::new();
    for arg in rest {
        match *arg {
            "--cluster" => cluster_aware = true,
            server => servers.push(server.to_string()),
        }
    }

    Ok(Command::Schedule(JobDraft {
        action,
        servers,
        hour: hour.to_string(),
        minute: minute.to_string(),
        cluster_aware,
    }))
}

impl std::str::FromStr for Command {
    type Err = anyhow::Error;

    fn from_str(line: &str) -> Result<Self> {
        let words: Vec<&str> = line.split_whitespace().collect();
        let (head, args) = match words.split_first() {
            Some((head, args)) => (*head, args),
            None => bail!("empty command"),
        };

        let command = match head {
            "help" | "?" => Command::Help,
            "show" => Command::Show,
            "servers" => Command::Servers,
            "jobs" => Command::Jobs,
            "history" => Command::History,
            "clock" => Command::Clock,
            "was" => Command::Was(WasId::new(one_arg(head, args)?)),
            "select" => Command::Select(one_arg(head, args)?.to_string()),
            "unselect" => Command::Unselect(one_arg(head, args)?.to_string()),
            "all" => Command::SelectAll,
            "none" => Command::SelectNone,
            "start" | "stop" | "restart" | "status" => {
                Command::Run(head.parse()?, one_arg(head, args)?.to_string())
            }
            "bulk" => Command::Bulk(one_arg(head, args)?.parse()?),
            "refresh" => Command::Refresh,
            "schedule" => schedule(args)?,
            "unschedule" => Command::Unschedule(JobId(one_arg(head, args)?.to_string())),
            "clusters" => Command::Clusters,
            "reload" => Command::Reload,
            "quit" | "exit" => Command::Quit,
            other => return Err(anyhow!("unknown command: {} (try 'help')", other)),
        };
        Ok(command)
    }
}
