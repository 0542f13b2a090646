pub mod dates;
pub mod output;
pub mod stats;
pub mod tasks;
pub mod views;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use dates::DateStyle;
use stats::{process_stats_command, StatsCommand};
use tasks::{process_add_command, process_edit_command, AddCommand, EditCommand};
use tracing::level_filters::LevelFilter;
use uuid::Uuid;
use views::{
    process_day_command, process_month_command, process_week_command, MonthCommand, ViewCommand,
};

use crate::{
    storage::task_storage::{TaskStorageImpl, TaskStore},
    utils::{
        clock::{Clock, DefaultClock},
        dir::{create_application_default_path, ensure_dir},
        logging::enable_logging,
    },
};

use output::format_task_line;

#[derive(Parser, Debug)]
#[command(name = "dayplan", version, long_about = None)]
#[command(about = "Planner for one-off and repeating tasks", long_about = None)]
struct Args {
    #[command(subcommand)]
    commands: Commands,
    #[arg(long, global = true, help = "Enable logging")]
    log: bool,
    #[arg(
        long,
        global = true,
        help = "Application directory. By default tries to save into $XDG_STATE_HOME or $HOME/.local/state"
    )]
    dir: Option<PathBuf>,
    #[arg(long, global = true, default_value_t = DateStyle::Uk, help = "Style of dates used during parsing. For Uk it's day/month/year. For Us it's month/day/year")]
    date_style: DateStyle,
}

#[derive(Subcommand, Debug)]
#[command(version, about, long_about = None)]
enum Commands {
    #[command(about = "Add a task")]
    Add {
        #[command(flatten)]
        command: AddCommand,
    },
    #[command(about = "Change fields of a task")]
    Edit {
        #[command(flatten)]
        command: EditCommand,
    },
    #[command(about = "Remove a task together with all its repetitions")]
    Remove { id: Uuid },
    #[command(about = "Mark a task as done or as not done")]
    Done { id: Uuid },
    #[command(about = "Show tasks of a day")]
    Day {
        #[command(flatten)]
        command: ViewCommand,
    },
    #[command(about = "Show tasks of a week, starting from Sunday")]
    Week {
        #[command(flatten)]
        command: ViewCommand,
    },
    #[command(about = "Show a month calendar with the number of tasks on every day")]
    Month {
        #[command(flatten)]
        command: MonthCommand,
    },
    #[command(about = "Show how tasks are spread across categories and days")]
    Stats {
        #[command(flatten)]
        command: StatsCommand,
    },
}

/// Everything a command needs besides its own arguments.
pub struct CliContext<'a> {
    pub clock: &'a dyn Clock,
    pub date_style: DateStyle,
}

pub async fn run_cli() -> Result<()> {
    let args = Args::parse();

    let app_dir = match args.dir {
        Some(dir) => ensure_dir(dir)?,
        None => create_application_default_path()?,
    };

    let logging_level = if args.log {
        Some(LevelFilter::TRACE)
    } else {
        None
    };
    enable_logging(&app_dir.join("logs"), logging_level, args.log)?;

    let store = TaskStore::new(TaskStorageImpl::new(app_dir)?);
    let context = CliContext {
        clock: &DefaultClock,
        date_style: args.date_style,
    };

    match args.commands {
        Commands::Add { command } => {
            let task = process_add_command(command, &store, &context).await?;
            println!("{}", format_task_line(&task));
            Ok(())
        }
        Commands::Edit { command } => {
            let task = process_edit_command(command, &store, &context).await?;
            println!("{}", format_task_line(&task));
            Ok(())
        }
        Commands::Remove { id } => {
            let task = store.delete(id).await?;
            println!("Removed {}", format_task_line(&task));
            Ok(())
        }
        Commands::Done { id } => {
            let task = store.toggle_complete(id).await?;
            println!("{}", format_task_line(&task));
            Ok(())
        }
        Commands::Day { command } => process_day_command(command, &store, &context).await,
        Commands::Week { command } => process_week_command(command, &store, &context).await,
        Commands::Month { command } => process_month_command(command, &store, &context).await,
        Commands::Stats { command } => process_stats_command(command, &store, &context).await,
    }
}
