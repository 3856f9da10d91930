use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

mod add_command;
mod api;
mod config;
mod console;
mod datetime;
mod delete_command;
mod dialog;
mod list_command;
mod report_command;
mod store;
mod submit_command;
mod time_entry;
mod validate;
mod week;
mod week_command;

use add_command::{AddArgs, AddCommand};
use api::ApiClient;
use config::Config;
use delete_command::{DeleteArgs, DeleteCommand};
use list_command::{ListArgs, ListCommand};
use report_command::{ReportArgs, ReportCommand};
use submit_command::{SubmitArgs, SubmitCommand};
use week_command::{WeekArgs, WeekCommand};

/// timesheet APIを操作するためのCLIアプリケーション。
///
/// # Examples
/// ```
/// $ cargo run -- week
/// $ cargo run -- add --task Review --project Atlas --client Acme --location NL --hours 2
/// ```
#[derive(Debug, Parser)]
#[clap(version, about)]
struct Args {
    #[clap(subcommand)]
    subcommand: SubCommands,

    #[clap(short, long, global = true, help = "Enable debug logging")]
    verbose: bool,
}

/// サブコマンドを表す列挙型。
#[derive(Debug, Subcommand)]
enum SubCommands {
    Week(WeekArgs),
    Add(AddArgs),
    Delete(DeleteArgs),
    Submit(SubmitArgs),
    List(ListArgs),
    Report(ReportArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    setup_logger(args.verbose)?;

    let config = Config::load()?;
    let client = ApiClient::from_config(&config);
    let mut stdout = std::io::stdout();

    match args.subcommand {
        SubCommands::Week(week) => WeekCommand::new(&client).run(week, &mut stdout).await?,
        SubCommands::Add(add) => AddCommand::new(&client).run(add, &mut stdout).await?,
        SubCommands::Delete(delete) => {
            DeleteCommand::new(&client).run(delete, &mut stdout).await?
        }
        SubCommands::Submit(submit) => {
            let stdin = std::io::stdin();
            let mut reader = stdin.lock();
            SubmitCommand::new(&client)
                .run(submit, &mut reader, &mut stdout)
                .await?
        }
        SubCommands::List(list) => ListCommand::new(&client).run(list, &mut stdout).await?,
        SubCommands::Report(report) => {
            ReportCommand::new(&client).run(report, &mut stdout).await?
        }
    }

    Ok(())
}

/// fernでロガーを初期化する。ログはstderrへ出力する。
fn setup_logger(verbose: bool) -> Result<()> {
    let colors = fern::colors::ColoredLevelConfig::new()
        .info(fern::colors::Color::Green)
        .warn(fern::colors::Color::Yellow)
        .error(fern::colors::Color::Red);
    let level = if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    fern::Dispatch::new()
        .format(move |out, message, record| {
            out.finish(format_args!(
                "{} [{}] {}",
                chrono::Local::now().format("%H:%M:%S"),
                colors.color(record.level()),
                message
            ))
        })
        .level(level)
        .chain(std::io::stderr())
        .apply()
        .context("Failed to initialize logger")?;

    Ok(())
}
