use std::io::{BufRead, Write};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use log::{debug, info};

use crate::api::TimesheetRepository;
use crate::datetime;
use crate::dialog::SubmitDialog;
use crate::store::{self, EntryStore};
use crate::week::{self, parse_date};

/// 週を提出するためのサブコマンド。
#[derive(Debug, clap::Args)]
pub struct SubmitArgs {
    #[clap(
        short = 'd',
        long = "date",
        help = "Submit the week containing this date (YYYY-MM-DD)",
        parse(try_from_str = parse_date),
    )]
    date: Option<NaiveDate>,

    #[clap(
        short = 'u',
        long = "user",
        help = "User whose week is submitted",
        default_value = "me"
    )]
    user: String,

    #[clap(short = 'y', long = "yes", help = "Submit without prompting")]
    yes: bool,
}

pub struct SubmitCommand<'a, T: TimesheetRepository> {
    repo: &'a T,
}

impl<'a, T: TimesheetRepository> SubmitCommand<'a, T> {
    /// 新しい`SubmitCommand`を返す。
    pub fn new(repo: &'a T) -> Self {
        Self { repo }
    }

    /// `submit`サブコマンドの処理を行う。
    ///
    /// 週の合計を計算して確認ダイアログを開き、確認が取れた場合のみ提出する。
    /// 合計が上限を超えていても提出自体は可能で、メッセージが変わるだけである。
    ///
    /// # Arguments
    ///
    /// * `args` - `submit`サブコマンドの引数
    /// * `reader` - 確認の入力の読み込み元
    /// * `writer` - 表示の書き込み先
    pub async fn run<R: BufRead, W: Write>(
        &self,
        args: SubmitArgs,
        reader: &mut R,
        writer: &mut W,
    ) -> Result<()> {
        let anchor = week::week_anchor(args.date.unwrap_or_else(datetime::today));
        let grid = week::week_grid(anchor);

        let mut store = EntryStore::new();
        let fetched = self
            .repo
            .read_time_entries(&args.user)
            .await
            .context("Failed to retrieve time entries")?;
        store.rebuild(&fetched);

        // ダイアログには計算済みの合計を渡すだけで、ダイアログ側では再計算しない
        let total = store.weekly_total(&grid);
        let mut dialog = SubmitDialog::new();
        dialog.open(total);
        if let Some(message) = dialog.message() {
            writeln!(writer, "{}", message).context("Failed to write dialog message")?;
        }

        let confirmed = args.yes || prompt_confirmation(reader, writer)?;
        if confirmed {
            dialog.confirm(|total| {
                info!(
                    "Submitted week of {} ({})",
                    week::format_date(anchor),
                    store::format_minutes(total)
                );
            });
            writeln!(writer, "Week of {} submitted.", week::format_date(anchor))
                .context("Failed to write submission result")?;
        } else {
            dialog.cancel();
            writeln!(writer, "Submission cancelled.")
                .context("Failed to write cancellation")?;
        }
        debug!("Dialog state after submission flow: {:?}", dialog.state());

        Ok(())
    }
}

// y/Nの確認を読み取る。`y`以外はすべてキャンセルとして扱う。
fn prompt_confirmation<R: BufRead, W: Write>(reader: &mut R, writer: &mut W) -> Result<bool> {
    write!(writer, "[y/N] ").context("Failed to write prompt")?;
    writer.flush().context("Failed to flush prompt")?;

    let mut line = String::new();
    reader
        .read_line(&mut line)
        .context("Failed to read confirmation")?;

    Ok(line.trim().eq_ignore_ascii_case("y"))
}
