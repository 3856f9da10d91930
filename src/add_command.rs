use std::io::Write;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use log::{error, info};

use crate::api::TimesheetRepository;
use crate::datetime;
use crate::store::{self, EntryStore};
use crate::validate::{validate_entry, EntryForm};
use crate::week::{self, parse_date};

/// 記録を追加するためのサブコマンド。
///
/// 必須フィールドは空文字をデフォルトとして受け取り、バリデーションゲート側で
/// フィールドごとのエラーメッセージを返す。
#[derive(Debug, clap::Args)]
pub struct AddArgs {
    #[clap(
        short = 'd',
        long = "date",
        help = "Entry date (YYYY-MM-DD), defaults to today",
        parse(try_from_str = parse_date),
    )]
    date: Option<NaiveDate>,

    #[clap(
        short = 'u',
        long = "user",
        help = "User to record the entry for",
        default_value = "me"
    )]
    user: String,

    #[clap(long, help = "Task name", default_value = "")]
    task: String,

    #[clap(long, help = "Project name", default_value = "")]
    project: String,

    #[clap(long = "project-code", help = "Project code")]
    project_code: Option<String>,

    #[clap(long, help = "Client name", default_value = "")]
    client: String,

    #[clap(long, help = "Work location", default_value = "")]
    location: String,

    #[clap(long, help = "Free-form remarks")]
    remarks: Option<String>,

    #[clap(long, help = "Hours worked", default_value = "0")]
    hours: String,

    #[clap(long, help = "Minutes worked", default_value = "0")]
    minutes: String,
}

pub struct AddCommand<'a, T: TimesheetRepository> {
    repo: &'a T,
}

impl<'a, T: TimesheetRepository> AddCommand<'a, T> {
    /// 新しい`AddCommand`を返す。
    pub fn new(repo: &'a T) -> Self {
        Self { repo }
    }

    /// `add`サブコマンドの処理を行う。
    ///
    /// バリデーションゲートを通過した記録を楽観的にストアへ追加してから、
    /// 作成リクエストを送る。作成に失敗しても楽観的に追加した記録は取り消さない。
    ///
    /// # Arguments
    ///
    /// * `args` - `add`サブコマンドの引数
    /// * `writer` - 表示の書き込み先
    pub async fn run<W: Write>(&self, args: AddArgs, writer: &mut W) -> Result<()> {
        let form = EntryForm {
            task: args.task,
            project: args.project,
            project_code: args.project_code,
            client: args.client,
            location: args.location,
            remarks: args.remarks,
            hours: args.hours,
            minutes: args.minutes,
        };
        // ネットワーク呼び出しの前にバリデーションする。失敗時はストアに何も追加されない
        let entry = validate_entry(&form)?;

        let date = week::format_date(args.date.unwrap_or_else(datetime::today));
        let mut store = EntryStore::new();
        // 楽観的な追加。ネットワークの確認を待たずに反映する
        let key = store.add(&date, entry.clone())?;
        writeln!(
            writer,
            "Added {} on {} ({})",
            entry.task,
            key,
            store::format_minutes(entry.duration_minutes())
        )
        .context("Failed to write added entry")?;

        match self.repo.create_time_entry(&args.user, &key, &entry).await {
            Ok(persisted) => {
                if let Some(id) = persisted.id {
                    store.assign_id(&key, &entry, id);
                    info!("Entry persisted with id {}", id);
                }
            }
            Err(err) => {
                // 作成の失敗では楽観的に追加した記録を取り消さない。次の全体リロードで解消する
                error!("Failed to persist entry, keeping the optimistic entry: {:#}", err);
            }
        }

        Ok(())
    }
}
