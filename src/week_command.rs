use std::io::Write;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use log::info;

use crate::api::TimesheetRepository;
use crate::console::{ConsoleMarkdown, ConsolePresenter};
use crate::datetime;
use crate::store::EntryStore;
use crate::week::{self, parse_date};

/// 週のグリッドを表示するためのサブコマンド。
#[derive(Debug, clap::Args)]
pub struct WeekArgs {
    #[clap(
        short = 'd',
        long = "date",
        help = "Show the week containing this date (YYYY-MM-DD)",
        parse(try_from_str = parse_date),
    )]
    date: Option<NaiveDate>,

    #[clap(
        short = 'u',
        long = "user",
        help = "User ID to load entries for",
        default_value = "me"
    )]
    user: String,

    #[clap(long = "prev", help = "Move one week back", conflicts_with = "next")]
    prev: bool,

    #[clap(long = "next", help = "Move one week forward", conflicts_with = "prev")]
    next: bool,
}

pub struct WeekCommand<'a, T: TimesheetRepository> {
    repo: &'a T,
}

impl<'a, T: TimesheetRepository> WeekCommand<'a, T> {
    /// 新しい`WeekCommand`を返す。
    pub fn new(repo: &'a T) -> Self {
        Self { repo }
    }

    /// `week`サブコマンドの処理を行う。
    ///
    /// 指定された日付(省略時は今日)を含む月曜始まりの週を表示する。
    /// `--prev`/`--next`で前後の週へ7日単位で移動する。
    ///
    /// # Arguments
    ///
    /// * `args` - `week`サブコマンドの引数
    /// * `writer` - 表示の書き込み先
    pub async fn run<W: Write>(&self, args: WeekArgs, writer: &mut W) -> Result<()> {
        let mut anchor = week::week_anchor(args.date.unwrap_or_else(datetime::today));
        if args.prev {
            anchor = week::previous_week(anchor);
        }
        if args.next {
            anchor = week::next_week(anchor);
        }
        let grid = week::week_grid(anchor);

        let mut store = EntryStore::new();
        self.load(&args.user, &mut store).await?;

        let mut presenter = ConsoleMarkdown::new(writer);
        presenter.show_week(&grid, &store)?;

        Ok(())
    }

    /// 指定されたユーザーの記録でストアを読み込み直す。
    ///
    /// ユーザーの切り替えに対応する明示的な読み込み操作で、既存のストアの内容は
    /// すべて破棄されて新しい取得結果で置き換わる。
    pub async fn load(&self, user: &str, store: &mut EntryStore) -> Result<()> {
        let fetched = self
            .repo
            .read_time_entries(user)
            .await
            .context("Failed to retrieve time entries")?;
        info!("Loaded {} entries for user {}", fetched.len(), user);
        store.rebuild(&fetched);
        if store.is_empty() {
            info!("No entries found for user {}", user);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::{WeekArgs, WeekCommand};
    use crate::api::MockTimesheetRepository;
    use crate::store::EntryStore;
    use crate::time_entry::{DatedEntry, TimeEntry};

    fn entry(id: i64, task: &str, hours: u32, minutes: u32) -> TimeEntry {
        TimeEntry {
            id: Some(id),
            task: task.to_string(),
            project: "Atlas".to_string(),
            project_code: None,
            client: "Acme".to_string(),
            location: "NL".to_string(),
            remarks: None,
            hours,
            minutes,
            user: None,
        }
    }

    /// 日付を指定しない場合でも週が表示できることを確認する。
    #[tokio::test]
    async fn test_week_command_no_date() {
        let args = WeekArgs {
            date: None,
            user: "me".to_string(),
            prev: false,
            next: false,
        };
        let mut repo = MockTimesheetRepository::new();
        repo.expect_read_time_entries()
            .times(1)
            .returning(|_| Ok(vec![]));

        let mut writer = Vec::new();
        let result = WeekCommand::new(&repo).run(args, &mut writer).await;

        assert!(result.is_ok());
        let output = String::from_utf8(writer).unwrap();
        assert!(output.contains("Weekly total: 0h 0m"));
    }

    /// 指定した日付を含む週の記録と合計が表示されることを確認する。
    #[tokio::test]
    async fn test_week_command_with_date() {
        let args = WeekArgs {
            date: Some(NaiveDate::from_ymd_opt(2024, 3, 6).unwrap()),
            user: "me".to_string(),
            prev: false,
            next: false,
        };
        let mut repo = MockTimesheetRepository::new();
        repo.expect_read_time_entries()
            .withf(|user| user == "me")
            .times(1)
            .returning(|_| {
                Ok(vec![
                    DatedEntry {
                        date: "2024-03-05T00:00:00Z".to_string(),
                        entry: entry(1, "Review", 2, 0),
                    },
                    DatedEntry {
                        date: "2024-03-07".to_string(),
                        entry: entry(2, "Design", 3, 30),
                    },
                ])
            });

        let mut writer = Vec::new();
        let result = WeekCommand::new(&repo).run(args, &mut writer).await;

        assert!(result.is_ok());
        let output = String::from_utf8(writer).unwrap();
        assert!(output.contains("## 2024-03-04 (Mon)"));
        assert!(output.contains("## 2024-03-05 (Tue) [2h 0m]"));
        assert!(output.contains("Weekly total: 5h 30m"));
    }

    /// `--prev`で前の週が表示されることを確認する。
    #[tokio::test]
    async fn test_week_command_prev_navigation() {
        let args = WeekArgs {
            date: Some(NaiveDate::from_ymd_opt(2024, 3, 6).unwrap()),
            user: "me".to_string(),
            prev: true,
            next: false,
        };
        let mut repo = MockTimesheetRepository::new();
        repo.expect_read_time_entries()
            .times(1)
            .returning(|_| Ok(vec![]));

        let mut writer = Vec::new();
        WeekCommand::new(&repo).run(args, &mut writer).await.unwrap();

        let output = String::from_utf8(writer).unwrap();
        assert!(output.contains("## 2024-02-26 (Mon)"));
        assert!(output.contains("## 2024-03-03 (Sun)"));
    }

    /// ユーザーを切り替えた読み込みで、前のユーザーの記録が破棄されることを確認する。
    #[tokio::test]
    async fn test_load_discards_previous_user_entries() {
        let mut repo = MockTimesheetRepository::new();
        repo.expect_read_time_entries()
            .withf(|user| user == "alice")
            .times(1)
            .returning(|_| {
                Ok(vec![DatedEntry {
                    date: "2024-03-04".to_string(),
                    entry: entry(1, "Review", 2, 0),
                }])
            });
        repo.expect_read_time_entries()
            .withf(|user| user == "bob")
            .times(1)
            .returning(|_| {
                Ok(vec![DatedEntry {
                    date: "2024-03-06".to_string(),
                    entry: entry(2, "Design", 1, 0),
                }])
            });

        let command = WeekCommand::new(&repo);
        let mut store = EntryStore::new();
        command.load("alice", &mut store).await.unwrap();
        assert!(store.contains_date("2024-03-04"));

        command.load("bob", &mut store).await.unwrap();
        assert!(!store.contains_date("2024-03-04"));
        assert!(store.contains_date("2024-03-06"));
    }

    /// 取得に失敗した場合はエラーになることを確認する。
    #[tokio::test]
    async fn test_load_propagates_fetch_error() {
        let mut repo = MockTimesheetRepository::new();
        repo.expect_read_time_entries()
            .times(1)
            .returning(|_| Err(anyhow::anyhow!("boom")));

        let mut store = EntryStore::new();
        let result = WeekCommand::new(&repo).load("me", &mut store).await;

        assert!(result.is_err());
        assert!(store.is_empty());
    }
}
