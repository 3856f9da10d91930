use std::io::Write;

use anyhow::{Context, Result};
use log::{error, info};

use crate::api::TimesheetRepository;
use crate::store::EntryStore;

/// 記録を削除するためのサブコマンド。
#[derive(Debug, clap::Args)]
pub struct DeleteArgs {
    #[clap(long = "id", help = "Server id of the entry to delete")]
    id: i64,

    #[clap(
        short = 'u',
        long = "user",
        help = "User owning the entry",
        default_value = "me"
    )]
    user: String,
}

pub struct DeleteCommand<'a, T: TimesheetRepository> {
    repo: &'a T,
}

impl<'a, T: TimesheetRepository> DeleteCommand<'a, T> {
    /// 新しい`DeleteCommand`を返す。
    pub fn new(repo: &'a T) -> Self {
        Self { repo }
    }

    /// `delete`サブコマンドの処理を行う。
    ///
    /// 記録を同期的にストアから取り除いてから削除リクエストを送る。
    /// 削除に失敗した場合は、正しさを優先してサーバーの状態でストア全体を読み直す。
    ///
    /// # Arguments
    ///
    /// * `args` - `delete`サブコマンドの引数
    /// * `writer` - 表示の書き込み先
    pub async fn run<W: Write>(&self, args: DeleteArgs, writer: &mut W) -> Result<()> {
        let mut store = EntryStore::new();
        let fetched = self
            .repo
            .read_time_entries(&args.user)
            .await
            .context("Failed to retrieve time entries")?;
        store.rebuild(&fetched);

        let (date, entry) = store
            .find_by_id(args.id)
            .with_context(|| format!("No entry with id {}", args.id))?;

        // 削除リクエストを送る前に同期的にストアから取り除く
        store.remove(&date, &entry)?;
        if !store.contains_date(&date) {
            info!("No entries remain on {}", date);
        }
        writeln!(writer, "Removed entry {} on {}", args.id, date)
            .context("Failed to write removed entry")?;

        match self.repo.delete_time_entry(args.id).await {
            Ok(()) => info!("Deleted entry {}", args.id),
            Err(err) => {
                error!("Failed to delete entry {}: {:#}", args.id, err);
                writeln!(
                    writer,
                    "Failed to delete entry {}, reloading from the server",
                    args.id
                )
                .context("Failed to write delete failure")?;
                // 対象だけを戻すのではなく、サーバーの状態で全体を読み直す
                let fetched = self
                    .repo
                    .read_time_entries(&args.user)
                    .await
                    .context("Failed to reload time entries")?;
                store.rebuild(&fetched);
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{DeleteArgs, DeleteCommand};
    use crate::api::MockTimesheetRepository;
    use crate::time_entry::{DatedEntry, TimeEntry};

    fn fetched() -> Vec<DatedEntry> {
        vec![DatedEntry {
            date: "2024-03-05".to_string(),
            entry: TimeEntry {
                id: Some(7),
                task: "Review".to_string(),
                project: "Atlas".to_string(),
                project_code: None,
                client: "Acme".to_string(),
                location: "NL".to_string(),
                remarks: None,
                hours: 2,
                minutes: 0,
                user: None,
            },
        }]
    }

    fn args() -> DeleteArgs {
        DeleteArgs {
            id: 7,
            user: "me".to_string(),
        }
    }

    /// 記録が取り除かれてから削除リクエストが送られることを確認する。
    #[tokio::test]
    async fn test_delete_command_removes_entry() {
        let mut repo = MockTimesheetRepository::new();
        repo.expect_read_time_entries()
            .times(1)
            .returning(|_| Ok(fetched()));
        repo.expect_delete_time_entry()
            .withf(|id| *id == 7)
            .times(1)
            .returning(|_| Ok(()));

        let mut writer = Vec::new();
        let result = DeleteCommand::new(&repo).run(args(), &mut writer).await;

        assert!(result.is_ok());
        let output = String::from_utf8(writer).unwrap();
        assert!(output.contains("Removed entry 7 on 2024-03-05"));
        assert!(!output.contains("reloading"));
    }

    /// 削除に失敗した場合はサーバーから全体を読み直すことを確認する。
    #[tokio::test]
    async fn test_delete_command_reloads_on_failure() {
        let mut repo = MockTimesheetRepository::new();
        // 最初の読み込みと、失敗後の読み直しの2回呼ばれる
        repo.expect_read_time_entries()
            .times(2)
            .returning(|_| Ok(fetched()));
        repo.expect_delete_time_entry()
            .times(1)
            .returning(|_| Err(anyhow::anyhow!("boom")));

        let mut writer = Vec::new();
        let result = DeleteCommand::new(&repo).run(args(), &mut writer).await;

        assert!(result.is_ok());
        let output = String::from_utf8(writer).unwrap();
        assert!(output.contains("Failed to delete entry 7, reloading from the server"));
    }

    /// 存在しないidの場合は削除リクエストを送らずにエラーになることを確認する。
    #[tokio::test]
    async fn test_delete_command_unknown_id() {
        let mut repo = MockTimesheetRepository::new();
        repo.expect_read_time_entries()
            .times(1)
            .returning(|_| Ok(vec![]));
        repo.expect_delete_time_entry().never();

        let mut writer = Vec::new();
        let result = DeleteCommand::new(&repo)
            .run(
                DeleteArgs {
                    id: 99,
                    user: "me".to_string(),
                },
                &mut writer,
            )
            .await;

        assert!(result.is_err());
    }
}
