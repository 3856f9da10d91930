use std::io::Write;

use anyhow::Result;
use log::error;

use crate::api::TimesheetRepository;
use crate::console::{ConsoleMarkdown, ConsolePresenter};

/// 参照リストを表示するためのサブコマンド。
#[derive(Debug, clap::Args)]
pub struct ListArgs {}

pub struct ListCommand<'a, T: TimesheetRepository> {
    repo: &'a T,
}

impl<'a, T: TimesheetRepository> ListCommand<'a, T> {
    /// 新しい`ListCommand`を返す。
    pub fn new(repo: &'a T) -> Self {
        Self { repo }
    }

    /// `list`サブコマンドの処理を行う。
    ///
    /// ユーザー・プロジェクト・部署の参照リストを表示する。いずれかの取得に失敗しても
    /// 中断せず、そのリストだけを空として表示する。
    ///
    /// # Arguments
    ///
    /// * `args` - `list`サブコマンドの引数
    /// * `writer` - 表示の書き込み先
    pub async fn run<W: Write>(&self, _args: ListArgs, writer: &mut W) -> Result<()> {
        let users = match self.repo.read_users().await {
            Ok(users) => users,
            Err(err) => {
                error!("Failed to fetch users: {:#}", err);
                Vec::new()
            }
        };
        let projects = match self.repo.read_projects().await {
            Ok(projects) => projects,
            Err(err) => {
                error!("Failed to fetch projects: {:#}", err);
                Vec::new()
            }
        };
        let depts = match self.repo.read_depts().await {
            Ok(depts) => depts,
            Err(err) => {
                error!("Failed to fetch depts: {:#}", err);
                Vec::new()
            }
        };

        let mut presenter = ConsoleMarkdown::new(writer);
        presenter.show_users(&users)?;
        presenter.show_projects(&projects)?;
        presenter.show_depts(&depts)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{ListArgs, ListCommand};
    use crate::api::MockTimesheetRepository;
    use crate::time_entry::{Dept, Project, User};

    /// 3種類の参照リストがまとめて表示されることを確認する。
    #[tokio::test]
    async fn test_list_command_shows_reference_lists() {
        let mut repo = MockTimesheetRepository::new();
        repo.expect_read_users().times(1).returning(|| {
            Ok(vec![User {
                id: 1,
                name: "Alice".to_string(),
                email: None,
            }])
        });
        repo.expect_read_projects().times(1).returning(|| {
            Ok(vec![Project {
                id: 10,
                name: "Atlas".to_string(),
                code: Some("ATL".to_string()),
                client: Some("Acme".to_string()),
            }])
        });
        repo.expect_read_depts().times(1).returning(|| {
            Ok(vec![Dept {
                id: 100,
                name: "Engineering".to_string(),
            }])
        });

        let mut writer = Vec::new();
        let result = ListCommand::new(&repo).run(ListArgs {}, &mut writer).await;

        assert!(result.is_ok());
        let output = String::from_utf8(writer).unwrap();
        assert!(output.contains("- Alice (1)"));
        assert!(output.contains("- Atlas (10) [ATL] / Acme"));
        assert!(output.contains("- Engineering (100)"));
    }

    /// 一部の取得に失敗しても、残りのリストは表示されることを確認する。
    #[tokio::test]
    async fn test_list_command_degrades_on_fetch_failure() {
        let mut repo = MockTimesheetRepository::new();
        repo.expect_read_users()
            .times(1)
            .returning(|| Err(anyhow::anyhow!("boom")));
        repo.expect_read_projects().times(1).returning(|| {
            Ok(vec![Project {
                id: 10,
                name: "Atlas".to_string(),
                code: None,
                client: None,
            }])
        });
        repo.expect_read_depts()
            .times(1)
            .returning(|| Err(anyhow::anyhow!("boom")));

        let mut writer = Vec::new();
        let result = ListCommand::new(&repo).run(ListArgs {}, &mut writer).await;

        assert!(result.is_ok());
        let output = String::from_utf8(writer).unwrap();
        assert!(output.contains("## Users\n(none)"));
        assert!(output.contains("- Atlas (10)"));
        assert!(output.contains("## Depts\n(none)"));
    }
}
