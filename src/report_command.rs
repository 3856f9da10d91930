use std::fs;
use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use log::info;

use crate::api::{ReportParams, TimesheetRepository};
use crate::console::{ConsoleMarkdown, ConsolePresenter};
use crate::week::{self, parse_date};

/// 集計レポートを取得・エクスポートするためのサブコマンド。
#[derive(Debug, clap::Args)]
pub struct ReportArgs {
    #[clap(
        long = "from",
        help = "Start date of the report range (YYYY-MM-DD)",
        parse(try_from_str = parse_date),
    )]
    from: NaiveDate,

    #[clap(
        long = "to",
        help = "End date of the report range (YYYY-MM-DD)",
        parse(try_from_str = parse_date),
    )]
    to: NaiveDate,

    #[clap(long = "user", help = "Filter by user, repeatable")]
    users: Vec<String>,

    #[clap(long = "project", help = "Filter by project, repeatable")]
    projects: Vec<String>,

    #[clap(long = "dept", help = "Filter by dept, repeatable")]
    depts: Vec<String>,

    #[clap(long = "location", help = "Filter by location, repeatable")]
    locations: Vec<String>,

    #[clap(
        long = "export",
        value_name = "FILE",
        help = "Write the exported spreadsheet to FILE instead of printing the report",
        parse(from_os_str),
    )]
    export: Option<PathBuf>,
}

pub struct ReportCommand<'a, T: TimesheetRepository> {
    repo: &'a T,
}

impl<'a, T: TimesheetRepository> ReportCommand<'a, T> {
    /// 新しい`ReportCommand`を返す。
    pub fn new(repo: &'a T) -> Self {
        Self { repo }
    }

    /// `report`サブコマンドの処理を行う。
    ///
    /// 日付範囲と複数選択の絞り込み条件で集計レポートを取得して表示する。
    /// `--export`が指定された場合は、エクスポートされたスプレッドシートをファイルへ書き込む。
    ///
    /// # Arguments
    ///
    /// * `args` - `report`サブコマンドの引数
    /// * `writer` - 表示の書き込み先
    pub async fn run<W: Write>(&self, args: ReportArgs, writer: &mut W) -> Result<()> {
        let params = ReportParams {
            from: week::format_date(args.from),
            to: week::format_date(args.to),
            users: args.users,
            projects: args.projects,
            depts: args.depts,
            locations: args.locations,
        };

        if let Some(path) = &args.export {
            let bytes = self
                .repo
                .export_report(&params)
                .await
                .context("Failed to export report")?;
            fs::write(path, &bytes)
                .with_context(|| format!("Failed to write exported report to {}", path.display()))?;
            info!("Wrote {} bytes to {}", bytes.len(), path.display());
            writeln!(writer, "Exported report to {}", path.display())
                .context("Failed to write export result")?;
            return Ok(());
        }

        let rows = self
            .repo
            .read_report(&params)
            .await
            .context("Failed to retrieve report")?;
        let mut presenter = ConsoleMarkdown::new(writer);
        presenter.show_report(&rows)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::env;
    use std::fs;

    use chrono::NaiveDate;

    use super::{ReportArgs, ReportCommand};
    use crate::api::{MockTimesheetRepository, ReportRow};

    fn args() -> ReportArgs {
        ReportArgs {
            from: NaiveDate::from_ymd_opt(2024, 3, 4).unwrap(),
            to: NaiveDate::from_ymd_opt(2024, 3, 10).unwrap(),
            users: vec!["alice".to_string()],
            projects: vec![],
            depts: vec![],
            locations: vec![],
            export: None,
        }
    }

    /// 絞り込み条件がそのままレポート取得に渡り、結果が表示されることを確認する。
    #[tokio::test]
    async fn test_report_command_shows_rows() {
        let mut repo = MockTimesheetRepository::new();
        repo.expect_read_report()
            .withf(|params| {
                params.from == "2024-03-04"
                    && params.to == "2024-03-10"
                    && params.users == vec!["alice".to_string()]
            })
            .times(1)
            .returning(|_| {
                Ok(vec![ReportRow {
                    user: "alice".to_string(),
                    project: "Atlas".to_string(),
                    dept: None,
                    location: None,
                    total_minutes: 330,
                }])
            });

        let mut writer = Vec::new();
        let result = ReportCommand::new(&repo).run(args(), &mut writer).await;

        assert!(result.is_ok());
        let output = String::from_utf8(writer).unwrap();
        assert!(output.contains("- alice | Atlas: 5h 30m"));
    }

    /// `--export`でエクスポートされたバイト列がファイルへ書き込まれることを確認する。
    #[tokio::test]
    async fn test_report_command_export_writes_file() {
        let mut repo = MockTimesheetRepository::new();
        repo.expect_export_report()
            .times(1)
            .returning(|_| Ok(b"PK\x03\x04fake-spreadsheet".to_vec()));
        repo.expect_read_report().never();

        let path = env::temp_dir().join(format!("tsheet-report-test-{}.xlsx", std::process::id()));
        let mut writer = Vec::new();
        let result = ReportCommand::new(&repo)
            .run(
                ReportArgs {
                    export: Some(path.clone()),
                    ..args()
                },
                &mut writer,
            )
            .await;

        assert!(result.is_ok());
        assert_eq!(fs::read(&path).unwrap(), b"PK\x03\x04fake-spreadsheet");
        let output = String::from_utf8(writer).unwrap();
        assert!(output.contains("Exported report to"));

        fs::remove_file(&path).unwrap();
    }
}
