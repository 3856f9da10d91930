use std::io::Write;

use anyhow::{Context, Result};
use chrono::NaiveDate;

use crate::api::ReportRow;
use crate::store::{self, EntryStore};
use crate::time_entry::{Dept, Project, TimeEntry, User};
use crate::week;

/// Consoleに週のグリッドや参照リストを表示するためのtrait。
pub trait ConsolePresenter {
    /// 週のグリッドを日毎・週の合計とともに表示する。
    fn show_week(&mut self, grid: &[NaiveDate], store: &EntryStore) -> Result<()>;

    /// ユーザーの参照リストを表示する。
    fn show_users(&mut self, users: &[User]) -> Result<()>;

    /// プロジェクトの参照リストを表示する。
    fn show_projects(&mut self, projects: &[Project]) -> Result<()>;

    /// 部署の参照リストを表示する。
    fn show_depts(&mut self, depts: &[Dept]) -> Result<()>;

    /// レポートの集計結果を表示する。
    fn show_report(&mut self, rows: &[ReportRow]) -> Result<()>;
}

/// Markdownのlist形式で表示するpresenter。
pub struct ConsoleMarkdown<'a, W: Write> {
    writer: &'a mut W,
}

impl<'a, W: Write> ConsoleMarkdown<'a, W> {
    /// 新しい`ConsoleMarkdown`を返す。
    pub fn new(writer: &'a mut W) -> Self {
        Self { writer }
    }

    fn show_list<T>(
        &mut self,
        heading: &str,
        items: &[T],
        format: impl Fn(&T) -> String,
    ) -> Result<()> {
        writeln!(self.writer, "## {}", heading).context("Failed to write heading")?;
        if items.is_empty() {
            writeln!(self.writer, "(none)").context("Failed to write empty list")?;
            return Ok(());
        }
        for item in items {
            writeln!(self.writer, "- {}", format(item)).context("Failed to write list item")?;
        }

        Ok(())
    }
}

impl<'a, W: Write> ConsolePresenter for ConsoleMarkdown<'a, W> {
    // 週のグリッドを表示する。合計はストアとグリッドから毎回計算する。
    fn show_week(&mut self, grid: &[NaiveDate], store: &EntryStore) -> Result<()> {
        for date in grid {
            let key = week::format_date(*date);
            let day_total = store.total_for_date(&key);
            writeln!(
                self.writer,
                "## {} ({}) [{}]",
                key,
                date.format("%a"),
                store::format_minutes(day_total)
            )
            .with_context(|| format!("Failed to write day heading for {}", key))?;

            let entries = store.entries_for(&key);
            if entries.is_empty() {
                writeln!(self.writer, "(no entries)").context("Failed to write empty day")?;
                continue;
            }
            for entry in entries {
                writeln!(self.writer, "- {}", format_entry_line(entry))
                    .with_context(|| format!("Failed to write time entry: {:?}", entry))?;
            }
        }

        let total = store.weekly_total(grid);
        writeln!(
            self.writer,
            "\nWeekly total: {}",
            store::format_minutes(total)
        )
        .context("Failed to write weekly total")?;
        if store::exceeds_limit(total) {
            writeln!(
                self.writer,
                "Warning: weekly total exceeds {}",
                store::format_minutes(store::WEEKLY_LIMIT_MINUTES)
            )
            .context("Failed to write limit warning")?;
        }

        Ok(())
    }

    fn show_users(&mut self, users: &[User]) -> Result<()> {
        self.show_list("Users", users, |user| {
            let mut line = format!("{} ({})", user.name, user.id);
            if let Some(email) = &user.email {
                line.push_str(&format!(" <{}>", email));
            }
            line
        })
    }

    fn show_projects(&mut self, projects: &[Project]) -> Result<()> {
        self.show_list("Projects", projects, |project| {
            let mut line = format!("{} ({})", project.name, project.id);
            if let Some(code) = &project.code {
                line.push_str(&format!(" [{}]", code));
            }
            if let Some(client) = &project.client {
                line.push_str(&format!(" / {}", client));
            }
            line
        })
    }

    fn show_depts(&mut self, depts: &[Dept]) -> Result<()> {
        self.show_list("Depts", depts, |dept| format!("{} ({})", dept.name, dept.id))
    }

    fn show_report(&mut self, rows: &[ReportRow]) -> Result<()> {
        self.show_list("Report", rows, |row| {
            let mut line = format!("{} | {}", row.user, row.project);
            if let Some(dept) = &row.dept {
                line.push_str(&format!(" ({})", dept));
            }
            if let Some(location) = &row.location {
                line.push_str(&format!(" @ {}", location));
            }
            line.push_str(&format!(": {}", store::format_minutes(row.total_minutes)));
            line
        })
    }
}

// 記録の1行分の表示を組み立てる。
fn format_entry_line(entry: &TimeEntry) -> String {
    let mut line = format!(
        "{} | {} | {} | {}: {}",
        entry.task,
        entry.project,
        entry.client,
        entry.location,
        store::format_minutes(entry.duration_minutes())
    );
    if let Some(remarks) = &entry.remarks {
        line.push_str(&format!(" ({})", remarks));
    }
    if let Some(user) = &entry.user {
        line.push_str(&format!(" [{}]", user));
    }
    line
}
