use anyhow::{Context, Result};
use log::info;
use reqwest::{header::CONTENT_TYPE, Client};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::time_entry::{DatedEntry, Dept, Project, TimeEntry, User};

/// timesheet APIのtime entryレスポンスをデシリアライズするための構造体。
#[derive(Debug, Deserialize)]
struct ApiTimeEntry {
    id: Option<i64>,
    entry_date: String,
    task_name: Option<String>,
    project: Option<String>,
    project_name: Option<String>,
    project_code: Option<String>,
    client: Option<String>,
    location: Option<String>,
    remarks: Option<String>,
    hours: u32,
    minutes: u32,
    user: Option<String>,
}

/// time entry作成リクエストのボディ。
#[derive(Debug, Serialize)]
struct CreateTimeEntryBody<'a> {
    #[serde(rename = "taskId")]
    task_id: &'a str,
    user: &'a str,
    project: &'a str,
    location: &'a str,
    remarks: Option<&'a str>,
    date: &'a str,
    hours: u32,
    minutes: u32,
}

/// レポート取得・エクスポートの絞り込み条件。
///
/// users以下の複数選択の条件は、空の場合はクエリに含めない。
#[derive(Clone, Debug, Default)]
pub struct ReportParams {
    pub from: String,
    pub to: String,
    pub users: Vec<String>,
    pub projects: Vec<String>,
    pub depts: Vec<String>,
    pub locations: Vec<String>,
}

impl ReportParams {
    // クエリパラメータの組み立て。複数選択はカンマ区切りにする。
    fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut query = vec![("from", self.from.clone()), ("to", self.to.clone())];
        if !self.users.is_empty() {
            query.push(("users", self.users.join(",")));
        }
        if !self.projects.is_empty() {
            query.push(("projects", self.projects.join(",")));
        }
        if !self.depts.is_empty() {
            query.push(("depts", self.depts.join(",")));
        }
        if !self.locations.is_empty() {
            query.push(("locations", self.locations.join(",")));
        }
        query
    }
}

/// レポートの1行分の集計結果。
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct ReportRow {
    pub user: String,
    pub project: String,
    pub dept: Option<String>,
    pub location: Option<String>,
    pub total_minutes: u32,
}

/// timesheet APIへの操作を表すトレイト。
///
/// コマンド側はこのトレイト経由でAPIを利用し、テストではモックに差し替える。
#[cfg_attr(test, mockall::automock)]
pub trait TimesheetRepository {
    /// 指定されたユーザーのtime entryを取得する。ユーザーは`me`かサーバーのユーザーidを指定する。
    async fn read_time_entries(&self, user: &str) -> Result<Vec<DatedEntry>>;

    /// time entryを作成し、サーバーidが割り当てられた記録を返す。
    async fn create_time_entry(&self, user: &str, date: &str, entry: &TimeEntry)
        -> Result<TimeEntry>;

    /// time entryを削除する。
    async fn delete_time_entry(&self, entry_id: i64) -> Result<()>;

    /// ユーザーの参照リストを取得する。
    async fn read_users(&self) -> Result<Vec<User>>;

    /// プロジェクトの参照リストを取得する。
    async fn read_projects(&self) -> Result<Vec<Project>>;

    /// 部署の参照リストを取得する。
    async fn read_depts(&self) -> Result<Vec<Dept>>;

    /// 集計レポートを取得する。
    async fn read_report(&self, params: &ReportParams) -> Result<Vec<ReportRow>>;

    /// エクスポートされたスプレッドシートをバイト列として取得する。
    async fn export_report(&self, params: &ReportParams) -> Result<Vec<u8>>;
}

/// timesheet APIと通信するためのクライアント。
///
/// すべてのリクエストにbearerトークンを付与する。トークンが不正な場合は401が
/// エラーとして返るだけで、リトライやバックオフは行わない。
pub struct ApiClient {
    client: Client,
    api_url: String,
    api_token: String,
}

impl ApiClient {
    /// 新しい`ApiClient`を返す。
    pub fn new(api_url: String, api_token: String) -> Self {
        Self {
            client: Client::new(),
            api_url,
            api_token,
        }
    }

    /// 接続設定から`ApiClient`を組み立てる。
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.api_url.clone(), config.api_token.clone())
    }

    // 認証付きのGETリクエストを送り、レスポンスをデシリアライズする。
    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        self.client
            .get(format!("{}{}", self.api_url, path))
            .bearer_auth(&self.api_token)
            .header(CONTENT_TYPE, "application/json")
            .query(query)
            .send()
            .await
            .with_context(|| {
                format!(
                    "Failed to send request to the timesheet API at {}{}",
                    self.api_url, path
                )
            })?
            .error_for_status()
            .context("Request returned an error status")?
            .json::<T>()
            .await
            .context("Failed to deserialize response")
    }
}

impl TimesheetRepository for ApiClient {
    async fn read_time_entries(&self, user: &str) -> Result<Vec<DatedEntry>> {
        let path = format!("/api/time-entries/user/{}", user);
        let entries: Vec<ApiTimeEntry> = self.get_json(&path, &[]).await?;
        info!("Retrieved {} time entries for user {}", entries.len(), user);

        Ok(entries.into_iter().map(map_entry).collect())
    }

    async fn create_time_entry(
        &self,
        user: &str,
        date: &str,
        entry: &TimeEntry,
    ) -> Result<TimeEntry> {
        let body = CreateTimeEntryBody {
            task_id: &entry.task,
            user,
            project: &entry.project,
            location: &entry.location,
            remarks: entry.remarks.as_deref(),
            date,
            hours: entry.hours,
            minutes: entry.minutes,
        };

        let created: ApiTimeEntry = self
            .client
            .post(format!("{}/api/time-entries", self.api_url))
            .bearer_auth(&self.api_token)
            .header(CONTENT_TYPE, "application/json")
            .json(&body)
            .send()
            .await
            .with_context(|| {
                format!(
                    "Failed to send request to the timesheet API at {}/api/time-entries",
                    self.api_url
                )
            })?
            .error_for_status()
            .context("Request returned an error status")?
            .json()
            .await
            .context("Failed to deserialize response")?;
        info!("Created time entry with id {:?}", created.id);

        Ok(map_entry(created).entry)
    }

    async fn delete_time_entry(&self, entry_id: i64) -> Result<()> {
        self.client
            .delete(format!("{}/api/time-entries/{}", self.api_url, entry_id))
            .bearer_auth(&self.api_token)
            .send()
            .await
            .with_context(|| format!("Failed to send delete request for entry {}", entry_id))?
            .error_for_status()
            .context("Request returned an error status")?;
        info!("Deleted time entry {}", entry_id);

        Ok(())
    }

    async fn read_users(&self) -> Result<Vec<User>> {
        self.get_json("/api/users", &[]).await
    }

    async fn read_projects(&self) -> Result<Vec<Project>> {
        self.get_json("/api/projects", &[]).await
    }

    async fn read_depts(&self) -> Result<Vec<Dept>> {
        self.get_json("/api/dept", &[]).await
    }

    async fn read_report(&self, params: &ReportParams) -> Result<Vec<ReportRow>> {
        self.get_json("/api/reports/time-entries", &params.to_query())
            .await
    }

    async fn export_report(&self, params: &ReportParams) -> Result<Vec<u8>> {
        let bytes = self
            .client
            .get(format!("{}/api/reports/export", self.api_url))
            .bearer_auth(&self.api_token)
            .query(&params.to_query())
            .send()
            .await
            .with_context(|| {
                format!(
                    "Failed to send request to the timesheet API at {}/api/reports/export",
                    self.api_url
                )
            })?
            .error_for_status()
            .context("Request returned an error status")?
            .bytes()
            .await
            .context("Failed to read exported report body")?;

        Ok(bytes.to_vec())
    }
}

// APIのレスポンスをドメインの記録へ変換する。
fn map_entry(wire: ApiTimeEntry) -> DatedEntry {
    DatedEntry {
        date: wire.entry_date,
        entry: TimeEntry {
            id: wire.id,
            task: wire.task_name.unwrap_or_default(),
            project: wire.project_name.or(wire.project).unwrap_or_default(),
            project_code: wire.project_code,
            client: wire.client.unwrap_or_default(),
            location: wire.location.unwrap_or_default(),
            remarks: wire.remarks,
            hours: wire.hours,
            minutes: wire.minutes,
            user: wire.user,
        },
    }
}
