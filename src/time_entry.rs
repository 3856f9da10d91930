use serde::Deserialize;

/// 1件の作業時間の記録を表す構造体。
///
/// サーバーに保存される前は`id`が`None`であり、保存された時点でサーバーのidが割り当てられる。
/// `hours`と`minutes`が同時に0になる記録はバリデーションゲートで拒否される。
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TimeEntry {
    pub id: Option<i64>,
    pub task: String,
    pub project: String,
    pub project_code: Option<String>,
    pub client: String,
    pub location: String,
    pub remarks: Option<String>,
    pub hours: u32,
    pub minutes: u32,
    pub user: Option<String>,
}

impl TimeEntry {
    /// 記録の長さを分単位で返す。
    pub fn duration_minutes(&self) -> u32 {
        self.hours * 60 + self.minutes
    }
}

/// サーバーから取得したentry dateと記録の組。
///
/// entry dateは正規化前の生の文字列のまま保持する。
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DatedEntry {
    pub date: String,
    pub entry: TimeEntry,
}

/// ユーザーの参照情報。ドロップダウンの選択肢としてのみ利用する読み取り専用のリスト。
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: Option<String>,
}

/// プロジェクトの参照情報。
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct Project {
    pub id: i64,
    pub name: String,
    pub code: Option<String>,
    pub client: Option<String>,
}

/// 部署の参照情報。
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct Dept {
    pub id: i64,
    pub name: String,
}
