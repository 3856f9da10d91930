use std::collections::BTreeMap;

use anyhow::Result;
use chrono::NaiveDate;
use log::warn;

use crate::time_entry::{DatedEntry, TimeEntry};
use crate::week;

/// 週あたりの上限時間(40時間)を分で表した定数。
///
/// 上限はあくまで警告のためのしきい値であり、記録自体を拒否するハードリミットではない。
pub const WEEKLY_LIMIT_MINUTES: u32 = 2400;

/// 選択中のユーザーの記録を日付ごとに保持するインメモリのストア。
///
/// キーは正規化済みの`YYYY-MM-DD`文字列。ユーザーを切り替えた時は`rebuild`で全体を作り直し、
/// 追加・削除はネットワーク確認を待たずに同期的に反映する。
#[derive(Debug, Default)]
pub struct EntryStore {
    entries: BTreeMap<String, Vec<TimeEntry>>,
}

impl EntryStore {
    /// 空の`EntryStore`を返す。
    pub fn new() -> Self {
        Self::default()
    }

    /// サーバーから取得した記録でストア全体を作り直す。
    ///
    /// 既存の内容はすべて破棄される。entry dateを正規化できない記録は警告を出して読み飛ばす。
    pub fn rebuild(&mut self, fetched: &[DatedEntry]) {
        self.entries.clear();

        for dated in fetched {
            match week::normalize_date(&dated.date) {
                Ok(key) => self.entries.entry(key).or_default().push(dated.entry.clone()),
                Err(err) => warn!("Skipping entry with unparseable date: {:#}", err),
            }
        }
    }

    /// 記録を楽観的に追加する。
    ///
    /// 日付を正規化したうえで同期的にストアへ追加し、正規化済みのキーを返す。
    /// ネットワークへの保存は呼び出し側がこの後に行う。
    pub fn add(&mut self, date: &str, entry: TimeEntry) -> Result<String> {
        let key = week::normalize_date(date)?;
        self.entries.entry(key.clone()).or_default().push(entry);

        Ok(key)
    }

    /// 指定された日付から記録を1件取り除く。
    ///
    /// サーバーidを持つ記録はidで、未保存の記録は内容の一致で照合する。
    /// 取り除いた結果そのリストが空になった場合は、日付のキーごと削除する。
    /// 取り除けた場合は`true`を返す。
    pub fn remove(&mut self, date: &str, target: &TimeEntry) -> Result<bool> {
        let key = week::normalize_date(date)?;
        let Some(list) = self.entries.get_mut(&key) else {
            return Ok(false);
        };

        let position = match target.id {
            Some(id) => list.iter().position(|entry| entry.id == Some(id)),
            None => list.iter().position(|entry| entry == target),
        };
        let Some(position) = position else {
            return Ok(false);
        };

        list.remove(position);
        if list.is_empty() {
            self.entries.remove(&key);
        }

        Ok(true)
    }

    /// サーバーidで記録を探し、日付キーと記録の組を返す。
    pub fn find_by_id(&self, id: i64) -> Option<(String, TimeEntry)> {
        self.entries.iter().find_map(|(date, list)| {
            list.iter()
                .find(|entry| entry.id == Some(id))
                .map(|entry| (date.clone(), entry.clone()))
        })
    }

    /// 楽観的に追加した未保存の記録へサーバーidを割り当てる。
    ///
    /// 割り当てられた場合は`true`を返す。
    pub fn assign_id(&mut self, date: &str, target: &TimeEntry, id: i64) -> bool {
        let Some(list) = self.entries.get_mut(date) else {
            return false;
        };
        let Some(entry) = list
            .iter_mut()
            .find(|entry| entry.id.is_none() && *entry == target)
        else {
            return false;
        };

        entry.id = Some(id);
        true
    }

    /// 指定された日付の記録のリストを返す。
    pub fn entries_for(&self, date: &str) -> &[TimeEntry] {
        self.entries.get(date).map(Vec::as_slice).unwrap_or(&[])
    }

    /// 指定された日付のキーが存在するかを返す。
    pub fn contains_date(&self, date: &str) -> bool {
        self.entries.contains_key(date)
    }

    /// 指定された日付の合計を分単位で返す。
    pub fn total_for_date(&self, date: &str) -> u32 {
        self.entries_for(date)
            .iter()
            .map(TimeEntry::duration_minutes)
            .sum()
    }

    /// 週のグリッドに含まれる日付の合計を分単位で返す。
    ///
    /// ストアとグリッドから毎回計算する導出値であり、キャッシュは持たない。
    pub fn weekly_total(&self, grid: &[NaiveDate]) -> u32 {
        grid.iter()
            .map(|date| self.total_for_date(&week::format_date(*date)))
            .sum()
    }

    /// 記録が1件もないかを返す。
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// 週の合計が上限を超えているかを返す。ちょうど上限の場合は超過とみなさない。
pub fn exceeds_limit(total_minutes: u32) -> bool {
    total_minutes > WEEKLY_LIMIT_MINUTES
}

/// 分単位の合計を`{hours}h {minutes}m`形式にする。
///
/// 時間は切り捨てで、余りの分は丸めずにそのまま表示する。
pub fn format_minutes(total_minutes: u32) -> String {
    format!("{}h {}m", total_minutes / 60, total_minutes % 60)
}
