use anyhow::{bail, Context, Result};
use chrono::{Datelike, NaiveDate};

/// 1週間の日数。
pub const DAYS_PER_WEEK: i64 = 7;

/// 指定された日付を含む週の月曜日を返す。
///
/// 日曜日は週の7日目として扱うため、日曜日を指定した場合は6日前の月曜日を返す。
///
/// # Arguments
///
/// * `date` - 週を決定する基準の日付
pub fn week_anchor(date: NaiveDate) -> NaiveDate {
    // Mon=0..Sun=6なので、そのまま月曜日までのオフセットになる
    let offset = date.weekday().num_days_from_monday() as i64;
    date - chrono::Duration::days(offset)
}

/// 週の先頭日から始まる連続した7日間を返す。
///
/// 純粋な関数であり、同じ入力に対しては常に同じ結果を返す。
/// 月末・年末をまたぐ場合の日付の正規化はchronoに任せる。
///
/// # Arguments
///
/// * `anchor` - 週の先頭日(月曜日)
pub fn week_grid(anchor: NaiveDate) -> Vec<NaiveDate> {
    (0..DAYS_PER_WEEK)
        .map(|offset| anchor + chrono::Duration::days(offset))
        .collect()
}

/// 前の週の先頭日を返す。
pub fn previous_week(anchor: NaiveDate) -> NaiveDate {
    anchor - chrono::Duration::days(DAYS_PER_WEEK)
}

/// 次の週の先頭日を返す。
pub fn next_week(anchor: NaiveDate) -> NaiveDate {
    anchor + chrono::Duration::days(DAYS_PER_WEEK)
}

/// 日付文字列を`YYYY-MM-DD`形式に正規化する。
///
/// `YYYY-MM-DD`で始まる文字列は最初の`T`以降を切り捨てて、日付部分をそのまま返す。
/// UTCへの変換は行わず、日付部分をLocalとして信頼する。
///
/// # Arguments
///
/// * `value` - サーバーから受け取ったentry date文字列
pub fn normalize_date(value: &str) -> Result<String> {
    if !has_iso_date_prefix(value) {
        bail!("Invalid entry date: {}", value);
    }

    let date_part = value.split('T').next().unwrap_or(value);
    Ok(date_part.to_string())
}

/// 日付をLocalの暦日のまま`YYYY-MM-DD`形式の文字列にする。
pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// 日付をパースする。
pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .with_context(|| format!("Failed to parse date: {}", s))
}

// 先頭10文字が`YYYY-MM-DD`の形になっているかを確認する。
fn has_iso_date_prefix(value: &str) -> bool {
    let bytes = value.as_bytes();
    if bytes.len() < 10 {
        return false;
    }

    bytes.iter().take(10).enumerate().all(|(i, b)| match i {
        4 | 7 => *b == b'-',
        _ => b.is_ascii_digit(),
    })
}
