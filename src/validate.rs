use thiserror::Error;

use crate::time_entry::TimeEntry;

/// バリデーションゲートで検出するエラー。
///
/// ネットワーク呼び出しの前に検出され、フィールドごとに異なるメッセージを利用者へ表示する。
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Task is required")]
    MissingTask,

    #[error("Project is required")]
    MissingProject,

    #[error("Client is required")]
    MissingClient,

    #[error("Location is required")]
    MissingLocation,

    #[error("Hours and minutes cannot both be zero")]
    ZeroDuration,
}

/// 追加フォームの入力値。時間と分は入力されたままのテキストで保持する。
#[derive(Clone, Debug, Default)]
pub struct EntryForm {
    pub task: String,
    pub project: String,
    pub project_code: Option<String>,
    pub client: String,
    pub location: String,
    pub remarks: Option<String>,
    pub hours: String,
    pub minutes: String,
}

/// フォームの入力値を検証して`TimeEntry`を組み立てる。
///
/// task、project、client、locationの順に必須チェックを行い、最初に失敗した時点で中断する。
/// 時間と分は数字以外を取り除いたうえで整数として解釈し(失敗時は0)、両方が0の場合は拒否する。
/// すべてのチェックを通過するまでストアへの追加は行われない。
pub fn validate_entry(form: &EntryForm) -> Result<TimeEntry, ValidationError> {
    if form.task.trim().is_empty() {
        return Err(ValidationError::MissingTask);
    }
    if form.project.trim().is_empty() {
        return Err(ValidationError::MissingProject);
    }
    if form.client.trim().is_empty() {
        return Err(ValidationError::MissingClient);
    }
    if form.location.trim().is_empty() {
        return Err(ValidationError::MissingLocation);
    }

    let hours = parse_duration_component(&form.hours);
    let minutes = parse_duration_component(&form.minutes);
    if hours == 0 && minutes == 0 {
        return Err(ValidationError::ZeroDuration);
    }

    Ok(TimeEntry {
        id: None,
        task: form.task.trim().to_string(),
        project: form.project.trim().to_string(),
        project_code: form.project_code.clone(),
        client: form.client.trim().to_string(),
        location: form.location.trim().to_string(),
        remarks: form.remarks.clone(),
        hours,
        minutes,
        user: None,
    })
}

/// 時間・分の入力テキストを整形する。
///
/// 数字以外の文字を取り除き、先頭から2文字までに切り詰める。
/// 2桁で表現できる0-99の範囲に制限されるだけで、23や59への明示的なクランプは行わない。
pub fn sanitize_duration_input(raw: &str) -> String {
    raw.chars().filter(char::is_ascii_digit).take(2).collect()
}

// 整形済みのテキストを整数として解釈する。解釈できない場合は0として扱う。
fn parse_duration_component(raw: &str) -> u32 {
    sanitize_duration_input(raw).parse().unwrap_or(0)
}
