use crate::store::{self, WEEKLY_LIMIT_MINUTES};

/// 提出ダイアログの状態。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DialogState {
    Closed,
    Reviewing { total_minutes: u32 },
}

/// 週の提出確認ダイアログ。
///
/// `Closed -> Reviewing -> {confirm, cancel} -> Closed`の状態遷移のみを持ち、
/// リトライや部分的な提出の状態は持たない。週の合計は`open`で外部から渡された値を
/// そのまま表示するだけで、ダイアログ自身は何も再計算しない。
#[derive(Debug, Default)]
pub struct SubmitDialog {
    state: DialogState,
}

impl Default for DialogState {
    fn default() -> Self {
        Self::Closed
    }
}

impl SubmitDialog {
    /// 閉じた状態の新しい`SubmitDialog`を返す。
    pub fn new() -> Self {
        Self::default()
    }

    /// 現在の状態を返す。
    pub fn state(&self) -> DialogState {
        self.state
    }

    /// 計算済みの週の合計を受け取ってダイアログを開く。
    pub fn open(&mut self, total_minutes: u32) {
        self.state = DialogState::Reviewing { total_minutes };
    }

    /// 表示するメッセージを返す。閉じている場合は`None`。
    ///
    /// 合計が2400分を超えているかどうかでメッセージを分岐するが、
    /// どちらの場合でも提出自体は可能である。
    pub fn message(&self) -> Option<String> {
        let DialogState::Reviewing { total_minutes } = self.state else {
            return None;
        };

        let total = store::format_minutes(total_minutes);
        if store::exceeds_limit(total_minutes) {
            Some(format!(
                "Weekly total is {}, which exceeds the {} limit. Submit this week anyway?",
                total,
                store::format_minutes(WEEKLY_LIMIT_MINUTES)
            ))
        } else {
            Some(format!("Weekly total is {}. Submit this week?", total))
        }
    }

    /// 提出を確定する。
    ///
    /// 開いている場合のみ、渡されたコールバックを週の合計とともに呼び出してから閉じる。
    /// コールバックの結果は追跡しない(fire-and-forget)。
    pub fn confirm<F: FnOnce(u32)>(&mut self, submit: F) {
        if let DialogState::Reviewing { total_minutes } = self.state {
            submit(total_minutes);
            self.state = DialogState::Closed;
        }
    }

    /// 提出せずにダイアログを閉じる。副作用はない。
    pub fn cancel(&mut self) {
        self.state = DialogState::Closed;
    }
}
