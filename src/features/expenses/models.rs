use serde::{Deserialize, Serialize};

/// 支出データモデル
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Expense {
    pub id: i64,
    pub title: String,
    pub amount: f64,
    pub category: Option<String>,
    /// 支払済みフラグ（0または1、作成時のデフォルトは1）
    pub paid: i64,
    /// 作成時刻（エポックミリ秒、挿入時に一度だけ設定される）
    pub created_at: i64,
}

/// 新規行の挿入に使う値オブジェクト（created_atはリポジトリ側で付与）
#[derive(Debug, Clone)]
pub struct NewExpense {
    pub title: String,
    pub amount: f64,
    pub category: Option<String>,
    pub paid: i64,
}

/// 支出作成用DTO
///
/// amountはフォーム入力のままの文字列で受け取り、サービス層でパースする
#[derive(Debug, Deserialize)]
pub struct CreateExpenseDto {
    pub title: String,
    pub amount: String,
    pub category: Option<String>,
}

/// 支出更新用DTO
#[derive(Debug, Deserialize)]
pub struct UpdateExpenseDto {
    pub title: String,
    pub amount: String,
    pub category: Option<String>,
}

/// リモートインポートの1要素
///
/// フィールドはすべて任意。金額はpriceを優先し、なければamount、
/// どちらもなければ0として扱う
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct RemoteExpenseDto {
    pub title: String,
    pub price: Option<f64>,
    pub amount: Option<f64>,
    pub category: Option<String>,
}

impl RemoteExpenseDto {
    /// インポート時の金額を導出する（price優先、なければamount、なければ0）
    pub fn resolved_amount(&self) -> f64 {
        self.price.or(self.amount).unwrap_or(0.0)
    }
}
