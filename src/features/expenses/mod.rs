/// 支出機能モジュール
///
/// このモジュールは支出管理に関連するすべての機能を提供します：
/// - 支出の作成、読み取り、更新、削除（CRUD操作）
/// - 支出データのバリデーション
/// - 検索・カテゴリフィルタと合計金額の導出
/// - リモートエンドポイントからの取り込み（重複排除つき）
// サブモジュールの宣言
pub mod commands;
pub mod models;
pub mod repository;
pub mod service;

// 公開インターフェース：外部から使用可能な型と関数をエクスポート

// モデル
pub use models::{CreateExpenseDto, Expense, NewExpense, RemoteExpenseDto, UpdateExpenseDto};

// サービス（状態・ビジネスロジックレイヤー）
pub use service::ExpenseService;

// コマンド（Tauriコマンドハンドラー）
pub use commands::{
    add_expense, delete_expense, get_expenses, get_total_amount, import_expenses,
    refresh_expenses, set_category_filter, set_search, toggle_paid, update_expense,
};
