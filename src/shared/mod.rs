/// 共有エラー型とエラーハンドリング
pub mod errors;

/// 共有データベース接続管理
pub mod database;

/// 共有設定管理
pub mod config;

/// リモートインポート用HTTPクライアント
pub mod api_client;

// 便利な再エクスポート
pub use api_client::ImportClient;
pub use config::{get_database_filename, get_environment, Environment, EnvironmentConfig, ImportConfig};
pub use database::{create_tables, get_database_path, initialize_database};
pub use errors::{AppError, AppResult, ErrorSeverity};
