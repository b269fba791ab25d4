pub mod features;
pub mod shared;

use features::expenses::commands;
use features::expenses::service::ExpenseService;
use log::{error, info, warn};
use shared::config::environment::EnvironmentConfig;
use std::sync::Mutex;

/// アプリケーション状態（支出サービスを保持）
pub struct AppState {
    pub service: Mutex<ExpenseService>,
}

#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    tauri::Builder::default()
        .plugin(tauri_plugin_opener::init())
        .plugin(tauri_plugin_dialog::init())
        .setup(|app| {
            // ログシステムを初期化
            initialize_logging_system();

            info!("アプリケーション初期化を開始します...");

            // 環境変数を読み込み（.envファイルがある場合）
            if dotenv::dotenv().is_err() {
                // .envファイルがない場合は無視（本番環境では環境変数が直接設定される）
                warn!(".envファイルが見つかりません。環境変数が直接設定されていることを確認してください。");
            } else {
                info!(".envファイルを読み込みました");
            }

            // アプリ起動時にデータベースを初期化
            info!("データベースを初期化しています...");
            let db_conn = shared::database::initialize_database(app.handle()).map_err(|e| {
                error!("データベースの初期化に失敗しました: {e}");
                e
            })?;

            info!("データベースの初期化が完了しました");

            // 支出サービスを構築し、キャッシュを初回読み込み
            let mut service = ExpenseService::new(db_conn);
            service.refresh().map_err(|e| {
                error!("支出一覧の初回読み込みに失敗しました: {e}");
                e
            })?;

            // サービスをアプリ状態に保存
            app.manage(AppState {
                service: Mutex::new(service),
            });

            info!("アプリケーション初期化が完了しました");

            Ok(())
        })
        .invoke_handler(tauri::generate_handler![
            // 支出コマンド
            commands::get_expenses,
            commands::get_total_amount,
            commands::add_expense,
            commands::update_expense,
            commands::delete_expense,
            commands::toggle_paid,
            // フィルタコマンド
            commands::set_search,
            commands::set_category_filter,
            // キャッシュ・インポートコマンド
            commands::refresh_expenses,
            commands::import_expenses,
        ])
        .run(tauri::generate_context!())
        .expect("Tauriアプリケーションの実行中にエラーが発生しました");
}

/// ログシステムを初期化
fn initialize_logging_system() {
    // 環境設定を取得
    let env_config = EnvironmentConfig::from_env();

    // ログレベルを設定
    let log_level = match env_config.log_level.to_lowercase().as_str() {
        "error" => log::LevelFilter::Error,
        "warn" => log::LevelFilter::Warn,
        "info" => log::LevelFilter::Info,
        "debug" => log::LevelFilter::Debug,
        "trace" => log::LevelFilter::Trace,
        _ => log::LevelFilter::Info,
    };

    // env_loggerを初期化
    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .format_timestamp_secs()
        .format_module_path(false)
        .format_target(false)
        .init();

    info!(
        "ログシステムを初期化しました: level={}, environment={}",
        env_config.log_level, env_config.environment
    );
}
