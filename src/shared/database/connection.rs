use crate::shared::config::environment::{get_database_filename, get_environment};
use crate::shared::errors::{AppError, AppResult};
use chrono::Utc;
use rusqlite::{params, Connection};
use std::path::{Path, PathBuf};
use tauri::{AppHandle, Manager};

/// データベース接続を初期化する
///
/// # 引数
/// * `app_handle` - Tauriアプリケーションハンドル
///
/// # 戻り値
/// データベース接続、または失敗時はエラー
///
/// # 処理内容
/// 1. アプリケーションデータディレクトリの確保
/// 2. データベースファイルパスの決定
/// 3. データベース接続の開設
/// 4. テーブル作成とサンプルデータの投入
pub fn initialize_database(app_handle: &AppHandle) -> AppResult<Connection> {
    // データベースファイルパスを取得
    let database_path = get_database_path(app_handle)?;

    // データベース接続を開いて初期化
    let conn = open_database(&database_path)?;

    log::info!("データベースを初期化しました: {database_path:?}");

    Ok(conn)
}

/// 指定されたパスのデータベースを開き、テーブル作成とシードを行う
///
/// # 引数
/// * `path` - データベースファイルのパス
///
/// # 戻り値
/// 初期化済みのデータベース接続、または失敗時はエラー
pub fn open_database(path: &Path) -> AppResult<Connection> {
    let conn = Connection::open(path).map_err(|e| AppError::Database(e.to_string()))?;

    create_tables(&conn)?;
    seed_sample_expenses(&conn)?;

    Ok(conn)
}

/// アプリデータディレクトリ内のデータベースファイルパスを取得する
///
/// # 引数
/// * `app_handle` - Tauriアプリケーションハンドル
///
/// # 戻り値
/// データベースファイルのパス、または失敗時はエラー
pub fn get_database_path(app_handle: &AppHandle) -> AppResult<PathBuf> {
    // アプリケーションデータディレクトリを取得
    let app_data_dir = app_handle.path().app_data_dir().map_err(|e| {
        AppError::configuration(format!("アプリデータディレクトリの取得に失敗: {e}"))
    })?;

    // ディレクトリが存在しない場合は作成
    if !app_data_dir.exists() {
        std::fs::create_dir_all(&app_data_dir).map_err(|e| {
            AppError::configuration(format!("アプリデータディレクトリの作成に失敗: {e}"))
        })?;
        log::info!(
            "アプリケーションデータディレクトリを作成: {:?}",
            app_data_dir
        );
    }

    // 環境に応じたデータベースファイル名を決定
    let db_filename = get_database_filename(get_environment());
    let database_path = app_data_dir.join(db_filename);

    Ok(database_path)
}

/// データベーステーブルを作成する
///
/// # 引数
/// * `conn` - データベース接続
///
/// # 戻り値
/// 成功時はOk(())、失敗時はエラー
pub fn create_tables(conn: &Connection) -> AppResult<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS expenses (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            amount REAL NOT NULL,
            category TEXT,
            paid INTEGER NOT NULL DEFAULT 1,
            created_at INTEGER NOT NULL
        )",
        [],
    )
    .map_err(|e| AppError::Database(e.to_string()))?;

    // インデックスを作成
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_expenses_created_at ON expenses(created_at)",
        [],
    )
    .map_err(|e| AppError::Database(e.to_string()))?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_expenses_category ON expenses(category)",
        [],
    )
    .map_err(|e| AppError::Database(e.to_string()))?;

    Ok(())
}

/// テーブルが空の場合、サンプルの支出データを投入する
///
/// # 引数
/// * `conn` - データベース接続
///
/// # 戻り値
/// 成功時はOk(())、失敗時はエラー
///
/// 行が存在するかどうかのチェックがシードのガードとなるため、
/// アプリ起動のたびに呼び出しても安全
pub fn seed_sample_expenses(conn: &Connection) -> AppResult<()> {
    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM expenses", [], |row| row.get(0))
        .map_err(|e| AppError::Database(e.to_string()))?;

    if count > 0 {
        return Ok(());
    }

    let now = Utc::now().timestamp_millis();
    let samples = [
        ("Cà phê", 30000.0, "Đồ uống"),
        ("Ăn trưa", 50000.0, "Ăn uống"),
        ("Đi xe buýt", 10000.0, "Di chuyển"),
    ];

    for (title, amount, category) in samples.iter() {
        conn.execute(
            "INSERT INTO expenses (title, amount, category, paid, created_at)
             VALUES (?1, ?2, ?3, 1, ?4)",
            params![title, amount, category, now],
        )
        .map_err(|e| AppError::Database(e.to_string()))?;
    }

    log::info!("サンプルの支出データを投入しました");

    Ok(())
}
