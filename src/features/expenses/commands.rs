use crate::features::expenses::models::{CreateExpenseDto, Expense, RemoteExpenseDto, UpdateExpenseDto};
use crate::shared::api_client::ImportClient;
use crate::AppState;
use log::{error, info};
use tauri::State;

/// フィルタ適用後の支出一覧を取得する
///
/// # 引数
/// * `state` - アプリケーション状態
///
/// # 戻り値
/// 現在の検索・カテゴリフィルタを適用した支出のリスト
#[tauri::command]
pub async fn get_expenses(state: State<'_, AppState>) -> Result<Vec<Expense>, String> {
    let service = state
        .service
        .lock()
        .map_err(|e| format!("状態ロックエラー: {e}"))?;

    Ok(service.filtered_view())
}

/// フィルタ適用後の合計金額を取得する
///
/// # 引数
/// * `state` - アプリケーション状態
///
/// # 戻り値
/// フィルタにマッチした支出の合計金額
#[tauri::command]
pub async fn get_total_amount(state: State<'_, AppState>) -> Result<f64, String> {
    let service = state
        .service
        .lock()
        .map_err(|e| format!("状態ロックエラー: {e}"))?;

    Ok(service.total_amount())
}

/// 支出を追加する
///
/// # 引数
/// * `dto` - 支出作成用DTO
/// * `state` - アプリケーション状態
///
/// # 戻り値
/// 成功時は空、失敗時はエラーメッセージ
#[tauri::command]
pub async fn add_expense(dto: CreateExpenseDto, state: State<'_, AppState>) -> Result<(), String> {
    let mut service = state
        .service
        .lock()
        .map_err(|e| format!("状態ロックエラー: {e}"))?;

    service.add(dto).map_err(|e| {
        error!("支出の追加に失敗しました: {}", e.details());
        String::from(e)
    })
}

/// 支出を更新する
///
/// # 引数
/// * `id` - 支出ID
/// * `dto` - 支出更新用DTO
/// * `state` - アプリケーション状態
///
/// # 戻り値
/// 成功時は空、失敗時はエラーメッセージ
#[tauri::command]
pub async fn update_expense(
    id: i64,
    dto: UpdateExpenseDto,
    state: State<'_, AppState>,
) -> Result<(), String> {
    let mut service = state
        .service
        .lock()
        .map_err(|e| format!("状態ロックエラー: {e}"))?;

    service.edit(id, dto).map_err(|e| {
        error!("支出の更新に失敗しました: {}", e.details());
        String::from(e)
    })
}

/// 支出を削除する
///
/// # 引数
/// * `id` - 支出ID
/// * `state` - アプリケーション状態
///
/// # 戻り値
/// 成功時は空、失敗時はエラーメッセージ
#[tauri::command]
pub async fn delete_expense(id: i64, state: State<'_, AppState>) -> Result<(), String> {
    let mut service = state
        .service
        .lock()
        .map_err(|e| format!("状態ロックエラー: {e}"))?;

    service.remove(id).map_err(|e| {
        error!("支出の削除に失敗しました: {}", e.details());
        String::from(e)
    })
}

/// 支払済みフラグを反転する
///
/// # 引数
/// * `id` - 支出ID
/// * `state` - アプリケーション状態
///
/// # 戻り値
/// 成功時は空、失敗時はエラーメッセージ
#[tauri::command]
pub async fn toggle_paid(id: i64, state: State<'_, AppState>) -> Result<(), String> {
    let mut service = state
        .service
        .lock()
        .map_err(|e| format!("状態ロックエラー: {e}"))?;

    service.toggle_paid(id).map_err(|e| {
        error!("支払済みフラグの更新に失敗しました: {}", e.details());
        String::from(e)
    })
}

/// 検索文字列を設定する
///
/// # 引数
/// * `search` - 検索文字列
/// * `state` - アプリケーション状態
#[tauri::command]
pub async fn set_search(search: String, state: State<'_, AppState>) -> Result<(), String> {
    let mut service = state
        .service
        .lock()
        .map_err(|e| format!("状態ロックエラー: {e}"))?;

    service.set_search(search);
    Ok(())
}

/// カテゴリフィルタを設定する
///
/// # 引数
/// * `category_filter` - カテゴリフィルタ（空文字列で解除）
/// * `state` - アプリケーション状態
#[tauri::command]
pub async fn set_category_filter(
    category_filter: String,
    state: State<'_, AppState>,
) -> Result<(), String> {
    let mut service = state
        .service
        .lock()
        .map_err(|e| format!("状態ロックエラー: {e}"))?;

    service.set_category_filter(category_filter);
    Ok(())
}

/// キャッシュをストレージから再読み込みする
///
/// # 引数
/// * `state` - アプリケーション状態
///
/// # 戻り値
/// 成功時は空、失敗時はエラーメッセージ
#[tauri::command]
pub async fn refresh_expenses(state: State<'_, AppState>) -> Result<(), String> {
    let mut service = state
        .service
        .lock()
        .map_err(|e| format!("状態ロックエラー: {e}"))?;

    service.refresh().map_err(|e| {
        error!("支出一覧の再読み込みに失敗しました: {}", e.details());
        String::from(e)
    })
}

/// リモートエンドポイントから支出を取り込む
///
/// # 引数
/// * `url` - 取得先URL（省略時は設定値を使用）
/// * `state` - アプリケーション状態
///
/// # 戻り値
/// 挿入された件数、または失敗時はエラーメッセージ
#[tauri::command]
pub async fn import_expenses(
    url: Option<String>,
    state: State<'_, AppState>,
) -> Result<usize, String> {
    let client = ImportClient::new().map_err(|e| {
        error!("インポートクライアントの作成に失敗しました: {}", e.details());
        String::from(e)
    })?;
    let target = url.unwrap_or_else(|| client.api_url().to_string());

    // 状態ロックを保持せずに取得を待つ
    let records: Vec<RemoteExpenseDto> = client.fetch_records(&target).await.map_err(|e| {
        error!("インポート元からの取得に失敗しました: {}", e.details());
        String::from(e)
    })?;

    let mut service = state
        .service
        .lock()
        .map_err(|e| format!("状態ロックエラー: {e}"))?;

    let inserted = service.import_records(records).map_err(|e| {
        error!("インポート処理に失敗しました: {}", e.details());
        String::from(e)
    })?;

    info!("インポートコマンド完了: {inserted}件を挿入しました");
    Ok(inserted)
}
