use crate::features::expenses::models::{Expense, NewExpense};
use crate::shared::errors::{AppError, AppResult};
use chrono::Utc;
use rusqlite::{params, Connection};

/// 支出を1件挿入する
///
/// # 引数
/// * `conn` - データベース接続
/// * `new` - 挿入する支出の値
///
/// # 戻り値
/// 成功時はOk(())、失敗時はエラー
///
/// created_atは現在時刻（エポックミリ秒）がここで付与される。
/// 採番されたidを知るには再度一覧を取得する
pub fn insert(conn: &Connection, new: &NewExpense) -> AppResult<()> {
    let created_at = Utc::now().timestamp_millis();

    conn.execute(
        "INSERT INTO expenses (title, amount, category, paid, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![new.title, new.amount, new.category, new.paid, created_at],
    )?;

    Ok(())
}

/// 支出の全件一覧を取得する（作成時刻の降順）
///
/// # 引数
/// * `conn` - データベース接続
///
/// # 戻り値
/// 支出のリスト（0件の場合は空のリスト）、または失敗時はエラー
pub fn list_all(conn: &Connection) -> AppResult<Vec<Expense>> {
    let mut stmt = conn.prepare(
        "SELECT id, title, amount, category, paid, created_at
         FROM expenses ORDER BY created_at DESC",
    )?;

    let expenses = stmt.query_map([], |row| {
        Ok(Expense {
            id: row.get(0)?,
            title: row.get(1)?,
            amount: row.get(2)?,
            category: row.get(3)?,
            paid: row.get(4)?,
            created_at: row.get(5)?,
        })
    })?;

    expenses
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| AppError::Database(e.to_string()))
}

/// IDで支出を取得する
///
/// # 引数
/// * `conn` - データベース接続
/// * `id` - 支出ID
///
/// # 戻り値
/// 該当行があればSome、なければNone（不在はエラーにしない）
pub fn find_by_id(conn: &Connection, id: i64) -> AppResult<Option<Expense>> {
    let result = conn.query_row(
        "SELECT id, title, amount, category, paid, created_at
         FROM expenses WHERE id = ?1",
        params![id],
        |row| {
            Ok(Expense {
                id: row.get(0)?,
                title: row.get(1)?,
                amount: row.get(2)?,
                category: row.get(3)?,
                paid: row.get(4)?,
                created_at: row.get(5)?,
            })
        },
    );

    match result {
        Ok(expense) => Ok(Some(expense)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(AppError::Database(e.to_string())),
    }
}

/// 支出を更新する
///
/// # 引数
/// * `conn` - データベース接続
/// * `expense` - 更新後の支出（idは既存行を指している必要がある）
///
/// # 戻り値
/// 成功時はOk(())、対象行が存在しない場合はNotFoundエラー
///
/// 更新対象はtitle、amount、category、paidのみ。
/// idとcreated_atは変更しない
pub fn update(conn: &Connection, expense: &Expense) -> AppResult<()> {
    let affected = conn.execute(
        "UPDATE expenses SET title = ?1, amount = ?2, category = ?3, paid = ?4
         WHERE id = ?5",
        params![
            expense.title,
            expense.amount,
            expense.category,
            expense.paid,
            expense.id
        ],
    )?;

    if affected == 0 {
        return Err(AppError::not_found(format!("ID {} の支出", expense.id)));
    }

    Ok(())
}

/// IDで支出を削除する
///
/// # 引数
/// * `conn` - データベース接続
/// * `id` - 支出ID
///
/// # 戻り値
/// 成功時はOk(())、失敗時はエラー
///
/// 対象行が存在しない場合も成功として扱う（削除は冪等）
pub fn delete_by_id(conn: &Connection, id: i64) -> AppResult<()> {
    conn.execute("DELETE FROM expenses WHERE id = ?1", params![id])?;

    Ok(())
}
