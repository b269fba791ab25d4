use crate::features::expenses::models::{
    CreateExpenseDto, Expense, NewExpense, RemoteExpenseDto, UpdateExpenseDto,
};
use crate::features::expenses::repository;
use crate::shared::errors::{AppError, AppResult};
use log::info;
use rusqlite::Connection;

/// 支出サービス
///
/// バリデーション、キャッシュ管理、派生ビュー（検索・カテゴリフィルタ・合計）、
/// インポートの重複排除を担当する状態レイヤー。
/// データベース接続は構築時に明示的に渡される
pub struct ExpenseService {
    conn: Connection,
    /// 最後に成功した全件取得を反映したインメモリキャッシュ
    cache: Vec<Expense>,
    search: String,
    category_filter: String,
}

impl ExpenseService {
    /// 新しい支出サービスを作成
    ///
    /// # 引数
    /// * `conn` - 初期化済みのデータベース接続
    ///
    /// # 戻り値
    /// キャッシュが空の支出サービス（最初のrefreshで充填される）
    pub fn new(conn: Connection) -> Self {
        Self {
            conn,
            cache: Vec::new(),
            search: String::new(),
            category_filter: String::new(),
        }
    }

    /// キャッシュをストレージの内容で置き換える
    ///
    /// # 戻り値
    /// 成功時はOk(())、失敗時はエラー
    ///
    /// 変更系の操作は完了後に必ずこれを呼び出すため、
    /// キャッシュがストレージと乖離するのは変更呼び出し1回分の間だけ
    pub fn refresh(&mut self) -> AppResult<()> {
        self.cache = repository::list_all(&self.conn)?;
        Ok(())
    }

    /// キャッシュ全体を取得する（フィルタ適用前）
    pub fn expenses(&self) -> &[Expense] {
        &self.cache
    }

    /// 検索文字列を設定する
    pub fn set_search(&mut self, search: String) {
        self.search = search;
    }

    /// カテゴリフィルタを設定する
    pub fn set_category_filter(&mut self, category_filter: String) {
        self.category_filter = category_filter;
    }

    /// 支出を追加する
    ///
    /// # 引数
    /// * `dto` - 支出作成用DTO
    ///
    /// # 戻り値
    /// 成功時はOk(())、バリデーション失敗時はストレージに触れずにエラー
    ///
    /// titleとcategoryはトリムされ、paidはデフォルトの1で保存される
    pub fn add(&mut self, dto: CreateExpenseDto) -> AppResult<()> {
        let (title, amount, category) =
            validate_input(&dto.title, &dto.amount, dto.category.as_deref())?;

        repository::insert(
            &self.conn,
            &NewExpense {
                title,
                amount,
                category,
                paid: 1,
            },
        )?;

        self.refresh()
    }

    /// 支出を編集する
    ///
    /// # 引数
    /// * `id` - 編集対象の支出ID
    /// * `dto` - 支出更新用DTO
    ///
    /// # 戻り値
    /// 成功時はOk(())、バリデーション失敗または対象不在時はエラー
    ///
    /// paidは既存の値を維持する
    pub fn edit(&mut self, id: i64, dto: UpdateExpenseDto) -> AppResult<()> {
        let existing = self.cached_by_id(id)?;
        let paid = existing.paid;
        self.apply_update(id, dto, paid)
    }

    /// 支出を削除する
    ///
    /// # 引数
    /// * `id` - 削除対象の支出ID
    ///
    /// # 戻り値
    /// 成功時はOk(())、失敗時はエラー
    ///
    /// 対象が存在しない場合も成功する（削除は冪等）
    pub fn remove(&mut self, id: i64) -> AppResult<()> {
        repository::delete_by_id(&self.conn, id)?;
        self.refresh()
    }

    /// 支払済みフラグを反転する
    ///
    /// # 引数
    /// * `id` - 対象の支出ID
    ///
    /// # 戻り値
    /// 成功時はOk(())、失敗時はエラー
    ///
    /// 編集と同じ経路を通るため、変更しないtitle/amountにも
    /// バリデーションが適用される。インポート由来などで金額が0以下の
    /// 行はフラグ反転もバリデーションで失敗する（現状の挙動を維持）
    pub fn toggle_paid(&mut self, id: i64) -> AppResult<()> {
        let existing = self.cached_by_id(id)?;
        let toggled = if existing.paid == 0 { 1 } else { 0 };
        let dto = UpdateExpenseDto {
            title: existing.title.clone(),
            amount: existing.amount.to_string(),
            category: existing.category.clone(),
        };
        self.apply_update(id, dto, toggled)
    }

    /// 検索・カテゴリフィルタを適用した支出の部分列を導出する
    ///
    /// # 戻り値
    /// フィルタ適用後の支出リスト（キャッシュの順序を維持）
    ///
    /// titleは検索文字列を部分一致（大文字小文字無視）、categoryは
    /// フィルタが空でない場合のみ完全一致（大文字小文字無視）で比較する。
    /// 空のフィルタはカテゴリなしの行も含めてすべてにマッチする。
    /// キャッシュとフィルタから毎回再計算される純粋な関数
    pub fn filtered_view(&self) -> Vec<Expense> {
        let search = self.search.to_lowercase();
        let category_filter = self.category_filter.to_lowercase();

        self.cache
            .iter()
            .filter(|item| {
                let match_title = item.title.to_lowercase().contains(&search);
                let match_category = if category_filter.is_empty() {
                    true
                } else {
                    item.category
                        .as_ref()
                        .map(|c| c.to_lowercase() == category_filter)
                        .unwrap_or(false)
                };
                match_title && match_category
            })
            .cloned()
            .collect()
    }

    /// フィルタ適用後の支出の合計金額を計算する
    ///
    /// # 戻り値
    /// フィルタにマッチした行のamountの合計（キャッシュ全体ではない）
    pub fn total_amount(&self) -> f64 {
        self.filtered_view().iter().map(|e| e.amount).sum()
    }

    /// リモートから取得したレコード群を取り込む
    ///
    /// # 引数
    /// * `records` - 取得済みのレコードのリスト
    ///
    /// # 戻り値
    /// 挿入された件数、または失敗時はエラー
    ///
    /// インポート開始時点の一覧と比較し、title+amountが一致する行が
    /// 既にある要素はスキップする（要素ごとの再照会はしない）。
    /// 手入力と異なりバリデーションは適用されないため、0以下の金額も
    /// そのまま受け入れられる。途中で失敗した場合、それまでに
    /// コミットされた挿入はロールバックされない
    pub fn import_records(&mut self, records: Vec<RemoteExpenseDto>) -> AppResult<usize> {
        let existing = repository::list_all(&self.conn)?;
        let mut inserted = 0usize;

        for record in records {
            let amount = record.resolved_amount();

            let is_duplicate = existing
                .iter()
                .any(|e| e.title == record.title && e.amount == amount);
            if is_duplicate {
                continue;
            }

            repository::insert(
                &self.conn,
                &NewExpense {
                    title: record.title,
                    amount,
                    category: record.category,
                    paid: 1,
                },
            )?;
            inserted += 1;
        }

        self.refresh()?;

        info!("インポート完了: {inserted}件を挿入しました");

        Ok(inserted)
    }

    /// キャッシュからIDで支出を探す
    fn cached_by_id(&self, id: i64) -> AppResult<Expense> {
        self.cache
            .iter()
            .find(|e| e.id == id)
            .cloned()
            .ok_or_else(|| AppError::not_found(format!("ID {id} の支出")))
    }

    /// バリデーション済みの値で行を上書きし、キャッシュを更新する
    fn apply_update(&mut self, id: i64, dto: UpdateExpenseDto, paid: i64) -> AppResult<()> {
        let (title, amount, category) =
            validate_input(&dto.title, &dto.amount, dto.category.as_deref())?;

        let existing = self.cached_by_id(id)?;
        let updated = Expense {
            id,
            title,
            amount,
            category,
            paid,
            created_at: existing.created_at,
        };

        repository::update(&self.conn, &updated)?;
        self.refresh()
    }
}

/// 手入力のバリデーションを行い、正規化済みの値を返す
///
/// # 引数
/// * `title` - タイトル（トリム後に空でないこと）
/// * `amount` - 金額の入力文字列（正の有限数にパースできること）
/// * `category` - カテゴリ（任意、トリム後に空なら未設定扱い）
///
/// # 戻り値
/// (トリム済みtitle, パース済みamount, 正規化済みcategory)、
/// または失敗したフィールドを特定したバリデーションエラー
fn validate_input(
    title: &str,
    amount: &str,
    category: Option<&str>,
) -> AppResult<(String, f64, Option<String>)> {
    let title = title.trim();
    if title.is_empty() {
        return Err(AppError::validation(
            "title",
            "タイトルを入力してください",
        ));
    }

    let amount: f64 = amount
        .trim()
        .parse()
        .map_err(|_| AppError::validation("amount", "金額は数値で入力してください"))?;
    if !amount.is_finite() || amount <= 0.0 {
        return Err(AppError::validation(
            "amount",
            "金額は0より大きい数値で入力してください",
        ));
    }

    let category = category
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(String::from);

    Ok((title.to_string(), amount, category))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::database::connection::{create_tables, seed_sample_expenses};
    use quickcheck_macros::quickcheck;

    /// テスト用のサービスを作成（空のテーブル）
    fn create_test_service() -> ExpenseService {
        let conn = Connection::open_in_memory().unwrap();
        create_tables(&conn).unwrap();
        let mut service = ExpenseService::new(conn);
        service.refresh().unwrap();
        service
    }

    /// テスト用のサービスを作成（サンプル3件投入済み）
    fn create_seeded_service() -> ExpenseService {
        let conn = Connection::open_in_memory().unwrap();
        create_tables(&conn).unwrap();
        seed_sample_expenses(&conn).unwrap();
        let mut service = ExpenseService::new(conn);
        service.refresh().unwrap();
        service
    }

    fn create_dto(title: &str, amount: &str, category: Option<&str>) -> CreateExpenseDto {
        CreateExpenseDto {
            title: title.to_string(),
            amount: amount.to_string(),
            category: category.map(String::from),
        }
    }

    #[test]
    fn test_add_valid_expense() {
        let mut service = create_test_service();
        let before = service.expenses().len();

        service
            .add(create_dto("  Snack  ", "15000", Some("  Ăn uống  ")))
            .unwrap();

        // キャッシュがちょうど1件増える
        let expenses = service.expenses();
        assert_eq!(expenses.len(), before + 1);

        // トリム済みの値とデフォルトのpaid=1で保存される
        let added = &expenses[0];
        assert_eq!(added.title, "Snack");
        assert_eq!(added.amount, 15000.0);
        assert_eq!(added.category, Some("Ăn uống".to_string()));
        assert_eq!(added.paid, 1);
    }

    #[test]
    fn test_add_blank_category_becomes_none() {
        let mut service = create_test_service();

        service.add(create_dto("Snack", "1000", Some("   "))).unwrap();

        assert_eq!(service.expenses()[0].category, None);
    }

    #[test]
    fn test_add_rejects_empty_title() {
        let mut service = create_test_service();

        let result = service.add(create_dto("   ", "10", None));

        match result.unwrap_err() {
            AppError::Validation { field, .. } => assert_eq!(field, "title"),
            other => panic!("想定外のエラー: {other:?}"),
        }

        // キャッシュもストレージも変化しない
        assert!(service.expenses().is_empty());
        service.refresh().unwrap();
        assert!(service.expenses().is_empty());
    }

    #[test]
    fn test_add_rejects_non_positive_amount() {
        let mut service = create_test_service();

        for bad_amount in ["0", "-5", "abc", ""] {
            let result = service.add(create_dto("x", bad_amount, None));
            match result.unwrap_err() {
                AppError::Validation { field, .. } => assert_eq!(field, "amount"),
                other => panic!("想定外のエラー: {other:?}"),
            }
        }

        assert!(service.expenses().is_empty());
    }

    #[test]
    fn test_edit_updates_fields_and_keeps_paid() {
        let mut service = create_test_service();
        service.add(create_dto("Cà phê", "30000", Some("Đồ uống"))).unwrap();
        let id = service.expenses()[0].id;

        service
            .edit(
                id,
                UpdateExpenseDto {
                    title: "Cà phê sữa".to_string(),
                    amount: "35000".to_string(),
                    category: None,
                },
            )
            .unwrap();

        let edited = &service.expenses()[0];
        assert_eq!(edited.title, "Cà phê sữa");
        assert_eq!(edited.amount, 35000.0);
        assert_eq!(edited.category, None);
        assert_eq!(edited.paid, 1);
    }

    #[test]
    fn test_edit_validation_failure_leaves_row_unchanged() {
        let mut service = create_test_service();
        service.add(create_dto("Cà phê", "30000", None)).unwrap();
        let id = service.expenses()[0].id;

        let result = service.edit(
            id,
            UpdateExpenseDto {
                title: "".to_string(),
                amount: "100".to_string(),
                category: None,
            },
        );
        assert!(result.is_err());

        let unchanged = &service.expenses()[0];
        assert_eq!(unchanged.title, "Cà phê");
        assert_eq!(unchanged.amount, 30000.0);
    }

    #[test]
    fn test_edit_unknown_id_fails() {
        let mut service = create_test_service();

        let result = service.edit(
            999,
            UpdateExpenseDto {
                title: "x".to_string(),
                amount: "10".to_string(),
                category: None,
            },
        );

        assert!(matches!(result.unwrap_err(), AppError::NotFound(_)));
    }

    #[test]
    fn test_toggle_paid_twice_restores_original() {
        let mut service = create_test_service();
        service.add(create_dto("Cà phê", "30000", Some("Đồ uống"))).unwrap();
        let original = service.expenses()[0].clone();
        assert_eq!(original.paid, 1);

        // 1回目で0になる
        service.toggle_paid(original.id).unwrap();
        assert_eq!(service.expenses()[0].paid, 0);

        // 2回目で元に戻り、他のフィールドは変わらない
        service.toggle_paid(original.id).unwrap();
        let restored = &service.expenses()[0];
        assert_eq!(restored.paid, 1);
        assert_eq!(restored.title, original.title);
        assert_eq!(restored.amount, original.amount);
        assert_eq!(restored.category, original.category);
        assert_eq!(restored.created_at, original.created_at);
    }

    #[test]
    fn test_toggle_paid_fails_on_invalid_stored_amount() {
        // インポート経由で入った金額0の行は、フラグ反転でも
        // 編集経路のバリデーションに引っかかる（既知の歪みの確認）
        let mut service = create_test_service();
        service
            .import_records(vec![RemoteExpenseDto {
                title: "Free sample".to_string(),
                price: None,
                amount: None,
                category: None,
            }])
            .unwrap();
        let id = service.expenses()[0].id;

        let result = service.toggle_paid(id);
        match result.unwrap_err() {
            AppError::Validation { field, .. } => assert_eq!(field, "amount"),
            other => panic!("想定外のエラー: {other:?}"),
        }
    }

    #[test]
    fn test_remove_is_idempotent() {
        let mut service = create_test_service();
        service.add(create_dto("Cà phê", "30000", None)).unwrap();
        let id = service.expenses()[0].id;

        service.remove(id).unwrap();
        assert!(service.expenses().is_empty());

        // 2回目の削除もエラーにならず、状態も変わらない
        service.remove(id).unwrap();
        assert!(service.expenses().is_empty());
    }

    #[test]
    fn test_filtered_view_defaults_return_all() {
        let service = create_seeded_service();

        // 検索もフィルタも空ならキャッシュ全体がそのままの順序で返る
        let view = service.filtered_view();
        assert_eq!(view.len(), 3);
        assert_eq!(view, service.expenses().to_vec());
    }

    #[test]
    fn test_filtered_view_search_is_case_insensitive() {
        let mut service = create_seeded_service();

        service.set_search("cà".to_string());
        let view = service.filtered_view();
        assert_eq!(view.len(), 1);
        assert_eq!(view[0].title, "Cà phê");

        // 大文字でも同じ結果になる
        service.set_search("CÀ".to_string());
        assert_eq!(service.filtered_view().len(), 1);
    }

    #[test]
    fn test_category_filter_requires_exact_match() {
        let mut service = create_seeded_service();
        service.add(create_dto("No category", "1000", None)).unwrap();

        // カテゴリ完全一致（大文字小文字無視）
        service.set_category_filter("ăn uống".to_string());
        let view = service.filtered_view();
        assert_eq!(view.len(), 1);
        assert_eq!(view[0].title, "Ăn trưa");

        // フィルタ設定中はカテゴリなしの行はマッチしない
        assert!(!view.iter().any(|e| e.category.is_none()));

        // フィルタを空に戻すとカテゴリなしの行も含まれる
        service.set_category_filter(String::new());
        assert_eq!(service.filtered_view().len(), 4);
    }

    #[test]
    fn test_total_amount_scenario() {
        // サンプル3件（30000 / 50000 / 10000、カテゴリはすべて異なる）に
        // Snackを追加し、カテゴリフィルタで2件・合計65000になること
        let mut service = create_seeded_service();

        service
            .add(create_dto("Snack", "15000", Some("Ăn uống")))
            .unwrap();

        service.set_category_filter("Ăn uống".to_string());
        let view = service.filtered_view();
        assert_eq!(view.len(), 2);

        let titles: Vec<&str> = view.iter().map(|e| e.title.as_str()).collect();
        assert!(titles.contains(&"Ăn trưa"));
        assert!(titles.contains(&"Snack"));

        assert_eq!(service.total_amount(), 65000.0);
    }

    #[test]
    fn test_total_amount_zero_when_no_match() {
        let mut service = create_seeded_service();

        service.set_category_filter("存在しないカテゴリ".to_string());
        assert!(service.filtered_view().is_empty());
        assert_eq!(service.total_amount(), 0.0);
    }

    #[test]
    fn test_import_skips_duplicate_title_and_amount() {
        let mut service = create_seeded_service();
        let before = service.expenses().len();

        // 既存行（Cà phê / 30000）と同一のtitle+amountはスキップされる
        let inserted = service
            .import_records(vec![RemoteExpenseDto {
                title: "Cà phê".to_string(),
                price: Some(30000.0),
                amount: None,
                category: Some("Khác".to_string()),
            }])
            .unwrap();

        assert_eq!(inserted, 0);
        assert_eq!(service.expenses().len(), before);
    }

    #[test]
    fn test_import_inserts_new_records() {
        let mut service = create_seeded_service();
        let before = service.expenses().len();

        let inserted = service
            .import_records(vec![
                // 新規: priceが使われる
                RemoteExpenseDto {
                    title: "Bánh mì".to_string(),
                    price: Some(20000.0),
                    amount: Some(99999.0),
                    category: Some("Ăn uống".to_string()),
                },
                // 既存と同じtitleでもamountが違えば挿入される
                RemoteExpenseDto {
                    title: "Cà phê".to_string(),
                    price: Some(25000.0),
                    amount: None,
                    category: None,
                },
            ])
            .unwrap();

        assert_eq!(inserted, 2);
        assert_eq!(service.expenses().len(), before + 2);

        let banh_mi = service
            .expenses()
            .iter()
            .find(|e| e.title == "Bánh mì")
            .unwrap();
        assert_eq!(banh_mi.amount, 20000.0);
        assert_eq!(banh_mi.paid, 1);
    }

    #[test]
    fn test_import_accepts_non_positive_amounts() {
        // 手入力と異なり、リモート由来の0円はそのまま受け入れられる
        let mut service = create_test_service();

        let inserted = service
            .import_records(vec![RemoteExpenseDto {
                title: "Quà tặng".to_string(),
                price: None,
                amount: None,
                category: None,
            }])
            .unwrap();

        assert_eq!(inserted, 1);
        assert_eq!(service.expenses()[0].amount, 0.0);
    }

    #[quickcheck]
    fn prop_total_equals_sum_of_filtered(amounts: Vec<u16>) -> bool {
        let mut service = create_test_service();
        for (i, a) in amounts.iter().enumerate() {
            repository::insert(
                &service.conn,
                &NewExpense {
                    title: format!("item-{i}"),
                    amount: f64::from(*a) + 1.0,
                    category: None,
                    paid: 1,
                },
            )
            .unwrap();
        }
        service.refresh().unwrap();

        // フィルタなしの合計は全行のamountの合計と一致する
        let expected: f64 = amounts.iter().map(|a| f64::from(*a) + 1.0).sum();
        service.total_amount() == expected
    }

    #[quickcheck]
    fn prop_empty_filters_never_drop_rows(titles: Vec<String>) -> bool {
        let mut service = create_test_service();
        for title in &titles {
            repository::insert(
                &service.conn,
                &NewExpense {
                    title: title.clone(),
                    amount: 1.0,
                    category: None,
                    paid: 1,
                },
            )
            .unwrap();
        }
        service.refresh().unwrap();

        // 空の検索・フィルタはどんなタイトルの行も落とさない
        service.filtered_view().len() == titles.len()
    }
}
