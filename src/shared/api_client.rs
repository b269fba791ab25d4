/// リモートインポート用HTTPクライアント
///
/// 設定されたエンドポイントからJSON配列を取得するためのクライアント
use crate::shared::config::environment::ImportConfig;
use crate::shared::errors::{AppError, AppResult};
use log::info;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;
use url::Url;

/// インポートクライアント
pub struct ImportClient {
    client: Client,
    config: ImportConfig,
}

impl ImportClient {
    /// 新しいインポートクライアントを作成
    pub fn new() -> AppResult<Self> {
        let config = ImportConfig::from_env();
        Self::with_config(config)
    }

    /// 設定を指定してインポートクライアントを作成
    pub fn with_config(config: ImportConfig) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| AppError::configuration(format!("HTTPクライアント初期化失敗: {e}")))?;

        Ok(Self { client, config })
    }

    /// 設定されたインポート元エンドポイントURLを取得
    pub fn api_url(&self) -> &str {
        &self.config.api_url
    }

    /// 指定URLからJSON配列を取得する
    ///
    /// # 引数
    /// * `url` - 取得先URL
    ///
    /// # 戻り値
    /// デコードされたレコードのリスト、または失敗時はインポートエラー
    ///
    /// リトライは行わない（再実行はユーザー操作に委ねる）
    pub async fn fetch_records<T>(&self, url: &str) -> AppResult<Vec<T>>
    where
        T: DeserializeOwned,
    {
        let parsed =
            Url::parse(url).map_err(|e| AppError::import(format!("不正なURLです: {url} ({e})")))?;

        info!("インポート元からデータを取得します: {parsed}");

        let response = self
            .client
            .get(parsed)
            .send()
            .await
            .map_err(|e| AppError::import(format!("リクエスト送信に失敗しました: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::import(format!(
                "インポート元がエラーを返しました: status={status}"
            )));
        }

        let records = response
            .json::<Vec<T>>()
            .await
            .map_err(|e| AppError::import(format!("レスポンスの解析に失敗しました: {e}")))?;

        info!("{}件のレコードを取得しました", records.len());

        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct DummyRecord {
        #[allow(dead_code)]
        title: Option<String>,
    }

    #[test]
    fn test_client_creation_with_default_config() {
        // デフォルト設定でクライアントが作成できることを確認
        let client = ImportClient::with_config(ImportConfig::default()).unwrap();
        assert!(client.api_url().starts_with("https://"));
    }

    #[tokio::test]
    async fn test_fetch_records_rejects_invalid_url() {
        // 不正なURLはインポートエラーになる
        let client = ImportClient::with_config(ImportConfig::default()).unwrap();
        let result = client.fetch_records::<DummyRecord>("not a url").await;

        assert!(result.is_err());
        assert!(matches!(result.unwrap_err(), AppError::Import(_)));
    }

    #[tokio::test]
    async fn test_fetch_records_unreachable_host() {
        // 到達不能なホストへのリクエストはインポートエラーとして表面化する
        let config = ImportConfig {
            api_url: "http://127.0.0.1:1/expenses".to_string(),
            timeout_seconds: 1,
        };
        let client = ImportClient::with_config(config).unwrap();
        let result = client
            .fetch_records::<DummyRecord>("http://127.0.0.1:1/expenses")
            .await;

        assert!(result.is_err());
        assert!(matches!(result.unwrap_err(), AppError::Import(_)));
    }
}
