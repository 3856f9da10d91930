use std::env;
use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};

const DEFAULT_API_URL: &str = "https://tsheet.example.com";
const API_URL_ENV: &str = "TSHEET_API_URL";
const API_TOKEN_ENV: &str = "TSHEET_API_TOKEN";

/// APIへの接続設定。
///
/// bearerトークンは環境変数`TSHEET_API_TOKEN`か、設定ディレクトリ配下のtokenファイルから読み込む。
#[derive(Clone, Debug)]
pub struct Config {
    pub api_url: String,
    pub api_token: String,
}

impl Config {
    /// 環境変数と設定ファイルから`Config`を組み立てる。
    ///
    /// 環境変数にトークンが無い場合はtokenファイルへフォールバックし、
    /// どちらにも無い場合はエラーを返す。
    pub fn load() -> Result<Self> {
        let api_url = env::var(API_URL_ENV).unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        let api_token = match env::var(API_TOKEN_ENV) {
            Ok(token) if !token.trim().is_empty() => token.trim().to_string(),
            _ => read_token_file()?,
        };

        Ok(Self { api_url, api_token })
    }
}

/// tokenファイルのパスを返す。
fn token_file_path() -> Result<PathBuf> {
    let config_dir = dirs::config_dir().context("Failed to resolve the user config directory")?;
    Ok(config_dir.join("tsheet").join("token"))
}

// tokenファイルからトークンを読み込む。
fn read_token_file() -> Result<String> {
    let path = token_file_path()?;
    let token = fs::read_to_string(&path).with_context(|| {
        format!(
            "Failed to read API token: set {} or put the token in {}",
            API_TOKEN_ENV,
            path.display()
        )
    })?;

    let token = token.trim().to_string();
    if token.is_empty() {
        bail!("API token file is empty: {}", path.display());
    }
    Ok(token)
}
