use crate::core::Storage;
use crate::utils::error::Result;
use std::path::Path;

/// 從本機檔案系統讀取資料檔；相對路徑以 `base_path` 為基準
#[derive(Debug, Clone)]
pub struct LocalStorage {
    base_path: String,
}

impl LocalStorage {
    pub fn new(base_path: impl Into<String>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }
}

impl Storage for LocalStorage {
    async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        let full_path = Path::new(&self.base_path).join(path);
        tracing::debug!("Reading file: {}", full_path.display());
        let data = tokio::fs::read(full_path).await?;
        Ok(data)
    }
}
