use crate::core::{OracleEntry, OracleSource, Storage};
use crate::utils::error::{BotError, Result};
use async_trait::async_trait;
use rand::Rng;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::OnceCell;

pub const ORIGINAL_TEXT_COLUMN: &str = "原文";
pub const MODERN_TEXT_COLUMN: &str = "現代化解籤";

/// 載入後唯讀的籤詩集合，順序即資料檔的列順序
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OracleCorpus {
    entries: Vec<OracleEntry>,
}

impl OracleCorpus {
    pub fn new(entries: Vec<OracleEntry>) -> Self {
        Self { entries }
    }

    /// 從本機 CSV 檔載入
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path).map_err(|e| BotError::DataUnavailable {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_csv_bytes(&data)
    }

    /// 解析 CSV 內容。必須有標題列且包含「原文」與「現代化解籤」，其他欄位忽略。
    pub fn from_csv_bytes(data: &[u8]) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(data);

        let headers = reader
            .headers()
            .map_err(|e| BotError::DataMalformed {
                message: format!("cannot read header row: {}", e),
            })?
            .clone();

        let original_idx = column_index(&headers, ORIGINAL_TEXT_COLUMN)?;
        let modern_idx = column_index(&headers, MODERN_TEXT_COLUMN)?;

        let mut entries = Vec::new();
        for (row, record) in reader.records().enumerate() {
            // 第 1 列是標題
            let line = row + 2;
            let record = record.map_err(|e| BotError::DataMalformed {
                message: format!("row {}: {}", line, e),
            })?;

            let cell = |idx: usize| {
                record
                    .get(idx)
                    .map(|value| value.trim().to_string())
                    .ok_or_else(|| BotError::DataMalformed {
                        message: format!("row {}: missing column #{}", line, idx + 1),
                    })
            };

            entries.push(OracleEntry {
                original_text: cell(original_idx)?,
                modern_text: cell(modern_idx)?,
            });
        }

        if entries.is_empty() {
            return Err(BotError::EmptyCorpus);
        }

        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[OracleEntry] {
        &self.entries
    }
}

fn column_index(headers: &csv::StringRecord, name: &str) -> Result<usize> {
    headers
        .iter()
        .position(|header| header.trim_start_matches('\u{feff}').trim() == name)
        .ok_or_else(|| BotError::DataMalformed {
            message: format!("required column '{}' not found", name),
        })
}

/// 均勻隨機抽一支籤 (取後放回)
pub fn draw_random(corpus: &OracleCorpus) -> Result<&OracleEntry> {
    draw_random_with(corpus, &mut rand::rng())
}

pub fn draw_random_with<'a, R: Rng + ?Sized>(
    corpus: &'a OracleCorpus,
    rng: &mut R,
) -> Result<&'a OracleEntry> {
    if corpus.is_empty() {
        return Err(BotError::EmptyCorpus);
    }
    let index = rng.random_range(0..corpus.len());
    Ok(&corpus.entries[index])
}

/// 延遲載入、只載入一次的籤詩庫。
///
/// 多個請求同時第一次存取時只會讀取一次資料來源，其餘請求等待同一份結果；
/// 載入失敗不會被記住，下一次存取會重試。
pub struct OracleStore<S: Storage> {
    storage: S,
    data_file: String,
    corpus: OnceCell<Arc<OracleCorpus>>,
}

impl<S: Storage> OracleStore<S> {
    pub fn new(storage: S, data_file: impl Into<String>) -> Self {
        Self {
            storage,
            data_file: data_file.into(),
            corpus: OnceCell::new(),
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.corpus.initialized()
    }

    pub async fn corpus(&self) -> Result<Arc<OracleCorpus>> {
        let corpus = self
            .corpus
            .get_or_try_init(|| async {
                tracing::info!("📖 Loading oracle data from: {}", self.data_file);
                let data = self
                    .storage
                    .read_file(&self.data_file)
                    .await
                    .map_err(|e| match e {
                        BotError::DataUnavailable { .. } => e,
                        other => BotError::DataUnavailable {
                            path: self.data_file.clone(),
                            reason: other.to_string(),
                        },
                    })?;

                let corpus = OracleCorpus::from_csv_bytes(&data)?;
                tracing::info!(
                    "✅ Oracle data {} loaded: {} entries",
                    self.data_file,
                    corpus.len()
                );
                Ok::<_, BotError>(Arc::new(corpus))
            })
            .await?;

        Ok(Arc::clone(corpus))
    }

    /// 啟動時預先載入，回傳籤數
    pub async fn preload(&self) -> Result<usize> {
        Ok(self.corpus().await?.len())
    }
}

#[async_trait]
impl<S: Storage> OracleSource for OracleStore<S> {
    async fn draw(&self) -> Result<OracleEntry> {
        let corpus = self.corpus().await?;
        draw_random(&corpus).cloned()
    }
}
