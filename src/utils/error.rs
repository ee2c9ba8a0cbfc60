use thiserror::Error;

#[derive(Error, Debug)]
pub enum BotError {
    #[error("Oracle data unavailable at '{path}': {reason}")]
    DataUnavailable { path: String, reason: String },

    #[error("Oracle data malformed: {message}")]
    DataMalformed { message: String },

    #[error("Oracle corpus is empty")]
    EmptyCorpus,

    #[error("Webhook signature verification failed")]
    AuthenticationFailure,

    #[error("Webhook body malformed: {message}")]
    BodyMalformed { message: String },

    #[error("Reply send failed with status {status}: {body}")]
    SendFailure { status: u16, body: String },

    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    // value 可能是密鑰，不放進訊息
    #[error("Invalid configuration value for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Data,
    Authentication,
    Request,
    Delivery,
    Configuration,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl BotError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            BotError::DataUnavailable { .. }
            | BotError::DataMalformed { .. }
            | BotError::EmptyCorpus => ErrorCategory::Data,
            BotError::AuthenticationFailure => ErrorCategory::Authentication,
            BotError::BodyMalformed { .. } => ErrorCategory::Request,
            BotError::SendFailure { .. } | BotError::HttpError(_) => ErrorCategory::Delivery,
            BotError::ConfigError { .. }
            | BotError::MissingConfigError { .. }
            | BotError::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
            BotError::IoError(_) => ErrorCategory::System,
        }
    }

    /// 嚴重程度：Critical 代表啟動失敗；Low 只影響單一請求；Medium 只影響單一事件
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            BotError::AuthenticationFailure | BotError::BodyMalformed { .. } => ErrorSeverity::Low,
            BotError::EmptyCorpus | BotError::SendFailure { .. } | BotError::HttpError(_) => {
                ErrorSeverity::Medium
            }
            BotError::IoError(_) => ErrorSeverity::High,
            BotError::DataUnavailable { .. }
            | BotError::DataMalformed { .. }
            | BotError::ConfigError { .. }
            | BotError::MissingConfigError { .. }
            | BotError::InvalidConfigValueError { .. } => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            BotError::DataUnavailable { path, .. } => {
                format!("確認籤詩資料檔 '{}' 存在且可讀取", path)
            }
            BotError::DataMalformed { .. } => {
                "確認資料檔為 CSV 且包含「原文」與「現代化解籤」兩個欄位".to_string()
            }
            BotError::EmptyCorpus => "資料檔至少需要一筆籤詩".to_string(),
            BotError::AuthenticationFailure => {
                "確認 LINE_CHANNEL_SECRET 與 LINE Developers Console 上的設定一致".to_string()
            }
            BotError::BodyMalformed { .. } => "請求內容不是有效的 webhook JSON".to_string(),
            BotError::SendFailure { status, .. } => match status {
                401 | 403 => "確認 LINE_CHANNEL_ACCESS_TOKEN 是否有效".to_string(),
                400 => "reply token 可能已過期或已被使用".to_string(),
                _ => "稍後再試，或檢查 LINE 平台狀態".to_string(),
            },
            BotError::HttpError(_) => "檢查網路連線與 LINE API 位址".to_string(),
            BotError::IoError(_) => "檢查檔案權限與磁碟狀態".to_string(),
            BotError::ConfigError { .. } => "檢查設定檔內容".to_string(),
            BotError::MissingConfigError { field } => {
                format!("請設定 '{}' (環境變數或設定檔)", field)
            }
            BotError::InvalidConfigValueError { field, .. } => {
                format!("請修正 '{}' 的設定值", field)
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Data => format!("籤詩資料載入失敗：{}", self),
            ErrorCategory::Authentication => "簽章驗證失敗".to_string(),
            ErrorCategory::Request => "請求格式錯誤".to_string(),
            ErrorCategory::Delivery => format!("回覆訊息失敗：{}", self),
            ErrorCategory::Configuration => format!("設定錯誤：{}", self),
            ErrorCategory::System => format!("系統錯誤：{}", self),
        }
    }

    /// 依嚴重程度決定結束碼
    pub fn exit_code(&self) -> i32 {
        match self.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }
}

pub type Result<T> = std::result::Result<T, BotError>;
