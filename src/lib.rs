pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::{cli::LocalStorage, toml_config::TomlConfig};

#[cfg(feature = "lambda")]
pub use config::lambda::{LambdaConfig, S3Storage};

pub use adapters::line_client::LineMessagingClient;
pub use core::{
    dispatch::Dispatcher,
    oracle::{OracleCorpus, OracleStore},
    signature::ChannelSecretVerifier,
};
pub use utils::error::{BotError, Result};
