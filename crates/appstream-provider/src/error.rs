//! Provider error types

use appstream_cloud::CloudError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Invalid provider configuration: {0}")]
    InvalidConfig(String),

    #[error("Logging already initialized: {0}")]
    Logging(String),

    #[error("State encoding error: {0}")]
    State(#[from] serde_json::Error),

    #[error("Cloud error: {0}")]
    Cloud(#[from] CloudError),

    #[cfg(feature = "aws")]
    #[error("AWS error: {0}")]
    Aws(#[from] appstream_cloud_aws::AwsError),
}

pub type Result<T> = std::result::Result<T, ProviderError>;
