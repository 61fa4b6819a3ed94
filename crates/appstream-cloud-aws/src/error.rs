//! AWS backend error types

use appstream_cloud::CloudError;
use aws_sdk_appstream::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AwsError {
    #[error("No AWS region configured. Set `region` in the provider block or AWS_REGION")]
    MissingRegion,

    #[error("Cloud error: {0}")]
    Cloud(#[from] CloudError),
}

pub type Result<T> = std::result::Result<T, AwsError>;

/// Convert an SDK error into a [`CloudError::Api`], keeping the service
/// error code so the classifiers can match on it.
pub(crate) fn from_sdk_error<E, R>(operation: &'static str, err: SdkError<E, R>) -> CloudError
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
    R: std::fmt::Debug + Send + Sync + 'static,
{
    let code = err.code().map(str::to_string);
    let message = match err.message() {
        Some(message) => message.to_string(),
        None => DisplayErrorContext(&err).to_string(),
    };
    tracing::debug!(operation, code = ?code, %message, "AWS API call failed");
    CloudError::Api {
        operation,
        code,
        message,
    }
}
