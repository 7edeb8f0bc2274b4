use voe_core::error::CoreError;

use crate::api::ApiError;
use crate::upload::UploadError;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Upload(#[from] UploadError),

    #[error("Account file error: {0}")]
    Io(#[from] std::io::Error),
}
