use std::path::PathBuf;

use url::Url;

use crate::{
    reqwest::{ReqwestErrorContext, ReqwestInnerError, ReqwestStage},
    rpc::ErrorObj,
};

pub type Result<T> = std::result::Result<T, UtilsError>;

#[derive(Debug, thiserror::Error)]
pub enum UtilsError {
    #[error("'{0}' is neither a valid Ethereum address nor an ENS name.")]
    InvalidIdentity(String),

    #[error("ENS name '{0}' does not resolve to an address.")]
    NameNotResolved(String),

    #[error("Failed to resolve ENS name '{name}'. (Error: {source})")]
    ResolutionFailed {
        name: String,
        source: Box<UtilsError>,
    },

    #[error("Balance provider request failed. (Error: {0})")]
    Provider(Box<UtilsError>),

    #[error("Metadata lookup failed for {contract}. (Error: {source})")]
    MetadataLookup {
        contract: String,
        source: Box<UtilsError>,
    },

    #[error("Failed to load price cache from {0}. (Error: {1})")]
    CacheLoad(PathBuf, Box<UtilsError>),

    #[error("Top token refresh failed. (Error: {0})")]
    RefreshFailed(Box<UtilsError>),

    #[error("ENS contract call failed. (Error: {0})")]
    EnsCall(String),

    #[error("JSON-RPC method '{method}' returned error {code}: {message}", code = error.code, message = error.message)]
    RpcError { method: String, error: ErrorObj },

    #[error("JSON-RPC method '{0}' returned neither result nor error.")]
    RpcEmptyResponse(String),

    #[error("Failed to read the file: {0}. (Error: {1:?})")]
    FileReadFailed(PathBuf, std::io::Error),

    #[error("Failed to write to the file: {0}. (Error: {1:?})")]
    FileWriteFailed(PathBuf, std::io::Error),

    #[error("Failed to create directory: {0:?}. (Error: {1:?})")]
    CreateDirAllFailed(PathBuf, std::io::Error),

    #[error("Parsing the json file failed: {0}. (Error: {1})")]
    JsonParsingFailed(PathBuf, serde_json::Error),

    #[error("Formatting to json failed. (Error: {0})")]
    JsonFormattingFailed(serde_json::Error),

    #[error("Failed to parse URL: {0}. (Error: {1:?})")]
    UrlParsingFailed(String, url::ParseError),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Please check your internet connection, the URL seems to be unreachable: {0}")]
    Internet(Url),

    #[error("Request to {0} timed out.")]
    Timeout(Url),

    #[error("Call timed out after {0:?}.")]
    CallTimeout(std::time::Duration),

    #[error("Request '{url}' failed at stage '{stage:?}' (Error='{inner:?}', Context='{context:?}')", url = context.url)]
    ReqwestFailed {
        stage: ReqwestStage,
        context: Box<ReqwestErrorContext>,
        inner: ReqwestInnerError,
    },

    #[error("Reqwest builder missing error context, this is a bug please report it.")]
    ReqwestErrorContextMissing,

    #[error("Failed to initialise logging. (Error: {0})")]
    LogInitFailed(String),
}

impl UtilsError {
    pub fn is_connect(&self) -> bool {
        match self {
            Self::Internet(_) => true,
            Self::ReqwestFailed { inner, .. } => inner.is_connect(),
            Self::Provider(inner) | Self::RefreshFailed(inner) => inner.is_connect(),
            _ => false,
        }
    }

    /// Errors caused by what the caller asked for rather than by an upstream.
    pub fn is_user_error(&self) -> bool {
        matches!(self, Self::InvalidIdentity(_) | Self::NameNotResolved(_))
    }

    pub fn provider(error: UtilsError) -> Self {
        match error {
            Self::Provider(_) => error,
            other => Self::Provider(Box::new(other)),
        }
    }
}
