use alloy::providers::{Provider, ProviderBuilder};

pub trait StringExt {
    fn to_alloy_provider(&self) -> crate::Result<impl Provider>;
}

impl StringExt for str {
    fn to_alloy_provider(&self) -> crate::Result<impl Provider> {
        self.parse()
            .map_err(|e| crate::Error::UrlParsingFailed(self.to_string(), e))
            .map(|rpc_url| ProviderBuilder::new().connect_http(rpc_url))
    }
}

impl StringExt for String {
    fn to_alloy_provider(&self) -> crate::Result<impl Provider> {
        self.as_str().to_alloy_provider()
    }
}
