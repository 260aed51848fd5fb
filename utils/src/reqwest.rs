use std::{fmt::Debug, time::Duration};

use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use url::Url;

use crate::serde::SerdePathError;

/// Upper bound for any outbound call unless the caller overrides it.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug)]
pub enum ReqwestStage {
    Send,
    Status,
    DecodeText,
    Deserialise,
}

const REDACTED: &str = "***";

/// Replaces every occurrence of `secret` in `text`.
pub fn redact(text: &str, secret: &str) -> String {
    if secret.is_empty() {
        return text.to_string();
    }
    text.replace(secret, REDACTED)
}

fn parse_url<U: ToString>(url: U) -> crate::Result<Url> {
    url.to_string()
        .parse::<Url>()
        .map_err(|_| crate::Error::InvalidUrl(url.to_string()))
}

#[derive(Debug)]
#[allow(dead_code)]
pub struct ReqwestErrorContext {
    pub url: Url,
    query: String,
    json_body: String,
}

#[derive(Debug)]
pub enum ReqwestInnerError {
    Reqwest(reqwest::Error),
    SerdePath(SerdePathError),
}

impl ReqwestInnerError {
    pub fn is_connect(&self) -> bool {
        match self {
            Self::Reqwest(err) => err.is_connect(),
            Self::SerdePath(_) => false,
        }
    }
}

pub struct Reqwest {
    builder: RequestBuilder,
    error_context: Option<ReqwestErrorContext>,
}

impl Reqwest {
    pub fn get<U: ToString>(url: U) -> crate::Result<Self> {
        let url = parse_url(url)?;
        let builder = Client::new().get(url.clone());
        Ok(Self::with_context(builder, url))
    }

    pub fn post<U: ToString>(url: U) -> crate::Result<Self> {
        let url = parse_url(url)?;
        let builder = Client::new().post(url.clone());
        Ok(Self::with_context(builder, url))
    }

    fn with_context(builder: RequestBuilder, url: Url) -> Self {
        Self {
            builder: builder
                .header("accept", "application/json")
                .timeout(DEFAULT_TIMEOUT),
            error_context: Some(ReqwestErrorContext {
                url,
                query: String::new(),
                json_body: String::new(),
            }),
        }
    }

    pub fn query<T: serde::Serialize + Debug>(mut self, query: &T) -> Self {
        if let Some(context) = self.error_context.as_mut() {
            context.query = format!("{query:?}");
        }
        self.builder = self.builder.query(query);
        self
    }

    pub fn json_body<T: serde::Serialize + Debug>(mut self, json_body: &T) -> Self {
        if let Some(context) = self.error_context.as_mut() {
            context.json_body = format!("{json_body:?}");
        }
        self.builder = self.builder.json(json_body);
        self
    }

    /// Keeps `secret` (e.g. an API key embedded in the URL path) out of any
    /// error built from this request.
    pub fn redact_url(mut self, secret: &str) -> Self {
        if let Some(context) = self.error_context.as_mut() {
            if let Ok(url) = redact(context.url.as_str(), secret).parse() {
                context.url = url;
            }
        }
        self
    }

    pub fn header(mut self, name: &'static str, value: &str) -> Self {
        self.builder = self.builder.header(name, value);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.builder = self.builder.timeout(timeout);
        self
    }

    async fn receive_text_internal(mut self) -> crate::Result<(String, Box<ReqwestErrorContext>)> {
        let error_context = Box::new(
            self.error_context
                .take()
                .ok_or(crate::Error::ReqwestErrorContextMissing)?,
        );

        let response = match self.builder.send().await {
            Ok(response) => response,
            Err(err) if err.is_connect() => return Err(crate::Error::Internet(error_context.url)),
            Err(err) if err.is_timeout() => return Err(crate::Error::Timeout(error_context.url)),
            Err(err) => {
                return Err(crate::Error::ReqwestFailed {
                    stage: ReqwestStage::Send,
                    context: error_context,
                    inner: ReqwestInnerError::Reqwest(err.without_url()),
                })
            }
        };

        let response = match response.error_for_status() {
            Ok(response) => response,
            Err(err) => {
                return Err(crate::Error::ReqwestFailed {
                    stage: ReqwestStage::Status,
                    context: error_context,
                    inner: ReqwestInnerError::Reqwest(err.without_url()),
                })
            }
        };

        match response.text().await {
            Ok(text) => Ok((text, error_context)),
            Err(err) if err.is_timeout() => Err(crate::Error::Timeout(error_context.url)),
            Err(err) => Err(crate::Error::ReqwestFailed {
                stage: ReqwestStage::DecodeText,
                context: error_context,
                inner: ReqwestInnerError::Reqwest(err.without_url()),
            }),
        }
    }

    pub async fn receive_json<J: Debug + DeserializeOwned>(self) -> crate::Result<J> {
        let (text, error_context) = self.receive_text_internal().await?;

        crate::serde::parse_json(&text).map_err(|err| crate::Error::ReqwestFailed {
            stage: ReqwestStage::Deserialise,
            context: error_context,
            inner: ReqwestInnerError::SerdePath(err),
        })
    }
}
