//! Saves a webpage's HTML as-is.

use async_trait::async_trait;
use std::path::Path;

use crate::ports::{ConversionInput, Converter, ConverterError};

/// Downloads the page body and writes it to the output file.
#[derive(Debug, Clone)]
pub struct WebpageHtmlFetcher {
    client: reqwest::Client,
}

impl WebpageHtmlFetcher {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Converter for WebpageHtmlFetcher {
    fn name(&self) -> &str {
        "webpage->html"
    }

    async fn convert(&self, input: &ConversionInput, output: &Path) -> Result<(), ConverterError> {
        let ConversionInput::Url(url) = input else {
            return Err(ConverterError::unsupported_input(self.name(), input));
        };

        let body = self
            .client
            .get(url.clone())
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|e| ConverterError::Fetch(e.to_string()))?
            .bytes()
            .await
            .map_err(|e| ConverterError::Fetch(e.to_string()))?;

        tokio::fs::write(output, &body).await?;
        Ok(())
    }
}
