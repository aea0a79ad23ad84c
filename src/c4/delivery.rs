//! Hands rendered PlantUML source to the caller or to a PlantUML server for rasterization.

use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use tracing::{debug, warn};

use crate::errors::DiagramResult;

/// Output format requested by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Puml,
    Png,
    Svg,
}

impl OutputFormat {
    /// `puml` and `svg` are honored; anything else, including no format, means `png`.
    pub fn from_query(format: Option<&str>) -> Self {
        match format {
            Some("puml") => OutputFormat::Puml,
            Some("svg") => OutputFormat::Svg,
            _ => OutputFormat::Png,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OutputFormat::Puml => "puml",
            OutputFormat::Png => "png",
            OutputFormat::Svg => "svg",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            OutputFormat::Puml => "text/plain; charset=utf-8",
            OutputFormat::Png => "image/png",
            OutputFormat::Svg => "image/svg+xml",
        }
    }
}

/// What goes back to the caller.
#[derive(Debug, Clone, PartialEq)]
pub enum Delivered {
    Text(String),
    Image { format: OutputFormat, bytes: Vec<u8> },
}

impl Delivered {
    pub fn content_type(&self) -> &'static str {
        match self {
            Delivered::Text(_) => OutputFormat::Puml.content_type(),
            Delivered::Image { format, .. } => format.content_type(),
        }
    }

    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            Delivered::Text(text) => text.into_bytes(),
            Delivered::Image { bytes, .. } => bytes,
        }
    }
}

#[derive(Clone)]
pub struct PlantUmlClient {
    client: Client,
    server: String,
}

impl PlantUmlClient {
    pub fn new(server: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            server: server.into().trim_end_matches('/').to_string(),
        }
    }

    pub async fn deliver(&self, puml: String, format: OutputFormat) -> DiagramResult<Delivered> {
        if format == OutputFormat::Puml {
            return Ok(Delivered::Text(puml));
        }

        let bytes = self.rasterize(puml, format).await?;
        Ok(Delivered::Image { format, bytes })
    }

    /// Returns the server's response body whatever its status: PlantUML answers
    /// syntax errors with an error image, which is what the caller should see.
    async fn rasterize(&self, puml: String, format: OutputFormat) -> DiagramResult<Vec<u8>> {
        let url = format!("{}/{}", self.server, format.as_str());
        debug!("Forwarding {} bytes of PlantUML to {}", puml.len(), url);

        let response = self
            .client
            .post(&url)
            .header(CONTENT_TYPE, "text/plain; charset=UTF-8")
            .body(puml)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            warn!("PlantUML server {} answered {}", url, status);
        }

        Ok(response.bytes().await?.to_vec())
    }
}
