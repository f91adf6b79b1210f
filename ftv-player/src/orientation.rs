//! Orientation lookup
//!
//! When an item starts playing the front-end switches to a portrait frame
//! for vertical videos. Dimensions come from the oEmbed endpoint.

use crate::error::Result;
use crate::player::ItemId;
use async_trait::async_trait;
use ftv_common::events::Orientation;
use serde::Deserialize;
use tracing::debug;

const OEMBED_URL: &str = "https://www.youtube.com/oembed";
const WATCH_URL: &str = "http://www.youtube.com/watch?v=";

/// Looks up the orientation of a playlist entry
#[async_trait]
pub trait OrientationProbe: Send + Sync {
    async fn probe(&self, item: &ItemId) -> Result<Orientation>;
}

#[derive(Debug, Deserialize)]
struct OEmbedDimensions {
    width: u32,
    height: u32,
}

/// oEmbed-backed probe
pub struct OEmbedProbe {
    client: reqwest::Client,
    endpoint: String,
}

impl OEmbedProbe {
    pub fn new() -> Result<Self> {
        Self::with_endpoint(OEMBED_URL)
    }

    /// Probe against a different oEmbed endpoint
    pub fn with_endpoint(endpoint: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("friday-tv/", env!("CARGO_PKG_VERSION")))
            .timeout(std::time::Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
        })
    }
}

#[async_trait]
impl OrientationProbe for OEmbedProbe {
    async fn probe(&self, item: &ItemId) -> Result<Orientation> {
        let watch_url = format!("{}{}", WATCH_URL, item);
        debug!("Fetching oEmbed dimensions for {}", item);

        let dimensions: OEmbedDimensions = self
            .client
            .get(&self.endpoint)
            .query(&[("url", watch_url.as_str()), ("format", "json")])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(Orientation::from_dimensions(dimensions.width, dimensions.height))
    }
}
