/// Thumbnail download and conversion
use async_trait::async_trait;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat};
use marquee_core::{ImageFetcher, ImageSize, MarqueeError, Result};
use marquee_federation::FetcherConfig;
use reqwest::{Client, Response};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// Images larger than this are refused before decoding
const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

/// Downloads remote images and stores them as JPEG thumbnails
#[derive(Debug, Clone)]
pub struct HttpImageFetcher {
    client: Client,
    max_bytes: usize,
}

impl HttpImageFetcher {
    /// Create a fetcher sharing the federation client settings
    pub fn new(config: &FetcherConfig) -> marquee_federation::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self {
            client,
            max_bytes: MAX_IMAGE_BYTES,
        })
    }

    /// Refuse bodies larger than `max_bytes`
    pub fn with_max_bytes(mut self, max_bytes: usize) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    /// Read the body chunk by chunk, giving up once it passes the limit
    async fn read_body(&self, url: &str, mut response: Response) -> Result<Vec<u8>> {
        let too_large =
            || MarqueeError::image(format!("{url} is larger than {} bytes", self.max_bytes));

        if let Some(length) = response.content_length() {
            if length > self.max_bytes as u64 {
                return Err(too_large());
            }
        }

        let mut body = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| MarqueeError::Network(e.to_string()))?
        {
            if body.len() + chunk.len() > self.max_bytes {
                return Err(too_large());
            }
            body.extend_from_slice(&chunk);
        }

        Ok(body)
    }
}

fn image_error(e: image::ImageError) -> MarqueeError {
    MarqueeError::image(e.to_string())
}

#[async_trait]
impl ImageFetcher for HttpImageFetcher {
    async fn fetch_image(
        &self,
        url: &str,
        dest_dir: &Path,
        dest_name: &str,
        size: ImageSize,
    ) -> Result<()> {
        debug!(url = %url, "Fetching image");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| MarqueeError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(MarqueeError::image(format!("{url} answered {status}")));
        }

        let bytes = self.read_body(url, response).await?;

        tokio::fs::create_dir_all(dest_dir).await?;
        let path = dest_dir.join(dest_name);

        // Decoding and resizing are CPU bound
        let dir = dest_dir.to_path_buf();
        let target = path.clone();
        tokio::task::spawn_blocking(move || -> Result<()> {
            let source = image::load_from_memory(&bytes).map_err(image_error)?;
            let thumbnail = source.resize_to_fill(size.width, size.height, FilterType::Lanczos3);

            // Written next to the target, then renamed over it
            let mut file = tempfile::Builder::new()
                .prefix(".thumbnail-")
                .suffix(".part")
                .tempfile_in(&dir)?;
            DynamicImage::ImageRgb8(thumbnail.to_rgb8())
                .write_to(file.as_file_mut(), ImageFormat::Jpeg)
                .map_err(image_error)?;
            file.persist(&target).map_err(|e| e.error)?;
            Ok(())
        })
        .await
        .map_err(|e| MarqueeError::Other(format!("thumbnail task failed: {e}")))??;

        debug!(path = %path.display(), "Thumbnail written");
        Ok(())
    }
}
