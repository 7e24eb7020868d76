//! AWS Textract backend for the [`TextRecognizer`] trait.

use crate::{TextFragment, TextRecognizer};
use anyhow::Context;
use aws_sdk_textract::primitives::Blob;
use aws_sdk_textract::types::{BlockType, Document, Geometry};
use aws_sdk_textract::Client;
use floorplan_model::Point;
use image::GenericImageView;
use tracing::debug;

pub struct TextractRecognizer {
    client: Client,
}

impl TextractRecognizer {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Build a client from the default AWS credential chain.
    pub async fn from_env() -> Self {
        let config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        Self {
            client: Client::new(&config),
        }
    }
}

impl TextRecognizer for TextractRecognizer {
    async fn recognize(&self, image_bytes: &[u8]) -> anyhow::Result<Vec<TextFragment>> {
        // Textract geometry is normalized to the page; we need pixel
        // dimensions to land fragments on room polygons.
        let (width, height) = image::load_from_memory(image_bytes)
            .context("image is not decodable for OCR")?
            .dimensions();

        let document = Document::builder()
            .bytes(Blob::new(image_bytes.to_vec()))
            .build();

        let response = self
            .client
            .detect_document_text()
            .document(document)
            .send()
            .await
            .context("Textract DetectDocumentText failed")?;

        let mut fragments = Vec::new();
        for block in response.blocks() {
            if !matches!(block.block_type(), Some(BlockType::Line)) {
                continue;
            }
            let Some(text) = block.text() else { continue };
            let Some(geometry) = block.geometry() else { continue };
            let Some(quad) = quad_from_geometry(geometry, f64::from(width), f64::from(height))
            else {
                continue;
            };
            fragments.push(TextFragment {
                quad,
                text: text.to_string(),
                confidence: block.confidence().unwrap_or(0.0),
            });
        }

        debug!(fragments = fragments.len(), "textract returned line blocks");
        Ok(fragments)
    }
}

fn quad_from_geometry(geometry: &Geometry, width: f64, height: f64) -> Option<[Point; 4]> {
    let polygon = geometry.polygon();
    if polygon.len() >= 4 {
        let scaled: Vec<Point> = polygon[..4]
            .iter()
            .map(|p| Point::new(f64::from(p.x()) * width, f64::from(p.y()) * height))
            .collect();
        return Some([scaled[0], scaled[1], scaled[2], scaled[3]]);
    }

    // Fall back to the bounding box when no polygon was returned
    let bbox = geometry.bounding_box()?;
    let left = f64::from(bbox.left()) * width;
    let top = f64::from(bbox.top()) * height;
    let w = f64::from(bbox.width()) * width;
    let h = f64::from(bbox.height()) * height;
    Some([
        Point::new(left, top),
        Point::new(left + w, top),
        Point::new(left + w, top + h),
        Point::new(left, top + h),
    ])
}
