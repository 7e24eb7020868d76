//! OCR adapter: recognized text fragments become room labels and
//! parsed dimensions, attached to the room that contains them.

mod dimensions;
mod textract;

pub use dimensions::{is_dimension, parse_dimension_text, parse_feet_inches, DimensionParseError};
pub use textract::TextractRecognizer;

use floorplan_model::{Dimension, Label, Layout, Metadata, Point};
use std::future::Future;
use tracing::{info, warn};

/// One recognized text fragment with its bounding quadrilateral, in
/// image-pixel coordinates.
#[derive(Debug, Clone)]
pub struct TextFragment {
    pub quad: [Point; 4],
    pub text: String,
    pub confidence: f32,
}

impl TextFragment {
    /// Straight vertex average; good enough for the 4-point quads the
    /// OCR engine emits.
    pub fn centroid(&self) -> Point {
        let (sx, sy) = self
            .quad
            .iter()
            .fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
        Point::new(sx / 4.0, sy / 4.0)
    }
}

/// Text recognition backend interface.
pub trait TextRecognizer: Send + Sync {
    fn recognize(
        &self,
        image_bytes: &[u8],
    ) -> impl Future<Output = anyhow::Result<Vec<TextFragment>>> + Send;
}

/// Per-run counters for the extraction pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractionSummary {
    pub fragments: usize,
    pub assigned: usize,
    pub unassigned: usize,
    /// Fragments that looked like dimensions but would not parse
    pub skipped: usize,
}

pub struct TextExtractor<R> {
    recognizer: R,
}

impl<R: TextRecognizer> TextExtractor<R> {
    pub fn new(recognizer: R) -> Self {
        Self { recognizer }
    }

    /// Run OCR and attach each fragment to the first room whose polygon
    /// contains the fragment's centroid, or to the layout itself when no
    /// room claims it. A fragment that matches the dimension shape but
    /// fails numeric parsing is logged and skipped; the pass never
    /// aborts over a single fragment.
    pub async fn annotate(
        &self,
        image_bytes: &[u8],
        layout: &mut Layout,
    ) -> anyhow::Result<ExtractionSummary> {
        let fragments = self.recognizer.recognize(image_bytes).await?;

        let mut summary = ExtractionSummary::default();

        for fragment in &fragments {
            summary.fragments += 1;

            let metadata = if is_dimension(&fragment.text) {
                match parse_dimension_text(&fragment.text) {
                    Ok((width, height)) => Metadata::Dimension(Dimension { width, height }),
                    Err(e) => {
                        warn!(error = %e, "skipping unparseable dimension fragment");
                        summary.skipped += 1;
                        continue;
                    }
                }
            } else {
                Metadata::Label(Label {
                    text: fragment.text.clone(),
                })
            };

            let centroid = fragment.centroid();
            match layout
                .rooms_mut()
                .iter_mut()
                .find(|room| room.polygon().contains(&centroid))
            {
                Some(room) => {
                    room.add_metadata(metadata);
                    summary.assigned += 1;
                }
                None => {
                    layout.add_metadata(metadata);
                    summary.unassigned += 1;
                }
            }
        }

        info!(
            fragments = summary.fragments,
            assigned = summary.assigned,
            unassigned = summary.unassigned,
            skipped = summary.skipped,
            "text extraction finished"
        );

        Ok(summary)
    }
}
