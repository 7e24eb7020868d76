//! Detection-model adapter: raw bounding-box detections become typed
//! [`Symbol`]s attached to the rooms they overlap.
//!
//! The model itself is behind a trait so the pipeline does not care
//! whether inference runs locally or the weights are even present.

use floorplan_model::{Category, Layout, Polygon, Symbol};
use std::sync::Arc;
use tracing::{debug, info};

/// One raw detection from the underlying model: corner coordinates,
/// an index into the model's names table, and a confidence score.
#[derive(Debug, Clone)]
pub struct RawDetection {
    /// [x1, y1, x2, y2] in image-pixel coordinates
    pub bbox: [f64; 4],
    pub class_id: usize,
    pub confidence: f32,
}

/// Symbol detection model interface - allows for different backends
pub trait SymbolModel: Send + Sync {
    fn detect(&self, image_bytes: &[u8]) -> anyhow::Result<Vec<RawDetection>>;

    /// The model's class_id -> class name table.
    fn class_names(&self) -> &[String];

    /// Get model info
    fn model_info(&self) -> String;
}

/// Stand-in for when the trained weights are not available.
pub struct StubSymbolModel {
    model_path: String,
    names: Vec<String>,
}

impl StubSymbolModel {
    pub fn new(model_path: impl Into<String>) -> Self {
        Self {
            model_path: model_path.into(),
            names: Vec::new(),
        }
    }
}

impl SymbolModel for StubSymbolModel {
    fn detect(&self, _image_bytes: &[u8]) -> anyhow::Result<Vec<RawDetection>> {
        Err(anyhow::anyhow!(
            "symbol model not available at {}",
            self.model_path
        ))
    }

    fn class_names(&self) -> &[String] {
        &self.names
    }

    fn model_info(&self) -> String {
        format!("stub symbol model (weights expected at {})", self.model_path)
    }
}

impl<M: SymbolModel + ?Sized> SymbolModel for Box<M> {
    fn detect(&self, image_bytes: &[u8]) -> anyhow::Result<Vec<RawDetection>> {
        (**self).detect(image_bytes)
    }

    fn class_names(&self) -> &[String] {
        (**self).class_names()
    }

    fn model_info(&self) -> String {
        (**self).model_info()
    }
}

/// Model that reports no detections. Zero detections are a valid
/// pipeline outcome, so this keeps the rest of the run going when no
/// detector is configured.
pub struct NullSymbolModel {
    names: Vec<String>,
}

impl NullSymbolModel {
    pub fn new() -> Self {
        Self { names: Vec::new() }
    }
}

impl Default for NullSymbolModel {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolModel for NullSymbolModel {
    fn detect(&self, _image_bytes: &[u8]) -> anyhow::Result<Vec<RawDetection>> {
        Ok(Vec::new())
    }

    fn class_names(&self) -> &[String] {
        &self.names
    }

    fn model_info(&self) -> String {
        "null symbol model".to_string()
    }
}

#[derive(Debug, Clone)]
pub struct DetectorConfig {
    /// Confidence threshold (0.0-1.0)
    pub confidence_threshold: f32,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.25,
        }
    }
}

/// Per-run counters, kept for diagnostics; unassigned symbols exist
/// nowhere else.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DetectionSummary {
    pub total: usize,
    pub assigned: usize,
    pub unassigned: usize,
}

pub struct SymbolDetector<M> {
    model: M,
    config: DetectorConfig,
}

impl<M: SymbolModel> SymbolDetector<M> {
    pub fn new(model: M, config: DetectorConfig) -> Self {
        Self { model, config }
    }

    pub fn with_defaults(model: M) -> Self {
        Self::new(model, DetectorConfig::default())
    }

    /// Run the model and append a [`Symbol`] to every room whose polygon
    /// the detection box intersects (containment included). A symbol
    /// matching several rooms is shared as one identity across all of
    /// them. Malformed detections (degenerate boxes) abort the stage.
    pub fn annotate(
        &self,
        image_bytes: &[u8],
        layout: &mut Layout,
    ) -> anyhow::Result<DetectionSummary> {
        let detections = self.model.detect(image_bytes)?;

        if detections.is_empty() {
            info!(model = %self.model.model_info(), "no symbols detected");
            return Ok(DetectionSummary::default());
        }

        let names = self.model.class_names();
        let mut summary = DetectionSummary::default();

        for detection in detections {
            if detection.confidence < self.config.confidence_threshold {
                debug!(
                    confidence = detection.confidence,
                    threshold = self.config.confidence_threshold,
                    "detection below confidence threshold"
                );
                continue;
            }

            let class_name = names.get(detection.class_id).map(String::as_str).unwrap_or("");
            let category = Category::from_class_name(class_name);

            let [x1, y1, x2, y2] = detection.bbox;
            let bbox = Polygon::axis_aligned(x1, y1, x2, y2)?;
            let symbol = Arc::new(Symbol::new(category, bbox)?);

            summary.total += 1;

            let mut matched = false;
            for room in layout.rooms_mut() {
                if room.polygon().intersects(symbol.bbox()) {
                    room.add_symbol(Arc::clone(&symbol));
                    matched = true;
                }
            }

            if matched {
                summary.assigned += 1;
            } else {
                summary.unassigned += 1;
            }
        }

        info!(
            total = summary.total,
            assigned = summary.assigned,
            unassigned = summary.unassigned,
            "symbol detection finished"
        );

        Ok(summary)
    }
}
