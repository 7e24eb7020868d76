//! Validation orchestrator: one call takes a stored blueprint through
//! vectorization, symbol detection, text extraction and the rule
//! engine, returning the guideline failures.
//!
//! Every backend is injected at construction; the pipeline holds no
//! ambient global state.

use blueprint_store::{BlueprintStore, StoreError};
use floorplan_model::Layout;
use rule_engine::{Failure, RuleConfig, RuleEngine};
use std::path::PathBuf;
use std::time::Duration;
use symbol_detector::{DetectorConfig, SymbolDetector, SymbolModel};
use text_extractor::{TextExtractor, TextRecognizer};
use tracing::info;
use vectorize_client::{CacheKey, VectorCache, VectorSource, VectorizeClient, VectorizeError};

/// A pipeline run fails with the stage that broke it, so callers can
/// always tell "ran with zero violations" apart from "did not run".
#[derive(Debug)]
pub enum PipelineError {
    /// The requested blueprint is not in the store
    BlueprintNotFound(PathBuf),
    /// Blueprint storage failed for another reason
    Store(StoreError),
    /// The vectorization stage failed (remote service or payload)
    Vectorize(VectorizeError),
    /// The symbol detection stage failed
    Detection(anyhow::Error),
    /// The text extraction stage failed
    Extraction(anyhow::Error),
}

impl std::fmt::Display for PipelineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelineError::BlueprintNotFound(path) => {
                write!(f, "blueprint not found: {}", path.display())
            }
            PipelineError::Store(e) => write!(f, "blueprint storage failed: {}", e),
            PipelineError::Vectorize(e) => write!(f, "vectorization stage failed: {}", e),
            PipelineError::Detection(e) => write!(f, "symbol detection stage failed: {}", e),
            PipelineError::Extraction(e) => write!(f, "text extraction stage failed: {}", e),
        }
    }
}

impl std::error::Error for PipelineError {}

impl From<StoreError> for PipelineError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(path) => PipelineError::BlueprintNotFound(path),
            other => PipelineError::Store(other),
        }
    }
}

impl From<VectorizeError> for PipelineError {
    fn from(err: VectorizeError) -> Self {
        PipelineError::Vectorize(err)
    }
}

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Base URL of the room vectorization service
    pub vectorizer_endpoint: String,
    /// Root of the per-user blueprint directories
    pub data_root: PathBuf,
    /// Timeout for the remote vectorization call
    pub request_timeout: Duration,
    pub detector: DetectorConfig,
    pub rules: RuleConfig,
}

impl PipelineConfig {
    /// Load configuration from the environment.
    /// `VECTORIZER_ENDPOINT` is required; everything else has defaults.
    pub fn from_env() -> anyhow::Result<Self> {
        let vectorizer_endpoint = std::env::var("VECTORIZER_ENDPOINT")
            .map_err(|_| anyhow::anyhow!("VECTORIZER_ENDPOINT is not set"))?;

        let data_root = std::env::var("BLUEPRINT_ROOT")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("uploaded_files"));

        let request_timeout = std::env::var("VECTORIZER_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or_else(|| Duration::from_secs(60));

        let mut detector = DetectorConfig::default();
        if let Some(threshold) = std::env::var("DETECTOR_CONFIDENCE")
            .ok()
            .and_then(|s| s.parse().ok())
        {
            detector.confidence_threshold = threshold;
        }

        let mut rules = RuleConfig::default();
        if let Some(max_area) = std::env::var("MAX_ROOM_AREA")
            .ok()
            .and_then(|s| s.parse().ok())
        {
            rules.max_area = max_area;
        }

        Ok(Self {
            vectorizer_endpoint,
            data_root,
            request_timeout,
            detector,
            rules,
        })
    }
}

pub struct ValidationPipeline<M, R, S, C> {
    store: BlueprintStore,
    vectorizer: VectorizeClient<S, C>,
    detector: SymbolDetector<M>,
    extractor: TextExtractor<R>,
    engine: RuleEngine,
}

impl<M, R, S, C> ValidationPipeline<M, R, S, C>
where
    M: SymbolModel,
    R: TextRecognizer,
    S: VectorSource,
    C: VectorCache,
{
    pub fn new(
        store: BlueprintStore,
        vectorizer: VectorizeClient<S, C>,
        detector: SymbolDetector<M>,
        extractor: TextExtractor<R>,
        engine: RuleEngine,
    ) -> Self {
        Self {
            store,
            vectorizer,
            detector,
            extractor,
            engine,
        }
    }

    /// Validate one stored blueprint and return its guideline failures.
    ///
    /// Stages run strictly in sequence against a single layout: rooms
    /// come back from vectorization, the detector appends symbols, the
    /// extractor appends metadata, and the rule engine reads the result.
    /// There is no automatic retry; that belongs to the calling
    /// workflow.
    pub async fn run_validation(
        &self,
        file_name: &str,
        owner_id: u64,
    ) -> Result<Vec<Failure>, PipelineError> {
        let image_bytes = self.store.read_blueprint(file_name, owner_id)?;

        let key = CacheKey::new(owner_id, file_name);
        let rooms = self.vectorizer.vectorize(&image_bytes, &key).await?;
        let mut layout = Layout::with_rooms(file_name, rooms);

        let detection = self
            .detector
            .annotate(&image_bytes, &mut layout)
            .map_err(PipelineError::Detection)?;

        let extraction = self
            .extractor
            .annotate(&image_bytes, &mut layout)
            .await
            .map_err(PipelineError::Extraction)?;

        let failures = self.engine.validate(&layout);

        info!(
            file = file_name,
            owner = owner_id,
            rooms = layout.rooms().len(),
            symbols_assigned = detection.assigned,
            fragments_assigned = extraction.assigned,
            failures = failures.len(),
            "validation run complete"
        );

        Ok(failures)
    }
}
