//! Client for the remote room-vectorization service.
//!
//! Turns a raster blueprint into room polygons: the image is re-encoded
//! as PNG, base64d and POSTed to the service, and the JSON response is
//! un-normalized back into image-pixel coordinates. Raw responses are
//! cached on disk per (owner, file) so a blueprint is vectorized at most
//! once — the remote side runs on billed, ephemeral compute.

use base64::{engine::general_purpose, Engine as _};
use blueprint_store::BlueprintStore;
use floorplan_model::{Point, Polygon, Room};
use serde::Deserialize;
use std::fs;
use std::future::Future;
use std::io::Cursor;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Error types for the vectorization stage
#[derive(Debug)]
pub enum VectorizeError {
    /// The remote service could not be reached, timed out, or refused
    Service(String),
    /// The service answered, but not with a usable payload
    Malformed(String),
    /// The uploaded bytes are not a decodable image
    Image(image::ImageError),
}

impl std::fmt::Display for VectorizeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VectorizeError::Service(msg) => {
                write!(f, "vectorization service unavailable: {}", msg)
            }
            VectorizeError::Malformed(msg) => {
                write!(f, "malformed vectorization response: {}", msg)
            }
            VectorizeError::Image(e) => write!(f, "image decoding failed: {}", e),
        }
    }
}

impl std::error::Error for VectorizeError {}

impl From<image::ImageError> for VectorizeError {
    fn from(err: image::ImageError) -> Self {
        VectorizeError::Image(err)
    }
}

/// Cache key for one vectorization result.
#[derive(Debug, Clone)]
pub struct CacheKey {
    pub owner_id: u64,
    pub file_name: String,
}

impl CacheKey {
    pub fn new(owner_id: u64, file_name: impl Into<String>) -> Self {
        Self {
            owner_id,
            file_name: file_name.into(),
        }
    }
}

/// Raw-payload cache, key -> optional payload. Policy (placement, atomic
/// writes, what counts as a miss) lives behind this trait so it can be
/// tested without touching the pipeline.
pub trait VectorCache: Send + Sync {
    fn get(&self, key: &CacheKey) -> std::io::Result<Option<String>>;
    fn put(&self, key: &CacheKey, payload: &str) -> std::io::Result<()>;
}

/// One JSON file per (owner, file stem) under the blueprint store.
/// Writes go through a temp file and a rename so concurrent readers
/// never observe partial JSON.
pub struct FileVectorCache {
    store: BlueprintStore,
}

impl FileVectorCache {
    pub fn new(store: BlueprintStore) -> Self {
        Self { store }
    }
}

impl VectorCache for FileVectorCache {
    fn get(&self, key: &CacheKey) -> std::io::Result<Option<String>> {
        let path = self.store.vector_cache_path(&key.file_name, key.owner_id);
        if !path.exists() {
            return Ok(None);
        }
        let payload = fs::read_to_string(&path)?;
        if payload.trim().is_empty() {
            // An empty file carries no response; treat it as a miss
            return Ok(None);
        }
        debug!(path = %path.display(), "vectorization cache hit");
        Ok(Some(payload))
    }

    fn put(&self, key: &CacheKey, payload: &str) -> std::io::Result<()> {
        let path = self.store.vector_cache_path(&key.file_name, key.owner_id);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let tmp = path.with_extension(format!("json.{}.tmp", uuid::Uuid::new_v4()));
        fs::write(&tmp, payload)?;
        fs::rename(&tmp, &path)?;
        debug!(path = %path.display(), "cached vectorization response");
        Ok(())
    }
}

/// The remote endpoint itself. Separated from the client so tests can
/// count calls and substitute canned responses.
pub trait VectorSource: Send + Sync {
    /// POST the base64 PNG and return the raw response body.
    fn fetch(&self, image_b64: &str) -> impl Future<Output = anyhow::Result<String>> + Send;
}

pub struct HttpVectorSource {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpVectorSource {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }
}

impl VectorSource for HttpVectorSource {
    async fn fetch(&self, image_b64: &str) -> anyhow::Result<String> {
        let response = self
            .client
            .post(format!("{}/vectorize", self.endpoint))
            .json(&serde_json::json!({ "input": image_b64 }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!(
                "vectorization endpoint returned {}: {}",
                status,
                error_text
            ));
        }

        Ok(response.text().await?)
    }
}

#[derive(Debug, Deserialize)]
struct VectorizeResponse {
    rooms: Vec<RawRoom>,
    scale_factor: f64,
}

#[derive(Debug, Deserialize)]
struct RawRoom {
    room_junctions: Vec<RawJunction>,
}

#[derive(Debug, Deserialize)]
struct RawJunction {
    x: f64,
    y: f64,
}

/// Parse a raw service response into bare rooms, dividing every
/// junction by the response's scale factor to recover pixel
/// coordinates.
pub fn parse_response(body: &str) -> Result<Vec<Room>, VectorizeError> {
    let response: VectorizeResponse = serde_json::from_str(body)
        .map_err(|e| VectorizeError::Malformed(e.to_string()))?;

    if !response.scale_factor.is_finite() || response.scale_factor <= 0.0 {
        return Err(VectorizeError::Malformed(format!(
            "unusable scale factor {}",
            response.scale_factor
        )));
    }

    let mut rooms = Vec::with_capacity(response.rooms.len());
    for raw in &response.rooms {
        let junctions: Vec<Point> = raw
            .room_junctions
            .iter()
            .map(|j| Point::new(j.x, j.y).unscale(response.scale_factor))
            .collect();
        let polygon = Polygon::new(junctions)
            .map_err(|e| VectorizeError::Malformed(e.to_string()))?;
        rooms.push(Room::new(polygon));
    }
    Ok(rooms)
}

fn encode_png_base64(image_bytes: &[u8]) -> Result<String, VectorizeError> {
    let img = image::load_from_memory(image_bytes)?;
    let mut png = Vec::new();
    img.write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)?;
    Ok(general_purpose::STANDARD.encode(&png))
}

pub struct VectorizeClient<S, C> {
    source: S,
    cache: C,
}

impl<S: VectorSource, C: VectorCache> VectorizeClient<S, C> {
    pub fn new(source: S, cache: C) -> Self {
        Self { source, cache }
    }

    /// Recover the room polygons for a blueprint, consulting the cache
    /// before the remote service. An empty room list is a valid outcome
    /// and propagates as such; it is the rule engine's job to flag it.
    pub async fn vectorize(
        &self,
        image_bytes: &[u8],
        key: &CacheKey,
    ) -> Result<Vec<Room>, VectorizeError> {
        match self.cache.get(key) {
            Ok(Some(cached)) => match parse_response(&cached) {
                Ok(rooms) => {
                    info!(
                        file = %key.file_name,
                        rooms = rooms.len(),
                        "vectorization served from cache"
                    );
                    return Ok(rooms);
                }
                Err(e) => {
                    warn!(file = %key.file_name, error = %e, "stale cache entry, refetching");
                }
            },
            Ok(None) => {}
            Err(e) => {
                warn!(file = %key.file_name, error = %e, "cache read failed, refetching");
            }
        }

        let image_b64 = encode_png_base64(image_bytes)?;
        let body = self
            .source
            .fetch(&image_b64)
            .await
            .map_err(|e| VectorizeError::Service(e.to_string()))?;

        let rooms = parse_response(&body)?;

        // Cache only well-formed, non-empty responses; a failure written
        // to disk would shadow every later attempt.
        if rooms.is_empty() {
            info!(file = %key.file_name, "service found no rooms");
        } else if let Err(e) = self.cache.put(key, &body) {
            warn!(file = %key.file_name, error = %e, "failed to cache vectorization response");
        }

        Ok(rooms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const EPS: f64 = 1e-9;

    fn sample_body() -> String {
        serde_json::json!({
            "rooms": [
                { "room_junctions": [
                    { "x": 0.0, "y": 0.0 },
                    { "x": 256.0, "y": 0.0 },
                    { "x": 256.0, "y": 256.0 },
                    { "x": 0.0, "y": 256.0 }
                ]}
            ],
            "scale_factor": 0.512
        })
        .to_string()
    }

    fn tiny_png() -> Vec<u8> {
        let img = image::DynamicImage::new_rgb8(4, 4);
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
            .unwrap();
        buf
    }

    struct CannedSource {
        body: String,
        calls: AtomicUsize,
    }

    impl CannedSource {
        fn new(body: String) -> Self {
            Self {
                body,
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl VectorSource for CannedSource {
        async fn fetch(&self, _image_b64: &str) -> anyhow::Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.body.clone())
        }
    }

    /// Cache that never stores anything.
    struct NoCache;

    impl VectorCache for NoCache {
        fn get(&self, _key: &CacheKey) -> std::io::Result<Option<String>> {
            Ok(None)
        }
        fn put(&self, _key: &CacheKey, _payload: &str) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn parse_divides_by_scale_factor() {
        let rooms = parse_response(&sample_body()).unwrap();
        assert_eq!(rooms.len(), 1);
        let points = rooms[0].polygon().points().to_vec();
        assert!((points[1].x - 500.0).abs() < EPS);
        assert!((points[2].y - 500.0).abs() < EPS);
    }

    #[test]
    fn parse_rejects_non_json() {
        let err = parse_response("<html>502 Bad Gateway</html>").unwrap_err();
        assert!(matches!(err, VectorizeError::Malformed(_)));
    }

    #[test]
    fn parse_rejects_zero_scale_factor() {
        let body = r#"{"rooms": [], "scale_factor": 0.0}"#;
        assert!(matches!(
            parse_response(body),
            Err(VectorizeError::Malformed(_))
        ));
    }

    #[test]
    fn parse_rejects_short_junction_list() {
        let body = serde_json::json!({
            "rooms": [ { "room_junctions": [ { "x": 1.0, "y": 1.0 } ] } ],
            "scale_factor": 1.0
        })
        .to_string();
        assert!(matches!(
            parse_response(&body),
            Err(VectorizeError::Malformed(_))
        ));
    }

    #[test]
    fn empty_room_list_is_not_an_error() {
        let body = r#"{"rooms": [], "scale_factor": 1.0}"#;
        let rooms = parse_response(body).unwrap();
        assert!(rooms.is_empty());
    }

    #[tokio::test]
    async fn second_call_is_served_from_cache() {
        let root = std::env::temp_dir().join(format!("vec-cache-{}", uuid::Uuid::new_v4()));
        let cache = FileVectorCache::new(BlueprintStore::new(&root));
        let source = CannedSource::new(sample_body());
        let client = VectorizeClient::new(source, cache);
        let key = CacheKey::new(9, "plan.png");
        let png = tiny_png();

        let first = client.vectorize(&png, &key).await.unwrap();
        let second = client.vectorize(&png, &key).await.unwrap();

        assert_eq!(first.len(), 1);
        assert_eq!(second.len(), 1);
        // Exactly one remote call; the second run read the cache file
        assert_eq!(client.source.calls.load(Ordering::SeqCst), 1);

        fs::remove_dir_all(&root).unwrap();
    }

    #[tokio::test]
    async fn empty_responses_are_not_cached() {
        let root = std::env::temp_dir().join(format!("vec-cache-{}", uuid::Uuid::new_v4()));
        let cache = FileVectorCache::new(BlueprintStore::new(&root));
        let source = CannedSource::new(r#"{"rooms": [], "scale_factor": 1.0}"#.to_string());
        let client = VectorizeClient::new(source, cache);
        let key = CacheKey::new(9, "plan.png");
        let png = tiny_png();

        client.vectorize(&png, &key).await.unwrap();
        client.vectorize(&png, &key).await.unwrap();

        // No cache entry was written, so both calls hit the service
        assert_eq!(client.source.calls.load(Ordering::SeqCst), 2);

        let _ = fs::remove_dir_all(&root);
    }

    #[tokio::test]
    async fn malformed_body_is_a_service_stage_failure() {
        let source = CannedSource::new("not json at all".to_string());
        let client = VectorizeClient::new(source, NoCache);
        let key = CacheKey::new(1, "plan.png");

        let err = client.vectorize(&tiny_png(), &key).await.unwrap_err();
        assert!(matches!(err, VectorizeError::Malformed(_)));
    }

    #[test]
    fn empty_cache_file_is_a_miss() {
        let root = std::env::temp_dir().join(format!("vec-cache-{}", uuid::Uuid::new_v4()));
        let store = BlueprintStore::new(&root);
        let cache = FileVectorCache::new(store.clone());
        let key = CacheKey::new(4, "plan.png");

        let path = store.vector_cache_path("plan.png", 4);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "  \n").unwrap();

        assert!(cache.get(&key).unwrap().is_none());

        fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn cache_round_trips_payload() {
        let root = std::env::temp_dir().join(format!("vec-cache-{}", uuid::Uuid::new_v4()));
        let cache = FileVectorCache::new(BlueprintStore::new(&root));
        let key = CacheKey::new(5, "plan.png");

        assert!(cache.get(&key).unwrap().is_none());
        cache.put(&key, &sample_body()).unwrap();
        assert_eq!(cache.get(&key).unwrap().unwrap(), sample_body());

        fs::remove_dir_all(&root).unwrap();
    }
}
