//! Local Embedding Backend
//!
//! fastembed-based ONNX inference. Loading a model is expensive, so
//! initialized models live in a process-wide cache keyed by model name;
//! each handle is `Mutex`-guarded because inference takes `&mut`.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, OnceLock};

use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};

use super::{normalize, EmbeddingError, Result, TextEmbedder};

/// Default embedding model
pub const DEFAULT_EMBEDDING_MODEL: &str = "nomic-embed-text-v1.5";

/// Maximum text length for embedding (truncated if longer)
const MAX_TEXT_LENGTH: usize = 8192;

/// Batch size for efficient embedding generation
const BATCH_SIZE: usize = 32;

// ============================================================================
// PROCESS-WIDE MODEL CACHE
// ============================================================================

type ModelHandle = Arc<Mutex<TextEmbedding>>;

static MODEL_CACHE: OnceLock<Mutex<HashMap<String, ModelHandle>>> = OnceLock::new();

/// Get the cache directory for model files
///
/// Honors `FASTEMBED_CACHE_PATH`, then the platform cache directory.
fn cache_dir() -> PathBuf {
    if let Ok(path) = std::env::var("FASTEMBED_CACHE_PATH") {
        return PathBuf::from(path);
    }
    if let Some(dirs) = directories::ProjectDirs::from("dev", "mnemos", "core") {
        return dirs.cache_dir().join("fastembed");
    }
    PathBuf::from(".fastembed_cache")
}

fn resolve_model(name: &str) -> Result<(EmbeddingModel, usize)> {
    match name.trim().to_lowercase().as_str() {
        "nomic-embed-text-v1.5" | "nomic-ai/nomic-embed-text-v1.5" => {
            Ok((EmbeddingModel::NomicEmbedTextV15, 768))
        }
        "all-minilm-l6-v2" => Ok((EmbeddingModel::AllMiniLML6V2, 384)),
        "bge-small-en-v1.5" => Ok((EmbeddingModel::BGESmallENV15, 384)),
        other => Err(EmbeddingError::InvalidInput(format!(
            "unknown embedding model: {other}"
        ))),
    }
}

fn model_handle(name: &str) -> Result<ModelHandle> {
    let cache = MODEL_CACHE.get_or_init(|| Mutex::new(HashMap::new()));
    let mut cache = cache
        .lock()
        .map_err(|e| EmbeddingError::ModelInit(format!("model cache lock poisoned: {e}")))?;

    if let Some(handle) = cache.get(name) {
        return Ok(handle.clone());
    }

    let (kind, _) = resolve_model(name)?;
    let dir = cache_dir();
    if let Err(error) = std::fs::create_dir_all(&dir) {
        tracing::warn!(dir = %dir.display(), %error, "failed to create model cache directory");
    }

    let options = InitOptions::new(kind)
        .with_show_download_progress(false)
        .with_cache_dir(dir);
    let model = TextEmbedding::try_new(options).map_err(|e| {
        EmbeddingError::ModelInit(format!(
            "failed to initialize embedding model {name}: {e}. \
             Ensure ONNX runtime is available and model files can be downloaded."
        ))
    })?;

    let handle = Arc::new(Mutex::new(model));
    cache.insert(name.to_string(), handle.clone());
    Ok(handle)
}

/// Truncate on a char boundary so multi-byte text cannot split
fn clip(text: &str) -> &str {
    if text.len() <= MAX_TEXT_LENGTH {
        return text;
    }
    let mut end = MAX_TEXT_LENGTH;
    while end > 0 && !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

// ============================================================================
// LOCAL EMBEDDER
// ============================================================================

/// fastembed-backed [`TextEmbedder`]
pub struct LocalEmbedder {
    model_name: String,
    dimensions: usize,
    handle: ModelHandle,
}

impl LocalEmbedder {
    /// Load (or reuse) the named model
    ///
    /// `truncate_to` keeps the first N dimensions and re-normalizes, for
    /// models trained with nested representations.
    pub fn new(model_name: &str, truncate_to: Option<usize>) -> Result<Self> {
        let (_, native_dims) = resolve_model(model_name)?;
        let handle = model_handle(model_name)?;
        let dimensions = truncate_to
            .filter(|&d| d > 0)
            .map(|d| d.min(native_dims))
            .unwrap_or(native_dims);
        Ok(Self {
            model_name: model_name.to_string(),
            dimensions,
            handle,
        })
    }

    /// Load the default model
    pub fn default_model() -> Result<Self> {
        Self::new(DEFAULT_EMBEDDING_MODEL, None)
    }

    fn shape(&self, mut vector: Vec<f32>) -> Vec<f32> {
        if vector.len() > self.dimensions {
            vector.truncate(self.dimensions);
        }
        normalize(&mut vector);
        vector
    }
}

impl TextEmbedder for LocalEmbedder {
    fn model_name(&self) -> &str {
        &self.model_name
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        if text.is_empty() {
            return Err(EmbeddingError::InvalidInput(
                "text cannot be empty".to_string(),
            ));
        }

        let mut model = self
            .handle
            .lock()
            .map_err(|e| EmbeddingError::ModelInit(format!("model lock poisoned: {e}")))?;
        let embeddings = model
            .embed(vec![clip(text)], None)
            .map_err(|e| EmbeddingError::EmbeddingFailed(e.to_string()))?;

        embeddings
            .into_iter()
            .next()
            .map(|v| self.shape(v))
            .ok_or_else(|| EmbeddingError::EmbeddingFailed("no embedding generated".to_string()))
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let mut model = self
            .handle
            .lock()
            .map_err(|e| EmbeddingError::ModelInit(format!("model lock poisoned: {e}")))?;

        let mut all = Vec::with_capacity(texts.len());
        for chunk in texts.chunks(BATCH_SIZE) {
            let clipped: Vec<&str> = chunk.iter().map(|t| clip(t)).collect();
            let embeddings = model
                .embed(clipped, None)
                .map_err(|e| EmbeddingError::EmbeddingFailed(e.to_string()))?;
            all.extend(embeddings.into_iter().map(|v| self.shape(v)));
        }
        Ok(all)
    }
}

// ============================================================================
// TESTS
// ============================================================================
