use crate::asset_store::AssetStore;
use crate::config::{ServerConfig, mask_key};
use crate::download::Downloader;
use crate::error::{GenerationError, GenerationResult};
use crate::inference::{InferenceClient, ReplicateClient};
use crate::io_struct::{GenerateForm, GenerateResponse, GenerationInput};
use std::sync::Arc;
use tokio::sync::Semaphore;

/// Shared, immutable state behind every request.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub store: AssetStore,
    pub downloader: Downloader,
    inference: Arc<dyn InferenceClient>,
    workers: Arc<Semaphore>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("store", &self.store)
            .field("workers", &self.workers.available_permits())
            .finish_non_exhaustive()
    }
}

impl AppState {
    /// State wired to the Replicate API.
    pub fn new(config: ServerConfig) -> anyhow::Result<Self> {
        let token = config.credential().unwrap_or_default().to_string();
        let client = ReplicateClient::new(token, config.replicate_base_url.clone());
        Self::with_inference(config, Arc::new(client))
    }

    pub fn with_inference(
        config: ServerConfig,
        inference: Arc<dyn InferenceClient>,
    ) -> anyhow::Result<Self> {
        if config.inference_workers == 0 {
            anyhow::bail!("inference_workers must be at least 1");
        }
        match config.credential() {
            Some(key) => log::info!("Replicate API key loaded: {}", mask_key(key)),
            None => log::warn!(
                "No Replicate API key configured; generation requests will fail until REPLICATE_API_KEY is set"
            ),
        }
        let store = AssetStore::open(config.upload_dir.clone())?;
        let downloader = Downloader::new(config.download_timeout(), config.max_download_bytes())?;
        let workers = Arc::new(Semaphore::new(config.inference_workers));
        Ok(Self {
            config: Arc::new(config),
            store,
            downloader,
            inference,
            workers,
        })
    }

    /// Runs the provider call on the blocking pool, at most `inference_workers` at once.
    async fn infer(&self, input: GenerationInput) -> GenerationResult<String> {
        let permit = self
            .workers
            .clone()
            .acquire_owned()
            .await
            .map_err(|e| GenerationError::Inference(e.to_string()))?;
        let client = self.inference.clone();
        let model = self.config.model.clone();
        let task = tokio::task::spawn_blocking(move || {
            let _permit = permit;
            client.run(&model, &input)?.into_locator()
        });

        let joined = match self.config.inference_timeout() {
            Some(bound) => tokio::time::timeout(bound, task).await.map_err(|_| {
                GenerationError::Timeout(format!(
                    "inference did not finish within {}s",
                    bound.as_secs()
                ))
            })?,
            None => task.await,
        };
        joined.map_err(|e| GenerationError::Inference(format!("inference worker failed: {}", e)))?
    }

    /// Prompt to stored video: inference, download, persist.
    ///
    /// The credential is checked before the prompt, and both before any
    /// outbound call.
    pub async fn generate(&self, form: &GenerateForm) -> GenerationResult<GenerateResponse> {
        if self.config.credential().is_none() {
            log::error!("No Replicate API key configured");
            return Err(GenerationError::Configuration(
                "Replicate API key not configured. Get one at https://replicate.com/account/api-tokens"
                    .to_string(),
            ));
        }
        let Some(prompt) = form.validated_prompt() else {
            log::warn!("Empty prompt received");
            return Err(GenerationError::Validation("Prompt is required".to_string()));
        };

        log::info!("Starting video generation with {}", self.config.model);
        let locator = self
            .infer(GenerationInput {
                prompt: prompt.to_string(),
            })
            .await?;
        log::info!("Video URL: {}", locator);

        let identifier = self.downloader.persist(&locator, &self.store).await?;
        Ok(GenerateResponse {
            success: true,
            video_url: AssetStore::retrieval_path(&identifier),
            message: format!("Video generated successfully using {}!", self.config.model),
        })
    }
}
