use std::pin::Pin;

use color_eyre::Result;
use serde::{Deserialize, Serialize};
use strum::Display;
use tokio_stream::Stream;

pub mod fal;
pub use fal::FalQueue;

pub const RESOLUTION: &str = "landscape_4_3";
pub const QUALITY_TOKENS: &[&str] = &["high quality", "ultra-detailed", "4K resolution"];
pub const STYLE_TOKENS: &[&str] = &["photorealistic"];
pub const NUM_INFERENCE_STEPS: u32 = 50;

#[derive(Debug, Clone, Copy, Display, clap::ValueEnum, PartialEq, Eq, Default)]
#[strum(serialize_all = "kebab-case")]
pub enum Model {
    #[default]
    FluxPro,
    FluxDev,
    FluxSchnell,
}

impl Model {
    pub fn app_id(&self) -> &'static str {
        match self {
            Model::FluxPro => "fal-ai/flux-pro",
            Model::FluxDev => "fal-ai/flux/dev",
            Model::FluxSchnell => "fal-ai/flux/schnell",
        }
    }
}

/// One generation job: the prompt plus the fixed parameter set, serialized
/// verbatim as the submit body.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationRequest {
    pub prompt: String,
    pub resolution: &'static str,
    pub quality_tokens: &'static [&'static str],
    pub style_tokens: &'static [&'static str],
    pub num_inference_steps: u32,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            resolution: RESOLUTION,
            quality_tokens: QUALITY_TOKENS,
            style_tokens: STYLE_TOKENS,
            num_inference_steps: NUM_INFERENCE_STEPS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub message: String,
    pub level: Option<String>,
    pub source: Option<String>,
    pub timestamp: Option<String>,
}

impl LogEntry {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            level: None,
            source: None,
            timestamp: None,
        }
    }
}

/// The final job payload. `images` is typed for the download step; everything
/// else the service sends is kept verbatim in `extra` so storing or printing
/// the result reproduces the full payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationResult {
    #[serde(default)]
    pub images: Vec<ImageInfo>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl GenerationResult {
    pub fn first_image_url(&self) -> Option<&str> {
        self.images.first().map(|image| image.url.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageInfo {
    pub url: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// What a submitted job emits: zero or more Queued/InProgress events followed
/// by exactly one Completed. Each InProgress carries the cumulative log list;
/// consumers track how much of it they have already seen.
#[derive(Debug)]
pub enum JobEvent {
    Queued { position: Option<u64> },
    InProgress { logs: Vec<LogEntry> },
    Completed(GenerationResult),
}

pub type JobStream<'a> = Pin<Box<dyn Stream<Item = Result<JobEvent>> + Send + 'a>>;

pub trait GenerationService {
    fn submit(&self, request: GenerationRequest) -> JobStream<'_>;
}
