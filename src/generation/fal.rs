use std::time::Duration;

use async_stream::try_stream;
use log::debug;

use crate::generation::{GenerationRequest, GenerationService, JobEvent, JobStream, Model};

pub mod queue_api;

const POLL_INTERVAL: Duration = Duration::from_millis(500);

/// [GenerationService] backed by the fal.ai request queue.
#[derive(Clone)]
pub struct FalQueue {
    model: Model,
    api_key: String,
    client: reqwest::Client,
}

impl FalQueue {
    pub fn new(model: Model, api_key: String) -> Self {
        Self {
            model,
            api_key,
            client: reqwest::Client::new(),
        }
    }
}

impl GenerationService for FalQueue {
    fn submit(&self, request: GenerationRequest) -> JobStream<'_> {
        Box::pin(try_stream! {
            let queued =
                queue_api::submit(self.model.app_id(), &request, &self.api_key, &self.client)
                    .await?;
            debug!("Submitted to {}: {queued:#?}", self.model);

            loop {
                let status =
                    queue_api::status(&queued.status_url, &self.api_key, &self.client).await?;

                use queue_api::QueueStatus::*;
                match status.status {
                    InQueue => {
                        yield JobEvent::Queued {
                            position: status.queue_position,
                        };
                    }
                    InProgress => {
                        yield JobEvent::InProgress {
                            logs: status.logs.unwrap_or_default(),
                        };
                    }
                    Completed => {
                        let result =
                            queue_api::fetch_result(&queued.response_url, &self.api_key, &self.client)
                                .await?;
                        yield JobEvent::Completed(result);
                        break;
                    }
                }

                tokio::time::sleep(POLL_INTERVAL).await;
            }
        })
    }
}
