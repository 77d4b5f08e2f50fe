use color_eyre::{Result, eyre::eyre};
use flux_client::generation::{FalQueue, GenerationRequest, GenerationService, JobEvent, Model};
use tokio::pin;
use tokio_stream::StreamExt;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    pretty_env_logger::init();
    let api_key = std::env::args()
        .nth(1)
        .ok_or(eyre!("Missing api key as first arg"))?;

    let service = FalQueue::new(Model::FluxSchnell, api_key);
    let stream = service.submit(GenerationRequest::new("A futuristic city at sunset"));

    pin!(stream);
    while let Some(event) = stream.try_next().await? {
        match event {
            JobEvent::Queued { position } => println!("In queue, position: {position:?}"),
            JobEvent::InProgress { logs } => {
                for entry in logs {
                    println!("{}", entry.message);
                }
            }
            JobEvent::Completed(result) => {
                println!("{}", serde_json::to_string_pretty(&result)?);
            }
        }
    }
    Ok(())
}
