//! The interactive generation flow: resolve the prompt, submit it, relay
//! progress, download the image and append the history row.

use std::{
    io::{Write, stdin, stdout},
    path::PathBuf,
};

use chrono::Local;
use color_eyre::{Result, eyre::bail};
use log::debug;
use tokio::pin;
use tokio_stream::StreamExt;

use crate::{
    DEFAULT_IMAGE_NAME, DEFAULT_PROJECT_NAME, PrompterBox, ServiceBox,
    db::Db,
    download::{self, DownloadError},
    generation::{GenerationRequest, JobEvent, LogEntry},
};

/// Where user answers come from. The real flow reads stdin; tests script the
/// answers instead.
pub trait Prompter {
    fn read_line(&mut self, message: &str) -> Result<String>;
}

pub struct StdinPrompter;

impl Prompter for StdinPrompter {
    fn read_line(&mut self, message: &str) -> Result<String> {
        print!("{message}");
        stdout().flush()?;
        let mut line = String::new();
        stdin().read_line(&mut line)?;
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }
}

/// Tracks how many log entries of a job have been relayed already. Status
/// polls return the cumulative list, so only the tail past `seen` is new.
#[derive(Debug, Default)]
pub struct LogCursor {
    seen: usize,
}

impl LogCursor {
    pub fn fresh<'a>(&mut self, logs: &'a [LogEntry]) -> &'a [LogEntry] {
        let fresh = logs.get(self.seen..).unwrap_or_default();
        self.seen = logs.len();
        fresh
    }
}

pub struct Session {
    pub db: Db,
    pub service: ServiceBox,
    pub prompter: PrompterBox,
    pub http: reqwest::Client,
    pub output_root: PathBuf,
}

impl Session {
    /// Runs one generation. With a template name the prompt comes from the
    /// store and the template name doubles as the default project; otherwise
    /// both are asked for interactively.
    pub async fn run(&mut self, template: Option<&str>) -> Result<()> {
        let (prompt, default_project) = match template {
            Some(name) => match self.db.load_template(name)? {
                Some(content) => (content, name.to_string()),
                None => {
                    println!("No template found with name '{name}'");
                    return Ok(());
                }
            },
            None => {
                let prompt = self
                    .prompter
                    .read_line("Enter your prompt for image generation: ")?;
                (prompt, DEFAULT_PROJECT_NAME.to_string())
            }
        };

        let answer = self
            .prompter
            .read_line(&format!("Enter the project name (default: {default_project}): "))?;
        let project_name = if answer.is_empty() { default_project } else { answer };

        let stream = self.service.submit(GenerationRequest::new(&prompt));
        pin!(stream);

        let mut cursor = LogCursor::default();
        let mut result = None;
        while let Some(event) = stream.try_next().await? {
            match event {
                JobEvent::Queued { position } => debug!("In queue, position: {position:?}"),
                JobEvent::InProgress { logs } => {
                    for entry in cursor.fresh(&logs) {
                        println!("{}", entry.message);
                    }
                }
                JobEvent::Completed(payload) => {
                    result = Some(payload);
                    break;
                }
            }
        }
        let Some(result) = result else {
            bail!("Job stream ended without a result");
        };

        println!("{}", serde_json::to_string_pretty(&result)?);

        // no image descriptor: nothing to download and nothing worth recording
        if let Some(url) = result.first_image_url() {
            let fetched = download::fetch(
                &self.http,
                &self.output_root,
                url,
                &project_name,
                DEFAULT_IMAGE_NAME,
            )
            .await;

            match fetched {
                Ok(path) => println!("Image saved as {}", path.display()),
                Err(DownloadError::Status { status }) => {
                    println!("Failed to download image. Status code: {status}");
                }
                Err(other) => return Err(other.into()),
            }

            let timestamp = Local::now().to_rfc3339();
            let record_id = self.db.insert_prompt(
                &timestamp,
                &prompt,
                &project_name,
                &serde_json::to_value(&result)?,
            )?;
            println!("Prompt data saved with ID: {record_id}");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::{
        collections::VecDeque,
        sync::{
            Arc, Mutex,
            atomic::{AtomicBool, Ordering},
        },
    };

    use chrono::DateTime;
    use color_eyre::eyre::eyre;
    use tempfile::tempdir;

    use super::*;
    use crate::{
        generation::{GenerationResult, GenerationService, JobStream},
        testutil::serve_once,
    };

    struct FakeService {
        events: Mutex<Vec<JobEvent>>,
        submitted: Arc<AtomicBool>,
    }

    impl GenerationService for FakeService {
        fn submit(&self, _request: GenerationRequest) -> JobStream<'_> {
            self.submitted.store(true, Ordering::SeqCst);
            let events = std::mem::take(&mut *self.events.lock().unwrap());
            Box::pin(tokio_stream::iter(events.into_iter().map(Ok)))
        }
    }

    struct ScriptedPrompter {
        answers: VecDeque<String>,
    }

    impl Prompter for ScriptedPrompter {
        fn read_line(&mut self, _message: &str) -> Result<String> {
            self.answers
                .pop_front()
                .ok_or(eyre!("Ran out of scripted answers"))
        }
    }

    fn session(
        events: Vec<JobEvent>,
        answers: &[&str],
        output_root: PathBuf,
    ) -> Result<(Session, Arc<AtomicBool>)> {
        let db = Db::open_in_memory()?;
        db.initialize()?;

        let submitted = Arc::new(AtomicBool::new(false));
        let session = Session {
            db,
            service: Box::new(FakeService {
                events: Mutex::new(events),
                submitted: Arc::clone(&submitted),
            }),
            prompter: Box::new(ScriptedPrompter {
                answers: answers.iter().map(|a| a.to_string()).collect(),
            }),
            http: reqwest::Client::new(),
            output_root,
        };
        Ok((session, submitted))
    }

    fn completed(image_url: &str) -> JobEvent {
        let result: GenerationResult = serde_json::from_value(serde_json::json!({
            "images": [{"url": image_url, "content_type": "image/jpeg"}],
            "seed": 1337,
        }))
        .unwrap();
        JobEvent::Completed(result)
    }

    fn progress(messages: &[&str]) -> JobEvent {
        JobEvent::InProgress {
            logs: messages.iter().map(|m| LogEntry::new(*m)).collect(),
        }
    }

    #[test]
    fn cursor_returns_only_the_unseen_tail() {
        let mut cursor = LogCursor::default();
        let logs = vec![LogEntry::new("a"), LogEntry::new("b")];

        assert_eq!(cursor.fresh(&logs).len(), 2);
        // same cumulative list again: nothing new
        assert_eq!(cursor.fresh(&logs).len(), 0);

        let mut logs = logs;
        logs.push(LogEntry::new("c"));
        let fresh = cursor.fresh(&logs);
        assert_eq!(fresh.len(), 1);
        assert_eq!(fresh[0].message, "c");
    }

    #[test]
    fn cursor_survives_a_shrinking_log_list() {
        let mut cursor = LogCursor::default();
        cursor.fresh(&[LogEntry::new("a"), LogEntry::new("b")]);
        assert_eq!(cursor.fresh(&[LogEntry::new("a")]).len(), 0);
    }

    #[tokio::test]
    async fn unknown_template_submits_nothing() -> Result<()> {
        let dir = tempdir()?;
        let (mut session, submitted) = session(vec![], &[], dir.path().to_path_buf())?;

        session.run(Some("missing")).await?;

        assert!(!submitted.load(Ordering::SeqCst));
        assert!(session.db.prompt_rows()?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn template_run_downloads_and_records() -> Result<()> {
        let dir = tempdir()?;
        let url = serve_once("200 OK", b"jpeg bytes".to_vec()).await;

        let events = vec![
            JobEvent::Queued { position: Some(2) },
            progress(&["14/50"]),
            progress(&["14/50", "50/50"]),
            completed(&url),
        ];
        // empty project answer: the template name is the default
        let (mut session, _) = session(events, &[""], dir.path().to_path_buf())?;
        session.db.upsert_template("foo", "a cat")?;

        session.run(Some("foo")).await?;

        let image = dir.path().join("foo").join("generated_image_hd.jpg");
        assert_eq!(std::fs::read(&image)?, b"jpeg bytes");

        let rows = session.db.prompt_rows()?;
        assert_eq!(rows.len(), 1);
        let (timestamp, prompt, project, result) = &rows[0];
        DateTime::parse_from_rfc3339(timestamp)?;
        assert_eq!(prompt, "a cat");
        assert_eq!(project, "foo");
        assert!(result.contains(&url));
        Ok(())
    }

    #[tokio::test]
    async fn interactive_run_asks_for_prompt_and_project() -> Result<()> {
        let dir = tempdir()?;
        let url = serve_once("200 OK", b"img".to_vec()).await;

        let events = vec![completed(&url)];
        let (mut session, _) = session(events, &["a dog", "holidays"], dir.path().to_path_buf())?;

        session.run(None).await?;

        assert!(dir.path().join("holidays").join("generated_image_hd.jpg").exists());
        let rows = session.db.prompt_rows()?;
        assert_eq!(rows[0].1, "a dog");
        assert_eq!(rows[0].2, "holidays");
        Ok(())
    }

    #[tokio::test]
    async fn failed_download_still_records_the_prompt() -> Result<()> {
        let dir = tempdir()?;
        let url = serve_once("404 Not Found", b"gone".to_vec()).await;

        let events = vec![completed(&url)];
        let (mut session, _) = session(events, &["a cat", ""], dir.path().to_path_buf())?;

        session.run(None).await?;

        assert!(!dir.path().join("default").join("generated_image_hd.jpg").exists());
        let rows = session.db.prompt_rows()?;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].2, "default");
        Ok(())
    }

    #[tokio::test]
    async fn result_without_images_skips_download_and_history() -> Result<()> {
        let dir = tempdir()?;
        let result: GenerationResult = serde_json::from_value(serde_json::json!({"seed": 7}))?;

        let events = vec![JobEvent::Completed(result)];
        let (mut session, _) = session(events, &["a cat", "proj"], dir.path().to_path_buf())?;

        session.run(None).await?;

        assert!(!dir.path().join("proj").exists());
        assert!(session.db.prompt_rows()?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn stream_ending_without_a_result_is_an_error() -> Result<()> {
        let dir = tempdir()?;
        let events = vec![progress(&["14/50"])];
        let (mut session, _) = session(events, &["a cat", ""], dir.path().to_path_buf())?;

        assert!(session.run(None).await.is_err());
        assert!(session.db.prompt_rows()?.is_empty());
        Ok(())
    }
}
