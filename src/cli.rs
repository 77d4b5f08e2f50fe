use crate::generation::Model;

#[derive(Debug, clap::Parser)]
#[command(
    version,
    about = "Submit prompts to the Flux image models on the fal.ai queue",
    long_about = indoc::indoc! {"
        Submits a text prompt to a Flux model on the fal.ai queue, streams the
        generation logs while the job runs, downloads the first resulting image
        into a per-project directory under ./output, and records the prompt and
        the raw result payload in a local SQLite database (./prompts.db).

        Prompt templates can be stored, listed, reused and deleted. Run with
        --db-init once before anything else.
    "}
)]
pub struct Cli {
    /// Store a new prompt template under this name (asks for the content) and exit
    #[arg(long, value_name = "NAME")]
    pub add_template: Option<String>,

    /// Use a stored prompt template as the prompt source
    #[arg(long, value_name = "NAME")]
    pub template: Option<String>,

    /// Create the database schema and exit
    #[arg(long)]
    pub db_init: bool,

    /// Print all stored templates and exit
    #[arg(long)]
    pub templates: bool,

    /// Delete a stored prompt template and exit
    #[arg(long, value_name = "NAME")]
    pub delete_template: Option<String>,

    /// fal.ai API key, read from $FAL_KEY when absent
    #[arg(short, long)]
    pub key: Option<String>,

    /// Model to submit the prompt to
    #[arg(long, value_enum, default_value_t)]
    pub model: Model,
}
