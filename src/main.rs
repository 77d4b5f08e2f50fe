use clap::Parser;
use color_eyre::{Result, eyre::eyre};
use flux_client::{
    DB_PATH, OUTPUT_DIR,
    cli::Cli,
    db::Db,
    generation::FalQueue,
    session::{Prompter, Session, StdinPrompter},
};

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    pretty_env_logger::init();
    let cli = Cli::parse();

    let db = Db::open(DB_PATH)?;

    if cli.db_init {
        db.initialize()?;
        println!("Database initialized successfully.");
        return Ok(());
    }

    if cli.templates {
        let templates = db.list_templates()?;
        if templates.is_empty() {
            println!("No templates found.");
        } else {
            println!("Existing templates:");
            for template in templates {
                println!("- {}: {}", template.name, template.content);
            }
        }
        return Ok(());
    }

    if let Some(name) = &cli.delete_template {
        if db.delete_template(name)? {
            println!("Template '{name}' has been deleted.");
        } else {
            println!("No template found with name '{name}'.");
        }
        return Ok(());
    }

    let mut prompter = StdinPrompter;

    if let Some(name) = &cli.add_template {
        let content = prompter.read_line("Enter your prompt template: ")?;
        db.upsert_template(name, &content)?;
        println!("Prompt template '{name}' has been stored.");
        return Ok(());
    }

    let api_key = match cli.key {
        Some(key) => key,
        None => std::env::var("FAL_KEY")
            .map_err(|_| eyre!("No api key. Pass --key or set the FAL_KEY environment variable"))?,
    };

    let mut session = Session {
        db,
        service: Box::new(FalQueue::new(cli.model, api_key)),
        prompter: Box::new(prompter),
        http: reqwest::Client::new(),
        output_root: OUTPUT_DIR.into(),
    };
    session.run(cli.template.as_deref()).await
}
