use crate::{generation::GenerationService, session::Prompter};

pub mod cli;
pub mod db;
pub mod download;
pub mod generation;
pub mod session;

#[cfg(test)]
mod testutil;

pub type ServiceBox = Box<dyn GenerationService + Send + Sync>;
pub type PrompterBox = Box<dyn Prompter + Send>;

pub const DB_PATH: &str = "prompts.db";
pub const OUTPUT_DIR: &str = "output";
pub const DEFAULT_IMAGE_NAME: &str = "generated_image_hd.jpg";
pub const DEFAULT_PROJECT_NAME: &str = "default";
