//! Text-generation client and reply parsing

pub mod client;
pub mod parser;

pub use client::{Generation, OllamaClient, RunningContext, TextGenerator};
