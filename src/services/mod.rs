pub mod controller;
pub mod llm;
pub mod prompt;
