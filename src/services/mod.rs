pub mod gateway;
pub mod llm_provider;
pub mod pdf;
pub mod prompt;
pub mod qdrant;
pub mod quiz_generator;
pub mod vector;
