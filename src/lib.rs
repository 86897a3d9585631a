pub mod analysis;
pub mod api;
pub mod config;
pub mod form;
pub mod llm;
pub mod llms_txt;
pub mod metrics;
pub mod player;
