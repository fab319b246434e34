pub mod config;
pub mod errors;
pub mod intake;
pub mod llm_client;
pub mod orchestrator;
pub mod protocol;
pub mod ranking;
pub mod routes;
pub mod state;
pub mod store;
