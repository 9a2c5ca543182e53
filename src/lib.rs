pub mod availability;
pub mod bundler;
pub mod config;
pub mod domain;
pub mod eligibility;
pub mod error;
pub mod http_oracle;
pub mod http_store;
pub mod ingester;
pub mod logging;
pub mod oracle;
pub mod orchestrator;
pub mod payload;
pub mod solver_client;
pub mod store;
pub mod time_window;
pub mod travel_cache;
pub mod travel_matrix;
pub mod write_applier;
