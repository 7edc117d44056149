pub mod agent;
pub mod api;
pub mod config;
pub mod ha;
pub mod lighting;
pub mod whatsapp;

pub use config::Config;
pub use config::ConfigError;
pub use config::LogLevel;
pub use ha::Backend;
pub use ha::BackendError;
pub use ha::HaClient;
pub use lighting::AreaRegistry;
pub use lighting::LightActions;
