mod settings;

pub use settings::{
    DatabaseConfig, LogFormat, LoggingConfig, RenderConfig, SecretSeed, ServerConfig, Settings,
};
