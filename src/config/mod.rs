mod settings;

pub use settings::{
    DirectoryConfig, DispatchConfig, MAX_CACHE_TTL_SECS, ServerConfig, Settings, SlackConfig,
    UsersFailurePolicy, load_settings,
};
