pub mod settings;

pub use settings::{RouterConfig, ENV_PREFIX};
