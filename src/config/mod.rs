//! Configuration for the lifecycle tool.
//!
//! This module handles:
//! - Parsing `glue-lifecycle.yaml` and environment overrides
//! - Validating profile overrides before they reach the registry

mod parser;
mod spec;
mod validator;

pub use parser::{
    ConfigParser, DEFAULT_CONFIG_FILES, ENDPOINT_ENV, REQUEST_TIMEOUT_ENV, find_config_file,
};
pub use spec::{
    LifecycleConfig, OperationOverride, ProfileOverride, RemoteConfig, RetryConfig, WaitConfig,
};
pub use validator::{ConfigValidator, ValidationError, ValidationResult};
