//! Utility functions and helpers.

pub mod preflight;
pub mod settings;

pub use preflight::{
    check_ai_command_prerequisites, check_ai_credentials, check_git_repository, AiCredentialInfo,
};
pub use settings::{prompt_and_save_api_key, Settings};
