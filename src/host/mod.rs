//! Windows host integration: the concrete state accessor and the
//! collaborators around it

pub mod accessor;
pub mod parse;
pub mod preflight;
pub mod restore_point;
pub mod startup;

pub use accessor::WindowsAccessor;

/// Machine name for the run manifest
pub fn host_name() -> String {
    std::env::var("COMPUTERNAME")
        .or_else(|_| std::env::var("HOSTNAME"))
        .unwrap_or_else(|_| "unknown".to_string())
}

/// Account name for the run manifest
pub fn user_name() -> String {
    std::env::var("USERNAME")
        .or_else(|_| std::env::var("USER"))
        .unwrap_or_else(|_| "unknown".to_string())
}
