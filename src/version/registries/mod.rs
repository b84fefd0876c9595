//! Version source implementations

pub mod ocm;
pub mod rosa_cli;

pub use ocm::OcmRegistry;
pub use rosa_cli::RosaCliRegistry;
