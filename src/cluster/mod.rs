//! Cluster configuration layer
//!
//! - [`types`]: Cluster definitions and change notices
//! - [`validator`]: Resolves every cluster's version and reports rewrites
//! - [`config_file`]: YAML load/save for cluster configuration files

pub mod config_file;
pub mod types;
pub mod validator;
