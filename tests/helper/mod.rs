#![allow(dead_code)]

pub mod registry;

pub use registry::{MockFallback, MockSource, create_test_service};
