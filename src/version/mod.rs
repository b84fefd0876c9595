//! Version management layer for supported cluster versions
//!
//! This module fetches the versions a control plane currently supports, caches
//! them for a bounded time and decides which version a cluster should use.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │   Service   │────▶│   Fetcher   │────▶│    Cache    │
//! │  (catalog)  │     │   (chain)   │     │    (TTL)    │
//! └─────────────┘     └─────────────┘     └─────────────┘
//!        │                   │
//!        ▼                   ▼
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │  Resolver   │     │ Registries  │────▶│    Token    │
//! │  (policy)   │     │ (ocm, cli)  │     │  + Retry    │
//! └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! # Modules
//!
//! - [`cache`]: In-memory, per-cluster-type version cache with TTL
//! - [`fetcher`]: Cache → primary source → fallback chain
//! - [`registry`]: Traits for primary and fallback version sources
//! - [`registries`]: Control-plane API and local CLI implementations
//! - [`resolver`]: Pure resolution policy (latest, supported, auto-upgrade)
//! - [`retry`]: Exponential backoff with jitter for transient failures
//! - [`service`]: Service object and the `VersionCatalog` capability trait
//! - [`token`]: Offline-token to bearer-token exchange
//! - [`error`]: Error types for fetching and resolution
//! - [`semver`]: Identifier normalization and ordering
//! - [`types`]: Version records, sets, requests and outcomes

pub mod cache;
pub mod error;
pub mod fetcher;
pub mod registries;
pub mod registry;
pub mod resolver;
pub mod retry;
pub mod semver;
pub mod service;
pub mod token;
pub mod types;
