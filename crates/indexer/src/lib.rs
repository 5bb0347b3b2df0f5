#![doc = include_str!("../README.md")]
//!
//! # Module Structure
//!
//! - [`error`]: Domain error types (`IndexerError`)
//! - [`config`]: Indexer configuration (`IndexerConfig`, builder)
//! - [`types`]: Domain types (`ParsedArtifact`, `ArtifactKind`)
//! - [`parser`]: Artifact name parsing (`ArtifactParser` trait, `WheelParser`, `SdistParser`)
//! - [`storage`]: Bucket access (`ObjectStorage` trait, `ObjectStoreBackend`, `MemoryStorage`)
//! - [`scanner`]: Paginated bucket enumeration (`BucketScanner`)
//! - [`index`]: Grouping and de-duplication (`Index`, `IndexBuilder`)
//! - [`digest`]: Published sha256 sidecars (`DigestResolver`)
//! - [`render`]: PEP 503 page rendering (`PageRenderer`, `RenderedPages`)
//! - [`publish`]: Page publishing and dry run (`Publisher`, `PublishReport`)
//! - [`indexer`]: Main orchestrator (`WheelIndexer`)
//!
//! # Architecture
//!
//! ```text
//! ObjectStorage --> BucketScanner --> parser::parse --> IndexBuilder --> Index
//!                                                                         |
//!                                                                   PageRenderer
//!                                                                         |
//!                                                                   RenderedPages
//!                                                                         |
//!                                                     Publisher --> ObjectStorage
//! ```

pub mod config;
pub mod digest;
pub mod error;
pub mod index;
pub mod indexer;
pub mod parser;
pub mod publish;
pub mod render;
pub mod scanner;
pub mod storage;
pub mod types;

// --- Public API Re-exports ---

// Orchestrator
pub use indexer::{RunSummary, WheelIndexer};

// Configuration
pub use config::{IndexerConfig, IndexerConfigBuilder, StorageBackend};

// Error
pub use error::IndexerError;

// Types
pub use types::{ArtifactKind, ParsedArtifact};

// Parser
pub use parser::{ArtifactParser, SdistParser, WheelParser, normalize_name, parse};

// Storage
pub use storage::{
    ListPage, LocalDestination, MemoryStorage, ObjectInfo, ObjectStorage, ObjectStoreBackend,
};

// Pipeline stages
pub use digest::{DigestResolver, DigestSummary};
pub use index::{Index, IndexBuilder, PackageEntry, build};
pub use publish::{PublishEntry, PublishOutcome, PublishReport, Publisher};
pub use render::{LinkBase, PageRenderer, RenderedPages};
pub use scanner::BucketScanner;
