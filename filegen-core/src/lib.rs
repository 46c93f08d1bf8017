//! FileGenerator Core - Mock Generation and Export Pipeline
//!
//! # Flow
//! 1. The input collector holds prompt, literal text and upload values
//! 2. The job runner simulates an asynchronous generation job
//! 3. The synthesizer renders a per-profile SVG placeholder
//! 4. The export service saves it through a download host
//!
//! There is no real geometry work anywhere in this crate. Every output is
//! a deterministic template.

pub mod config;
pub mod export;
pub mod hashing;
pub mod input;
pub mod job;
pub mod logging;
pub mod profiles;
pub mod session;
pub mod synth;

pub use config::{Config, ConfigError};
pub use export::{export_artifact, DataUriHost, DirectoryHost, DownloadHost, ExportError, Exporter, SaveReceipt};
pub use hashing::{canonical_json, compute_request_hash, sha256_hex};
pub use input::{can_submit, GenerationRequest, InputCollector, InputError, InputMode, UploadRef};
pub use job::{JobRunner, JobState, Rejection, StartOutcome};
pub use profiles::{FabricationProfile, ProfileId, ProfileRegistry};
pub use session::{Session, SessionSnapshot};
pub use synth::{synthesize, SynthesizedArtifact};

pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");
