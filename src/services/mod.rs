// src/services/mod.rs

//! Service layer: stateless helpers and per-run controllers used by the
//! extraction pipeline.

pub mod fingerprint;
pub mod language;
pub mod pacing;
pub mod proxy;
pub mod translate;
pub mod transport;

pub use language::{LanguageClassifier, LanguageTag, ScriptFallback};
pub use pacing::{PacingController, RequestOutcome};
pub use proxy::{ProxyLease, ProxyPool};
pub use translate::Translator;
pub use transport::{Envelope, Transport};
