// src/lib.rs

//! Review harvesting library for map-service places.
//!
//! Replays the provider's internal review RPC over plain HTTP: builds
//! browser-shaped request envelopes, walks the continuation-token
//! pagination sequentially, decodes the positional payload through
//! tiered field extraction, and filters records by date window. Pacing,
//! classed retry, and language classification are built in.
//!
//! The main entry point is [`pipeline::Harvester`]:
//!
//! ```no_run
//! use revharvest::models::{ExtractionRequest, HarvesterConfig};
//! use revharvest::pipeline::Harvester;
//!
//! # async fn run() -> revharvest::error::Result<()> {
//! let harvester = Harvester::new(HarvesterConfig::default());
//! let result = harvester
//!     .run(&ExtractionRequest::new("0x89c2588f046ee661:0xa0b3281fcecc2c59"))
//!     .await?;
//! println!("{} records ({:?})", result.records.len(), result.terminal_reason);
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod utils;

pub use error::{HarvestError, Result};
pub use models::{ExtractionRequest, ExtractionResult, HarvesterConfig, Record, TerminalReason};
pub use pipeline::Harvester;
