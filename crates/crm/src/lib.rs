//! CRM-facing half of Proforma: the record-store gateway trait with its HTTP
//! and in-memory implementations, the proposal orchestrator, the render
//! webhook trigger, and the async link watcher.

pub mod client;
pub mod gateway;
pub mod memory;
pub mod proposal;
pub mod render;
pub mod watcher;

pub use client::HttpCrmGateway;
pub use gateway::{CrmGateway, GatewayError};
pub use memory::{InMemoryCrm, StoredLine, StoredProduct, StoredQuote};
pub use proposal::ProposalService;
pub use render::{RenderClient, RenderError, RenderPayload};
pub use watcher::{LinkWatcher, PollTimer, TokioTimer, WatchOutcome};
