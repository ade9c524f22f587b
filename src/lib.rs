//! Shared pieces of the corpus cleaning tools: document I/O, configuration,
//! run reports, and the per-document quality and redaction stages that run
//! ahead of deduplication.

pub mod dto;
pub mod error;
pub mod filter;
pub mod pii;
pub mod report;
pub mod util;
