//! Rule-based data-quality auditing.
//!
//! The inventory audit runs as a staged [`candidate_pipeline`]: records are
//! scored per category, classified by an ordered rule list, remediated,
//! mapped to follow-up actions, priced, and tiered. The fraud, security and
//! shipment analyzers are plain batch functions over their own CSV exports.

pub mod abc;
pub mod actions;
pub mod auditor;
pub mod candidate_pipeline;
pub mod components;
pub mod config;
pub mod coverage;
pub mod error;
pub mod filter;
pub mod fraud;
pub mod hydrator;
pub mod inventory_loader;
pub mod pipelines;
pub mod query_hydrator;
pub mod remediator;
pub mod report;
pub mod rules;
pub mod scorer;
pub mod security;
pub mod selector;
pub mod shipments;
pub mod side_effect;
pub mod source;
pub mod stats;
pub mod types;
pub mod util;

pub use config::{AuditConfig, FraudConfig, MissingGroupPolicy, SecurityConfig, Settings};
pub use error::{AuditError, AuditResult};
pub use types::{AbcClass, AuditRequest, AuditStatus, AuditedItem, CoverageStatus, RequiredAction};
