//! Proposal generation core.
//!
//! Everything here is synchronous and deterministic: the data model, totals,
//! prompt and schema compilation, response validation, and the single-flight
//! session gate. The network call lives in `proposta-agent`.

pub mod config;
pub mod domain;
pub mod errors;
pub mod pricing;
pub mod prompt;
pub mod response;
pub mod schema;
pub mod session;

pub use domain::proposal::{
    ClientInfo, CompanyInfo, LineItem, LineItemId, LineItemPatch, PreflightWarning,
    ProposalInput, ProposalOutput, Tone,
};
pub use errors::{DomainError, GenerationError, InterfaceError};
pub use pricing::{line_total, proposal_total};
pub use prompt::{compile_prompt, CompiledPrompt};
pub use response::{parse_proposal_output, ParseError};
pub use schema::{FieldKind, OutputSchema, SchemaField};
pub use session::{GenerationGate, GenerationState};
