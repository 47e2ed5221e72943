//! Proposal generation runtime.
//!
//! - `llm`: the `GenerationClient` seam and its request type
//! - `gemini`: HTTP client for the Gemini `generateContent` endpoint
//! - `runtime`: `ProposalGenerator`, which sequences totals, prompt
//!   compilation, the service call, and response validation
//!
//! The model only writes prose. Prices and totals are computed locally and
//! handed to it as context.

pub mod gemini;
pub mod llm;
pub mod runtime;

pub use gemini::{GeminiClient, GeminiConfig};
pub use llm::{GenerationClient, GenerationRequest, JSON_MIME_TYPE};
pub use runtime::ProposalGenerator;
