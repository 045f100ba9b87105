// Candidate ingestion and storage.
// JSON submissions and multipart uploads both flow through ingest, which
// extracts document text and embeds each candidate once before it is stored.

pub mod extract;
pub mod handlers;
pub mod ingest;
pub mod store;

pub use ingest::{embed_candidates, prepare_json, CandidateInput};
pub use store::CandidateStore;
