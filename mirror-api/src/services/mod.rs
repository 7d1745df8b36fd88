//! Outbound integration clients

pub mod chroma_client;
pub mod webex_client;

pub use chroma_client::{ChromaClient, ChromaError};
pub use webex_client::{WebexClient, WebexError};
