//! icdlens - OCR medical documents and recover ICD-10 codes.
//!
//! Documents are sent to a remote OCR service, the extracted text to an
//! LLM analysis endpoint, and the loosely shaped analysis payload is
//! normalized into an ordered list of coded findings.

pub mod cli;
pub mod config;
pub mod export;
pub mod http_client;
pub mod models;
pub mod normalize;
pub mod session;
