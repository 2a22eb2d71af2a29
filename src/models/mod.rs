//! Data models for icdlens.

mod analysis;
mod finding;
mod ocr;

pub use analysis::{code_array_in, RawAnalysisResponse, ReinitResponse, CODE_ARRAY_FIELDS};
pub use finding::{CodedFinding, Confidence, Status};
pub use ocr::{OcrLine, OcrResult, OcrStats};
