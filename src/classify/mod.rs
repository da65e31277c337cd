// Classifiers — trait-based abstraction over sentiment and entity models.
//
// The traits define the interface. The ONNX implementations run locally;
// the hosted implementations call the HuggingFace inference API. Tests
// substitute deterministic stubs.

pub mod aggregate;
pub mod download;
pub mod inference;
pub mod onnx;
pub mod rate_limiter;
pub mod traits;
