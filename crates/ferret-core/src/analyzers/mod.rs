//! Specialized analyzers. Each is an independent producer of findings; the
//! scanner driver runs them sequentially per file so later analyzers can
//! see earlier results.

pub mod capability;
pub mod correlation;
pub mod dependency;
pub mod entropy;
pub mod mcp;
pub mod semantic;
pub mod threat_intel;
