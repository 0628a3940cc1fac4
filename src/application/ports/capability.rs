//! Runtime capability probing port

use thiserror::Error;

/// A probe that blew up instead of answering
#[derive(Debug, Clone, Error)]
#[error("Capability probe failed for {mime}: {reason}")]
pub struct ProbeError {
    pub mime: String,
    pub reason: String,
}

/// Answers "can this runtime handle this MIME type?"
pub trait CapabilityOracle: Send + Sync {
    fn is_type_supported(&self, mime: &str) -> Result<bool, ProbeError>;
}

impl<T: CapabilityOracle + ?Sized> CapabilityOracle for &T {
    fn is_type_supported(&self, mime: &str) -> Result<bool, ProbeError> {
        (**self).is_type_supported(mime)
    }
}
