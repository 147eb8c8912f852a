pub mod certificates;

// Re-export
pub use certificates::{
    device_identity_hash, Certificate, CertificateBuilder, CertificateDocument, CertificateError,
    ContentHash,
};
