//! Remote annotation layer: batch entity and dominant-language detection
//! against AWS Comprehend, behind the [`AnnotationService`] seam.

pub mod http;
pub mod service;
pub mod sigv4;

pub use http::{ClientConfig, ComprehendClient};
pub use service::{AnnotationClient, AnnotationService, ClientError, Operation};
pub use sigv4::Credentials;
