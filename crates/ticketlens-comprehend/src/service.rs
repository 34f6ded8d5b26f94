//! The annotation service seam and the counting client wrapped around it.

use thiserror::Error;
use ticketlens_core::ApiResult;
use tracing::info;

/// Invocation count interval between progress log lines.
const CALL_LOG_INTERVAL: u64 = 100;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server returned {status}: {body}")]
    Server { status: u16, body: String },
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid endpoint {0}")]
    InvalidEndpoint(String),
    #[error("missing credentials: {0} is not set")]
    MissingCredentials(&'static str),
}

/// A batch operation of the remote service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    DetectEntities { language_code: String },
    DetectDominantLanguage,
}

impl Operation {
    /// JSON-1.1 `X-Amz-Target` for this operation.
    pub fn target(&self) -> &'static str {
        match self {
            Self::DetectEntities { .. } => "Comprehend_20171127.BatchDetectEntities",
            Self::DetectDominantLanguage => "Comprehend_20171127.BatchDetectDominantLanguage",
        }
    }

    pub fn language_code(&self) -> Option<&str> {
        match self {
            Self::DetectEntities { language_code } => Some(language_code.as_str()),
            Self::DetectDominantLanguage => None,
        }
    }
}

/// Anything that can annotate one batch of texts.
///
/// Implementations return the service's result for the whole batch; per-item
/// failures belong in [`ApiResult::error_list`], not in `Err`.
pub trait AnnotationService {
    fn annotate(&self, operation: &Operation, texts: &[&str]) -> Result<ApiResult, ClientError>;
}

impl<S: AnnotationService + ?Sized> AnnotationService for &S {
    fn annotate(&self, operation: &Operation, texts: &[&str]) -> Result<ApiResult, ClientError> {
        (**self).annotate(operation, texts)
    }
}

/// Binds a service to one operation and counts the calls that reach it.
pub struct AnnotationClient<S> {
    service: S,
    operation: Operation,
    invocations: u64,
}

impl<S: AnnotationService> AnnotationClient<S> {
    pub fn new(service: S, operation: Operation) -> Self {
        Self {
            service,
            operation,
            invocations: 0,
        }
    }

    /// Annotate one batch, logging a running total every 100 calls.
    pub fn call(&mut self, texts: &[&str]) -> Result<ApiResult, ClientError> {
        self.invocations += 1;
        let result = self.service.annotate(&self.operation, texts)?;
        if self.invocations % CALL_LOG_INTERVAL == 0 {
            self.summary();
        }
        Ok(result)
    }

    pub fn invocations(&self) -> u64 {
        self.invocations
    }

    pub fn operation(&self) -> &Operation {
        &self.operation
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    pub fn summary(&self) {
        info!(
            batches = self.invocations,
            operation = self.operation.target(),
            "queried {} batches",
            self.invocations
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use ticketlens_core::test_support::capture_logs;

    #[derive(Default)]
    struct Recorder {
        calls: RefCell<Vec<(Operation, Vec<String>)>>,
    }

    impl AnnotationService for Recorder {
        fn annotate(
            &self,
            operation: &Operation,
            texts: &[&str],
        ) -> Result<ApiResult, ClientError> {
            self.calls.borrow_mut().push((
                operation.clone(),
                texts.iter().map(|t| t.to_string()).collect(),
            ));
            Ok(ApiResult::default())
        }
    }

    struct Failing;

    impl AnnotationService for Failing {
        fn annotate(&self, _: &Operation, _: &[&str]) -> Result<ApiResult, ClientError> {
            Err(ClientError::Server {
                status: 400,
                body: "TextSizeLimitExceededException".into(),
            })
        }
    }

    #[test]
    fn forwards_operation_and_texts() {
        let recorder = Recorder::default();
        let mut client = AnnotationClient::new(
            &recorder,
            Operation::DetectEntities {
                language_code: "en".into(),
            },
        );
        client.call(&["a", "b"]).unwrap();
        client.call(&["c"]).unwrap();
        assert_eq!(client.invocations(), 2);

        let calls = recorder.calls.borrow();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].1, vec!["a", "b"]);
        assert_eq!(calls[0].0.language_code(), Some("en"));
    }

    #[test]
    fn failed_calls_still_count() {
        let mut client = AnnotationClient::new(Failing, Operation::DetectDominantLanguage);
        let err = client.call(&["x"]).unwrap_err();
        assert!(matches!(err, ClientError::Server { status: 400, .. }));
        assert_eq!(client.invocations(), 1);
    }

    #[test]
    fn targets_match_comprehend_api() {
        assert_eq!(
            Operation::DetectDominantLanguage.target(),
            "Comprehend_20171127.BatchDetectDominantLanguage"
        );
        assert_eq!(Operation::DetectDominantLanguage.language_code(), None);
        assert_eq!(
            Operation::DetectEntities {
                language_code: "de".into()
            }
            .target(),
            "Comprehend_20171127.BatchDetectEntities"
        );
    }

    #[test]
    fn call_total_is_logged_every_hundred_calls() {
        let recorder = Recorder::default();
        let mut client = AnnotationClient::new(&recorder, Operation::DetectDominantLanguage);

        let ((), logs) = capture_logs(|| {
            for _ in 0..99 {
                client.call(&["x"]).unwrap();
            }
        });
        assert!(!logs.contains("queried"), "{logs}");

        let ((), logs) = capture_logs(|| {
            client.call(&["x"]).unwrap();
        });
        assert_eq!(logs.matches("queried 100 batches").count(), 1, "{logs}");
        assert_eq!(client.invocations(), 100);
    }
}
