//! Pipeline stages.

use std::fmt;

/// One step of [`RequestPipeline::process`](super::RequestPipeline::process).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Stage {
    /// Check the HTTP Basic credentials with the authenticator.
    Authenticate,
    /// Read the whole body and keep it for logging.
    CaptureBody,
    /// Emit the request log event.
    LogRequest,
    /// Parse the body as JSON into the decode target.
    Decode,
    /// Check the decoded target's field constraints.
    Validate,
    /// Resolve the registered integer parameters.
    ExtractParams,
}

impl Stage {
    /// Every stage, in execution order.
    pub const ORDER: [Stage; 6] = [
        Stage::Authenticate,
        Stage::CaptureBody,
        Stage::LogRequest,
        Stage::Decode,
        Stage::Validate,
        Stage::ExtractParams,
    ];

    /// Returns the stage name used in log events.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Authenticate => "authenticate",
            Self::CaptureBody => "capture_body",
            Self::LogRequest => "log_request",
            Self::Decode => "decode",
            Self::Validate => "validate",
            Self::ExtractParams => "extract_params",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
