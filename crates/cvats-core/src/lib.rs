pub mod analysis;
pub mod config;
pub mod error;
pub mod extraction;
pub mod progress;
pub mod session;
pub mod upload;
pub mod validation;

pub use analysis::{AnalysisApi, ParsedCv, ScoreRating, ScoreReport};
pub use config::ClientConfig;
pub use error::{CvatsError, Result};
pub use extraction::{ExtractApi, ExtractionOutcome, ExtractionRequest, ExtractionResponse};
pub use progress::{ProgressSink, TracingProgress};
pub use session::{ScreeningSession, UploadedDocument};
pub use upload::{PresignRequest, PresignResponse, UploadApi, UploadTarget};
pub use validation::DocumentKind;
