pub mod answer;
pub mod loaders;
pub mod question;
pub mod run;
pub mod source;

pub use answer::{RawAnswer, ResolvedAnswer};
pub use loaders::{load_source_descriptors, parse_source_descriptors};
pub use question::{option_label, AnswerQuery, QuestionKind, QuestionSnapshot};
pub use run::{IterationResult, IterationStatus, RunLog, RunOutcome, RunSummary};
pub use source::{HttpMethod, ResponseHandler, SourceDescriptor, SuccessRule};
