pub mod action_applier;
pub mod answer_resolver;
pub mod answer_source;
pub mod completion_streamer;
pub mod question_reader;

pub use action_applier::{ActionApplier, ApplyReport};
pub use answer_resolver::resolve;
pub use answer_source::{AnswerSourceClient, SourceStrategy};
pub use completion_streamer::{CompletionSettings, CompletionStreamer, StreamOutcome, StreamStatus};
pub use question_reader::QuestionReader;
