mod classifier;
mod pipeline;
pub mod reconstructor;
mod rules;
mod scrubber;

pub use classifier::{LineClass, LineClassifier, NoiseReason};
pub use pipeline::{clean_deed_text, CleanupOutcome, CleanupReport, DeedCleaner};
pub use reconstructor::{ParagraphReconstructor, Step};
pub use rules::CompiledRules;
pub use scrubber::PatternScrubber;
