mod session;
mod transcript;

pub use session::SessionPhase;
pub use transcript::{TestOutcome, Transcript, TranscriptPhase};
