pub mod gate;
pub mod store;

pub use gate::{Submission, SubmissionGate};
pub use store::{get_session_path, FileSessionStore, MemorySessionStore, SessionStore, Updated};
