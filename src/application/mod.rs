// Application layer: the ledger and quiz use cases that any client (CLI,
// tests, a future TUI) drives. Callers hold their own Account or QuizUser.

pub mod error;
pub mod quiz;
pub mod service;

pub use error::*;
pub use quiz::*;
pub use service::*;
