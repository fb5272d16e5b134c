//! Resume-to-job matching: upload validation, batch prompting of the
//! upstream model, response parsing, ranking, and persistence.

pub mod handlers;
pub mod orchestrator;
pub mod prompts;
pub mod store;
