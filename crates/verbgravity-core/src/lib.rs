//! verbgravity-core: quiz state machine, grading, and scoring.
//!
//! The learner finds the root verb(s) of each sentence, then its subject.
//! This crate holds the data model, the pure transition function, the async
//! session driver, and the summary and report types the other crates build on.

pub mod answer_key;
pub mod engine;
pub mod error;
pub mod grading;
pub mod ledger;
pub mod model;
pub mod navigation;
pub mod parser;
pub mod report;
pub mod selection;
pub mod session;
pub mod state;
pub mod statistics;
pub mod traits;
