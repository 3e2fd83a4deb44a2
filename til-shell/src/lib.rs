//! # Til Application Frameworks
//!
//! Host-side tooling for the Til interpreter: an interactive REPL with `rustyline` line
//! editing, and a script runner that turns evaluation results into process exit codes.

mod shell;

pub use crate::shell::{repl, run_script, script};
