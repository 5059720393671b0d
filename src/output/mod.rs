//! Rendering of a finished run.
//!
//! - [`human`] prints a short summary for terminals
//! - [`json`] prints the full [`RunReport`](crate::pipeline::RunReport) for scripting
//!
//! # Example
//!
//! ```no_run
//! use tmplmerge::config::Config;
//! use tmplmerge::error::ExitCode;
//! use tmplmerge::output::json::JsonOutput;
//! use tmplmerge::pipeline::Pipeline;
//!
//! let report = Pipeline::new(Config::default()).run().unwrap();
//! let output = JsonOutput::new(&report, ExitCode::from_report(&report));
//! println!("{}", output.to_json_pretty().unwrap());
//! ```

pub mod human;
pub mod json;

pub use human::HumanOutput;
pub use json::{JsonOutput, JsonOutputError};
