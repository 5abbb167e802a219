//! Output scripts and mutation sweeps for data-driven tests.
//!
//! A sweep ("crumble") takes a captured input value, perturbs it once per
//! row of a mutation table, calls the function under test with each copy,
//! and records one titled result per row. An optional output script
//! (`if <key> equals <value> then <flags> else <flags>`) selects how each
//! raw result is post-processed.
//!
//! ```
//! use serde_json::json;
//! use zest_crumble::crumble::{crumble, CrumbleConfig, MutationRow, SweepEntry};
//!
//! let config = CrumbleConfig {
//!     output: Some("if status equals ok then pass else count".to_string()),
//!     ..CrumbleConfig::single_argument()
//! };
//! let sweep = crumble(config, vec![MutationRow::new("name", "blank")]);
//!
//! let entries = sweep
//!     .run(|input| Ok(json!({ "status": "ok", "seen": input })), &[json!({ "name": "Ada" })])
//!     .unwrap();
//!
//! assert_eq!(entries[0].title(), Some("Path: name, mutation: blank"));
//! ```

pub mod abstraction;
pub mod cli;
pub mod command;
pub mod crumble;
pub mod logging;
pub mod mutator;
pub mod options;
pub mod output;
pub mod report;
pub mod run_report;
pub mod script;
pub mod sweep_file;
pub mod ui;

pub use abstraction::{Abstractor, ShapeAbstractor};
pub use crumble::{Crumble, CrumbleConfig, CrumbleError, MutationRow, SweepEntry, crumble};
pub use mutator::{MutationError, Mutator, RuleMutator};
pub use output::{TransformOutputInfo, apply_flags};
pub use script::{Flag, OutputScript, OutputScriptResult, ScriptError};
