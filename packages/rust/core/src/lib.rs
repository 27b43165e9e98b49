//! Build orchestration for tutpage.
//!
//! This crate ties together change detection, the sparse fetch, the
//! tutorial walk, assembly and page output into a single `build` run
//! ([`pipeline::run_build`]).

pub mod assembler;
pub mod detector;
pub mod page;
pub mod pipeline;
pub mod state;
pub mod walker;

pub use assembler::{assemble, section_anchor_id};
pub use detector::{RebuildDecision, needs_rebuild};
pub use page::{Placeholder, TemplateVars, copy_assets, readable_timestamp, render_template, write_page};
pub use pipeline::{BuildOutcome, BuildReport, ProgressReporter, SilentProgress, build_status, run_build};
pub use state::BuildStateStore;
pub use walker::{WalkOptions, parse_index, walk};
