//! Core library for the fpa-consolidate command line application.
//!
//! The library exposes the consolidation pipeline that powers the
//! command-line interface as well as the integration tests. The modules are
//! structured to keep responsibilities narrow and composable: IO adapters
//! live under [`io`], data representations inside [`model`], structural
//! validation in [`validate`], account mapping and merging in [`mapping`],
//! decimal conversion in [`amounts`], and the run orchestration under
//! [`consolidate`].

pub mod amounts;
pub mod audit;
pub mod config;
pub mod consolidate;
pub mod error;
pub mod io;
pub mod mapping;
pub mod model;
pub mod validate;

pub use error::{PipelineError, Result};
