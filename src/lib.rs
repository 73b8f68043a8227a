#![forbid(unsafe_code)]

pub mod chapter_runs;
pub mod chunker;
pub mod cli;
pub mod commands;
pub mod error;
pub mod ingest;
pub mod integrity;
pub mod logging;
pub mod model;
pub mod progress;
pub mod rechunk;
pub mod remap;
pub mod source;
pub mod store;
pub mod words;
