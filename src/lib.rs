pub mod cli;
pub mod config;
pub mod error;
pub mod graph;
pub mod impact;
pub mod indexer;
pub mod model;
pub mod qualname;
pub mod syntax;
pub mod util;
