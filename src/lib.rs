pub mod aggregate;
pub mod chart;
pub mod cli;
pub mod error;
pub mod export;
pub mod github;
pub mod model;
pub mod store;
pub mod sync;
pub mod util;
