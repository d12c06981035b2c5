pub mod cancel;
pub mod catalog;
pub mod cli;
pub mod client;
pub mod error;
#[cfg(test)]
mod fixtures;
pub mod github_provider;
pub mod ledger;
pub mod phases;
pub mod pipeline;
pub mod provider;
