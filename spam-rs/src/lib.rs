//! spam-rs: Email spam filter
//!
//! Classifies email content as spam or ham with a choice of algorithms,
//! driven by a layered configuration.
//!
//! # Features
//!
//! - **Layered configuration**: JSON file, environment and command line,
//!   merged with fixed precedence and validated
//! - **Pluggable classifiers**: Naive Bayes, linear SVM, RNN and CNN
//! - **Sender lists**: whitelist and blacklist entries override the model
//! - **Hot reload**: config file changes are picked up while running
//!
//! # Example
//!
//! ```no_run
//! use spam_rs::classifiers::{Algorithm, TrainingOptions};
//! use spam_rs::config::ConfigResolver;
//! use spam_rs::corpus::TrainingSet;
//! use spam_rs::filter::SpamFilter;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConfigResolver::new(Some("config.json".into())).resolve();
//!
//!     let mut filter = SpamFilter::new(config);
//!     filter.train(&TrainingSet::sample(), &[Algorithm::NaiveBayes], &TrainingOptions::default())?;
//!
//!     let verdict = filter.run("Congratulations, you won a free prize!")?;
//!     println!("{} ({:.2})", verdict.label, verdict.spam_probability);
//!
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! - [`config`]: Configuration resolution and hot reload
//! - [`classifiers`]: Classifier adapters
//! - [`filter`]: Algorithm dispatch and sender lists
//! - [`email`]: Email parsing
//! - [`corpus`]: Training data
//! - [`error`]: Error types

pub mod classifiers;
pub mod config;
pub mod corpus;
pub mod email;
pub mod error;
pub mod filter;

// Re-export commonly used types
pub use classifiers::{Algorithm, Label, Model};
pub use config::FilterConfig;
pub use error::{Result, SpamError};
pub use filter::{SpamFilter, Verdict};
