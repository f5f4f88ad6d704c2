//! Spam filtering
//!
//! Sender lists first, then the configured classifier.

pub mod dispatcher;
pub mod lists;
pub mod types;

pub use dispatcher::SpamFilter;
pub use lists::AddressList;
pub use types::{Verdict, VerdictReason};
