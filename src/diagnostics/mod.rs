//! Test-send diagnostics.
//!
//! This module provides:
//! - [`SendOutcome`], the tagged result of a delivery attempt
//! - [`classify`], which turns an outcome into either the success payload or
//!   an ordered list of remediation suggestions
//!
//! Outcomes without guidance surface as [`UnclassifiedOutcome`] so callers
//! can report them as internal errors.

mod classifier;
mod outcome;
mod suggestions;

pub use classifier::{classify, Diagnostic, TestSendResult, UnclassifiedOutcome};
pub use outcome::{
    ChannelFailure, EmailProviderFailure, SendOutcome, SkipReason, SmsProviderFailure,
    WorkspaceMisconfiguration,
};
