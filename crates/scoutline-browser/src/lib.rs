//! Browser automation for the scoutline scraper.
//!
//! Provides a single serialized headless page with a per-domain politeness
//! throttle, plus route interception that captures the background requests
//! a page fires when its controls are clicked.

pub mod actions;
pub mod engine;
pub mod error;
pub mod intercept;

pub use actions::{BrowserActions, PageResponse};
pub use engine::BrowserEngine;
pub use error::{BrowserError, Result};
pub use intercept::{InterceptStream, InterceptedResponse, RequestInterceptor};
