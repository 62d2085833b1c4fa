//! The translation service boundary.
//!
//! Everything that turns source text into translated text implements [`Translate`].
//! Batch code only ever sees the trait, so tests swap in stubs and the CLI picks
//! the HTTP client.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

mod http;
mod stub;
mod timeout;

pub use http::{normalize_target, HttpConfig, HttpTranslator};
pub use stub::StubTranslator;
pub use timeout::TimeoutTranslator;

#[derive(Debug, Clone, Error)]
pub enum TranslateError {
    #[error("request failed: {0}")]
    Request(String),
    #[error("service returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("malformed response: {0}")]
    Response(String),
    #[error("timed out after {0:?}")]
    Timeout(Duration),
    #[error("{0}")]
    Other(String),
}

/// One opaque call per piece of text. Implementations may fail; callers decide
/// whether a failure is fatal.
pub trait Translate {
    fn translate(&self, text: &str) -> Result<String, TranslateError>;
}

impl<T: Translate + ?Sized> Translate for &T {
    fn translate(&self, text: &str) -> Result<String, TranslateError> {
        (**self).translate(text)
    }
}

impl<T: Translate + ?Sized> Translate for Box<T> {
    fn translate(&self, text: &str) -> Result<String, TranslateError> {
        (**self).translate(text)
    }
}

impl<T: Translate + ?Sized> Translate for Arc<T> {
    fn translate(&self, text: &str) -> Result<String, TranslateError> {
        (**self).translate(text)
    }
}

/// Adapts a closure into a [`Translate`] implementation.
pub struct FnTranslator<F>(pub F);

impl<F> Translate for FnTranslator<F>
where
    F: Fn(&str) -> Result<String, TranslateError>,
{
    fn translate(&self, text: &str) -> Result<String, TranslateError> {
        (self.0)(text)
    }
}
