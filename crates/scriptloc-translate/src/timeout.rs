use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::{Translate, TranslateError};

/// Bounds every call to the inner translator. The call runs on a worker thread;
/// if it does not answer in time the caller gets [`TranslateError::Timeout`] and the
/// worker is left to finish on its own.
pub struct TimeoutTranslator<T> {
    inner: Arc<T>,
    timeout: Duration,
}

impl<T> TimeoutTranslator<T>
where
    T: Translate + Send + Sync + 'static,
{
    pub fn new(inner: T, timeout: Duration) -> Self {
        Self {
            inner: Arc::new(inner),
            timeout,
        }
    }
}

impl<T> Translate for TimeoutTranslator<T>
where
    T: Translate + Send + Sync + 'static,
{
    fn translate(&self, text: &str) -> Result<String, TranslateError> {
        let (tx, rx) = mpsc::channel();
        let inner = Arc::clone(&self.inner);
        let text = text.to_owned();
        thread::Builder::new()
            .name("scriptloc-translate".into())
            .spawn(move || {
                // receiver may be gone after a timeout
                let _ = tx.send(inner.translate(&text));
            })
            .map_err(|e| TranslateError::Other(format!("failed to spawn worker: {e}")))?;

        match rx.recv_timeout(self.timeout) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => {
                tracing::warn!(event = "translate_timeout", timeout = ?self.timeout);
                Err(TranslateError::Timeout(self.timeout))
            }
            Err(RecvTimeoutError::Disconnected) => Err(TranslateError::Other(
                "translation worker exited without a result".into(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FnTranslator;

    fn slow(delay: Duration) -> FnTranslator<impl Fn(&str) -> Result<String, TranslateError>> {
        FnTranslator(move |s: &str| {
            thread::sleep(delay);
            Ok(s.to_uppercase())
        })
    }

    #[test]
    fn fast_calls_pass_through() {
        let t = TimeoutTranslator::new(slow(Duration::from_millis(1)), Duration::from_secs(5));
        assert_eq!(t.translate("ok").unwrap(), "OK");
    }

    #[test]
    fn slow_calls_time_out() {
        let t = TimeoutTranslator::new(slow(Duration::from_secs(2)), Duration::from_millis(50));
        match t.translate("late") {
            Err(TranslateError::Timeout(d)) => assert_eq!(d, Duration::from_millis(50)),
            other => panic!("expected timeout, got {other:?}"),
        }
    }

    #[test]
    fn inner_errors_are_forwarded() {
        let t = TimeoutTranslator::new(
            FnTranslator(|_: &str| Err(TranslateError::Other("quota".into()))),
            Duration::from_secs(1),
        );
        assert!(matches!(t.translate("x"), Err(TranslateError::Other(m)) if m == "quota"));
    }
}
