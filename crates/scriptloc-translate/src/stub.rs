use crate::{Translate, TranslateError};

/// Offline translators selected with `stub:<kind>` endpoints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StubTranslator {
    /// Returns the input unchanged.
    Echo,
    /// Upper-cases the input.
    Upper,
    /// Prepends a fixed string.
    Prefix(String),
    /// Always fails.
    Fail,
    /// Fails when the input contains the marker, otherwise echoes.
    FailOn(String),
}

impl StubTranslator {
    /// Parse `stub:echo`, `stub:upper`, `stub:fail`, `stub:prefix:<s>` or `stub:fail-on:<s>`.
    pub fn parse(spec: &str) -> Option<Self> {
        let rest = spec.strip_prefix("stub:")?;
        match rest {
            "echo" => Some(Self::Echo),
            "upper" => Some(Self::Upper),
            "fail" => Some(Self::Fail),
            _ => {
                if let Some(p) = rest.strip_prefix("prefix:") {
                    Some(Self::Prefix(p.to_string()))
                } else {
                    rest.strip_prefix("fail-on:")
                        .filter(|m| !m.is_empty())
                        .map(|m| Self::FailOn(m.to_string()))
                }
            }
        }
    }
}

impl Translate for StubTranslator {
    fn translate(&self, text: &str) -> Result<String, TranslateError> {
        match self {
            Self::Echo => Ok(text.to_string()),
            Self::Upper => Ok(text.to_uppercase()),
            Self::Prefix(p) => Ok(format!("{p}{text}")),
            Self::Fail => Err(TranslateError::Other("stub translator failure".into())),
            Self::FailOn(marker) if text.contains(marker.as_str()) => Err(TranslateError::Other(
                format!("stub translator refused text containing {marker:?}"),
            )),
            Self::FailOn(_) => Ok(text.to_string()),
        }
    }
}
