use std::time::Duration;

use crate::{Translate, TranslateError};

const MAX_ERROR_BODY: usize = 200;

#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// LibreTranslate-compatible `/translate` URL.
    pub endpoint: String,
    pub api_key: Option<String>,
    pub source_lang: String,
    pub target_lang: String,
    pub timeout: Duration,
}

/// Map loose Simplified Chinese spellings to the code translation services expect.
pub fn normalize_target(code: &str) -> String {
    match code.to_ascii_lowercase().as_str() {
        "zh-cn" | "zh_cn" | "zhcn" | "zh" | "zh-hans" => "zh".to_string(),
        _ => code.to_string(),
    }
}

/// Blocking JSON client for a LibreTranslate-style service.
pub struct HttpTranslator {
    cfg: HttpConfig,
    client: reqwest::blocking::Client,
}

impl HttpTranslator {
    pub fn new(cfg: HttpConfig) -> Result<Self, TranslateError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(cfg.timeout)
            .build()
            .map_err(|e| TranslateError::Request(e.to_string()))?;
        Ok(Self { cfg, client })
    }

    fn map_error(&self, e: reqwest::Error) -> TranslateError {
        if e.is_timeout() {
            TranslateError::Timeout(self.cfg.timeout)
        } else {
            TranslateError::Request(e.to_string())
        }
    }
}

impl Translate for HttpTranslator {
    fn translate(&self, text: &str) -> Result<String, TranslateError> {
        #[derive(serde::Serialize)]
        struct In<'a> {
            q: &'a str,
            source: &'a str,
            target: &'a str,
            format: &'static str,
            #[serde(skip_serializing_if = "Option::is_none")]
            api_key: Option<&'a str>,
        }
        #[derive(serde::Deserialize)]
        struct Out {
            #[serde(rename = "translatedText")]
            translated_text: String,
        }

        let target = normalize_target(&self.cfg.target_lang);
        tracing::debug!(
            event = "translate_request",
            endpoint = %self.cfg.endpoint,
            chars = text.chars().count()
        );
        let resp = self
            .client
            .post(&self.cfg.endpoint)
            .json(&In {
                q: text,
                source: &self.cfg.source_lang,
                target: &target,
                format: "text",
                api_key: self.cfg.api_key.as_deref(),
            })
            .send()
            .map_err(|e| self.map_error(e))?;

        let status = resp.status();
        if !status.is_success() {
            let mut body = resp.text().unwrap_or_default();
            if body.len() > MAX_ERROR_BODY {
                let mut cut = MAX_ERROR_BODY;
                while !body.is_char_boundary(cut) {
                    cut -= 1;
                }
                body.truncate(cut);
            }
            return Err(TranslateError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let out: Out = resp.json().map_err(|e| {
            if e.is_timeout() {
                TranslateError::Timeout(self.cfg.timeout)
            } else {
                TranslateError::Response(e.to_string())
            }
        })?;
        Ok(out.translated_text)
    }
}
