//! Script-aware translation for rAthena-style NPC scripts.
//!
//! Only the player-visible string literals are sent to the translation service:
//! `mes` text, the first two arguments of `npctalk`, `select` menu entries that
//! contain Latin letters and the first argument of `F_Navi(...)` calls.
//! Everything else in a line is copied through unchanged, including line endings.

use std::ops::Range;

use once_cell::sync::Lazy;
use regex::Regex;
use scriptloc_translate::{Translate, TranslateError};

mod protect;

use protect::Protected;

/// Joins several literals into one request so the service sees them in context.
pub const SEPARATOR: &str = "<<<SEP>>>";

static STRING_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r#""[^"]*""#).unwrap());
static MES_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bmes\b\s*(?P<expr>.+)$").unwrap());
static NPCTALK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bnpctalk\b\s*(?P<expr>.+)$").unwrap());
static SELECT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bselect\b\s*(?P<expr>.+)$").unwrap());
static F_NAVI_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"F_Navi\s*\(").unwrap());
static DOTS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[.．。…]+$").unwrap());

/// Wraps a plain translator and applies it literal by literal.
pub struct ScriptTranslator<T> {
    inner: T,
}

impl<T: Translate> ScriptTranslator<T> {
    pub fn new(inner: T) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> T {
        self.inner
    }
}

impl<T: Translate> Translate for ScriptTranslator<T> {
    fn translate(&self, text: &str) -> Result<String, TranslateError> {
        translate_script(text, &self.inner)
    }
}

/// Translate a whole script. Any failed call fails the whole text, so callers never
/// see a partially translated result.
pub fn translate_script<T: Translate + ?Sized>(
    text: &str,
    t: &T,
) -> Result<String, TranslateError> {
    let mut out = String::with_capacity(text.len() + text.len() / 2);
    for (idx, raw) in text.split_inclusive('\n').enumerate() {
        let (body, eol) = split_eol(raw);
        let translated = translate_line(body, t).inspect_err(|e| {
            tracing::debug!(event = "npc_line_failed", line = idx + 1, error = %e);
        })?;
        out.push_str(&translated);
        out.push_str(eol);
    }
    Ok(out)
}

fn split_eol(line: &str) -> (&str, &str) {
    if let Some(body) = line.strip_suffix("\r\n") {
        (body, "\r\n")
    } else if let Some(body) = line.strip_suffix('\n') {
        (body, "\n")
    } else {
        (line, "")
    }
}

fn translate_line<T: Translate + ?Sized>(body: &str, t: &T) -> Result<String, TranslateError> {
    if body.trim_start().starts_with("//") || !body.contains('"') {
        return Ok(body.to_string());
    }
    if let Some(expr) = MES_RE.captures(body).and_then(|c| c.name("expr")) {
        let new_expr = process_mes(expr.as_str(), t)?;
        return Ok(format!("{}{}", &body[..expr.start()], new_expr));
    }

    let line = translate_f_navi_calls(body, t)?;
    if let Some(expr) = NPCTALK_RE.captures(&line).and_then(|c| c.name("expr")) {
        let new_expr = process_npctalk(expr.as_str(), t)?;
        return Ok(format!("{}{}", &line[..expr.start()], new_expr));
    }
    if let Some(expr) = SELECT_RE.captures(&line).and_then(|c| c.name("expr")) {
        let new_expr = process_select(expr.as_str(), t)?;
        return Ok(format!("{}{}", &line[..expr.start()], new_expr));
    }
    Ok(line)
}

/// Byte ranges of `"..."` literals, quotes included.
fn literals(s: &str) -> Vec<Range<usize>> {
    STRING_RE.find_iter(s).map(|m| m.range()).collect()
}

fn content<'a>(s: &'a str, lit: &Range<usize>) -> &'a str {
    &s[lit.start + 1..lit.end - 1]
}

fn splice(s: &str, lits: &[Range<usize>], contents: &[String]) -> String {
    let mut out = String::with_capacity(s.len());
    let mut last = 0;
    for (lit, new) in lits.iter().zip(contents) {
        out.push_str(&s[last..lit.start]);
        out.push('"');
        out.push_str(new);
        out.push('"');
        last = lit.end;
    }
    out.push_str(&s[last..]);
    out
}

fn is_dots(s: &str) -> bool {
    DOTS_RE.is_match(s.trim())
}

fn escape_quotes(s: &str) -> String {
    s.replace('"', "\\\"")
}

/// Keep the original when the service handed back the same text.
fn choose(original: &str, candidate: &str) -> String {
    if candidate.trim() == original.trim() {
        original.to_string()
    } else {
        candidate.to_string()
    }
}

fn translate_one<T: Translate + ?Sized>(text: &str, t: &T) -> Result<String, TranslateError> {
    if text.trim().is_empty() {
        return Ok(text.to_string());
    }
    let candidate = t.translate(text)?;
    Ok(choose(text, &candidate))
}

/// Translate several protected literals with a single request, falling back to one
/// request per literal when the service mangles the separators.
fn translate_list<T: Translate + ?Sized>(
    texts: &[String],
    t: &T,
) -> Result<Vec<String>, TranslateError> {
    if texts.iter().all(|s| s.trim().is_empty()) {
        return Ok(texts.to_vec());
    }
    let combined = texts.join(SEPARATOR);
    let translated = t.translate(&combined)?;
    let parts: Vec<&str> = translated.split(SEPARATOR).collect();
    if parts.len() == texts.len() {
        return Ok(texts
            .iter()
            .zip(parts)
            .map(|(orig, cand)| choose(orig, cand))
            .collect());
    }

    tracing::debug!(
        event = "npc_separator_mismatch",
        expected = texts.len(),
        got = parts.len()
    );
    texts
        .iter()
        .map(|p| {
            if is_dots(p) {
                Ok(p.clone())
            } else {
                translate_one(p, t)
            }
        })
        .collect()
}

fn process_mes<T: Translate + ?Sized>(expr: &str, t: &T) -> Result<String, TranslateError> {
    let (replaced, navi) = hide_f_navi_calls(expr, t)?;
    let lits = literals(&replaced);
    if lits.is_empty() {
        return Ok(restore_placeholders(replaced, &navi));
    }

    let protected: Vec<Protected> = lits
        .iter()
        .map(|l| Protected::new(content(&replaced, l)))
        .collect();
    let texts: Vec<String> = protected.iter().map(|p| p.text.clone()).collect();
    let translated = translate_list(&texts, t)?;

    let contents: Vec<String> = lits
        .iter()
        .zip(protected.iter().zip(translated))
        .map(|(lit, (p, tr))| {
            let use_text = if is_dots(content(&replaced, lit)) {
                p.text.clone()
            } else {
                tr
            };
            escape_quotes(&p.restore(&use_text))
        })
        .collect();

    let rebuilt = splice(&replaced, &lits, &contents);
    Ok(restore_placeholders(rebuilt, &navi))
}

fn process_npctalk<T: Translate + ?Sized>(expr: &str, t: &T) -> Result<String, TranslateError> {
    let lits = literals(expr);
    if lits.is_empty() {
        return Ok(expr.to_string());
    }

    let mut contents = Vec::with_capacity(lits.len());
    for (i, lit) in lits.iter().enumerate() {
        let raw = content(expr, lit);
        let new = if raw.is_empty() || i > 1 {
            raw.to_string()
        } else if let (1, Some((before, after))) = (i, raw.split_once('#')) {
            // `Name#unique` keeps the hidden part after '#'
            let p = Protected::new(before);
            let chosen = translate_one(&p.text, t)?;
            if chosen == p.text {
                raw.to_string()
            } else {
                format!("{}#{}", escape_quotes(&p.restore(&chosen)), after)
            }
        } else {
            let p = Protected::new(raw);
            let chosen = translate_one(&p.text, t)?;
            escape_quotes(&p.restore(&chosen))
        };
        contents.push(new);
    }
    Ok(splice(expr, &lits, &contents))
}

fn process_select<T: Translate + ?Sized>(expr: &str, t: &T) -> Result<String, TranslateError> {
    let lits = literals(expr);
    let wanted: Vec<bool> = lits
        .iter()
        .map(|l| content(expr, l).chars().any(|c| c.is_ascii_alphabetic()))
        .collect();
    if !wanted.iter().any(|w| *w) {
        return Ok(expr.to_string());
    }

    let protected: Vec<Protected> = lits
        .iter()
        .zip(&wanted)
        .filter(|(_, w)| **w)
        .map(|(l, _)| Protected::new(content(expr, l)))
        .collect();
    let texts: Vec<String> = protected.iter().map(|p| p.text.clone()).collect();
    let mut translated = translate_list(&texts, t)?.into_iter();
    let mut protected = protected.iter();

    let mut contents = Vec::with_capacity(lits.len());
    for (lit, w) in lits.iter().zip(&wanted) {
        if !*w {
            contents.push(content(expr, lit).to_string());
            continue;
        }
        match (protected.next(), translated.next()) {
            (Some(p), Some(tr)) => contents.push(escape_quotes(&p.restore(&tr))),
            _ => contents.push(content(expr, lit).to_string()),
        }
    }
    Ok(splice(expr, &lits, &contents))
}

/// End of the call whose argument list starts at `from`, just past the closing paren.
fn call_end(text: &str, from: usize) -> usize {
    let mut depth = 0usize;
    for (i, ch) in text[from..].char_indices() {
        match ch {
            '(' => depth += 1,
            ')' if depth == 0 => return from + i + 1,
            ')' => depth -= 1,
            _ => {}
        }
    }
    text.len()
}

/// Replace each `F_Navi(...)` call with a placeholder. The returned pairs map
/// placeholders to the call text with its first literal translated, so later
/// passes never touch the call's other arguments.
fn hide_f_navi_calls<T: Translate + ?Sized>(
    text: &str,
    t: &T,
) -> Result<(String, Vec<(String, String)>), TranslateError> {
    let mut out = String::with_capacity(text.len());
    let mut calls = Vec::new();
    let mut last = 0;
    for m in F_NAVI_RE.find_iter(text) {
        if m.start() < last {
            continue;
        }
        let end = call_end(text, m.end());
        out.push_str(&text[last..m.start()]);
        let call = &text[m.start()..end];
        match literals(call).first() {
            None => out.push_str(call),
            Some(lit) => {
                let p = Protected::new(content(call, lit));
                let translated = translate_list(std::slice::from_ref(&p.text), t)?
                    .pop()
                    .unwrap_or_else(|| p.text.clone());
                let new_call = format!(
                    "{}\"{}\"{}",
                    &call[..lit.start],
                    escape_quotes(&p.restore(&translated)),
                    &call[lit.end..]
                );
                let placeholder = format!("__F_NAV_{}__", calls.len());
                out.push_str(&placeholder);
                calls.push((placeholder, new_call));
            }
        }
        last = end;
    }
    out.push_str(&text[last..]);
    Ok((out, calls))
}

fn restore_placeholders(mut text: String, calls: &[(String, String)]) -> String {
    for (placeholder, call) in calls {
        text = text.replace(placeholder, call);
    }
    text
}

fn translate_f_navi_calls<T: Translate + ?Sized>(
    line: &str,
    t: &T,
) -> Result<String, TranslateError> {
    let (replaced, calls) = hide_f_navi_calls(line, t)?;
    Ok(restore_placeholders(replaced, &calls))
}
