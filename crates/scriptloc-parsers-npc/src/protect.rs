use once_cell::sync::Lazy;
use regex::Regex;

static COLOR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\^[0-9a-fA-F]{6}").unwrap());
static BRACKET_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\[\]]").unwrap());

/// Literal text with color codes and brackets swapped for tokens the
/// translation service leaves alone.
#[derive(Debug, Clone)]
pub(crate) struct Protected {
    pub text: String,
    colors: Vec<String>,
    brackets: Vec<String>,
}

impl Protected {
    pub fn new(raw: &str) -> Self {
        let (text, colors) = tokenize(&COLOR_RE, raw, "CLR");
        let (text, brackets) = tokenize(&BRACKET_RE, &text, "BR");
        Self {
            text,
            colors,
            brackets,
        }
    }

    pub fn restore(&self, translated: &str) -> String {
        let mut out = translated.to_string();
        for (i, b) in self.brackets.iter().enumerate() {
            out = out.replace(&token("BR", i), b);
        }
        for (i, c) in self.colors.iter().enumerate() {
            out = out.replace(&token("CLR", i), c);
        }
        out
    }
}

fn token(kind: &str, index: usize) -> String {
    format!("<<<{kind}{index}>>>")
}

fn tokenize(re: &Regex, s: &str, kind: &str) -> (String, Vec<String>) {
    let mut found = Vec::new();
    let text = re
        .replace_all(s, |caps: &regex::Captures<'_>| {
            let t = token(kind, found.len());
            found.push(caps[0].to_string());
            t
        })
        .into_owned();
    (text, found)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn colors_and_brackets_round_trip() {
        let raw = "[Guide] ^FF0000Red^000000 text";
        let p = Protected::new(raw);
        assert_eq!(p.text, "<<<BR0>>>Guide<<<BR1>>> <<<CLR0>>>Red<<<CLR1>>> text");
        assert_eq!(p.restore(&p.text), raw);
    }

    #[test]
    fn plain_text_is_untouched() {
        let p = Protected::new("Hello there");
        assert_eq!(p.text, "Hello there");
        assert_eq!(p.restore("你好"), "你好");
    }
}
