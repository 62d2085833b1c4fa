use std::borrow::Cow;

const MARKER: &str = "Translated By";
const PREFIX: &str = "//===== ";
const TITLE: &str = "Translated By:";
const DEFAULT_WIDTH: usize = 60;

/// A full-width `//====...` rule; a short `//=` is a blank description line.
fn is_separator(line: &str) -> bool {
    line.trim().strip_prefix("//").is_some_and(|rest| {
        rest.len() >= DEFAULT_WIDTH - 2 && rest.bytes().all(|b| b == b'=')
    })
}

/// Add a `Translated By` credit to a script's header comment block.
///
/// The block goes right before the first `//=====...` separator line, or after
/// the leading `//` comment block when there is none. Its width follows the first
/// `//===== Key:` line above it. Text that already carries a credit is returned as is.
pub fn insert_translated_by_header<'a>(text: &'a str, author: &str) -> Cow<'a, str> {
    if text.contains(MARKER) {
        return Cow::Borrowed(text);
    }
    let nl = if text.contains("\r\n") { "\r\n" } else { "\n" };
    let lines: Vec<&str> = text.split_inclusive('\n').collect();

    let insert_at = lines.iter().position(|l| is_separator(l)).unwrap_or_else(|| {
        lines
            .iter()
            .take_while(|l| l.trim_start().starts_with("//"))
            .enumerate()
            .filter(|(_, l)| l.contains('='))
            .last()
            .map_or(0, |(i, _)| i + 1)
    });

    let width = lines[..insert_at]
        .iter()
        .map(|l| l.trim_end())
        .find(|l| l.starts_with(PREFIX) && l.contains(':'))
        .map_or(DEFAULT_WIDTH, |l| l.chars().count());
    let equals = width.saturating_sub(PREFIX.len() + TITLE.len() + 1);

    let mut out = String::with_capacity(text.len() + width * 2);
    for line in &lines[..insert_at] {
        out.push_str(line);
    }
    if insert_at > 0 && !lines[insert_at - 1].ends_with('\n') {
        out.push_str(nl);
    }
    out.push_str(PREFIX);
    out.push_str(TITLE);
    out.push(' ');
    out.push_str(&"=".repeat(equals));
    out.push_str(nl);
    out.push_str("//= ");
    out.push_str(author);
    out.push_str(nl);
    for line in &lines[insert_at..] {
        out.push_str(line);
    }
    Cow::Owned(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEP: &str = "//============================================================";

    #[test]
    fn inserted_before_separator_matching_header_width() {
        let header = "//===== By: ==================================================";
        let text = format!("{header}\n//= Shop\n{SEP}\nprontera,1,1,0\tscript\tA\t1,{{}}\n");
        let out = insert_translated_by_header(&text, "dsc");
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[2].len(), header.len());
        assert!(lines[2].starts_with("//===== Translated By: ="));
        assert_eq!(lines[3], "//= dsc");
        assert_eq!(lines[4], SEP);
    }

    #[test]
    fn blank_description_lines_are_not_separators() {
        let header = "//===== rAthena Script ======================================";
        let text = format!("{header}\n//= Shop\n//=\n//= More description\n{SEP}\nmes \"x\";\n");
        let out = insert_translated_by_header(&text, "dsc");
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[2], "//=");
        assert_eq!(lines[3], "//= More description");
        assert!(lines[4].starts_with("//===== Translated By: ="));
        assert_eq!(lines[5], "//= dsc");
        assert_eq!(lines[6], SEP);
    }

    #[test]
    fn falls_back_to_end_of_comment_block_with_crlf() {
        let text = "//= Header ==\r\n//= Notes\r\nmes \"x\";\r\n";
        let out = insert_translated_by_header(text, "me");
        assert_eq!(
            out,
            format!(
                "//= Header ==\r\n//= Notes\r\n//===== Translated By: {}\r\n//= me\r\nmes \"x\";\r\n",
                "=".repeat(37)
            )
        );
    }

    #[test]
    fn no_header_inserts_at_top_and_existing_credit_is_kept() {
        let out = insert_translated_by_header("mes \"x\";", "me");
        assert!(out.starts_with("//===== Translated By: "));
        assert!(out.ends_with("//= me\nmes \"x\";"));

        let credited = "//===== Translated By: ===\n//= someone\n";
        assert!(matches!(
            insert_translated_by_header(credited, "me"),
            Cow::Borrowed(_)
        ));
    }
}
