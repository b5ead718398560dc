//! Text rewrites applied to decoded statement, answer and solution text.
//!
//! Each rewrite is a fixed, non-greedy regex applied once; nothing is nested
//! or re-scanned.

/// Generic markup cleanup shared by both dialects.
pub(crate) fn clean_text(text: &str) -> String {
    let text = regex!(r"\\bf\{(.*?)\}").replace_all(text, "<b>${1}</b>");
    let text = regex!(r"\\it\{(.*?)\}").replace_all(&text, "<i>${1}</i>");
    let text = regex!(r"\\uline\{(.*?)\}").replace_all(&text, "<i>${1}</i>");
    let text = regex!(r"\\\[\s*(.*?)\s*\\\]").replace_all(&text, "$$${1}$$");
    let text = regex!(r"<center>(.*?)</center>").replace_all(&text, r#"<p style="text-align:center">${1}</p>"#);
    text.into_owned()
}

/// `${name}`, `${name[$i]}`, `$name` and `$name[$i]` lose their sigils.
fn strip_sigils(text: &str) -> String {
    let text = regex!(r"\$\{(\w+)(\[)?\$?(\w+\])?\}").replace_all(text, "${1}${2}${3}");
    regex!(r"\$(\w+)(\[)?\$?(\w+\])?").replace_all(&text, "${1}${2}${3}").into_owned()
}

/// Cleanup for the legacy tag dialect: inline equations and sigil
/// references become `@{..}` placeholders, set notation tags become LaTeX,
/// then the generic rewrites run.
pub(crate) fn clean_legacy_text(text: &str) -> String {
    let text = text.trim();
    let text = regex!(r"<(?:eqn|EQN) (.*?)>")
        .replace_all(text, |caps: &regex::Captures<'_>| format!("@{{{}}}", strip_sigils(&caps[1])));
    let text = regex!(r"<(?:eqn|EQN)>(.*?)</(?:eqn|EQN)>")
        .replace_all(&text, |caps: &regex::Captures<'_>| format!("@{{{}}}", strip_sigils(&caps[1])));
    let text = regex!(r"\$\{(\w+)(\[)?\$?(\w+\])?\}").replace_all(&text, "@{${1}${2}${3}}");
    let text = regex!(r"\$(\w+)(\[)?\$?(\w+\])?").replace_all(&text, "@{${1}${2}${3}}");
    let text = text.replace("<s:union>", "\\cup").replace("<s:intersect>", "\\cap").replace("<s:element>", "\\in");
    clean_text(&text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn generic_rewrites() {
        assert_eq!(clean_text(r"\bf{Note} and \it{this} and \uline{that}"), "<b>Note</b> and <i>this</i> and <i>that</i>");
        assert_eq!(clean_text(r"Solve \[ x^2 = 4 \] now"), "Solve $x^2 = 4$ now");
        assert_eq!(clean_text("<center>@{a}</center>"), r#"<p style="text-align:center">@{a}</p>"#);
    }

    #[test]
    fn rewrites_are_non_greedy() {
        assert_eq!(clean_text(r"\bf{a} x \bf{b}"), "<b>a</b> x <b>b</b>");
    }

    #[test]
    fn legacy_sigils_become_placeholders() {
        assert_eq!(clean_legacy_text("Let $a and ${b} be given"), "Let @{a} and @{b} be given");
        assert_eq!(clean_legacy_text("pick $xs[$i]"), "pick @{xs[i]}");
        assert_eq!(clean_legacy_text("value <eqn $a*$b> done"), "value @{a*b} done");
        assert_eq!(clean_legacy_text("<EQN>$a+1</EQN>"), "@{a+1}");
    }

    #[test]
    fn legacy_set_notation() {
        assert_eq!(clean_legacy_text("A <s:union> B <s:intersect> C, x <s:element> A"), r"A \cup B \cap C, x \in A");
    }
}
