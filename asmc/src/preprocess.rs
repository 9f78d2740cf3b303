//! Strips comments and blank lines before lexing, so the rest of the
//! pipeline only ever sees non-empty, single-spaced lines.

/// Strip `;` comments, trim, drop empty lines and collapse internal
/// whitespace runs to a single space. Idempotent: `minify(minify(s)) ==
/// minify(s)`.
pub fn minify(source: &str) -> String {
    source
        .lines()
        .map(strip_comment)
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(collapse_whitespace)
        .collect::<Vec<_>>()
        .join("\n")
}

fn strip_comment(line: &str) -> &str {
    match line.find(';') {
        Some(idx) => &line[..idx],
        None => line,
    }
}

fn collapse_whitespace(line: &str) -> String {
    line.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn strips_comments_and_blank_lines() {
        let input = "mov %rax, 1 ; load one\n\n; a full line comment\nhlt\n";
        assert_eq!(minify(input), "mov %rax, 1\nhlt");
    }

    #[test]
    fn collapses_internal_whitespace() {
        assert_eq!(minify("mov   %rax,    1"), "mov %rax, 1");
    }

    #[test]
    fn is_idempotent() {
        let once = minify("mov %rax, 1  ; c\n\nhlt");
        let twice = minify(&once);
        assert_eq!(once, twice);
    }
}
