// fixup.rs — normalizes cart dialect sugar into plain Lua.
//
// Handled forms:
//   - `!=`                      -> `~=`
//   - `?expr`                   -> `print(expr)`
//   - `a += b` (and -= *= /= %= ..=)
//   - `if (cond) stmt`          -> `if (cond) then stmt end`
//   - `if (cond) stmt else s2`  -> `if (cond) then stmt else s2 end`
//
// All transforms are string- and comment-aware, including long brackets
// (`[[ ]]`, `[=[ ]=]`) spanning multiple lines.

use alloc::string::String;
use alloc::vec::Vec;

/// Carry state between lines: inside a long bracket (string or comment) of
/// a given level, or not.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Block {
    None,
    Long(usize),
}

pub fn fix_dialect(code: &str) -> String {
    let mut out = String::with_capacity(code.len() + code.len() / 8);
    let mut block = Block::None;
    for line in code.lines() {
        fix_line(line, &mut block, &mut out);
        out.push('\n');
    }
    out
}

/// `[` + n `=` + `[` at `i`; returns the level and the opener length.
fn long_open(b: &[u8], i: usize) -> Option<(usize, usize)> {
    if b.get(i) != Some(&b'[') {
        return None;
    }
    let mut level = 0;
    while b.get(i + 1 + level) == Some(&b'=') {
        level += 1;
    }
    if b.get(i + 1 + level) == Some(&b'[') {
        Some((level, level + 2))
    } else {
        None
    }
}

/// Position right after the matching `]` + n `=` + `]`, if on this line.
fn long_close(b: &[u8], from: usize, level: usize) -> Option<usize> {
    let mut i = from;
    while i + level + 1 < b.len() {
        if b[i] == b']'
            && b[i + 1 + level] == b']'
            && b[i + 1..i + 1 + level].iter().all(|&c| c == b'=')
        {
            return Some(i + level + 2);
        }
        i += 1;
    }
    None
}

/// Per-byte mask of `line`: true where the byte belongs to a string or
/// comment. Also returns where a to-end-of-line comment begins (or the
/// line length), and updates `block` when a long bracket stays open.
fn literal_mask(line: &str, block: &mut Block) -> (Vec<bool>, usize) {
    let b = line.as_bytes();
    let mut mask = Vec::new();
    mask.resize(b.len(), false);
    let mut i = 0;

    while i < b.len() {
        match b[i] {
            b'-' if b.get(i + 1) == Some(&b'-') => {
                if let Some((level, len)) = long_open(b, i + 2) {
                    match long_close(b, i + 2 + len, level) {
                        Some(end) => {
                            for m in &mut mask[i..end] {
                                *m = true;
                            }
                            i = end;
                            continue;
                        }
                        None => *block = Block::Long(level),
                    }
                }
                for m in &mut mask[i..] {
                    *m = true;
                }
                return (mask, i);
            }
            b'\'' | b'"' => {
                let quote = b[i];
                mask[i] = true;
                i += 1;
                while i < b.len() {
                    mask[i] = true;
                    if b[i] == b'\\' {
                        if i + 1 < b.len() {
                            mask[i + 1] = true;
                        }
                        i += 2;
                        continue;
                    }
                    if b[i] == quote {
                        break;
                    }
                    i += 1;
                }
                i += 1;
            }
            b'[' => {
                if let Some((level, len)) = long_open(b, i) {
                    let end = long_close(b, i + len, level);
                    let stop = end.unwrap_or(b.len());
                    for m in &mut mask[i..stop] {
                        *m = true;
                    }
                    match end {
                        Some(e) => i = e,
                        None => {
                            *block = Block::Long(level);
                            return (mask, b.len());
                        }
                    }
                } else {
                    i += 1;
                }
            }
            _ => i += 1,
        }
    }
    (mask, b.len())
}

fn fix_line(line: &str, block: &mut Block, out: &mut String) {
    // Inside a long bracket: copy until its closer, then resume fixing.
    if let Block::Long(level) = *block {
        let b = line.as_bytes();
        match long_close(b, 0, level) {
            Some(end) => {
                out.push_str(&line[..end]);
                *block = Block::None;
                fix_line(&line[end..], block, out);
            }
            None => out.push_str(line),
        }
        return;
    }

    // Transforms never touch a trailing comment; it is split off here and
    // reattached verbatim.
    let (mask, comment_start) = literal_mask(line, block);
    let code = &line[..comment_start];
    let tail = &line[comment_start..];
    let mask = &mask[..comment_start];

    let trimmed = code.trim_start();
    let indent_len = code.len() - trimmed.len();

    // `?expr` print shorthand.
    if trimmed.starts_with('?') && !mask.get(indent_len).copied().unwrap_or(true) {
        let rest = &code[indent_len + 1..];
        let fixed = replace_neq(rest, &mask[indent_len + 1..]);
        out.push_str(&code[..indent_len]);
        out.push_str("print(");
        out.push_str(fixed.trim());
        out.push(')');
        out.push_str(tail);
        return;
    }

    // Single-line `if (cond) stmt [else stmt]`.
    if let Some(fixed) = fix_short_if(code, mask) {
        out.push_str(&fixed);
        out.push_str(tail);
        return;
    }

    let fixed = replace_neq(code, mask);
    out.push_str(&fix_compound(&fixed, mask));
    out.push_str(tail);
}

/// `!=` -> `~=` outside literals. Output length equals input length.
fn replace_neq(code: &str, mask: &[bool]) -> String {
    let b = code.as_bytes();
    let mut out = String::with_capacity(code.len());
    let mut i = 0;
    while i < b.len() {
        if !mask.get(i).copied().unwrap_or(false) && b[i] == b'!' && b.get(i + 1) == Some(&b'=') {
            out.push_str("~=");
            i += 2;
        } else {
            out.push(b[i] as char);
            i += 1;
        }
    }
    out
}

/// Rewrite `if (cond) stmt` when there is no `then` on the line.
fn fix_short_if(line: &str, mask: &[bool]) -> Option<String> {
    let trimmed = line.trim_start();
    let indent = &line[..line.len() - trimmed.len()];
    let rest = trimmed.strip_prefix("if")?;
    let after_if = rest.trim_start();
    if !after_if.starts_with('(') {
        return None;
    }

    // Find the parenthesis matching the condition opener.
    let base = line.len() - after_if.len();
    let b = line.as_bytes();
    let mut depth = 0i32;
    let mut close = None;
    for i in base..b.len() {
        if mask.get(i).copied().unwrap_or(false) {
            continue;
        }
        match b[i] {
            b'(' => depth += 1,
            b')' => {
                depth -= 1;
                if depth == 0 {
                    close = Some(i);
                    break;
                }
            }
            _ => {}
        }
    }
    let close = close?;
    let body_full = &line[close + 1..];
    let body = body_full.trim();
    if body.is_empty() || has_word(line, mask, "then") {
        return None;
    }

    let cond = replace_neq(&line[base..close + 1], &mask[base..close + 1]);

    // `else` splits the body into separately fixed statements.
    let body_start = close + 1 + (body_full.len() - body_full.trim_start().len());
    let body_mask = &mask[body_start..body_start + body.len()];
    let mut fixed_body = String::new();
    let mut offset = 0;
    for (i, part) in body.split(" else ").enumerate() {
        if i > 0 {
            fixed_body.push_str(" else ");
        }
        let part_mask = &body_mask[offset..offset + part.len()];
        let part = replace_neq(part, part_mask);
        fixed_body.push_str(&fix_compound(&part, part_mask));
        offset += part.len() + " else ".len();
    }

    let mut out = String::with_capacity(line.len() + 16);
    out.push_str(indent);
    out.push_str("if ");
    out.push_str(&cond);
    out.push_str(" then ");
    out.push_str(&fixed_body);
    out.push_str(" end");
    Some(out)
}

/// Whole-word search outside literals.
fn has_word(code: &str, mask: &[bool], word: &str) -> bool {
    find_word(code, mask, word).is_some()
}

fn find_word(code: &str, mask: &[bool], word: &str) -> Option<usize> {
    let b = code.as_bytes();
    let w = word.as_bytes();
    let is_ident = |c: u8| c.is_ascii_alphanumeric() || c == b'_';
    let mut i = 0;
    while i + w.len() <= b.len() {
        if !mask.get(i).copied().unwrap_or(false)
            && &b[i..i + w.len()] == w
            && (i == 0 || !is_ident(b[i - 1]))
            && (i + w.len() == b.len() || !is_ident(b[i + w.len()]))
        {
            return Some(i);
        }
        i += 1;
    }
    None
}

/// Rewrite the first `lhs op= rhs` outside literals into `lhs = lhs op (rhs)`.
/// `mask` must align with `code` byte for byte.
fn fix_compound(code: &str, mask: &[bool]) -> String {
    let b = code.as_bytes();
    let is_ident = |c: u8| c.is_ascii_alphanumeric() || c == b'_';

    for i in 0..b.len() {
        if mask.get(i).copied().unwrap_or(false) {
            continue;
        }
        let op: &str = if b[i..].starts_with(b"..=") {
            ".."
        } else if i + 1 < b.len()
            && matches!(b[i], b'+' | b'-' | b'*' | b'/' | b'%')
            && b[i + 1] == b'='
            && b.get(i + 2) != Some(&b'=')
        {
            match b[i] {
                b'+' => "+",
                b'-' => "-",
                b'*' => "*",
                b'/' => "/",
                _ => "%",
            }
        } else {
            continue;
        };

        // Walk back over the assignment target: identifiers, field access
        // and balanced index brackets.
        let mut end = i;
        while end > 0 && b[end - 1] == b' ' {
            end -= 1;
        }
        let mut start = end;
        while start > 0 {
            let c = b[start - 1];
            if is_ident(c) || c == b'.' {
                start -= 1;
            } else if c == b']' {
                let mut depth = 0;
                while start > 0 {
                    let c = b[start - 1];
                    start -= 1;
                    if c == b']' {
                        depth += 1;
                    } else if c == b'[' {
                        depth -= 1;
                        if depth == 0 {
                            break;
                        }
                    }
                }
            } else {
                break;
            }
        }
        if start == end {
            continue;
        }

        let lhs = &code[start..end];

        // The right-hand side runs to the end of the statement, which on a
        // one-liner means up to a closing `end` or a following `else`.
        let rhs_start = i + op.len() + 1;
        let rest = &code[rhs_start..];
        let rest_mask = &mask[rhs_start.min(mask.len())..];
        let stop = [find_word(rest, rest_mask, "end"), find_word(rest, rest_mask, "else")]
            .into_iter()
            .flatten()
            .min()
            .unwrap_or(rest.len());
        let (rhs_raw, suffix) = rest.split_at(stop);

        let mut out = String::with_capacity(code.len() + lhs.len() + 8);
        out.push_str(&code[..start]);
        out.push_str(lhs);
        out.push_str(" = ");
        out.push_str(lhs);
        out.push(' ');
        out.push_str(op);
        out.push_str(" (");
        out.push_str(rhs_raw.trim());
        out.push(')');
        if !suffix.is_empty() {
            out.push(' ');
            out.push_str(suffix);
        }
        return out;
    }
    String::from(code)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_equal_becomes_tilde() {
        assert_eq!(fix_dialect("if a != b then end"), "if a ~= b then end\n");
    }

    #[test]
    fn test_not_equal_inside_string_is_kept() {
        assert_eq!(fix_dialect("s = \"a != b\""), "s = \"a != b\"\n");
    }

    #[test]
    fn test_compound_assignment() {
        assert_eq!(fix_dialect("x += 1"), "x = x + (1)\n");
        assert_eq!(fix_dialect("x -= y * 2"), "x = x - (y * 2)\n");
        assert_eq!(fix_dialect("t.count *= 2"), "t.count = t.count * (2)\n");
        assert_eq!(fix_dialect("a[i+1] /= 2"), "a[i+1] = a[i+1] / (2)\n");
        assert_eq!(fix_dialect("s ..= \"x\""), "s = s .. (\"x\")\n");
        assert_eq!(fix_dialect("x %= 3"), "x = x % (3)\n");
    }

    #[test]
    fn test_compound_inside_string_is_kept() {
        assert_eq!(fix_dialect("s = \"x += 1\""), "s = \"x += 1\"\n");
    }

    #[test]
    fn test_compound_stops_before_closing_keyword() {
        assert_eq!(
            fix_dialect("if done then n += 1 end"),
            "if done then n = n + (1) end\n"
        );
        assert_eq!(
            fix_dialect("while x do y += 2 end"),
            "while x do y = y + (2) end\n"
        );
        assert_eq!(
            fix_dialect("if a then x += 1 else x = 2 end"),
            "if a then x = x + (1) else x = 2 end\n"
        );
    }

    #[test]
    fn test_comparisons_are_not_compounds() {
        assert_eq!(fix_dialect("if x == 1 then end"), "if x == 1 then end\n");
        assert_eq!(fix_dialect("a = b <= c"), "a = b <= c\n");
    }

    #[test]
    fn test_print_shorthand() {
        assert_eq!(fix_dialect("?\"hello\""), "print(\"hello\")\n");
        assert_eq!(fix_dialect("  ?x, y"), "  print(x, y)\n");
    }

    #[test]
    fn test_single_line_if() {
        assert_eq!(fix_dialect("if (x > 0) x = 0"), "if (x > 0) then x = 0 end\n");
        assert_eq!(
            fix_dialect("if (a != b) c += 1"),
            "if (a ~= b) then c = c + (1) end\n"
        );
    }

    #[test]
    fn test_single_line_if_else() {
        assert_eq!(
            fix_dialect("if (n<0) s=-1 else s=1"),
            "if (n<0) then s=-1 else s=1 end\n"
        );
    }

    #[test]
    fn test_single_line_if_with_nested_parens() {
        assert_eq!(
            fix_dialect("if (f(a, b) > 0) g()"),
            "if (f(a, b) > 0) then g() end\n"
        );
    }

    #[test]
    fn test_regular_if_is_untouched() {
        assert_eq!(
            fix_dialect("if (x > 0) then x = 0 end"),
            "if (x > 0) then x = 0 end\n"
        );
        assert_eq!(
            fix_dialect("if (a) or (b) then f() end"),
            "if (a) or (b) then f() end\n"
        );
        assert_eq!(fix_dialect("if (x) then"), "if (x) then\n");
    }

    #[test]
    fn test_multiline_if_condition_line_is_untouched() {
        assert_eq!(fix_dialect("if (x > 0)"), "if (x > 0)\n");
    }

    #[test]
    fn test_line_comments_are_preserved() {
        assert_eq!(fix_dialect("x = 1 -- note"), "x = 1 -- note\n");
        assert_eq!(
            fix_dialect("y = 2 -- x += 1 stays"),
            "y = 2 -- x += 1 stays\n"
        );
    }

    #[test]
    fn test_compound_before_comment_closes_its_parenthesis() {
        assert_eq!(fix_dialect("x += 1 -- bump"), "x = x + (1)-- bump\n");
    }

    #[test]
    fn test_short_if_with_trailing_comment() {
        assert_eq!(
            fix_dialect("if (x) y=1 -- note"),
            "if (x) then y=1 end-- note\n"
        );
    }

    #[test]
    fn test_block_string_spans_lines_untouched() {
        let src = "s = [[\na != b\nx += 1\n]]\ny += 1";
        let out = fix_dialect(src);
        assert!(out.contains("a != b"), "long string content is verbatim");
        assert!(out.contains("x += 1"), "long string content is verbatim");
        assert!(out.ends_with("y = y + (1)\n"), "code resumes after the closer");
    }

    #[test]
    fn test_block_comment_spans_lines() {
        let src = "--[[\nx += 1\n]]\nz += 1";
        let out = fix_dialect(src);
        assert!(out.contains("\nx += 1\n"));
        assert!(out.ends_with("z = z + (1)\n"));
    }

    #[test]
    fn test_leveled_long_bracket() {
        let src = "s = [=[\na != b\n]=]\nk += 1";
        let out = fix_dialect(src);
        assert!(out.contains("a != b"));
        assert!(out.ends_with("k = k + (1)\n"));
    }
}
