//! Two-grammar tokenizer. Switches between ordinary `;`-terminated SQL,
//! single `---`-prefixed directive lines, and `/** ... **/` bracketed
//! directive blocks, tracking a single `typemode` flag. Strictly
//! single-threaded and non-restartable: it borrows the source buffer and
//! walks it once.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Eof,
    SlComment,
    Sql,
    Meta,
    EnterType,
    LeaveType,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub kind: LineKind,
    /// Single-element for `Sql` (the raw SQL text); directive tokens for `Meta`.
    pub tokens: Vec<String>,
}

pub struct Lexer<'a> {
    bytes: &'a [u8],
    pos: usize,
    typemode: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            bytes: source.as_bytes(),
            pos: 0,
            typemode: false,
        }
    }

    fn rest(&self) -> &'a [u8] {
        &self.bytes[self.pos..]
    }

    fn starts_with(&self, needle: &str) -> bool {
        self.rest().starts_with(needle.as_bytes())
    }

    fn is_ws(b: u8) -> bool {
        matches!(b, b' ' | b'\t' | b'\r' | b'\n')
    }

    fn skip_ws(&mut self) {
        while self.pos < self.bytes.len() && Self::is_ws(self.bytes[self.pos]) {
            self.pos += 1;
        }
    }

    fn is_meta_id(b: u8) -> bool {
        b == b'_' || b.is_ascii_alphanumeric()
    }

    /// Advances past the next line, returning its classification. Returns
    /// `None` once every byte has been consumed (there is no trailing
    /// `Eof` token emitted; callers stop iterating on `None`).
    fn next_line(&mut self) -> Option<Line> {
        self.skip_ws();
        if self.pos >= self.bytes.len() {
            return None;
        }

        if self.starts_with("/**") {
            self.pos += 3;
            return Some(Line {
                kind: LineKind::EnterType,
                tokens: Vec::new(),
            });
        }

        if self.starts_with("/*") {
            self.consume_block_comment();
            return Some(Line {
                kind: LineKind::SlComment,
                tokens: Vec::new(),
            });
        }

        if self.typemode && self.starts_with("**/") {
            self.pos += 3;
            return Some(Line {
                kind: LineKind::LeaveType,
                tokens: Vec::new(),
            });
        }

        if self.typemode || self.starts_with("---") {
            if !self.typemode {
                self.pos += 3;
            }
            let tokens = self.consume_directive();
            return Some(Line {
                kind: LineKind::Meta,
                tokens,
            });
        }

        if self.starts_with("--") {
            while self.pos < self.bytes.len()
                && self.bytes[self.pos] != b'\r'
                && self.bytes[self.pos] != b'\n'
            {
                self.pos += 1;
            }
            return Some(Line {
                kind: LineKind::SlComment,
                tokens: Vec::new(),
            });
        }

        let start = self.pos;
        while self.pos < self.bytes.len() && self.bytes[self.pos] != b';' {
            self.pos += 1;
        }
        if self.pos >= self.bytes.len() {
            // Unterminated trailing SQL text: treat as end-of-input.
            self.pos = start;
            return None;
        }
        let text = String::from_utf8_lossy(&self.bytes[start..self.pos]).into_owned();
        self.pos += 1; // consume ';'
        Some(Line {
            kind: LineKind::Sql,
            tokens: vec![text],
        })
    }

    fn consume_block_comment(&mut self) {
        while self.pos + 1 < self.bytes.len() {
            if self.bytes[self.pos] == b'*' && self.bytes[self.pos + 1] == b'/' {
                self.pos += 2;
                return;
            }
            self.pos += 1;
        }
        self.pos = self.bytes.len();
    }

    fn is_meta_eol(&self) -> bool {
        self.pos >= self.bytes.len() || self.bytes[self.pos] == b';'
    }

    fn consume_directive(&mut self) -> Vec<String> {
        let mut tokens = Vec::new();
        while !self.is_meta_eol() {
            let b = self.bytes[self.pos];
            if Self::is_ws(b) {
                while !self.is_meta_eol() && Self::is_ws(self.bytes[self.pos]) {
                    self.pos += 1;
                }
            } else if b == b'/' && self.pos + 1 < self.bytes.len() && self.bytes[self.pos + 1] == b'*' {
                self.consume_block_comment();
            } else if b == b'-' && self.pos + 1 < self.bytes.len() && self.bytes[self.pos + 1] == b'-' {
                while self.pos < self.bytes.len()
                    && self.bytes[self.pos] != b'\n'
                    && !self.is_meta_eol()
                {
                    self.pos += 1;
                }
            } else if b == b'\'' {
                self.pos += 1;
                let start = self.pos;
                while self.pos < self.bytes.len() && self.bytes[self.pos] != b'\'' {
                    self.pos += 1;
                }
                let s = String::from_utf8_lossy(&self.bytes[start..self.pos]).into_owned();
                if self.pos < self.bytes.len() {
                    self.pos += 1; // closing quote
                }
                tokens.push(s);
            } else if Self::is_meta_id(b) {
                let start = self.pos;
                while self.pos < self.bytes.len() && Self::is_meta_id(self.bytes[self.pos]) {
                    self.pos += 1;
                }
                tokens.push(String::from_utf8_lossy(&self.bytes[start..self.pos]).into_owned());
            } else {
                // Punctuation run: anything that's neither EOL, whitespace, nor an identifier.
                let start = self.pos;
                while !self.is_meta_eol()
                    && !Self::is_ws(self.bytes[self.pos])
                    && !Self::is_meta_id(self.bytes[self.pos])
                {
                    self.pos += 1;
                    if self.pos >= self.bytes.len() {
                        break;
                    }
                }
                if self.pos > start {
                    tokens.push(String::from_utf8_lossy(&self.bytes[start..self.pos]).into_owned());
                } else {
                    // Defensive: guarantee forward progress on any unexpected byte.
                    self.pos += 1;
                }
            }
        }
        if self.pos < self.bytes.len() && self.bytes[self.pos] == b';' {
            self.pos += 1;
        }
        tokens
    }
}

impl Iterator for Lexer<'_> {
    type Item = Line;

    fn next(&mut self) -> Option<Self::Item> {
        let line = self.next_line()?;
        match line.kind {
            LineKind::EnterType => self.typemode = true,
            LineKind::LeaveType => self.typemode = false,
            _ => {}
        }
        Some(line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<LineKind> {
        Lexer::new(source).map(|l| l.kind).collect()
    }

    #[test]
    fn plain_sql_statement() {
        let lines: Vec<_> = Lexer::new("CREATE TABLE t(id INTEGER);").collect();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].kind, LineKind::Sql);
        assert_eq!(lines[0].tokens, vec!["CREATE TABLE t(id INTEGER)"]);
    }

    #[test]
    fn directive_line_tokenizes() {
        let lines: Vec<_> = Lexer::new("---DEFINE DATABASE Auth;").collect();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].kind, LineKind::Meta);
        assert_eq!(lines[0].tokens, vec!["DEFINE", "DATABASE", "Auth"]);
    }

    #[test]
    fn quoted_strings_keep_inner_bytes_verbatim() {
        let lines: Vec<_> = Lexer::new("---HCODE 'a; b -- c';").collect();
        assert_eq!(lines[0].tokens, vec!["HCODE", "a; b -- c"]);
    }

    #[test]
    fn typemode_block_treats_every_line_as_directive() {
        let src = "/** VTYPE foo bar; VTYPE baz qux; **/";
        let lines: Vec<_> = Lexer::new(src).collect();
        assert_eq!(
            lines.iter().map(|l| l.kind).collect::<Vec<_>>(),
            vec![
                LineKind::EnterType,
                LineKind::Meta,
                LineKind::Meta,
                LineKind::LeaveType
            ]
        );
        assert_eq!(lines[1].tokens, vec!["VTYPE", "foo", "bar"]);
        assert_eq!(lines[2].tokens, vec!["VTYPE", "baz", "qux"]);
    }

    #[test]
    fn line_comments_and_block_comments_are_skipped() {
        assert_eq!(
            kinds("-- a comment\n/* another */\nSELECT 1;"),
            vec![LineKind::SlComment, LineKind::SlComment, LineKind::Sql]
        );
    }

    #[test]
    fn enum_directive_with_punctuation_tokens() {
        let lines: Vec<_> = Lexer::new("---ENUM Color(RED GREEN BLUE);").collect();
        assert_eq!(
            lines[0].tokens,
            vec!["ENUM", "Color", "(", "RED", "GREEN", "BLUE", ")"]
        );
    }
}
