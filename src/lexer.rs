//! Classification of program characters.
//!
//! The lexer decides which characters are code and which are not: comment
//! text, label operands and inert characters. The pre-scan and the
//! interactive highlighter both go through it so they never disagree.

/// Toggles comment mode.
pub const COMMENT: char = '#';
/// Defines the label named by the next character.
pub const LABEL_DEF: char = '^';
/// Jumps to the label named by the next character.
pub const JUMP: char = 'v';

/// What a run of source characters means.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LexemeKind {
    /// One of `><+-.,[]`.
    Op(char),
    /// `^x`; `label` is `None` when the marker ends the program.
    LabelDef { label: Option<char> },
    /// `vx`; `label` is `None` when the marker ends the program.
    Jump { label: Option<char> },
    /// An opening or closing `#`.
    CommentDelimiter,
    /// Text between comment delimiters.
    Comment,
    /// Any other character outside a comment.
    Inert(char),
}

/// A classified span of the program, measured in chars.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lexeme {
    pub start: usize,
    pub len: usize,
    pub kind: LexemeKind,
}

/// Iterator over the lexemes of a program held as chars.
pub struct Lexer<'a> {
    chars: &'a [char],
    pos: usize,
    in_comment: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(chars: &'a [char]) -> Self {
        Self {
            chars,
            pos: 0,
            in_comment: false,
        }
    }
}

impl Iterator for Lexer<'_> {
    type Item = Lexeme;

    fn next(&mut self) -> Option<Lexeme> {
        let start = self.pos;
        let ch = *self.chars.get(start)?;

        if ch == COMMENT {
            self.in_comment = !self.in_comment;
            self.pos += 1;
            return Some(Lexeme { start, len: 1, kind: LexemeKind::CommentDelimiter });
        }

        if self.in_comment {
            let len = self.chars[start..]
                .iter()
                .take_while(|&&c| c != COMMENT)
                .count();
            self.pos += len;
            return Some(Lexeme { start, len, kind: LexemeKind::Comment });
        }

        let (len, kind) = match ch {
            '>' | '<' | '+' | '-' | '.' | ',' | '[' | ']' => (1, LexemeKind::Op(ch)),
            LABEL_DEF | JUMP => {
                let label = self.chars.get(start + 1).copied();
                let len = if label.is_some() { 2 } else { 1 };
                if ch == LABEL_DEF {
                    (len, LexemeKind::LabelDef { label })
                } else {
                    (len, LexemeKind::Jump { label })
                }
            }
            other => (1, LexemeKind::Inert(other)),
        };
        self.pos += len;
        Some(Lexeme { start, len, kind })
    }
}

/// Lex a whole program.
pub fn lex(chars: &[char]) -> Vec<Lexeme> {
    Lexer::new(chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<LexemeKind> {
        let chars: Vec<char> = src.chars().collect();
        lex(&chars).into_iter().map(|l| l.kind).collect()
    }

    #[test]
    fn label_operands_are_not_instructions() {
        assert_eq!(
            kinds("^[v]"),
            vec![
                LexemeKind::LabelDef { label: Some('[') },
                LexemeKind::Jump { label: Some(']') },
            ]
        );
    }

    #[test]
    fn comments_hide_code() {
        assert_eq!(
            kinds("+#[^a#-"),
            vec![
                LexemeKind::Op('+'),
                LexemeKind::CommentDelimiter,
                LexemeKind::Comment,
                LexemeKind::CommentDelimiter,
                LexemeKind::Op('-'),
            ]
        );
    }

    #[test]
    fn unterminated_comment_runs_to_end() {
        let chars: Vec<char> = "#abc".chars().collect();
        let lexemes = lex(&chars);
        assert_eq!(lexemes.last(), Some(&Lexeme { start: 1, len: 3, kind: LexemeKind::Comment }));
    }

    #[test]
    fn trailing_marker_has_no_label() {
        assert_eq!(kinds("+v"), vec![LexemeKind::Op('+'), LexemeKind::Jump { label: None }]);
    }

    #[test]
    fn other_characters_are_inert() {
        assert_eq!(kinds("a "), vec![LexemeKind::Inert('a'), LexemeKind::Inert(' ')]);
    }
}
