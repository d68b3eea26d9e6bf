//! Lexer - Component Text to Token Stream
//!
//! Single left-to-right scan with bounded lookahead. Each construct is
//! scanned by its own small state machine. A construct that cannot be
//! completed is never an error: the text consumed so far stays part of
//! the surrounding literal and scanning resumes in plain mode at the
//! character that stalled it. Every such recovery is recorded so the
//! loader can report it.

use serde::{Deserialize, Serialize};

use crate::token::{ArgFragment, Inclusion, InlineArg, PropType, Token};

const SUB_OPENER: &str = "<ez";
const SUBS_OPENER: &str = "<ez-for";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Construct {
    Prop,
    Attr,
    Sub,
    Subs,
}

/// A construct that was abandoned and kept as literal text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recovery {
    pub construct: Construct,
    /// Byte offsets into the component source
    pub start: usize,
    pub end: usize,
    pub line: usize,
    pub column: usize,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Lexed {
    pub tokens: Vec<Token>,
    pub recovered: Vec<Recovery>,
}

struct Stall {
    at: usize,
    reason: &'static str,
}

impl Stall {
    fn new(at: usize, reason: &'static str) -> Self {
        Self { at, reason }
    }

    fn eof(at: usize) -> Self {
        Self::new(at, "unexpected end of input")
    }
}

type Scan = Result<(Token, usize), Stall>;

fn is_ws(c: u8) -> bool {
    matches!(c, b' ' | b'\t' | b'\r' | b'\n')
}

fn is_ident(c: u8) -> bool {
    c.is_ascii_alphanumeric() || c == b'_' || c == b'-'
}

/// Characters that can never appear in a prop name.
fn is_prop_stop(c: u8) -> bool {
    matches!(c, b'$' | b'{' | b'<' | b'/' | b'>' | b'&' | b'"')
}

/// Characters that can never appear in a name="..." or id="..." value.
fn is_value_stop(c: u8) -> bool {
    is_ws(c) || matches!(c, b'$' | b'{' | b':' | b'}' | b'<' | b'>' | b'&')
}

/// Reusable tokenizer. Holds no state between calls to [`Lexer::lex`].
#[derive(Debug, Default)]
pub struct Lexer {
    tokens: Vec<Token>,
    recovered: Vec<Recovery>,
    literal: String,
}

impl Lexer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lex(&mut self, src: &str) -> Lexed {
        self.tokens.clear();
        self.recovered.clear();
        self.literal.clear();

        let bytes = src.as_bytes();
        let mut pos = 0;
        // start of the pending literal run that has not been copied into `literal` yet
        let mut run = 0;
        let mut in_tag = false;
        // open quote of an attribute value inside the current tag
        let mut quote: Option<u8> = None;

        while pos < bytes.len() {
            let rest = &bytes[pos..];
            match bytes[pos] {
                b'\\' if rest.starts_with(b"\\${") => {
                    self.literal.push_str(&src[run..pos]);
                    self.literal.push_str("${");
                    pos += 3;
                    run = pos;
                }
                b'$' => match bytes.get(pos + 1) {
                    Some(b'{') => {
                        let scan = scan_prop(src, pos);
                        pos = self.commit(src, &mut run, pos, Construct::Prop, scan);
                    }
                    Some(b'*') => {
                        self.flush_run(src, &mut run, pos);
                        self.emit(Token::AttrsForward);
                        pos += 2;
                        run = pos;
                    }
                    Some(&c) if is_ident(c) && in_tag && quote.is_none() && pos > 0 && is_ws(bytes[pos - 1]) => {
                        let scan = scan_attr(src, pos);
                        pos = self.commit(src, &mut run, pos, Construct::Attr, scan);
                    }
                    _ => pos += 1,
                },
                b'<' if rest.starts_with(SUBS_OPENER.as_bytes())
                    && bytes.get(pos + SUBS_OPENER.len()).copied().is_some_and(is_ws) =>
                {
                    let scan = scan_inclusion(src, pos, SUBS_OPENER.len() + 1, true);
                    pos = self.commit(src, &mut run, pos, Construct::Subs, scan);
                }
                b'<' if rest.starts_with(SUB_OPENER.as_bytes())
                    && bytes.get(pos + SUB_OPENER.len()).copied().is_some_and(is_ws) =>
                {
                    let scan = scan_inclusion(src, pos, SUB_OPENER.len() + 1, false);
                    pos = self.commit(src, &mut run, pos, Construct::Sub, scan);
                }
                c @ (b'"' | b'\'') if in_tag => {
                    quote = match quote {
                        None => Some(c),
                        Some(q) if q == c => None,
                        open => open,
                    };
                    pos += 1;
                }
                b'<' if quote.is_none() => {
                    in_tag = bytes.get(pos + 1).is_some_and(u8::is_ascii_alphabetic);
                    pos += 1;
                }
                b'>' if quote.is_none() => {
                    in_tag = false;
                    pos += 1;
                }
                _ => pos += 1,
            }
        }

        self.flush_run(src, &mut run, bytes.len());
        self.flush_literal();

        Lexed {
            tokens: std::mem::take(&mut self.tokens),
            recovered: std::mem::take(&mut self.recovered),
        }
    }

    /// Emits the scanned token, or records the recovery and leaves the
    /// consumed text in the pending literal run. Returns the resume position.
    fn commit(&mut self, src: &str, run: &mut usize, start: usize, construct: Construct, scan: Scan) -> usize {
        match scan {
            Ok((token, end)) => {
                self.flush_run(src, run, start);
                self.emit(token);
                *run = end;
                end
            }
            Err(stall) => {
                // the opener is always consumed, so this still makes progress
                let resume = stall.at.max(start + 1);
                self.recovered.push(recovery(src, construct, start, stall));
                resume
            }
        }
    }

    fn flush_run(&mut self, src: &str, run: &mut usize, upto: usize) {
        self.literal.push_str(&src[*run..upto]);
        *run = upto;
    }

    fn flush_literal(&mut self) {
        if !self.literal.is_empty() {
            let text = std::mem::take(&mut self.literal);
            self.tokens.push(Token::Literal { text });
        }
    }

    fn emit(&mut self, token: Token) {
        self.flush_literal();
        self.tokens.push(token);
    }
}

fn recovery(src: &str, construct: Construct, start: usize, stall: Stall) -> Recovery {
    let before = &src[..start];
    let line = before.matches('\n').count() + 1;
    let column = before.rsplit('\n').next().map_or(0, |l| l.chars().count()) + 1;
    Recovery {
        construct,
        start,
        end: stall.at,
        line,
        column,
        reason: stall.reason.to_string(),
    }
}

/// Lex one component text with a fresh [`Lexer`].
pub fn lex(src: &str) -> Lexed {
    Lexer::new().lex(src)
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum PropState {
    PreName,
    Name,
    ColonOrEnd,
    PreType,
    Type,
    End,
}

/// `${ name : type }`, starting at the `$`.
fn scan_prop(src: &str, start: usize) -> Scan {
    let bytes = src.as_bytes();
    let mut i = start + 2;
    let mut state = PropState::PreName;
    let mut name = (0, 0);
    let mut type_start = 0;
    let mut prop_type = PropType::Any;

    loop {
        let Some(&c) = bytes.get(i) else {
            return Err(Stall::eof(i));
        };
        match state {
            PropState::PreName => {
                if is_ws(c) {
                    i += 1;
                } else {
                    name.0 = i;
                    state = PropState::Name;
                }
            }
            PropState::Name => match c {
                b':' | b'}' if i == name.0 => return Err(Stall::new(i, "expected a prop name")),
                b'}' => return Ok((Token::prop(&src[name.0..i], PropType::Any), i + 1)),
                b':' => {
                    name.1 = i;
                    i += 1;
                    state = PropState::PreType;
                }
                c if is_ws(c) => {
                    name.1 = i;
                    state = PropState::ColonOrEnd;
                }
                c if is_prop_stop(c) => return Err(Stall::new(i, "invalid character in prop name")),
                _ => i += 1,
            },
            PropState::ColonOrEnd => match c {
                c if is_ws(c) => i += 1,
                b':' => {
                    i += 1;
                    state = PropState::PreType;
                }
                b'}' => return Ok((Token::prop(&src[name.0..name.1], PropType::Any), i + 1)),
                _ => return Err(Stall::new(i, "expected ':' or '}'")),
            },
            PropState::PreType => {
                if is_ws(c) {
                    i += 1;
                } else {
                    type_start = i;
                    state = PropState::Type;
                }
            }
            PropState::Type => {
                if c.is_ascii_alphabetic() {
                    i += 1;
                } else {
                    match PropType::from_keyword(&src[type_start..i]) {
                        Some(t) => {
                            prop_type = t;
                            state = PropState::End;
                        }
                        None => return Err(Stall::new(i, "unknown prop type")),
                    }
                }
            }
            PropState::End => match c {
                c if is_ws(c) => i += 1,
                b'}' => return Ok((Token::prop(&src[name.0..name.1], prop_type), i + 1)),
                _ => return Err(Stall::new(i, "expected '}'")),
            },
        }
    }
}

/// ` $name` inside an opening tag, starting at the `$`.
fn scan_attr(src: &str, start: usize) -> Scan {
    let bytes = src.as_bytes();
    let mut i = start + 1;
    while bytes.get(i).copied().is_some_and(is_ident) {
        i += 1;
    }
    match bytes.get(i) {
        None => Err(Stall::eof(i)),
        Some(&c) if is_ws(c) || c == b'>' || c == b'/' => Ok((Token::attr(&src[start + 1..i]), i)),
        Some(_) => Err(Stall::new(i, "invalid character in attribute shorthand")),
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum SubState {
    PreNameOrId,
    NameOrId,
    Name,
    Id,
    NeedSpace,
    AfterArg,
    EndOrArg,
    Relay,
    ArgKey,
    ArgValue,
    ArgValueProp,
}

/// `<ez name="..." id="..." args... />` (or `<ez-for`), starting at the `<`.
fn scan_inclusion(src: &str, start: usize, opener_len: usize, repeated: bool) -> Scan {
    let bytes = src.as_bytes();
    let mut i = start + opener_len;
    let mut state = SubState::PreNameOrId;

    let mut name: Option<&str> = None;
    let mut id: Option<&str> = None;
    let mut args = Vec::new();

    // start of the value, key or prop reference currently being scanned
    let mut mark = 0;
    let mut key = "";
    let mut fragments = Vec::new();
    let mut text = String::new();
    let mut run = 0;

    loop {
        let Some(&c) = bytes.get(i) else {
            return Err(Stall::eof(i));
        };
        match state {
            SubState::PreNameOrId => {
                if is_ws(c) {
                    i += 1;
                } else {
                    state = SubState::NameOrId;
                }
            }
            SubState::NameOrId => {
                let rest = &bytes[i..];
                if rest.starts_with(b"name=\"") {
                    if name.is_some() {
                        return Err(Stall::new(i, "duplicate name attribute"));
                    }
                    i += 6;
                    mark = i;
                    state = SubState::Name;
                } else if rest.starts_with(b"id=\"") {
                    if id.is_some() {
                        return Err(Stall::new(i, "duplicate id attribute"));
                    }
                    i += 4;
                    mark = i;
                    state = SubState::Id;
                } else {
                    return Err(Stall::new(i, "expected name=\"...\" or id=\"...\""));
                }
            }
            SubState::Name | SubState::Id => match c {
                b'"' => {
                    if i == mark {
                        return Err(Stall::new(i, "empty name or id"));
                    }
                    let value = &src[mark..i];
                    if state == SubState::Name {
                        name = Some(value);
                    } else {
                        id = Some(value);
                    }
                    i += 1;
                    state = if name.is_some() && id.is_some() {
                        SubState::AfterArg
                    } else {
                        SubState::NeedSpace
                    };
                }
                // slashes address components in subdirectories
                b'/' if state == SubState::Name => i += 1,
                b'/' => return Err(Stall::new(i, "invalid character in id")),
                c if is_value_stop(c) => return Err(Stall::new(i, "invalid character in name or id")),
                _ => i += 1,
            },
            SubState::NeedSpace => {
                if is_ws(c) {
                    state = SubState::PreNameOrId;
                } else {
                    return Err(Stall::new(i, "expected whitespace"));
                }
            }
            SubState::AfterArg => {
                if is_ws(c) || c == b'/' {
                    state = SubState::EndOrArg;
                } else {
                    return Err(Stall::new(i, "expected whitespace or '/>'"));
                }
            }
            SubState::EndOrArg => match c {
                c if is_ws(c) => i += 1,
                b'/' => {
                    if bytes.get(i + 1) != Some(&b'>') {
                        return Err(Stall::new(i, "expected '/>'"));
                    }
                    let inclusion = Inclusion {
                        name: name.unwrap_or_default().to_string(),
                        id: id.unwrap_or_default().to_string(),
                        args,
                    };
                    let token = if repeated {
                        Token::Subs(inclusion)
                    } else {
                        Token::Sub(inclusion)
                    };
                    return Ok((token, i + 2));
                }
                b'$' => match bytes.get(i + 1) {
                    Some(b'*') => {
                        args.push(InlineArg::Wildcard);
                        i += 2;
                        state = SubState::AfterArg;
                    }
                    Some(&c) if is_ident(c) => {
                        i += 1;
                        mark = i;
                        state = SubState::Relay;
                    }
                    _ => return Err(Stall::new(i, "expected '$*' or '$name'")),
                },
                c if is_ident(c) => {
                    mark = i;
                    state = SubState::ArgKey;
                }
                _ => return Err(Stall::new(i, "expected inline argument or '/>'")),
            },
            SubState::Relay => {
                if is_ident(c) {
                    i += 1;
                } else {
                    args.push(InlineArg::relay(&src[mark..i]));
                    state = SubState::AfterArg;
                }
            }
            SubState::ArgKey => {
                if is_ident(c) {
                    i += 1;
                } else if bytes[i..].starts_with(b"=\"") {
                    key = &src[mark..i];
                    i += 2;
                    run = i;
                    state = SubState::ArgValue;
                } else {
                    return Err(Stall::new(i, "expected '=\"' after argument name"));
                }
            }
            SubState::ArgValue => match c {
                b'"' => {
                    text.push_str(&src[run..i]);
                    if !text.is_empty() {
                        fragments.push(ArgFragment::Literal(std::mem::take(&mut text)));
                    }
                    args.push(InlineArg::Named {
                        name: key.to_string(),
                        fragments: std::mem::take(&mut fragments),
                    });
                    i += 1;
                    state = SubState::AfterArg;
                }
                b'\\' if bytes[i..].starts_with(b"\\${") => {
                    text.push_str(&src[run..i]);
                    text.push_str("${");
                    i += 3;
                    run = i;
                }
                b'$' if bytes.get(i + 1) == Some(&b'{') => {
                    text.push_str(&src[run..i]);
                    if !text.is_empty() {
                        fragments.push(ArgFragment::Literal(std::mem::take(&mut text)));
                    }
                    i += 2;
                    mark = i;
                    state = SubState::ArgValueProp;
                }
                _ => i += 1,
            },
            SubState::ArgValueProp => match c {
                b'}' => {
                    if i == mark {
                        return Err(Stall::new(i, "empty prop reference"));
                    }
                    fragments.push(ArgFragment::Prop(src[mark..i].to_string()));
                    i += 1;
                    run = i;
                    state = SubState::ArgValue;
                }
                c if is_ws(c) || c == b':' || is_prop_stop(c) => {
                    return Err(Stall::new(i, "invalid character in prop reference"));
                }
                _ => i += 1,
            },
        }
    }
}
