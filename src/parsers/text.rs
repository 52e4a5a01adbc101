//! The text flavor. Members are separated by `;`, array elements by `,`, and data objects are delimited by braces.
//! Every offset the parser reports is a byte offset into the text it was given, translated to a line and column.

use crate::diagnostics::{Diagnostic, Location, Reporter, Severity};
use crate::options::ParseOptions;
use crate::parsers::{
    primitive::XPrimitive,
    template::{ElementKind, MemberSpec, Primitive, Template, TemplateRegistry},
    FloatWidth, SyntaxError, SyntaxErrorKind,
};
use crate::structure::{Structure, Value};
use log::{debug, trace};

type Result<T> = std::result::Result<T, SyntaxError>;

/// Characters that end the text of a scalar or of a data object name.
const DELIMITERS: &[u8] = b"{},;\"";

fn is_space(b: u8) -> bool {
    b.is_ascii_whitespace() || b == 0
}

fn is_space_char(c: char) -> bool {
    c.is_ascii() && is_space(c as u8)
}

/// Parses the body of a text file (everything after the file header) into the root structure, whose data holds one
/// `Value::Structure` per top-level data object.
pub fn parse_text(
    text: &str,
    float_width: FloatWidth,
    registry: &TemplateRegistry,
    options: &ParseOptions,
    reporter: &mut dyn Reporter,
) -> Result<Structure> {
    let text = strip_comments(text);
    let mut parser = TextParser::new(&text, float_width, registry, options, reporter);
    let root = parser.structure(&Template::root(), false)?;

    debug!(
        "{}: {} top-level data object(s) in {} bytes of text",
        options.source_name,
        root.data.len(),
        text.len()
    );
    Ok(root)
}

/// Replaces `//` and `#` comments outside of quoted strings with spaces, keeping every offset where it was.
pub fn strip_comments(text: &str) -> String {
    let mut bytes = text.as_bytes().to_vec();
    let mut in_quotes = false;
    let mut i = 0;

    while i < bytes.len() {
        let comment = match bytes[i] {
            b'"' => {
                in_quotes = !in_quotes;
                false
            }
            b'#' => !in_quotes,
            b'/' => !in_quotes && bytes.get(i + 1) == Some(&b'/'),
            _ => false,
        };

        if comment {
            let end = bytes[i..]
                .iter()
                .position(|&b| b == b'\n')
                .map(|p| i + p)
                .unwrap_or_else(|| bytes.len());
            for b in &mut bytes[i..end] {
                *b = b' ';
            }
            i = end;
        } else {
            i += 1;
        }
    }

    // Blanked ranges start at an ASCII character and end at a newline, so the bytes are still valid UTF-8.
    String::from_utf8_lossy(&bytes).into_owned()
}

pub struct TextParser<'a, 'r> {
    text: &'a str,
    pos: usize,
    float_width: FloatWidth,
    registry: &'a TemplateRegistry,
    options: &'a ParseOptions,
    reporter: &'r mut dyn Reporter,
    depth: usize,
}

impl<'a, 'r> TextParser<'a, 'r> {
    /// `text` is parsed as is, comments have to be removed with `strip_comments` first.
    pub fn new(
        text: &'a str,
        float_width: FloatWidth,
        registry: &'a TemplateRegistry,
        options: &'a ParseOptions,
        reporter: &'r mut dyn Reporter,
    ) -> Self {
        TextParser {
            text,
            pos: 0,
            float_width,
            registry,
            options,
            reporter,
            depth: 0,
        }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    /// Whether only whitespace is left.
    pub fn is_at_end(&self) -> bool {
        self.text.as_bytes()[self.pos..].iter().all(|&b| is_space(b))
    }

    /// Parses one instance of `template` at the cursor. Inline instances have no braces of their own, their
    /// terminator belongs to the member or array that contains them.
    pub fn structure(&mut self, template: &Template, inline: bool) -> Result<Structure> {
        if self.depth >= self.options.max_depth {
            return Err(self.error(
                SyntaxErrorKind::RecursionLimit,
                format!(
                    "{} is nested deeper than {} levels",
                    template.name, self.options.max_depth
                ),
            ));
        }

        self.depth += 1;
        let result = self.members(template, inline);
        self.depth -= 1;
        result
    }

    fn members(&mut self, template: &Template, inline: bool) -> Result<Structure> {
        trace!("{} at offset {}", template.name, self.pos);
        let mut data = Vec::with_capacity(template.members.len());

        for (index, member) in template.members.iter().enumerate() {
            match member {
                MemberSpec::Primitive(Primitive::Int) => {
                    let v = self.scalar::<i32>()?;
                    data.push(Value::Int(v));
                }
                MemberSpec::Primitive(Primitive::Float) => {
                    let v = self.scalar::<f64>()?;
                    data.push(Value::Float(v));
                }
                MemberSpec::Primitive(Primitive::String) => {
                    let v = self.string()?;
                    data.push(Value::Str(v));
                }
                MemberSpec::InlineTemplate(name) => {
                    let registry = self.registry;
                    let nested = registry.lookup(name);
                    let structure = self.structure(&nested, true)?;
                    self.terminator(b';')?;
                    data.push(Value::Structure(structure));
                }
                MemberSpec::Array(kind, size) => {
                    let len = size
                        .resolve(&data)
                        .map_err(|message| self.error(SyntaxErrorKind::SizeReference, message))?;
                    let array = self.array(kind, len)?;
                    data.push(array);

                    // Exporters often close the last array of a data object with `;;`.
                    let last_data_member = template
                        .members
                        .get(index + 1)
                        .map(MemberSpec::is_open)
                        .unwrap_or(true);
                    if !inline && last_data_member {
                        self.skip_space();
                        if self.peek() == Some(b';') {
                            self.pos += 1;
                        }
                    }
                }
                MemberSpec::AnyRepeated => self.repeated(template, inline, &mut data)?,
                MemberSpec::Opaque => self.skip_opaque()?,
            }
        }

        if !inline && !template.closes_itself() {
            self.terminator(b'}')?;
        }

        Ok(Structure::new(template.name.clone(), data))
    }

    fn location(&self, offset: usize) -> Location {
        Location::in_text(self.text, offset)
    }

    fn error(&self, kind: SyntaxErrorKind, message: String) -> SyntaxError {
        self.error_at(kind, self.pos, message)
    }

    fn error_at(&self, kind: SyntaxErrorKind, offset: usize, message: String) -> SyntaxError {
        SyntaxError::new(kind, self.location(offset), message)
    }

    /// The error for finding something other than `expected` at `offset`.
    fn unexpected(&self, offset: usize, expected: &str) -> SyntaxError {
        let found = self.text.get(offset..).and_then(|rest| rest.chars().next());

        match found {
            None => self.error_at(
                SyntaxErrorKind::PrematureEnd,
                offset,
                format!("expected {} but the text ends", expected),
            ),
            Some(c) if "{},;".contains(c) => self.error_at(
                SyntaxErrorKind::UnexpectedDelimiter,
                offset,
                format!("expected {} but found '{}'", expected, c),
            ),
            Some(c) => self.error_at(
                SyntaxErrorKind::MalformedToken,
                offset,
                format!("expected {} but found {:?}", expected, c),
            ),
        }
    }

    fn report(&mut self, severity: Severity, offset: usize, message: String) {
        let location = self.location(offset);
        self.reporter.report(Diagnostic {
            severity,
            source: self.options.source_name.clone(),
            location,
            message,
        });
    }

    fn peek(&self) -> Option<u8> {
        self.text.as_bytes().get(self.pos).copied()
    }

    fn skip_space(&mut self) {
        while self.peek().map(is_space).unwrap_or(false) {
            self.pos += 1;
        }
    }

    /// Skips whitespace and consumes `expected`, which has to come next.
    fn terminator(&mut self, expected: u8) -> Result<()> {
        self.skip_space();
        if self.peek() == Some(expected) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.unexpected(self.pos, &format!("'{}'", expected as char)))
        }
    }

    /// Finds the first of `stops` from the cursor on. Any other delimiter in between is an error.
    fn scan(&self, stops: &[u8], expected: &str) -> Result<usize> {
        let bytes = self.text.as_bytes();

        for at in self.pos..bytes.len() {
            if stops.contains(&bytes[at]) {
                return Ok(at);
            }
            if DELIMITERS.contains(&bytes[at]) {
                return Err(self.unexpected(at, expected));
            }
        }

        Err(self.unexpected(bytes.len(), expected))
    }

    /// Parses the text between `start` and `end`. Text that isn't a number is reported and read as zero.
    fn number<T: XPrimitive>(&mut self, start: usize, end: usize) -> T {
        let text = self.text;
        let slice = &text[start..end];
        let raw = slice.trim();

        match T::parse_text(raw, self.float_width) {
            Some(v) => v,
            None => {
                let offset = start + (slice.len() - slice.trim_start().len());
                self.report(
                    Severity::Warning,
                    offset,
                    format!("{:?} is not a valid {}", raw, T::x_name()),
                );
                T::default()
            }
        }
    }

    fn scalar<T: XPrimitive>(&mut self) -> Result<T> {
        let start = self.pos;
        let end = self.scan(b";", &format!("';' after a {}", T::x_name()))?;
        self.pos = end + 1;
        Ok(self.number(start, end))
    }

    fn string(&mut self) -> Result<String> {
        self.skip_space();
        if self.peek() != Some(b'"') {
            return Err(self.unexpected(self.pos, "a quoted string"));
        }

        let text = self.text;
        let start = self.pos + 1;
        let end = match text.as_bytes()[start..].iter().position(|&b| b == b'"') {
            Some(len) => start + len,
            None => {
                return Err(self.error(
                    SyntaxErrorKind::PrematureEnd,
                    "the text ends inside a string".to_string(),
                ))
            }
        };

        self.pos = end + 1;
        self.terminator(b';')?;
        Ok(text[start..end].to_string())
    }

    fn scalars<T: XPrimitive>(&mut self, len: usize) -> Result<Value> {
        let mut values = Vec::new();

        for index in 0..len {
            let start = self.pos;
            let end = self.scan(b",;", "an array element")?;
            let found = self.text.as_bytes()[end];
            let expected = if index + 1 == len { b';' } else { b',' };

            if found != expected {
                return Err(self.error_at(
                    SyntaxErrorKind::UnexpectedDelimiter,
                    end,
                    format!(
                        "found '{}' after element {} of {}, expected '{}'",
                        found as char,
                        index + 1,
                        len,
                        expected as char
                    ),
                ));
            }

            values.push(self.number::<T>(start, end));
            self.pos = end + 1;
        }

        Ok(T::into_array(values))
    }

    fn array(&mut self, kind: &ElementKind, len: usize) -> Result<Value> {
        if len == 0 {
            self.terminator(b';')?;
            return Ok(match kind {
                ElementKind::Int => Value::IntArray(Vec::new()),
                ElementKind::Float => Value::FloatArray(Vec::new()),
                ElementKind::Template(_) => Value::StructureArray(Vec::new()),
            });
        }

        match kind {
            ElementKind::Int => self.scalars::<i32>(len),
            ElementKind::Float => self.scalars::<f64>(len),
            ElementKind::Template(name) => {
                let registry = self.registry;
                let template = registry.lookup(name);

                let mut items = Vec::new();
                for index in 0..len {
                    items.push(self.structure(&template, true)?);
                    self.terminator(if index + 1 == len { b';' } else { b',' })?;
                }
                Ok(Value::StructureArray(items))
            }
        }
    }

    /// Child data objects until the closing brace of `template`, or until the end of the text for the root.
    fn repeated(&mut self, template: &Template, inline: bool, data: &mut Vec<Value>) -> Result<()> {
        let text = self.text;

        loop {
            let start = self.pos;
            let at = match text.as_bytes()[start..]
                .iter()
                .position(|b| DELIMITERS.contains(b))
            {
                Some(len) => start + len,
                None => {
                    if template.is_root() && self.is_at_end() {
                        self.pos = text.len();
                        return Ok(());
                    }
                    if template.is_root() {
                        let rest = &text[start..];
                        let offset = start + (rest.len() - rest.trim_start_matches(is_space_char).len());
                        return Err(self.error_at(
                            SyntaxErrorKind::MalformedToken,
                            offset,
                            format!(
                                "unexpected {:?} at the end of the text",
                                rest.trim_matches(is_space_char)
                            ),
                        ));
                    }
                    return Err(self.unexpected(text.len(), "a data object or '}'"));
                }
            };

            let words = &text[start..at];
            let word_offset = start + (words.len() - words.trim_start_matches(is_space_char).len());
            match text.as_bytes()[at] {
                b'{' => {
                    self.pos = at + 1;
                    let name = words.split(is_space_char).find(|w| !w.is_empty()).unwrap_or("");
                    if let Some(child) = self.data_object(name, word_offset)? {
                        data.push(Value::Structure(child));
                    }
                }
                b'}' | b';' if word_offset != at => {
                    return Err(self.error_at(
                        SyntaxErrorKind::MalformedToken,
                        word_offset,
                        format!("unexpected {:?}", words.trim_matches(is_space_char)),
                    ))
                }
                b'}' if template.is_root() => {
                    return Err(self.error_at(
                        SyntaxErrorKind::UnexpectedDelimiter,
                        at,
                        "'}' outside of any data object".to_string(),
                    ))
                }
                b'}' => {
                    // An inline owner leaves the brace to its parent.
                    self.pos = if inline { at } else { at + 1 };
                    return Ok(());
                }
                b';' if inline => {
                    self.pos = at;
                    return Ok(());
                }
                b'"' => {
                    return Err(self.error_at(
                        SyntaxErrorKind::MalformedToken,
                        at,
                        "unexpected string between data objects".to_string(),
                    ))
                }
                other => {
                    return Err(self.error_at(
                        SyntaxErrorKind::UnexpectedDelimiter,
                        at,
                        format!("unexpected '{}' between data objects", other as char),
                    ))
                }
            }
        }
    }

    /// The content of a data object whose opening brace was just consumed. Unknown templates, references and
    /// template declarations are skipped and give `None`.
    fn data_object(&mut self, name: &str, offset: usize) -> Result<Option<Structure>> {
        match name {
            // `{ name }` refers to an object declared elsewhere.
            "" => {
                self.skip_opaque()?;
                return Ok(None);
            }
            "template" => {
                self.skip_opaque()?;
                debug!("skipped template declaration at {}", self.location(offset));
                return Ok(None);
            }
            _ => {}
        }

        let registry = self.registry;
        let template = registry.lookup(name);

        if template.is_opaque() {
            if self.options.report_unknown_templates {
                self.report(
                    Severity::Info,
                    offset,
                    format!("skipping unknown template {}", name),
                );
            }
            self.structure(&template, false)?;
            return Ok(None);
        }

        self.skip_guid();
        self.structure(&template, false).map(Some)
    }

    fn skip_guid(&mut self) {
        self.skip_space();
        if self.peek() != Some(b'<') {
            return;
        }

        let text = self.text;
        if let Some(len) = text.as_bytes()[self.pos..].iter().position(|&b| b == b'>') {
            self.pos += len + 1;
        }
    }

    /// Skips everything up to the closing brace of the current data object. Braces inside strings don't count.
    fn skip_opaque(&mut self) -> Result<()> {
        let text = self.text;
        let start = self.pos;
        let mut level = 0_usize;
        let mut in_quotes = false;

        while let Some(&b) = text.as_bytes().get(self.pos) {
            self.pos += 1;
            match b {
                b'"' => in_quotes = !in_quotes,
                _ if in_quotes => {}
                b'{' => level += 1,
                b'}' if level == 0 => return Ok(()),
                b'}' => level -= 1,
                _ => {}
            }
        }

        Err(self.error_at(
            SyntaxErrorKind::PrematureEnd,
            start,
            "the text ends inside an unknown data object".to_string(),
        ))
    }
}
