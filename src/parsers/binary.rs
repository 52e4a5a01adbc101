//! The binary flavor: a stream of little-endian tokens interpreted through the template registry.
//!
//! Scalar members rarely have a token of their own. Exporters pack the values of many consecutive members into one
//! `INTEGER_LIST` or `FLOAT_LIST` token, so the parser keeps the unclaimed values in a `ValueCache` shared by the
//! whole recursion. The cache has to be empty whenever the parser has to decide what the next data object is.

use crate::diagnostics::{Diagnostic, Location, Reporter, Severity};
use crate::options::ParseOptions;
use crate::parsers::{
    cache::ValueCache,
    primitive::XPrimitive,
    template::{ElementKind, MemberSpec, Primitive, SizeSource, Template, TemplateRegistry},
    token::{self, LexError, Token, TokenKind},
    FloatWidth, SyntaxError, SyntaxErrorKind,
};
use crate::structure::{Structure, Value};
use log::{debug, trace};

type Result<T> = std::result::Result<T, SyntaxError>;

/// Parses a complete binary token stream (everything after the file header) into the root structure, whose data
/// holds one `Value::Structure` per top-level data object.
pub fn parse_binary(
    data: &[u8],
    float_width: FloatWidth,
    registry: &TemplateRegistry,
    options: &ParseOptions,
    reporter: &mut dyn Reporter,
) -> Result<Structure> {
    let mut parser = BinaryParser::new(data, float_width, registry, options, reporter);
    let root = parser.structure(&Template::root(), false)?;

    debug!(
        "{}: {} top-level data object(s) in {} bytes of binary data",
        options.source_name,
        root.data.len(),
        data.len()
    );
    Ok(root)
}

pub struct BinaryParser<'a, 'r> {
    data: &'a [u8],
    /// What is left of `data`.
    input: &'a [u8],
    float_width: FloatWidth,
    cache: ValueCache,
    registry: &'a TemplateRegistry,
    options: &'a ParseOptions,
    reporter: &'r mut dyn Reporter,
    depth: usize,
}

impl<'a, 'r> BinaryParser<'a, 'r> {
    pub fn new(
        data: &'a [u8],
        float_width: FloatWidth,
        registry: &'a TemplateRegistry,
        options: &'a ParseOptions,
        reporter: &'r mut dyn Reporter,
    ) -> Self {
        BinaryParser {
            data,
            input: data,
            float_width,
            cache: ValueCache::new(),
            registry,
            options,
            reporter,
            depth: 0,
        }
    }

    /// Offset of the next unread byte.
    pub fn position(&self) -> usize {
        self.data.len() - self.input.len()
    }

    pub fn cache(&self) -> &ValueCache {
        &self.cache
    }

    pub fn is_at_end(&self) -> bool {
        self.input.is_empty()
    }

    /// Parses one instance of `template` at the current position. Inline instances are parts of another data
    /// object and have no braces of their own, so the closing brace is only expected when `inline` is false.
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
        trace!("{} at {:#x}", template.name, self.position());
        let mut data = Vec::with_capacity(template.members.len());

        for member in &template.members {
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
                    data.push(Value::Structure(self.structure(&nested, true)?));
                }
                MemberSpec::Array(kind, size) => {
                    let len = self.array_len(*size, &data)?;
                    let array = self.array(kind, len)?;
                    data.push(array);
                }
                MemberSpec::AnyRepeated => self.repeated(template, &mut data)?,
                MemberSpec::Opaque => self.skip_opaque()?,
            }
        }

        if !inline && !template.closes_itself() {
            self.check_depleted("the closing brace")?;
            self.expect(TokenKind::CBrace)?;
        }

        Ok(Structure::new(template.name.clone(), data))
    }

    fn error(&self, kind: SyntaxErrorKind, message: String) -> SyntaxError {
        self.error_at(kind, self.position(), message)
    }

    fn error_at(&self, kind: SyntaxErrorKind, offset: usize, message: String) -> SyntaxError {
        SyntaxError::new(kind, Location::Byte(offset), message)
    }

    fn report(&mut self, severity: Severity, offset: usize, message: String) {
        self.reporter.report(Diagnostic {
            severity,
            source: self.options.source_name.clone(),
            location: Location::Byte(offset),
            message,
        });
    }

    fn next_token(&mut self) -> Result<Token> {
        let offset = self.position();

        match token::next_token(self.input, self.float_width) {
            Ok((rest, token)) => {
                self.input = rest;
                Ok(token)
            }
            Err(LexError::Truncated) => Err(self.error_at(
                SyntaxErrorKind::PrematureEnd,
                offset,
                "the data ends before the current template is complete".to_string(),
            )),
            Err(LexError::UnknownToken(code)) => Err(self.error_at(
                SyntaxErrorKind::MalformedToken,
                offset,
                format!("unknown token code {}", code),
            )),
            Err(LexError::BadStringTerminator(code)) => Err(self.error_at(
                SyntaxErrorKind::MalformedToken,
                offset,
                format!("string terminated by token code {} instead of ',' or ';'", code),
            )),
        }
    }

    fn expect(&mut self, kind: TokenKind) -> Result<()> {
        let offset = self.position();
        let token = self.next_token()?;

        if token.kind() == kind {
            Ok(())
        } else {
            Err(self.error_at(
                SyntaxErrorKind::MalformedToken,
                offset,
                format!("expected {} but found {}", kind, token),
            ))
        }
    }

    /// Consumes the next token if it has the given kind.
    fn skip_if(&mut self, kind: TokenKind) -> Result<bool> {
        if token::peek_kind(self.input) == Some(kind) {
            self.next_token()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn check_depleted(&self, before: &str) -> Result<()> {
        if self.cache.is_empty() {
            return Ok(());
        }

        Err(self.error(
            SyntaxErrorKind::CacheViolation,
            format!(
                "{} from a previous list are left over before {}",
                self.cache.pending(),
                before
            ),
        ))
    }

    fn scalar<T: XPrimitive>(&mut self) -> Result<T> {
        loop {
            let offset = self.position();

            match T::take_cached(&mut self.cache) {
                Ok(Some(v)) => return Ok(v),
                Ok(None) => {}
                Err(mismatch) => {
                    return Err(self.error_at(
                        SyntaxErrorKind::CacheViolation,
                        offset,
                        mismatch.to_string(),
                    ))
                }
            }

            let token = self.next_token()?;
            match T::from_token(token, &mut self.cache) {
                Ok(Some(v)) => return Ok(v),
                // An empty list, the value is in one of the next tokens.
                Ok(None) => {}
                Err(token) => {
                    return Err(self.error_at(
                        SyntaxErrorKind::MalformedToken,
                        offset,
                        format!("expected a {} but found {}", T::x_name(), token),
                    ))
                }
            }
        }
    }

    fn scalars<T: XPrimitive>(&mut self, len: usize) -> Result<Value> {
        // The length comes from the file, so nothing is reserved up front.
        let mut values = Vec::new();
        for _ in 0..len {
            values.push(self.scalar::<T>()?);
        }
        Ok(T::into_array(values))
    }

    fn string(&mut self) -> Result<String> {
        self.check_depleted("a STRING")?;
        let offset = self.position();

        match self.next_token()? {
            Token::String(text) => Ok(text),
            other => Err(self.error_at(
                SyntaxErrorKind::MalformedToken,
                offset,
                format!("expected a STRING but found {}", other),
            )),
        }
    }

    fn array_len(&self, size: SizeSource, data: &[Value]) -> Result<usize> {
        size.resolve(data)
            .map_err(|message| self.error(SyntaxErrorKind::SizeReference, message))
    }

    fn array(&mut self, kind: &ElementKind, len: usize) -> Result<Value> {
        match kind {
            ElementKind::Int => self.scalars::<i32>(len),
            ElementKind::Float => self.scalars::<f64>(len),
            ElementKind::Template(name) => {
                let registry = self.registry;
                let template = registry.lookup(name);

                let mut items = Vec::new();
                for _ in 0..len {
                    let before = (self.position(), self.cache.pending());
                    items.push(self.structure(&template, true)?);

                    // Elements that hold no data would let the count alone decide how much is allocated.
                    if (self.position(), self.cache.pending()) == before {
                        return Err(self.error(
                            SyntaxErrorKind::MalformedToken,
                            format!("{} elements of {} hold no data", len, template.name),
                        ));
                    }
                }
                Ok(Value::StructureArray(items))
            }
        }
    }

    /// Child data objects until the closing brace of `template`, or until the end of the data for the root.
    fn repeated(&mut self, template: &Template, data: &mut Vec<Value>) -> Result<()> {
        loop {
            self.check_depleted("the next data object")?;
            if template.is_root() && self.is_at_end() {
                return Ok(());
            }

            let offset = self.position();
            match self.next_token()? {
                Token::Name(name) => {
                    if let Some(child) = self.data_object(name, offset)? {
                        data.push(Value::Structure(child));
                    }
                }
                Token::Punct(TokenKind::CBrace) if template.is_root() => {
                    return Err(self.error_at(
                        SyntaxErrorKind::MalformedToken,
                        offset,
                        "'}' outside of any data object".to_string(),
                    ));
                }
                Token::Punct(TokenKind::CBrace) => return Ok(()),
                Token::Punct(TokenKind::OBrace) => self.skip_reference()?,
                Token::Punct(TokenKind::Template) => self.skip_declaration(offset)?,
                other => {
                    return Err(self.error_at(
                        SyntaxErrorKind::MalformedToken,
                        offset,
                        format!("expected a data object but found {}", other),
                    ))
                }
            }
        }
    }

    /// The rest of a data object whose `NAME` token was just read: an optional instance name, the opening brace,
    /// an optional GUID and the content. Unknown templates are skipped and give `None`.
    fn data_object(&mut self, name: String, offset: usize) -> Result<Option<Structure>> {
        self.skip_if(TokenKind::Name)?;
        self.expect(TokenKind::OBrace)?;
        self.skip_if(TokenKind::Guid)?;

        let registry = self.registry;
        let template = registry.lookup(&name);

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

        self.structure(&template, false).map(Some)
    }

    /// Skips everything up to the closing brace of the current data object, nested data objects included.
    fn skip_opaque(&mut self) -> Result<()> {
        self.check_depleted("unknown content")?;
        let mut level = 0_usize;

        loop {
            let offset = self.position();
            match self.next_token()? {
                Token::Name(_) => {
                    // A nested data object, or the target of a reference.
                    self.skip_if(TokenKind::Name)?;
                    if self.skip_if(TokenKind::OBrace)? {
                        level += 1;
                    }
                }
                Token::Punct(TokenKind::OBrace) => level += 1,
                Token::Punct(TokenKind::CBrace) => {
                    if level == 0 {
                        return Ok(());
                    }
                    level -= 1;
                }
                Token::Integer(_)
                | Token::IntegerList(_)
                | Token::FloatList(_)
                | Token::String(_)
                | Token::Guid(_) => {}
                other => {
                    return Err(self.error_at(
                        SyntaxErrorKind::MalformedToken,
                        offset,
                        format!("unexpected {} in unknown data object", other),
                    ))
                }
            }
        }
    }

    /// `{ name }` or `{ guid }`, after the opening brace.
    fn skip_reference(&mut self) -> Result<()> {
        loop {
            let offset = self.position();
            match self.next_token()? {
                Token::Punct(TokenKind::CBrace) => return Ok(()),
                Token::Name(_) | Token::Guid(_) => {}
                other => {
                    return Err(self.error_at(
                        SyntaxErrorKind::MalformedToken,
                        offset,
                        format!("unexpected {} in reference", other),
                    ))
                }
            }
        }
    }

    /// A template declaration embedded in the data, after the `template` keyword. The registry is fixed, so it is
    /// skipped.
    fn skip_declaration(&mut self, offset: usize) -> Result<()> {
        let name_offset = self.position();
        let name = match self.next_token()? {
            Token::Name(name) => name,
            other => {
                return Err(self.error_at(
                    SyntaxErrorKind::MalformedToken,
                    name_offset,
                    format!("expected a template name but found {}", other),
                ))
            }
        };
        self.expect(TokenKind::OBrace)?;

        let mut level = 0_usize;
        loop {
            match self.next_token()? {
                Token::Punct(TokenKind::OBrace) => level += 1,
                Token::Punct(TokenKind::CBrace) if level == 0 => break,
                Token::Punct(TokenKind::CBrace) => level -= 1,
                _ => {}
            }
        }

        debug!("skipped declaration of template {} at {:#x}", name, offset);
        Ok(())
    }
}
