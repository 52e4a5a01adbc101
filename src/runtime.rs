use crate::diagnostics::{Diagnostic, Location, LogReporter, Reporter, Severity};
use crate::options::ParseOptions;
use crate::parsers::{
    binary::parse_binary,
    compression::inflate,
    header::{header, Header},
    template::TemplateRegistry,
    text::parse_text,
    XParseError,
};
use crate::structure::Structure;
use log::{debug, info};
use nom::Err;
use std::{io::Read, path::Path, result::Result as StdResult};

/// A loaded X file.
#[derive(Debug, Clone, PartialEq)]
pub struct XFile {
    pub header: Header,
    /// Nameless structure with one `Value::Structure` per top-level data object. Data objects of unknown templates
    /// are not included.
    pub root: Structure,
}

impl XFile {
    /// Loads an X file with the standard templates. Diagnostics go to the `log` facade.
    pub fn from_data<T: Read>(data: T) -> StdResult<Self, XParseError> {
        XFile::from_data_with(
            data,
            &ParseOptions::default(),
            TemplateRegistry::standard(),
            &mut LogReporter,
        )
    }

    /// Loads an X file from a path with the standard templates. Diagnostics go to the `log` facade and name the path.
    pub fn from_path<P: AsRef<Path>>(path: P) -> StdResult<Self, XParseError> {
        use std::fs::File;

        let options = ParseOptions::default().with_source_name(path.as_ref().display().to_string());
        let file = File::open(path)?;
        XFile::from_data_with(file, &options, TemplateRegistry::standard(), &mut LogReporter)
    }

    /// Loads an X file with custom options and templates. Whatever goes wrong is sent to `reporter` exactly once,
    /// as an error diagnostic, before being returned.
    pub fn from_data_with<T: Read>(
        mut data: T,
        options: &ParseOptions,
        registry: &TemplateRegistry,
        reporter: &mut dyn Reporter,
    ) -> StdResult<Self, XParseError> {
        let mut buffer = Vec::new();
        let result = match data.read_to_end(&mut buffer) {
            Ok(_) => XFile::parse(&buffer, options, registry, reporter),
            Err(e) => Err(XParseError::Io(e)),
        };

        if let Err(e) = &result {
            let (location, message) = match e {
                XParseError::Syntax(e) => (e.location, e.message.clone()),
                other => (Location::Byte(0), other.to_string()),
            };
            reporter.report(Diagnostic {
                severity: Severity::Error,
                source: options.source_name.clone(),
                location,
                message,
            });
        }

        result
    }

    fn parse(
        buffer: &[u8],
        options: &ParseOptions,
        registry: &TemplateRegistry,
        reporter: &mut dyn Reporter,
    ) -> StdResult<Self, XParseError> {
        let (body, header) = match header(buffer) {
            Ok(v) => v,
            Err(Err::Failure(e)) | Err(Err::Error(e)) => return Err(e),
            Err(Err::Incomplete(..)) => return Err(XParseError::NotEnoughData),
        };
        debug!(
            "{}: {:?} file, {:?} floats",
            options.source_name, header.format, header.float_width
        );

        let inflated;
        let body = if header.format.is_compressed() {
            inflated = inflate(buffer)?;
            &inflated[..]
        } else {
            body
        };

        let root = if header.format.is_binary() {
            parse_binary(body, header.float_width, registry, options, reporter)?
        } else {
            let text = String::from_utf8_lossy(body);
            parse_text(&text, header.float_width, registry, options, reporter)?
        };

        info!(
            "{}: loaded {} data object(s)",
            options.source_name,
            root.data.len()
        );
        Ok(XFile { header, root })
    }

    /// Every top-level data object, in file order.
    pub fn structures(&self) -> impl Iterator<Item = &Structure> {
        self.root.children()
    }

    /// Top-level data objects of the template `name`.
    pub fn get_by_name<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Structure> + 'a {
        self.root.find(name)
    }
}
