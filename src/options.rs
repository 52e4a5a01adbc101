/// Nesting depth at which parsing stops with `SyntaxErrorKind::RecursionLimit`.
pub const DEFAULT_MAX_DEPTH: usize = 128;

/// Knobs for a single parse. The template registry is passed separately since it is usually shared.
#[derive(Debug, Clone)]
pub struct ParseOptions {
    /// Name used to identify the input in diagnostics.
    pub source_name: String,
    /// Maximum nesting of templates (including the root) before the parse is aborted.
    pub max_depth: usize,
    /// Whether templates missing from the registry are reported before being skipped.
    pub report_unknown_templates: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        ParseOptions {
            source_name: "<memory>".to_string(),
            max_depth: DEFAULT_MAX_DEPTH,
            report_unknown_templates: true,
        }
    }
}

impl ParseOptions {
    pub fn with_source_name<T: Into<String>>(mut self, source_name: T) -> Self {
        self.source_name = source_name.into();
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_report_unknown_templates(mut self, report: bool) -> Self {
        self.report_unknown_templates = report;
        self
    }
}
