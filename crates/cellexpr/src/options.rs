//! Pipeline configuration
//!
//! Options are fixed when a [`ParserList`](crate::parser::ParserList) is
//! built and shared read-only by every parse it runs.

/// Numeric literal policy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumericOptions {
    pub allow_int32: bool,
    pub allow_single: bool,
    pub allow_double: bool,
    pub allow_decimal: bool,
    /// Separator between integer and fractional digits
    pub decimal_separator: char,
    /// Optional thousands separator, accepted between integer digits only
    pub group_separator: Option<char>,
}

impl Default for NumericOptions {
    fn default() -> Self {
        Self {
            allow_int32: true,
            allow_single: false,
            allow_double: true,
            allow_decimal: false,
            decimal_separator: '.',
            group_separator: None,
        }
    }
}

impl NumericOptions {
    /// Integer literals only; any fractional literal is rejected
    pub fn int32_only() -> Self {
        Self {
            allow_int32: true,
            allow_single: false,
            allow_double: false,
            allow_decimal: false,
            ..Self::default()
        }
    }

    pub fn with_int32(mut self, allow: bool) -> Self {
        self.allow_int32 = allow;
        self
    }

    pub fn with_single(mut self, allow: bool) -> Self {
        self.allow_single = allow;
        self
    }

    pub fn with_double(mut self, allow: bool) -> Self {
        self.allow_double = allow;
        self
    }

    pub fn with_decimal(mut self, allow: bool) -> Self {
        self.allow_decimal = allow;
        self
    }

    pub fn with_decimal_separator(mut self, separator: char) -> Self {
        self.decimal_separator = separator;
        self
    }

    pub fn with_group_separator(mut self, separator: Option<char>) -> Self {
        self.group_separator = separator;
        self
    }

    /// Whether any kind that can hold a fractional part is enabled
    pub fn allows_fraction(&self) -> bool {
        self.allow_single || self.allow_double || self.allow_decimal
    }
}

/// Function-call policy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionOptions {
    /// Argument separators; any of them splits arguments
    pub separators: Vec<String>,
    /// Match function names exactly instead of ignoring ASCII case
    pub case_sensitive: bool,
}

impl Default for FunctionOptions {
    fn default() -> Self {
        Self {
            separators: vec![",".to_string()],
            case_sensitive: false,
        }
    }
}

impl FunctionOptions {
    pub fn with_separators<I, S>(mut self, separators: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.separators = separators.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.case_sensitive = case_sensitive;
        self
    }
}

/// Options for the standard pipeline
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineOptions {
    pub numeric: NumericOptions,
    pub functions: FunctionOptions,
}

impl EngineOptions {
    pub fn with_numeric(mut self, numeric: NumericOptions) -> Self {
        self.numeric = numeric;
        self
    }

    pub fn with_functions(mut self, functions: FunctionOptions) -> Self {
        self.functions = functions;
        self
    }
}
