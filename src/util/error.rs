// OrderPulse - util/error.rs
//
// Typed error hierarchy with context-preserving error chains.
// Row-level problems are never errors here: they are counted by the parser.
// Everything in this file is a file-level or run-level failure.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Top-level error type for a pipeline run.
#[derive(Debug)]
pub enum PipelineError {
    /// Snapshot parsing failed.
    Parse(ParseError),

    /// Snapshot directory listing failed.
    Discovery(DiscoveryError),

    /// Writing a report failed.
    Export(ExportError),

    /// Configuration loading or validation failed.
    Config(ConfigError),

    /// No current snapshot was configured and none could be discovered.
    NoCurrentSnapshot { directory: PathBuf },

    /// I/O error with path context.
    Io {
        path: PathBuf,
        operation: &'static str,
        source: io::Error,
    },
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse(e) => write!(f, "Parse error: {e}"),
            Self::Discovery(e) => write!(f, "Discovery error: {e}"),
            Self::Export(e) => write!(f, "Export error: {e}"),
            Self::Config(e) => write!(f, "Configuration error: {e}"),
            Self::NoCurrentSnapshot { directory } => write!(
                f,
                "No current snapshot configured and no dated snapshot found in '{}'",
                directory.display()
            ),
            Self::Io {
                path,
                operation,
                source,
            } => write!(
                f,
                "I/O error during {operation} on '{}': {source}",
                path.display()
            ),
        }
    }
}

impl std::error::Error for PipelineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Parse(e) => Some(e),
            Self::Discovery(e) => Some(e),
            Self::Export(e) => Some(e),
            Self::Config(e) => Some(e),
            Self::NoCurrentSnapshot { .. } => None,
            Self::Io { source, .. } => Some(source),
        }
    }
}

// ---------------------------------------------------------------------------
// Parse errors
// ---------------------------------------------------------------------------

/// File-level snapshot parsing failures.
#[derive(Debug)]
pub enum ParseError {
    /// The snapshot could not be opened or read.
    Io { file: PathBuf, source: io::Error },

    /// The CSV reader failed on the header or on the byte stream itself.
    Csv { file: PathBuf, source: csv::Error },

    /// A required column is absent from the header row.
    MissingColumn { file: PathBuf, column: &'static str },

    /// A date field could not be parsed while parsing in strict mode.
    FieldParse {
        file: PathBuf,
        line_number: u64,
        column: &'static str,
        raw_value: String,
    },
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { file, source } => {
                write!(f, "'{}': I/O error: {source}", file.display())
            }
            Self::Csv { file, source } => {
                write!(f, "'{}': CSV error: {source}", file.display())
            }
            Self::MissingColumn { file, column } => write!(
                f,
                "'{}': required column '{column}' is missing from the header",
                file.display()
            ),
            Self::FieldParse {
                file,
                line_number,
                column,
                raw_value,
            } => write!(
                f,
                "'{}' line {line_number}: cannot parse '{column}' value '{raw_value}' as a day-first date",
                file.display()
            ),
        }
    }
}

impl std::error::Error for ParseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Csv { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<ParseError> for PipelineError {
    fn from(e: ParseError) -> Self {
        Self::Parse(e)
    }
}

// ---------------------------------------------------------------------------
// Discovery errors
// ---------------------------------------------------------------------------

/// Errors listing the snapshot directory.
#[derive(Debug)]
pub enum DiscoveryError {
    /// The input directory does not exist.
    RootNotFound { path: PathBuf },

    /// The input path is not a directory.
    NotADirectory { path: PathBuf },

    /// Walkdir failed on the root itself.
    Traversal {
        path: PathBuf,
        source: walkdir::Error,
    },
}

impl fmt::Display for DiscoveryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RootNotFound { path } => {
                write!(f, "Input directory '{}' does not exist", path.display())
            }
            Self::NotADirectory { path } => {
                write!(f, "Input path '{}' is not a directory", path.display())
            }
            Self::Traversal { path, source } => {
                write!(f, "Error listing '{}': {source}", path.display())
            }
        }
    }
}

impl std::error::Error for DiscoveryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Traversal { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<DiscoveryError> for PipelineError {
    fn from(e: DiscoveryError) -> Self {
        Self::Discovery(e)
    }
}

// ---------------------------------------------------------------------------
// Export errors
// ---------------------------------------------------------------------------

/// Errors writing report artifacts.
#[derive(Debug)]
pub enum ExportError {
    /// I/O error writing the report file.
    Io { path: PathBuf, source: io::Error },

    /// CSV serialisation error.
    Csv { path: PathBuf, source: csv::Error },

    /// JSON serialisation error.
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
}

impl fmt::Display for ExportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "Export I/O error '{}': {source}", path.display())
            }
            Self::Csv { path, source } => {
                write!(f, "CSV export error '{}': {source}", path.display())
            }
            Self::Json { path, source } => {
                write!(f, "JSON export error '{}': {source}", path.display())
            }
        }
    }
}

impl std::error::Error for ExportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Csv { source, .. } => Some(source),
            Self::Json { source, .. } => Some(source),
        }
    }
}

impl From<ExportError> for PipelineError {
    fn from(e: ExportError) -> Self {
        Self::Export(e)
    }
}

// ---------------------------------------------------------------------------
// Config errors
// ---------------------------------------------------------------------------

/// Errors related to configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    /// TOML parsing failed.
    TomlParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    /// A config value is out of the allowed range.
    ValueOutOfRange {
        field: String,
        value: String,
        expected: String,
    },

    /// A date string is not in `DD-MM-YYYY` form.
    InvalidDate { field: String, value: String },

    /// A value the run cannot do without was not supplied.
    MissingValue { field: &'static str },

    /// I/O error reading config file.
    Io { path: PathBuf, source: io::Error },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TomlParse { path, source } => {
                write!(f, "Config parse error '{}': {source}", path.display())
            }
            Self::ValueOutOfRange {
                field,
                value,
                expected,
            } => write!(
                f,
                "Config '{field}' = '{value}' is out of range. Expected: {expected}"
            ),
            Self::InvalidDate { field, value } => write!(
                f,
                "Config '{field}' = '{value}' is not a DD-MM-YYYY date"
            ),
            Self::MissingValue { field } => {
                write!(f, "Config value '{field}' is required but was not set")
            }
            Self::Io { path, source } => {
                write!(f, "Config I/O error '{}': {source}", path.display())
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::TomlParse { source, .. } => Some(source),
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<ConfigError> for PipelineError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

/// Convenience type alias for pipeline results.
pub type Result<T> = std::result::Result<T, PipelineError>;
