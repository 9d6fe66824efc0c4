//! Output formatting for CLI commands
//!
//! A [`Formatters`] registry maps format names to rendering functions.
//! [`Output`] registers a `--format` flag selecting one of them and writes
//! values through the selection.
//!
//! | Format | Serialisable | Rendering |
//! |--------|--------------|-----------|
//! | `smart` | no | plain text for scalars, string lists and simple mappings, YAML otherwise |
//! | `json` | yes | compact JSON and a newline |
//! | `yaml` | yes | YAML |

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context as _, Result};
use clap::{Arg, ArgMatches};
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

use super::command::{explicit, FlagSet};
use super::context::Context;

/// Id of the `--format` flag
pub const FORMAT_ID: &str = "format";

/// Id of the `--output` flag
pub const OUTPUT_ID: &str = "output";

#[derive(Debug, Error)]
pub enum FormatError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("unknown format {0:?}")]
    UnknownFormat(String),
}

/// Renders a value to a destination stream
pub type Formatter = fn(&mut dyn Write, &Value) -> Result<(), FormatError>;

/// A formatter and whether its output is machine-readable
#[derive(Clone, Copy)]
pub struct TypeFormatter {
    pub formatter: Formatter,
    pub serialisable: bool,
}

/// Registry of named formatters, fixed once built
#[derive(Clone, Default)]
pub struct Formatters {
    by_name: BTreeMap<String, TypeFormatter>,
}

impl Formatters {
    /// An empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in `smart`, `json` and `yaml` formatters
    pub fn defaults() -> Self {
        Self::default()
            .with(
                "smart",
                TypeFormatter {
                    formatter: format_smart,
                    serialisable: false,
                },
            )
            .with(
                "json",
                TypeFormatter {
                    formatter: format_json,
                    serialisable: true,
                },
            )
            .with(
                "yaml",
                TypeFormatter {
                    formatter: format_yaml,
                    serialisable: true,
                },
            )
    }

    /// Adds (or replaces) a formatter
    pub fn with(mut self, name: impl Into<String>, formatter: TypeFormatter) -> Self {
        self.by_name.insert(name.into(), formatter);
        self
    }

    pub fn get(&self, name: &str) -> Option<&TypeFormatter> {
        self.by_name.get(name)
    }

    /// Format names in sorted order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.by_name.keys().map(String::as_str)
    }

    /// The bare rendering functions, keyed by name
    pub fn formatters(&self) -> BTreeMap<String, Formatter> {
        self.by_name
            .iter()
            .map(|(name, tf)| (name.clone(), tf.formatter))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

/// The value of a parsed `--format` flag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatChoice {
    pub name: String,
    pub serialisable: bool,
}

/// Returns true if `flags` selects a machine-readable format
pub fn selects_serial_format(flags: &ArgMatches) -> bool {
    flags
        .try_get_one::<FormatChoice>(FORMAT_ID)
        .ok()
        .flatten()
        .map_or(false, |choice| choice.serialisable)
}

/// Output helper for consistent formatting
#[derive(Clone, Default)]
pub struct Output {
    formatters: Formatters,
    default_format: String,
    selected: Option<String>,
    out_path: Option<PathBuf>,
}

impl Output {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `--format` (legal values: the keys of `formatters`,
    /// defaulting to `default_format`) and `-o/--output`.
    pub fn add_flags(&mut self, flags: FlagSet, default_format: &str, formatters: Formatters) -> FlagSet {
        let names: Vec<&str> = formatters.names().collect();
        let help = format!("Specify output format ({})", names.join("|"));

        let table = formatters.clone();
        let parser = move |value: &str| -> Result<FormatChoice, FormatError> {
            table
                .get(value)
                .map(|tf| FormatChoice {
                    name: value.to_string(),
                    serialisable: tf.serialisable,
                })
                .ok_or_else(|| FormatError::UnknownFormat(value.to_string()))
        };

        self.formatters = formatters;
        self.default_format = default_format.to_string();

        flags
            .arg(
                Arg::new(FORMAT_ID)
                    .long("format")
                    .value_name("format")
                    .default_value(default_format.to_string())
                    .value_parser(parser)
                    .help(help),
            )
            .arg(
                Arg::new(OUTPUT_ID)
                    .short('o')
                    .long("output")
                    .value_name("path")
                    .help("Specify an output file"),
            )
    }

    /// Records the format and output path given on the command line
    pub fn apply_flags(&mut self, flags: &ArgMatches) {
        if let Some(choice) = explicit::<FormatChoice>(flags, FORMAT_ID) {
            self.selected = Some(choice.name);
        }
        if let Some(path) = explicit::<String>(flags, OUTPUT_ID) {
            self.out_path = Some(PathBuf::from(path));
        }
    }

    /// Name of the selected format
    pub fn name(&self) -> &str {
        self.selected.as_deref().unwrap_or(&self.default_format)
    }

    fn selected(&self) -> Result<TypeFormatter, FormatError> {
        self.formatters
            .get(self.name())
            .copied()
            .ok_or_else(|| FormatError::UnknownFormat(self.name().to_string()))
    }

    /// Writes `value` using the format selected on the command line
    pub fn write<T: Serialize + ?Sized>(&self, ctx: &mut Context, value: &T) -> Result<()> {
        let selected = self.selected()?;
        if selected.serialisable {
            ctx.set_serialisable(true);
        }
        self.write_formatter(ctx, selected.formatter, value)
    }

    /// Writes `value` with `formatter`, ignoring the selected format
    pub fn write_formatter<T: Serialize + ?Sized>(
        &self,
        ctx: &mut Context,
        formatter: Formatter,
        value: &T,
    ) -> Result<()> {
        let value = serde_json::to_value(value).map_err(FormatError::from)?;

        match &self.out_path {
            Some(path) => {
                let path = ctx.abs_path(path);
                let mut file = File::create(&path)
                    .with_context(|| format!("Failed to create output file: {}", path.display()))?;
                formatter(&mut file, &value)?;
            }
            None => formatter(ctx.stdout(), &value)?,
        }
        Ok(())
    }
}

/// Renders `value` as compact JSON followed by a newline
pub fn format_json(w: &mut dyn Write, value: &Value) -> Result<(), FormatError> {
    serde_json::to_writer(&mut *w, value)?;
    w.write_all(b"\n")?;
    Ok(())
}

/// Renders `value` as YAML; null renders as nothing
pub fn format_yaml(w: &mut dyn Write, value: &Value) -> Result<(), FormatError> {
    if value.is_null() {
        return Ok(());
    }
    serde_yaml::to_writer(&mut *w, value)?;
    Ok(())
}

/// Renders `value` for humans.
///
/// Nil and empty strings render as nothing, booleans as `True`/`False`, a
/// list of strings as one per line, and a mapping with scalar leaves as an
/// indented block. Everything else falls back to YAML.
pub fn format_smart(w: &mut dyn Write, value: &Value) -> Result<(), FormatError> {
    match value {
        Value::Null => {}
        Value::String(s) if s.is_empty() => {}
        Value::Array(items) if items.iter().all(Value::is_string) => {
            for item in items.iter().filter_map(Value::as_str) {
                writeln!(w, "{}", item)?;
            }
        }
        Value::Array(_) => format_yaml(w, value)?,
        Value::Object(map) => {
            let mut block = String::new();
            if smart_block(map, 0, &mut block) {
                w.write_all(block.as_bytes())?;
            } else {
                format_yaml(w, value)?;
            }
        }
        scalar => {
            if let Some(text) = smart_scalar(scalar) {
                writeln!(w, "{}", text)?;
            }
        }
    }
    Ok(())
}

fn smart_scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Bool(true) => Some("True".to_string()),
        Value::Bool(false) => Some("False".to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Appends `map` as indented `key: value` lines; returns false when the
/// mapping holds something the plain block form can't express.
fn smart_block(map: &Map<String, Value>, indent: usize, out: &mut String) -> bool {
    if map.is_empty() {
        return false;
    }
    let pad = " ".repeat(indent);
    for (key, value) in map {
        match value {
            Value::Object(inner) => {
                out.push_str(&format!("{}{}:\n", pad, key));
                if !smart_block(inner, indent + 2, out) {
                    return false;
                }
            }
            Value::String(s) if s.contains('\n') => return false,
            scalar => match smart_scalar(scalar) {
                Some(text) => out.push_str(&format!("{}{}: {}\n", pad, key, text)),
                None => return false,
            },
        }
    }
    true
}
