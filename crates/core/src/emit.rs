//! Renders translation records into per-language JavaScript modules.

use crate::config::{Language, OutputConfig};
use crate::record::TranslationRecord;
use std::path::{Path, PathBuf};

const LOG_TARGET: &str = "emit";
const INDENT: &str = "    ";

#[derive(thiserror::Error, Debug)]
pub enum EmitError {
    #[error("failed to create output directory {}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write {}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Renders the module text for `lang`.
///
/// Entries keep the order of `records`. The output has no trailing newline.
pub fn render_module(lang: Language, records: &[TranslationRecord]) -> String {
    let name = lang.name();
    let entries: Vec<String> = records
        .iter()
        .map(|record| render_entry(&record.key, record.text(lang)))
        .collect();

    format!(
        "const {name} = {{\n{}\n}}\n\nexport default {name}",
        entries.join(",\n")
    )
}

fn render_entry(key: &str, text: &str) -> String {
    let key = if is_identifier(key) {
        key.to_owned()
    } else {
        quote(key)
    };
    format!("{INDENT}{key}: {}", quote(text))
}

pub fn module_path(output: &OutputConfig, lang: Language) -> PathBuf {
    output
        .dir
        .join(format!("{}.{}", lang.name(), output.extension))
}

/// Writes the module for `lang`, replacing any existing file.
pub fn write_module(
    output: &OutputConfig,
    lang: Language,
    records: &[TranslationRecord],
) -> Result<PathBuf, EmitError> {
    ensure_dir(&output.dir)?;
    let path = module_path(output, lang);
    std::fs::write(&path, render_module(lang, records)).map_err(|source| EmitError::Write {
        path: path.clone(),
        source,
    })?;
    tracing::info!(
        target: LOG_TARGET,
        language = %lang,
        entries = records.len(),
        path = %path.display(),
        "module written"
    );
    Ok(path)
}

fn ensure_dir(dir: &Path) -> Result<(), EmitError> {
    if dir.as_os_str().is_empty() || dir.is_dir() {
        return Ok(());
    }
    std::fs::create_dir_all(dir).map_err(|source| EmitError::CreateDir {
        path: dir.to_path_buf(),
        source,
    })
}

/// Double-quoted JavaScript string literal.
fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() || c == '\u{2028}' || c == '\u{2029}' => {
                out.push_str(&format!("\\u{:04x}", c as u32));
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

// ASCII identifiers only; anything else gets quoted.
fn is_identifier(key: &str) -> bool {
    let mut chars = key.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}
