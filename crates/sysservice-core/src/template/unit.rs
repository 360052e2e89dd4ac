//! systemd unit file.

use std::fmt::Write as _;
use std::path::PathBuf;

use super::{Artifact, path_text};
use crate::config::ServiceDescriptor;
use crate::env::EnvFacts;
use crate::error::Result;

/// systemd service unit for a descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitFile {
    label: String,
    description: String,
    documentation: Option<String>,
    program: PathBuf,
    args: Vec<String>,
    path: PathBuf,
}

impl UnitFile {
    /// Builds the unit.
    #[must_use]
    pub fn new(descriptor: &ServiceDescriptor, env: &EnvFacts) -> Self {
        let file = format!("{}.service", descriptor.label);
        let path = if env.is_elevated() {
            PathBuf::from("/etc/systemd/system").join(file)
        } else {
            env.home_dir().join(".config/systemd/user").join(file)
        };

        Self {
            label: descriptor.label.clone(),
            description: descriptor.description.clone(),
            documentation: descriptor.documentation.clone(),
            program: descriptor.program.clone(),
            args: descriptor.args.clone(),
            path,
        }
    }

    /// Unit name as passed to `systemctl`.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// The `ExecStart=` value.
    pub fn exec_start(&self) -> Result<String> {
        let mut line = quote_word(path_text(&self.program)?);
        for arg in &self.args {
            line.push(' ');
            line.push_str(&quote_word(arg));
        }
        Ok(line)
    }
}

impl Artifact for UnitFile {
    fn path(&self) -> PathBuf {
        self.path.clone()
    }

    fn render(&self) -> Result<String> {
        let mut out = String::new();

        out.push_str("[Unit]\n");
        out.push_str("After=network.target\n");
        let _ = writeln!(out, "Description={}", escape_value(&self.description));
        if let Some(doc) = &self.documentation {
            let _ = writeln!(out, "Documentation={}", escape_value(doc));
        }

        out.push_str("\n[Service]\n");
        let _ = writeln!(out, "ExecStart={}", self.exec_start()?);
        out.push_str("Restart=on-failure\n");
        out.push_str("Type=simple\n");

        out.push_str("\n[Install]\n");
        out.push_str("WantedBy=multi-user.target\n");

        Ok(out)
    }
}

/// Flattens newlines and escapes `%` specifiers.
fn escape_specifiers(s: &str) -> String {
    s.replace(['\r', '\n'], " ").replace('%', "%%")
}

/// Escapes a free-text value. A trailing backslash would continue the
/// assignment onto the next line, so trailing backslashes and whitespace are
/// dropped.
fn escape_value(s: &str) -> String {
    escape_specifiers(s)
        .trim_end_matches(|c: char| c == '\\' || c.is_whitespace())
        .to_string()
}

/// Escapes one command-line word, quoting it when it contains whitespace or
/// quote characters.
fn quote_word(word: &str) -> String {
    let escaped = escape_specifiers(word).replace('$', "$$");
    let needs_quotes = escaped.is_empty()
        || escaped
            .chars()
            .any(|c| c.is_whitespace() || c == '"' || c == '\'' || c == '\\');
    if !needs_quotes {
        return escaped;
    }

    let mut quoted = String::with_capacity(escaped.len() + 2);
    quoted.push('"');
    for c in escaped.chars() {
        if c == '"' || c == '\\' {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('"');
    quoted
}
