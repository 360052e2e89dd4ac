//! launchd property list.

use std::fmt::Write as _;
use std::path::PathBuf;

use super::{Artifact, path_text};
use crate::config::ServiceDescriptor;
use crate::env::EnvFacts;
use crate::error::Result;

const HEADER: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE plist PUBLIC "-//Apple//DTD PLIST 1.0//EN" "http://www.apple.com/DTDs/PropertyList-1.0.dtd">
<plist version="1.0">
"#;

/// launchd job definition for a descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyList {
    label: String,
    program: PathBuf,
    program_arguments: Vec<String>,
    stdout_path: PathBuf,
    stderr_path: PathBuf,
    keep_alive: bool,
    run_at_load: bool,
    path: PathBuf,
}

impl PropertyList {
    /// Builds the job definition.
    ///
    /// Logs land in `<log root>/<name>/<name>.stdout.log` and `.stderr.log`,
    /// the log root being `/Library/Logs` for system jobs and
    /// `~/Library/Logs` for agents.
    #[must_use]
    pub fn new(descriptor: &ServiceDescriptor, env: &EnvFacts) -> Self {
        let log_root = if env.is_elevated() {
            PathBuf::from("/Library/Logs")
        } else {
            env.home_dir().join("Library/Logs")
        };
        let log_dir = log_root.join(&descriptor.name);

        let mut program_arguments = Vec::with_capacity(descriptor.args.len() + 1);
        program_arguments.push(descriptor.program.display().to_string());
        program_arguments.extend(descriptor.args.iter().cloned());

        let file = format!("{}.plist", descriptor.label);
        let path = if env.is_elevated() {
            PathBuf::from("/Library/LaunchDaemons").join(file)
        } else {
            env.home_dir().join("Library/LaunchAgents").join(file)
        };

        Self {
            label: descriptor.label.clone(),
            program: descriptor.program.clone(),
            program_arguments,
            stdout_path: log_dir.join(format!("{}.stdout.log", descriptor.name)),
            stderr_path: log_dir.join(format!("{}.stderr.log", descriptor.name)),
            keep_alive: true,
            run_at_load: true,
            path,
        }
    }

    /// Job label.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Directory holding the job's stdout/stderr logs.
    #[must_use]
    pub fn log_dir(&self) -> Option<&std::path::Path> {
        self.stdout_path.parent()
    }

    /// Standard output log path.
    #[must_use]
    pub fn stdout_path(&self) -> &std::path::Path {
        &self.stdout_path
    }

    /// Standard error log path.
    #[must_use]
    pub fn stderr_path(&self) -> &std::path::Path {
        &self.stderr_path
    }
}

impl Artifact for PropertyList {
    fn path(&self) -> PathBuf {
        self.path.clone()
    }

    fn render(&self) -> Result<String> {
        let mut out = String::from(HEADER);
        out.push_str("<dict>\n");

        push_string(&mut out, "Label", &self.label);
        push_string(&mut out, "Program", path_text(&self.program)?);

        out.push_str("    <key>ProgramArguments</key>\n    <array>\n");
        for arg in &self.program_arguments {
            let _ = writeln!(out, "        <string>{}</string>", escape_xml(arg));
        }
        out.push_str("    </array>\n");

        push_string(&mut out, "StandardOutPath", path_text(&self.stdout_path)?);
        push_string(&mut out, "StandardErrorPath", path_text(&self.stderr_path)?);
        push_bool(&mut out, "KeepAlive", self.keep_alive);
        push_bool(&mut out, "RunAtLoad", self.run_at_load);

        out.push_str("</dict>\n</plist>\n");
        Ok(out)
    }
}

fn push_string(out: &mut String, key: &str, value: &str) {
    let _ = writeln!(out, "    <key>{key}</key>\n    <string>{}</string>", escape_xml(value));
}

fn push_bool(out: &mut String, key: &str, value: bool) {
    let _ = writeln!(out, "    <key>{key}</key>\n    <{value}/>");
}

/// Escapes XML special characters.
fn escape_xml(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
