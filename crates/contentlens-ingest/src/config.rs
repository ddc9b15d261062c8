use serde::{Deserialize, Serialize};

/// The `[ingest]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    #[serde(default = "default_max_file_size_mb")]
    pub max_file_size_mb: u64,
    #[serde(default = "default_allowed_extensions")]
    pub allowed_extensions: Vec<String>,
    /// External text extractors, one per group of extensions.
    #[serde(default = "default_commands")]
    pub commands: Vec<CommandSpec>,
}

/// An external program that prints the text of a file on stdout.
///
/// `{path}` in `args` is replaced with the file path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandSpec {
    pub extensions: Vec<String>,
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default = "default_command_timeout")]
    pub timeout_secs: u64,
}

fn default_max_file_size_mb() -> u64 {
    20
}

fn default_allowed_extensions() -> Vec<String> {
    ["pdf", "docx", "txt", "png", "jpg", "jpeg"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_command_timeout() -> u64 {
    60
}

fn command(extensions: &[&str], program: &str, args: &[&str]) -> CommandSpec {
    CommandSpec {
        extensions: extensions.iter().map(|e| (*e).to_string()).collect(),
        program: program.to_string(),
        args: args.iter().map(|a| (*a).to_string()).collect(),
        timeout_secs: default_command_timeout(),
    }
}

fn default_commands() -> Vec<CommandSpec> {
    vec![
        command(&["pdf"], "pdftotext", &["-layout", "{path}", "-"]),
        command(&["docx"], "pandoc", &["--to", "plain", "{path}"]),
        command(&["png", "jpg", "jpeg"], "tesseract", &["{path}", "stdout"]),
    ]
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            max_file_size_mb: default_max_file_size_mb(),
            allowed_extensions: default_allowed_extensions(),
            commands: default_commands(),
        }
    }
}

impl IngestConfig {
    /// Upload size limit in bytes.
    pub fn max_file_size_bytes(&self) -> u64 {
        self.max_file_size_mb * 1024 * 1024
    }

    pub fn is_allowed(&self, extension: &str) -> bool {
        self.allowed_extensions
            .iter()
            .any(|e| e.eq_ignore_ascii_case(extension))
    }
}
