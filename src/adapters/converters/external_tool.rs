//! Converter that shells out to an external program.
//!
//! Arguments are templates: `{input}` is replaced by the input path or URL,
//! `{output}` by the output path and `{output_stem}` by the output path
//! without its extension (for tools that append their own).

use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

use crate::ports::{ConversionInput, Converter, ConverterError};

const STDERR_LIMIT: usize = 2_000;

/// Runs `program args...` to perform a conversion.
#[derive(Debug, Clone)]
pub struct ExternalToolConverter {
    name: String,
    program: String,
    args: Vec<String>,
}

impl ExternalToolConverter {
    pub fn new(
        name: impl Into<String>,
        program: impl Into<String>,
        args: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            name: name.into(),
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Expands the argument templates for one invocation.
    pub fn render_args(&self, input: &ConversionInput, output: &Path) -> Vec<String> {
        let input = match input {
            ConversionInput::File(path) => path.display().to_string(),
            ConversionInput::Url(url) => url.to_string(),
            ConversionInput::Media(media) => media.watch_url.to_string(),
        };
        let output_stem = output.with_extension("");
        let output = output.display().to_string();
        let output_stem = output_stem.display().to_string();

        self.args
            .iter()
            .map(|arg| {
                arg.replace("{input}", &input)
                    .replace("{output_stem}", &output_stem)
                    .replace("{output}", &output)
            })
            .collect()
    }
}

#[async_trait]
impl Converter for ExternalToolConverter {
    fn name(&self) -> &str {
        &self.name
    }

    async fn convert(&self, input: &ConversionInput, output: &Path) -> Result<(), ConverterError> {
        let args = self.render_args(input, output);
        debug!(converter = %self.name, program = %self.program, args = ?args, "Running external tool");

        let result = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await;

        let output_status = match result {
            Ok(out) => out,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ConverterError::ToolMissing {
                    tool: self.program.clone(),
                });
            }
            Err(e) => return Err(ConverterError::Io(e)),
        };

        if !output_status.status.success() {
            let stderr = String::from_utf8_lossy(&output_status.stderr);
            return Err(ConverterError::ToolFailed {
                tool: self.program.clone(),
                status: output_status.status.code(),
                stderr: stderr.trim().chars().take(STDERR_LIMIT).collect(),
            });
        }

        let written = tokio::fs::metadata(output).await.map(|m| m.len()).unwrap_or(0);
        if written == 0 {
            return Err(ConverterError::ToolFailed {
                tool: self.program.clone(),
                status: output_status.status.code(),
                stderr: "tool produced no output".to_string(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn file_input(path: &str) -> ConversionInput {
        ConversionInput::File(PathBuf::from(path))
    }

    #[test]
    fn test_render_args_substitutes_placeholders() {
        let converter = ExternalToolConverter::new(
            "photo->text",
            "tesseract",
            ["{input}", "{output_stem}"],
        );

        let args = converter.render_args(&file_input("/tmp/in.jpg"), Path::new("/tmp/x/out.txt"));

        assert_eq!(args, vec!["/tmp/in.jpg", "/tmp/x/out"]);
    }

    #[test]
    fn test_render_args_with_url_input() {
        let converter = ExternalToolConverter::new("webpage->pdf", "wkhtmltopdf", ["{input}", "{output}"]);
        let input = ConversionInput::Url(url::Url::parse("https://example.com/a").unwrap());

        let args = converter.render_args(&input, Path::new("/w/page.pdf"));

        assert_eq!(args, vec!["https://example.com/a", "/w/page.pdf"]);
    }

    #[test]
    fn test_render_args_keeps_literal_arguments() {
        let converter = ExternalToolConverter::new(
            "media->mp3",
            "yt-dlp",
            ["-x", "--audio-format", "mp3", "-o", "{output_stem}.%(ext)s", "{input}"],
        );

        let args = converter.render_args(&file_input("u"), Path::new("/w/song.mp3"));

        assert_eq!(args[4], "/w/song.%(ext)s");
        assert_eq!(args[1], "--audio-format");
    }

    #[tokio::test]
    async fn test_missing_program_is_tool_missing() {
        let temp_dir = TempDir::new().unwrap();
        let converter = ExternalToolConverter::new(
            "x",
            "definitely-not-an-installed-tool-7f3a",
            ["{input}"],
        );

        let result = converter
            .convert(&file_input("in"), &temp_dir.path().join("out"))
            .await;

        assert!(matches!(result, Err(ConverterError::ToolMissing { .. })));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failing_program_reports_status_and_stderr() {
        let temp_dir = TempDir::new().unwrap();
        let converter = ExternalToolConverter::new(
            "failing",
            "sh",
            ["-c", "echo broken >&2; exit 3"],
        );

        let result = converter
            .convert(&file_input("in"), &temp_dir.path().join("out"))
            .await;

        match result {
            Err(ConverterError::ToolFailed { status, stderr, .. }) => {
                assert_eq!(status, Some(3));
                assert_eq!(stderr, "broken");
            }
            other => panic!("expected ToolFailed, got {other:?}"),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_successful_program_writes_output() {
        let temp_dir = TempDir::new().unwrap();
        let input = temp_dir.path().join("in.txt");
        std::fs::write(&input, "hello").unwrap();
        let output = temp_dir.path().join("out.txt");
        let converter = ExternalToolConverter::new("copy", "cp", ["{input}", "{output}"]);

        converter
            .convert(&ConversionInput::File(input), &output)
            .await
            .unwrap();

        assert_eq!(std::fs::read_to_string(output).unwrap(), "hello");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_empty_output_is_failure() {
        let temp_dir = TempDir::new().unwrap();
        let output = temp_dir.path().join("out.txt");
        std::fs::write(&output, "").unwrap();
        let converter = ExternalToolConverter::new("noop", "true", Vec::<String>::new());

        let result = converter.convert(&file_input("in"), &output).await;

        assert!(matches!(result, Err(ConverterError::ToolFailed { .. })));
    }
}
