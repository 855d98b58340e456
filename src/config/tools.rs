//! External tool configuration

use serde::Deserialize;

use super::error::ValidationError;

/// Programs used by the external-tool converters
///
/// Each value is a program name resolved through `PATH`, or an absolute path.
#[derive(Debug, Clone, Deserialize)]
pub struct ToolsConfig {
    #[serde(default = "default_wkhtmltopdf")]
    pub wkhtmltopdf: String,

    #[serde(default = "default_wkhtmltoimage")]
    pub wkhtmltoimage: String,

    #[serde(default = "default_pdftotext")]
    pub pdftotext: String,

    #[serde(default = "default_pdf2docx")]
    pub pdf2docx: String,

    #[serde(default = "default_img2pdf")]
    pub img2pdf: String,

    #[serde(default = "default_tesseract")]
    pub tesseract: String,

    #[serde(default = "default_yt_dlp")]
    pub yt_dlp: String,
}

impl ToolsConfig {
    /// Validate tool configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        let tools = [
            (&self.wkhtmltopdf, "TOOLS__WKHTMLTOPDF"),
            (&self.wkhtmltoimage, "TOOLS__WKHTMLTOIMAGE"),
            (&self.pdftotext, "TOOLS__PDFTOTEXT"),
            (&self.pdf2docx, "TOOLS__PDF2DOCX"),
            (&self.img2pdf, "TOOLS__IMG2PDF"),
            (&self.tesseract, "TOOLS__TESSERACT"),
            (&self.yt_dlp, "TOOLS__YT_DLP"),
        ];
        for (value, name) in tools {
            if value.trim().is_empty() {
                return Err(ValidationError::MissingRequired(name));
            }
        }
        Ok(())
    }
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            wkhtmltopdf: default_wkhtmltopdf(),
            wkhtmltoimage: default_wkhtmltoimage(),
            pdftotext: default_pdftotext(),
            pdf2docx: default_pdf2docx(),
            img2pdf: default_img2pdf(),
            tesseract: default_tesseract(),
            yt_dlp: default_yt_dlp(),
        }
    }
}

fn default_wkhtmltopdf() -> String {
    "wkhtmltopdf".to_string()
}

fn default_wkhtmltoimage() -> String {
    "wkhtmltoimage".to_string()
}

fn default_pdftotext() -> String {
    "pdftotext".to_string()
}

fn default_pdf2docx() -> String {
    "pdf2docx".to_string()
}

fn default_img2pdf() -> String {
    "img2pdf".to_string()
}

fn default_tesseract() -> String {
    "tesseract".to_string()
}

fn default_yt_dlp() -> String {
    "yt-dlp".to_string()
}
