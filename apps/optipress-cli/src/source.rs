//! Loading the image to send

use anyhow::{Context, Result};
use bytes::Bytes;
use optipress_domain::uploader::SelectedFile;
use std::path::Path;
use tokio::io::AsyncReadExt;

/// Argument value meaning "read standard input"
pub const STDIN_MARKER: &str = "-";

/// Name given to images read from standard input
const STDIN_NAME: &str = "pasted-image";

const OCTET_STREAM: &str = "application/octet-stream";

/// Where the image comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    Path(String),
    Stdin,
}

impl Source {
    pub fn parse(input: &str) -> Self {
        if input == STDIN_MARKER {
            Source::Stdin
        } else {
            Source::Path(input.to_string())
        }
    }

    pub fn is_stdin(&self) -> bool {
        matches!(self, Source::Stdin)
    }

    /// Read the image and work out its MIME type
    ///
    /// Files are typed by extension, the way a browser labels a picked file.
    /// Standard input has no name, so its type is sniffed from magic bytes.
    pub async fn load(&self) -> Result<SelectedFile> {
        match self {
            Source::Path(path) => {
                let data = tokio::fs::read(path)
                    .await
                    .with_context(|| format!("Failed to read {}", path))?;
                let name = Path::new(path)
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_else(|| path.clone());
                Ok(SelectedFile::new(name, mime_from_path(path), Bytes::from(data)))
            }
            Source::Stdin => {
                let mut data = Vec::new();
                tokio::io::stdin()
                    .read_to_end(&mut data)
                    .await
                    .context("Failed to read standard input")?;
                let mime = sniff_mime(&data);
                Ok(SelectedFile::new(STDIN_NAME, mime, Bytes::from(data)))
            }
        }
    }
}

fn mime_from_path(path: &str) -> String {
    mime_guess::from_path(path)
        .first_raw()
        .unwrap_or(OCTET_STREAM)
        .to_string()
}

/// MIME type from the leading bytes, `application/octet-stream` when unknown
pub fn sniff_mime(data: &[u8]) -> String {
    image::guess_format(data)
        .map(|format| format.to_mime_type())
        .unwrap_or(OCTET_STREAM)
        .to_string()
}
