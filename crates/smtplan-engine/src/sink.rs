//! Destination for generated encodings.
//!
//! Each encode step opens the destination, writes, flushes and closes it
//! before returning, whether or not the encoder succeeded. A solver started
//! afterwards always sees a complete file.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use miette::Diagnostic;
use tempfile::TempPath;
use thiserror::Error;
use tracing::debug;

use crate::config::Configuration;
use crate::ports::PortError;

#[derive(Debug, Error, Diagnostic)]
pub enum SinkError {
    #[error("Unable to open file for output: {path}: {source}")]
    #[diagnostic(code(smtplan::io::open))]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Unable to create scratch encoding file: {0}")]
    #[diagnostic(code(smtplan::io::scratch))]
    Scratch(#[source] io::Error),
    #[error("Failed writing encoding: {0}")]
    #[diagnostic(code(smtplan::io::write))]
    Write(#[source] io::Error),
    #[error("Encoder failed at bound {bound}: {source}")]
    #[diagnostic(code(smtplan::encode))]
    Encode {
        bound: u64,
        #[source]
        source: PortError,
    },
}

#[derive(Debug)]
pub enum EncodingSink {
    File(PathBuf),
    Stdout,
    /// Temporary file used when solving without a configured path; removed on drop.
    Scratch(TempPath),
}

impl EncodingSink {
    /// The configured path wins. Without one, encode-only runs print to
    /// standard output and solving runs use a scratch file.
    pub fn for_config(config: &Configuration) -> Result<Self, SinkError> {
        if let Some(path) = &config.encoding_path {
            return Ok(EncodingSink::File(path.clone()));
        }
        if !config.solve {
            return Ok(EncodingSink::Stdout);
        }
        let scratch = tempfile::Builder::new()
            .prefix("smtplan-")
            .suffix(".smt2")
            .tempfile()
            .map_err(SinkError::Scratch)?
            .into_temp_path();
        debug!(path = %scratch.display(), "using scratch encoding file");
        Ok(EncodingSink::Scratch(scratch))
    }

    /// File the solver can read, if the encoding is persisted.
    pub fn location(&self) -> Option<&Path> {
        match self {
            EncodingSink::File(path) => Some(path.as_path()),
            EncodingSink::Scratch(path) => Some(&**path),
            EncodingSink::Stdout => None,
        }
    }

    pub fn is_stdout(&self) -> bool {
        matches!(self, EncodingSink::Stdout)
    }

    /// Open the destination, run `encode` against it, and release it.
    pub fn write_with<F>(&self, bound: u64, encode: F) -> Result<(), SinkError>
    where
        F: FnOnce(&mut dyn Write) -> Result<(), PortError>,
    {
        match self {
            EncodingSink::Stdout => {
                let stdout = io::stdout();
                let mut out = stdout.lock();
                write_scoped(&mut out, bound, encode)
            }
            EncodingSink::File(path) => write_file(path, bound, encode),
            EncodingSink::Scratch(path) => write_file(path, bound, encode),
        }
    }
}

fn write_file<F>(path: &Path, bound: u64, encode: F) -> Result<(), SinkError>
where
    F: FnOnce(&mut dyn Write) -> Result<(), PortError>,
{
    let file = File::create(path).map_err(|source| SinkError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let mut out = BufWriter::new(file);
    write_scoped(&mut out, bound, encode)?;
    out.into_inner()
        .map_err(|e| SinkError::Write(e.into_error()))?
        .sync_all()
        .map_err(SinkError::Write)
}

fn write_scoped<W, F>(out: &mut W, bound: u64, encode: F) -> Result<(), SinkError>
where
    W: Write,
    F: FnOnce(&mut dyn Write) -> Result<(), PortError>,
{
    encode(out).map_err(|source| SinkError::Encode { bound, source })?;
    out.flush().map_err(SinkError::Write)
}
