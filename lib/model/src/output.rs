use crate::ModelError;
use bzip2::write::BzEncoder;
use bzip2::Compression;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::warn;

/// The writer type for compressed Turtle output files.
pub type Bz2FileWriter = BzEncoder<BufWriter<File>>;

/// Creates a bzip2 compressed output file.
///
/// Output files are expected to be named `*.ttl.bz2`. Other names work, but a warning is logged.
pub fn create_bz2_file(path: &Path) -> Result<Bz2FileWriter, ModelError> {
    if !path.to_string_lossy().ends_with(".ttl.bz2") {
        warn!(
            "Output filename {} is expected to end with '.ttl.bz2'",
            path.display()
        );
    }
    let file = File::create(path)?;
    Ok(BzEncoder::new(BufWriter::new(file), Compression::default()))
}

/// Writes the bzip2 trailer and flushes the file to disk.
pub fn finish_bz2_file(writer: Bz2FileWriter) -> Result<(), ModelError> {
    let mut inner = writer.finish()?;
    inner.flush()?;
    let file = inner
        .into_inner()
        .map_err(std::io::IntoInnerError::into_error)?;
    file.sync_all()?;
    Ok(())
}

/// Creates a plain text file for aux-geo entries.
pub fn create_aux_geo_file(path: &Path) -> Result<Box<dyn Write>, ModelError> {
    Ok(Box::new(BufWriter::new(File::create(path)?)))
}
