use crate::ConvertError;
use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use zip::ZipArchive;

/// Extracts the single `.kml` member of a KMZ archive next to the archive.
///
/// `places.kmz` is extracted to `places.kml`, any other name gets `.kml` appended. Returns the
/// path of the extracted file.
pub fn extract_kmz(path: &Path) -> Result<PathBuf, ConvertError> {
    info!("Extracting KMZ file '{}'", path.display());
    let name = path.to_string_lossy();
    if name.ends_with(".kml") {
        warn!("The filename ends .kml but is treated as .kmz");
    }
    let extracted = PathBuf::from(format!(
        "{}.kml",
        name.strip_suffix(".kmz").unwrap_or(&name)
    ));

    let mut archive = ZipArchive::new(File::open(path)?)?;
    let members = archive
        .file_names()
        .filter(|n| n.ends_with(".kml"))
        .map(str::to_owned)
        .collect::<Vec<_>>();
    let [member] = members.as_slice() else {
        return Err(ConvertError::InvalidKml(format!(
            "a KMZ file must contain exactly one .kml file, {} found",
            members.len()
        )));
    };

    let mut content = String::new();
    archive.by_name(member)?.read_to_string(&mut content)?;
    fs::write(&extracted, content)?;
    info!("Extracted file written to '{}'", extracted.display());
    Ok(extracted)
}
