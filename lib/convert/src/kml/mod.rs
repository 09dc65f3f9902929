mod geometry;
mod kmz;
mod placemark;
mod xml;

pub use geometry::{Geometry, LineString, Point, Polygon};
pub use kmz::extract_kmz;
pub use placemark::Placemark;

use crate::{ConvertError, Dataset, DatasetSource};
use rdf_spatial_model::vocab::{datatype, predicate};
use rdf_spatial_model::{typed_term, IdGenerator, Term, Triple, TripleSink};
use tracing::{debug, info};
use xml::KmlDocument;

/// A KML file, converted to one subject with a geometry per placemark.
///
/// Supported are `<Placemark id="">` with `<name>`, `<description>` and one of `<Point>`,
/// `<LineString>`, `<gx:Track>`, `<Polygon>` or `<MultiGeometry>`.
#[derive(Debug, Clone)]
pub struct KmlDataset {
    source: DatasetSource,
}

impl KmlDataset {
    pub fn new(source: DatasetSource) -> Self {
        Self { source }
    }

    /// Parses the placemarks of the loaded file.
    pub fn placemarks(&self) -> Result<Vec<Placemark>, ConvertError> {
        let content = self.source.content()?;
        let doc = KmlDocument::parse(&content)?;
        Placemark::from_document(&doc)
    }
}

impl Dataset for KmlDataset {
    fn source(&self) -> &DatasetSource {
        &self.source
    }

    fn source_mut(&mut self) -> &mut DatasetSource {
        &mut self.source
    }

    fn rdf(&mut self, ids: &IdGenerator, sink: &mut dyn TripleSink) -> Result<(), ConvertError> {
        let placemarks = self.placemarks()?;
        info!(
            "Dataset {} contains {} placemarks",
            self.source.dataset(),
            placemarks.len()
        );

        let type_term = self.source.type_term();
        for placemark in placemarks {
            debug!("Parsed: {placemark:?}");
            let subject = Term::name(format!(
                "{}{}",
                self.source.primary_prefix(),
                ids.next_id()
            ));
            let geometry_subject = subject.with_suffix("_geo");

            sink.push(Triple::new(
                subject.clone(),
                predicate::TYPE,
                type_term.clone(),
            ))?;
            if let Some(parent) = self.source.parent() {
                sink.push(Triple::new(
                    subject.clone(),
                    predicate::MEMBER,
                    parent.clone(),
                ))?;
            }
            for (key, value) in [
                (predicate::LABEL, &placemark.name),
                (predicate::COMMENT, &placemark.description),
                (predicate::IDENTIFIER, &placemark.id),
            ] {
                if let Some(value) = value.as_deref().filter(|v| !v.is_empty()) {
                    sink.push(Triple::new(subject.clone(), key, typed_term(value)))?;
                }
            }

            let wkt = placemark.geometry.to_wkt();
            sink.push(Triple::new(
                subject.clone(),
                predicate::HAS_GEOMETRY,
                geometry_subject.clone(),
            ))?;
            sink.push(Triple::new(
                geometry_subject,
                predicate::AS_WKT,
                Term::typed_literal(wkt.clone(), datatype::WKT_LITERAL),
            ))?;
            sink.push_geometry(&subject, &wkt)?;
        }
        Ok(())
    }
}
