use super::geometry::Geometry;
use super::xml::{Element, KmlDocument};
use crate::ConvertError;

/// A `<Placemark>` with exactly one supported geometry.
#[derive(Debug, Clone, PartialEq)]
pub struct Placemark {
    pub geometry: Geometry,
    pub id: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
}

impl Placemark {
    /// Extracts all placemarks of the document, including nested ones.
    ///
    /// Placemarks without a supported geometry are skipped. More than one geometry in a
    /// placemark is an error.
    pub(crate) fn from_document(doc: &KmlDocument) -> Result<Vec<Self>, ConvertError> {
        let mut nodes = Vec::new();
        doc.root.descendants_named(&doc.kml, "Placemark", &mut nodes);

        let mut placemarks = Vec::new();
        for node in nodes {
            let mut geometries = Geometry::from_kml(node, doc, true)?;
            if geometries.len() > 1 {
                return Err(ConvertError::InvalidKml(
                    "the KML standard allows only one geometry per placemark".to_owned(),
                ));
            }
            let Some(geometry) = geometries.pop() else {
                continue;
            };
            placemarks.push(Self {
                geometry,
                id: node.attribute("id").map(str::to_owned),
                name: child_text(node, doc, "name"),
                description: child_text(node, doc, "description"),
            });
        }
        Ok(placemarks)
    }
}

fn child_text(node: &Element, doc: &KmlDocument, name: &str) -> Option<String> {
    node.child(&doc.kml, name)
        .and_then(Element::text)
        .map(str::to_owned)
}
