use super::xml::{Element, KmlDocument};
use crate::ConvertError;
use std::fmt::Write;

/// A WGS84 coordinate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    lat: f64,
    lng: f64,
}

impl Point {
    pub fn new(lat: f64, lng: f64) -> Result<Self, ConvertError> {
        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lng) {
            return Err(ConvertError::InvalidKml(format!(
                "coordinate out of range: lat {lat}, lng {lng}"
            )));
        }
        Ok(Self { lat, lng })
    }

    pub fn lat(&self) -> f64 {
        self.lat
    }

    pub fn lng(&self) -> f64 {
        self.lng
    }

    /// Parses a KML tuple `lng,lat[,alt]`.
    fn from_kml_coords(coords: &str) -> Result<Self, ConvertError> {
        let mut parts = coords.trim_end().split(',');
        let lng = parse_coordinate(parts.next(), coords)?;
        let lat = parse_coordinate(parts.next(), coords)?;
        Self::new(lat, lng)
    }

    fn write_coords(&self, out: &mut String) {
        let _ = write!(
            out,
            "{} {}",
            format_coordinate(self.lng),
            format_coordinate(self.lat)
        );
    }
}

/// A line through at least two points.
#[derive(Debug, Clone, PartialEq)]
pub struct LineString {
    points: Vec<Point>,
}

impl LineString {
    pub fn new(points: Vec<Point>) -> Result<Self, ConvertError> {
        if points.len() < 2 {
            return Err(ConvertError::InvalidKml(
                "a line string needs at least two points".to_owned(),
            ));
        }
        Ok(Self { points })
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Parses whitespace separated KML tuples. `None` if there are less than two points.
    fn from_kml_coords(coords: &str) -> Result<Option<Self>, ConvertError> {
        let points = coords
            .split_whitespace()
            .map(Point::from_kml_coords)
            .collect::<Result<Vec<_>, _>>()?;
        Ok((points.len() >= 2).then_some(Self { points }))
    }

    fn write_coords(&self, out: &mut String) {
        out.push('(');
        for (i, point) in self.points.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            point.write_coords(out);
        }
        out.push(')');
    }
}

/// An outer ring with any number of holes.
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    outer: LineString,
    inner: Vec<LineString>,
}

impl Polygon {
    pub fn new(outer: LineString, inner: Vec<LineString>) -> Self {
        Self { outer, inner }
    }

    pub fn outer(&self) -> &LineString {
        &self.outer
    }

    pub fn inner(&self) -> &[LineString] {
        &self.inner
    }

    fn write_coords(&self, out: &mut String) {
        out.push('(');
        self.outer.write_coords(out);
        for inner in &self.inner {
            out.push_str(", ");
            inner.write_coords(out);
        }
        out.push(')');
    }
}

/// A geometry of a placemark.
///
/// Collections only contain points, line strings and polygons. A collection whose members all
/// have the same type is written as `MULTIPOINT`, `MULTILINESTRING` or `MULTIPOLYGON`, otherwise
/// as `GEOMETRYCOLLECTION`.
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Point(Point),
    LineString(LineString),
    Polygon(Polygon),
    Collection(Vec<Geometry>),
}

impl Geometry {
    pub fn wkt_type(&self) -> String {
        match self {
            Self::Point(_) => "POINT".to_owned(),
            Self::LineString(_) => "LINESTRING".to_owned(),
            Self::Polygon(_) => "POLYGON".to_owned(),
            Self::Collection(members) => match homogeneous_type(members) {
                Some(member_type) => format!("MULTI{member_type}"),
                None => "GEOMETRYCOLLECTION".to_owned(),
            },
        }
    }

    /// The well-known text of the geometry, e.g. `POINT(7.8 48.0)`.
    pub fn to_wkt(&self) -> String {
        let mut out = String::new();
        self.write_wkt(&mut out, true);
        out
    }

    fn write_wkt(&self, out: &mut String, with_type: bool) {
        if with_type {
            out.push_str(&self.wkt_type());
        }
        match self {
            Self::Point(point) => {
                out.push('(');
                point.write_coords(out);
                out.push(')');
            }
            Self::LineString(line) => line.write_coords(out),
            Self::Polygon(polygon) => polygon.write_coords(out),
            Self::Collection(members) => {
                let heterogeneous = homogeneous_type(members).is_none();
                out.push('(');
                for (i, member) in members.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    member.write_wkt(out, heterogeneous);
                }
                out.push(')');
            }
        }
    }

    /// All geometries directly below a placemark (or a `MultiGeometry`), in the order points,
    /// lines, tracks, polygons and, if `collections` is set, multi geometries.
    pub(crate) fn from_kml(
        node: &Element,
        doc: &KmlDocument,
        collections: bool,
    ) -> Result<Vec<Self>, ConvertError> {
        let kml = doc.kml.as_str();
        let mut geometries = Vec::new();

        for coordinates in node.select(kml, &["Point", "coordinates"]) {
            let text = coordinates.text().unwrap_or_default();
            geometries.push(Self::Point(Point::from_kml_coords(text)?));
        }

        for coordinates in node.select(kml, &["LineString", "coordinates"]) {
            let text = coordinates.text().unwrap_or_default();
            if let Some(line) = LineString::from_kml_coords(text)? {
                geometries.push(Self::LineString(line));
            }
        }
        for track in node.children_named(&doc.gx, "Track") {
            let mut points = Vec::new();
            for coord in track.children_named(&doc.gx, "coord") {
                let Some(text) = coord.text() else {
                    continue;
                };
                let mut parts = text.split_whitespace();
                let lng = parse_coordinate(parts.next(), text)?;
                let lat = parse_coordinate(parts.next(), text)?;
                points.push(Point::new(lat, lng)?);
            }
            if points.len() >= 2 {
                geometries.push(Self::LineString(LineString { points }));
            }
        }

        for polygon in node.children_named(kml, "Polygon") {
            let outer_path = ["outerBoundaryIs", "LinearRing", "coordinates"];
            let Some(outer) = polygon.select(kml, &outer_path).into_iter().next() else {
                continue;
            };
            let outer = LineString::from_kml_coords(outer.text().unwrap_or_default())?;
            let mut inner = Vec::new();
            let inner_path = ["innerBoundaryIs", "LinearRing", "coordinates"];
            for ring in polygon.select(kml, &inner_path) {
                if let Some(ring) = LineString::from_kml_coords(ring.text().unwrap_or_default())? {
                    inner.push(ring);
                }
            }
            if let Some(outer) = outer {
                geometries.push(Self::Polygon(Polygon::new(outer, inner)));
            }
        }

        if collections {
            for multi in node.children_named(kml, "MultiGeometry") {
                let members = Self::from_kml(multi, doc, false)?;
                if !members.is_empty() {
                    geometries.push(Self::Collection(members));
                }
            }
        }
        Ok(geometries)
    }
}

fn homogeneous_type(members: &[Geometry]) -> Option<&'static str> {
    let mut member_type = None;
    for member in members {
        let current = match member {
            Geometry::Point(_) => "POINT",
            Geometry::LineString(_) => "LINESTRING",
            Geometry::Polygon(_) => "POLYGON",
            Geometry::Collection(_) => return None,
        };
        match member_type {
            None => member_type = Some(current),
            Some(t) if t != current => return None,
            Some(_) => {}
        }
    }
    member_type
}

fn parse_coordinate(value: Option<&str>, context: &str) -> Result<f64, ConvertError> {
    value
        .and_then(|v| v.trim().parse().ok())
        .ok_or_else(|| ConvertError::InvalidKml(format!("invalid coordinates '{context}'")))
}

/// Formats like a shortest round-trip float, always with a fractional part: `7.0`, `48.119569`.
fn format_coordinate(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.1}")
    } else {
        value.to_string()
    }
}
