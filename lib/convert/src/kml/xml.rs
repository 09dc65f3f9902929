use crate::ConvertError;
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::ResolveResult;
use quick_xml::NsReader;

const DEFAULT_GX_NAMESPACE: &str = "http://www.google.com/kml/ext/2.2";

/// An XML element with resolved namespace, in document order.
#[derive(Debug, Clone, Default)]
pub(crate) struct Element {
    namespace: Option<String>,
    name: String,
    attributes: Vec<(String, String)>,
    text: String,
    children: Vec<Element>,
}

impl Element {
    pub(crate) fn is(&self, namespace: &str, name: &str) -> bool {
        self.name == name && self.namespace.as_deref() == Some(namespace)
    }

    pub(crate) fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// The text directly inside the element, `None` if empty.
    pub(crate) fn text(&self) -> Option<&str> {
        (!self.text.is_empty()).then_some(self.text.as_str())
    }

    pub(crate) fn children_named(&self, namespace: &str, name: &str) -> Vec<&Element> {
        self.children
            .iter()
            .filter(|c| c.is(namespace, name))
            .collect()
    }

    pub(crate) fn child(&self, namespace: &str, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.is(namespace, name))
    }

    /// All elements reached by following `path` through the children, in document order.
    pub(crate) fn select(&self, namespace: &str, path: &[&str]) -> Vec<&Element> {
        let mut current = vec![self];
        for step in path {
            current = current
                .into_iter()
                .flat_map(|e| e.children_named(namespace, step))
                .collect();
        }
        current
    }

    /// All descendants with the given name, in document order.
    pub(crate) fn descendants_named<'a>(
        &'a self,
        namespace: &str,
        name: &str,
        found: &mut Vec<&'a Element>,
    ) {
        for child in &self.children {
            if child.is(namespace, name) {
                found.push(child);
            }
            child.descendants_named(namespace, name, found);
        }
    }
}

/// A parsed KML document together with the namespaces it uses.
#[derive(Debug)]
pub(crate) struct KmlDocument {
    pub(crate) root: Element,
    pub(crate) kml: String,
    pub(crate) gx: String,
}

impl KmlDocument {
    /// Parses `source`. The root element must be in a KML namespace.
    pub(crate) fn parse(source: &str) -> Result<Self, ConvertError> {
        let mut reader = NsReader::from_str(source);
        let mut stack: Vec<Element> = Vec::new();
        let mut root = None;
        let mut gx = None;

        loop {
            match reader.read_resolved_event()? {
                (namespace, Event::Start(start)) => {
                    let element = element(namespace, &start, &mut gx)?;
                    stack.push(element);
                }
                (namespace, Event::Empty(start)) => {
                    let element = element(namespace, &start, &mut gx)?;
                    attach(&mut stack, &mut root, element);
                }
                (_, Event::End(_)) => {
                    let element = stack.pop().ok_or_else(|| {
                        ConvertError::InvalidKml("unbalanced closing tag".to_owned())
                    })?;
                    attach(&mut stack, &mut root, element);
                }
                (_, Event::Text(text)) => {
                    if let Some(current) = stack.last_mut() {
                        current.text.push_str(&text.unescape()?);
                    }
                }
                (_, Event::CData(data)) => {
                    if let Some(current) = stack.last_mut() {
                        current
                            .text
                            .push_str(&String::from_utf8_lossy(&data.into_inner()));
                    }
                }
                (_, Event::Eof) => break,
                _ => {}
            }
        }

        let root = root.ok_or_else(|| ConvertError::InvalidKml("no root element".to_owned()))?;
        let kml = match &root.namespace {
            Some(namespace) if namespace.contains("/kml/") => namespace.clone(),
            Some(namespace) => {
                return Err(ConvertError::InvalidKml(format!(
                    "unexpected root namespace {namespace}"
                )))
            }
            None => {
                return Err(ConvertError::InvalidKml(
                    "the root element has no namespace".to_owned(),
                ))
            }
        };
        Ok(Self {
            root,
            kml,
            gx: gx.unwrap_or_else(|| DEFAULT_GX_NAMESPACE.to_owned()),
        })
    }
}

fn element(
    namespace: ResolveResult<'_>,
    start: &BytesStart<'_>,
    gx: &mut Option<String>,
) -> Result<Element, ConvertError> {
    let namespace = match namespace {
        ResolveResult::Bound(namespace) => {
            Some(String::from_utf8_lossy(namespace.0).into_owned())
        }
        _ => None,
    };
    let mut attributes = Vec::new();
    for attribute in start.attributes() {
        let attribute = attribute.map_err(quick_xml::Error::from)?;
        let key = String::from_utf8_lossy(attribute.key.as_ref()).into_owned();
        let value = attribute.unescape_value()?.into_owned();
        if key == "xmlns:gx" && gx.is_none() {
            *gx = Some(value.clone());
        }
        attributes.push((key, value));
    }
    Ok(Element {
        namespace,
        name: String::from_utf8_lossy(start.local_name().as_ref()).into_owned(),
        attributes,
        ..Element::default()
    })
}

fn attach(stack: &mut [Element], root: &mut Option<Element>, element: Element) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None => *root = Some(element),
    }
}
