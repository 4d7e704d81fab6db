use thiserror::Error;

/// Errors produced while decoding or encoding a TCX document.
///
/// Every variant is fatal to the call that produced it; no partial
/// activity or partial document is ever returned.
#[derive(Debug, Error)]
pub enum TcxError {
    #[error("XML parse error: {0}")]
    XmlParse(#[from] quick_xml::Error),

    #[error("missing required <{0}> element")]
    MissingElement(&'static str),

    #[error("missing attribute '{attribute}' on <{element}>")]
    MissingAttribute {
        element: &'static str,
        attribute: &'static str,
    },

    #[error("invalid value '{value}' in <{element}>")]
    InvalidValue {
        element: &'static str,
        value: String,
    },

    #[error("no waypoints in activity")]
    NoWaypoints,

    #[error("XML write error: {0}")]
    Io(#[from] std::io::Error),
}
