//! Geometry-to-style resolution.
//!
//! This is the single place where GeoJSON geometry types are mapped to
//! rendering categories and default paint. Style mutations elsewhere
//! (opacity, color) operate generically on the resolved category instead of
//! special-casing geometry types.

use std::fmt;

/// Rendering category derived from a feature's geometry type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeometryCategory {
    /// Polygon / MultiPolygon, rendered as a filled area
    Polygon,
    /// LineString / MultiLineString, rendered as a stroke
    Line,
    /// Point / MultiPoint, rendered as a circle marker
    Point,
}

impl GeometryCategory {
    /// Returns the category name for logging.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Polygon => "polygon",
            Self::Line => "line",
            Self::Point => "point",
        }
    }
}

impl fmt::Display for GeometryCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An RGB color, serialized as `#RRGGBB`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parses a `#RRGGBB` hex string.
    pub fn parse(s: &str) -> Option<Self> {
        let hex = s.strip_prefix('#')?;
        if hex.len() != 6 {
            return None;
        }
        let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
        let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
        let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
        Some(Self { r, g, b })
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

/// A single paint property value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PaintValue {
    Number(f64),
    Color(Rgb),
}

/// Default fill color for polygon layers (cyan).
const POLYGON_FILL: Rgb = Rgb::new(0x00, 0xFF, 0xFF);
/// Default stroke color for line layers (green).
const LINE_STROKE: Rgb = Rgb::new(0x00, 0x80, 0x00);
/// Default marker color for point layers (red).
const POINT_FILL: Rgb = Rgb::new(0xFF, 0x00, 0x00);
/// Outline color shared by polygon outlines and point strokes.
const OUTLINE: Rgb = Rgb::new(0xB0, 0xBE, 0xC5);
/// Default opacity applied to every newly added layer.
pub const DEFAULT_OPACITY: f64 = 0.5;

/// Default paint for a resolved geometry category.
///
/// Variants carry the full property set the rendering engine needs for the
/// corresponding layer type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DefaultPaint {
    Fill {
        color: Rgb,
        opacity: f64,
        outline_color: Rgb,
    },
    Line {
        color: Rgb,
        width: f64,
        opacity: f64,
    },
    Circle {
        color: Rgb,
        radius: f64,
        opacity: f64,
        stroke_width: f64,
        stroke_color: Rgb,
    },
}

impl DefaultPaint {
    /// Expands the paint into `(property, value)` pairs understood by the
    /// rendering engine.
    pub fn properties(&self) -> Vec<(&'static str, PaintValue)> {
        match *self {
            Self::Fill {
                color,
                opacity,
                outline_color,
            } => vec![
                ("fill-color", PaintValue::Color(color)),
                ("fill-opacity", PaintValue::Number(opacity)),
                ("fill-outline-color", PaintValue::Color(outline_color)),
            ],
            Self::Line {
                color,
                width,
                opacity,
            } => vec![
                ("line-color", PaintValue::Color(color)),
                ("line-width", PaintValue::Number(width)),
                ("line-opacity", PaintValue::Number(opacity)),
            ],
            Self::Circle {
                color,
                radius,
                opacity,
                stroke_width,
                stroke_color,
            } => vec![
                ("circle-color", PaintValue::Color(color)),
                ("circle-radius", PaintValue::Number(radius)),
                ("circle-opacity", PaintValue::Number(opacity)),
                ("circle-stroke-width", PaintValue::Number(stroke_width)),
                ("circle-stroke-color", PaintValue::Color(stroke_color)),
            ],
        }
    }
}

/// A resolved rendering style: the category plus its default paint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedStyle {
    pub category: GeometryCategory,
    pub paint: DefaultPaint,
}

/// Resolves a GeoJSON geometry type string to a rendering style.
///
/// Returns `None` for any type outside the supported set; callers must abort
/// the add-layer operation in that case rather than registering a partial
/// layer.
pub fn resolve_style(geometry_type: &str) -> Option<ResolvedStyle> {
    match geometry_type {
        "Polygon" | "MultiPolygon" => Some(ResolvedStyle {
            category: GeometryCategory::Polygon,
            paint: DefaultPaint::Fill {
                color: POLYGON_FILL,
                opacity: DEFAULT_OPACITY,
                outline_color: OUTLINE,
            },
        }),
        "LineString" | "MultiLineString" => Some(ResolvedStyle {
            category: GeometryCategory::Line,
            paint: DefaultPaint::Line {
                color: LINE_STROKE,
                width: 2.0,
                opacity: DEFAULT_OPACITY,
            },
        }),
        "Point" | "MultiPoint" => Some(ResolvedStyle {
            category: GeometryCategory::Point,
            paint: DefaultPaint::Circle {
                color: POINT_FILL,
                radius: 5.0,
                opacity: DEFAULT_OPACITY,
                stroke_width: 1.0,
                stroke_color: OUTLINE,
            },
        }),
        _ => None,
    }
}
