//! Transformation parameter keys and values
//!
//! Every parameter renders as `{shortcode}_{value}` inside a group:
//! `w_100,h_150,c_fill`.

use std::str::FromStr;

use super::error::TransformationError;
use super::layer::Layer;
use super::Transformation;

/// How the asset is resized or cropped into the requested dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Crop {
    Fill,
    Crop,
    Scale,
    Fit,
    Limit,
    MFit,
    LFill,
    Pad,
    LPad,
    MPad,
    Thumb,
    ImaggaCrop,
    ImaggaScale,
}

impl Crop {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fill => "fill",
            Self::Crop => "crop",
            Self::Scale => "scale",
            Self::Fit => "fit",
            Self::Limit => "limit",
            Self::MFit => "mfit",
            Self::LFill => "lfill",
            Self::Pad => "pad",
            Self::LPad => "lpad",
            Self::MPad => "mpad",
            Self::Thumb => "thumb",
            Self::ImaggaCrop => "imagga_crop",
            Self::ImaggaScale => "imagga_scale",
        }
    }
}

impl FromStr for Crop {
    type Err = TransformationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "fill" => Ok(Crop::Fill),
            "crop" => Ok(Crop::Crop),
            "scale" => Ok(Crop::Scale),
            "fit" => Ok(Crop::Fit),
            "limit" => Ok(Crop::Limit),
            "mfit" => Ok(Crop::MFit),
            "lfill" => Ok(Crop::LFill),
            "pad" => Ok(Crop::Pad),
            "lpad" => Ok(Crop::LPad),
            "mpad" => Ok(Crop::MPad),
            "thumb" => Ok(Crop::Thumb),
            "imagga_crop" => Ok(Crop::ImaggaCrop),
            "imagga_scale" => Ok(Crop::ImaggaScale),
            _ => Err(TransformationError::UnknownValue {
                kind: "crop mode",
                value: s.to_string(),
            }),
        }
    }
}

/// Gravity/anchor point for cropping and overlays
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Gravity {
    #[default]
    Center,
    North,
    South,
    East,
    West,
    NorthEast,
    NorthWest,
    SouthEast,
    SouthWest,
    Face,
    Faces,
    /// Content-aware automatic gravity
    Auto,
    /// Custom coordinates stored with the asset
    Custom,
}

impl Gravity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Center => "center",
            Self::North => "north",
            Self::South => "south",
            Self::East => "east",
            Self::West => "west",
            Self::NorthEast => "north_east",
            Self::NorthWest => "north_west",
            Self::SouthEast => "south_east",
            Self::SouthWest => "south_west",
            Self::Face => "face",
            Self::Faces => "faces",
            Self::Auto => "auto",
            Self::Custom => "custom",
        }
    }
}

impl FromStr for Gravity {
    type Err = TransformationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "center" => Ok(Gravity::Center),
            "north" => Ok(Gravity::North),
            "south" => Ok(Gravity::South),
            "east" => Ok(Gravity::East),
            "west" => Ok(Gravity::West),
            "north_east" => Ok(Gravity::NorthEast),
            "north_west" => Ok(Gravity::NorthWest),
            "south_east" => Ok(Gravity::SouthEast),
            "south_west" => Ok(Gravity::SouthWest),
            "face" => Ok(Gravity::Face),
            "faces" => Ok(Gravity::Faces),
            "auto" => Ok(Gravity::Auto),
            "custom" => Ok(Gravity::Custom),
            _ => Err(TransformationError::UnknownValue {
                kind: "gravity",
                value: s.to_string(),
            }),
        }
    }
}

/// Transformation parameter keys
///
/// Only the commonly used subset has a dedicated variant; anything else can
/// be passed through with [`Param::Custom`] using its server shortcode.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Param {
    Width,
    Height,
    Crop,
    Gravity,
    Quality,
    FetchFormat,
    Effect,
    Angle,
    Radius,
    Opacity,
    Border,
    Background,
    Color,
    Overlay,
    Underlay,
    DefaultImage,
    Dpr,
    X,
    Y,
    Zoom,
    Flags,
    Density,
    Page,
    AspectRatio,
    VideoCodec,
    AudioCodec,
    BitRate,
    StartOffset,
    EndOffset,
    Duration,
    /// Named transformation(s), or a nested chain
    Transformation,
    Prefix,
    /// Appended verbatim after the sorted parameters
    RawTransformation,
    /// Any other parameter, keyed by its shortcode
    Custom(String),
}

impl Param {
    /// The server-side shortcode of this parameter
    pub fn shortcode(&self) -> &str {
        match self {
            Param::Width => "w",
            Param::Height => "h",
            Param::Crop => "c",
            Param::Gravity => "g",
            Param::Quality => "q",
            Param::FetchFormat => "f",
            Param::Effect => "e",
            Param::Angle => "a",
            Param::Radius => "r",
            Param::Opacity => "o",
            Param::Border => "bo",
            Param::Background => "b",
            Param::Color => "co",
            Param::Overlay => "l",
            Param::Underlay => "u",
            Param::DefaultImage => "d",
            Param::Dpr => "dpr",
            Param::X => "x",
            Param::Y => "y",
            Param::Zoom => "z",
            Param::Flags => "fl",
            Param::Density => "dn",
            Param::Page => "pg",
            Param::AspectRatio => "ar",
            Param::VideoCodec => "vc",
            Param::AudioCodec => "ac",
            Param::BitRate => "br",
            Param::StartOffset => "so",
            Param::EndOffset => "eo",
            Param::Duration => "du",
            Param::Transformation => "t",
            Param::Prefix => "p",
            Param::RawTransformation => "raw_transformation",
            Param::Custom(code) => code.as_str(),
        }
    }
}

/// A parameter value
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Text(String),
    Int(i64),
    /// Rendered with one fractional digit (`0.5`, `2.0`)
    Float(f64),
    /// Rendered as `1` / `0`
    Bool(bool),
    /// Rendered joined by `.` (`fl_progressive.lossy`)
    List(Vec<ParamValue>),
    Layer(Layer),
    /// Chained transformation, only valid under [`Param::Transformation`]
    Nested(Transformation),
}

impl ParamValue {
    /// Render a scalar or list value. Returns `Ok(None)` for empty text,
    /// which drops the parameter from its group.
    pub(crate) fn render(&self, param: &Param) -> Result<Option<String>, TransformationError> {
        match self {
            ParamValue::Text(text) if text.is_empty() => Ok(None),
            ParamValue::Text(text) => Ok(Some(text.clone())),
            ParamValue::Int(value) => Ok(Some(value.to_string())),
            ParamValue::Float(value) => {
                if !value.is_finite() {
                    return Err(TransformationError::invalid_param(
                        param.shortcode(),
                        "number must be finite",
                    ));
                }
                Ok(Some(format!("{:.1}", value)))
            }
            ParamValue::Bool(flag) => Ok(Some(if *flag { "1" } else { "0" }.to_string())),
            ParamValue::List(items) => {
                let mut rendered = Vec::with_capacity(items.len());
                for item in items {
                    if matches!(
                        item,
                        ParamValue::List(_) | ParamValue::Layer(_) | ParamValue::Nested(_)
                    ) {
                        return Err(TransformationError::invalid_param(
                            param.shortcode(),
                            "lists may only contain scalar values",
                        ));
                    }
                    if let Some(value) = item.render(param)? {
                        rendered.push(value);
                    }
                }
                if rendered.is_empty() {
                    Ok(None)
                } else {
                    Ok(Some(rendered.join(".")))
                }
            }
            ParamValue::Layer(layer) => layer.to_param_string().map(Some),
            ParamValue::Nested(_) => Err(TransformationError::invalid_param(
                param.shortcode(),
                "nested transformations are only allowed as a chained transformation",
            )),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Text(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::Text(value)
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        ParamValue::Int(value)
    }
}

impl From<i32> for ParamValue {
    fn from(value: i32) -> Self {
        ParamValue::Int(value as i64)
    }
}

impl From<u32> for ParamValue {
    fn from(value: u32) -> Self {
        ParamValue::Int(value as i64)
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        ParamValue::Float(value)
    }
}

impl From<f32> for ParamValue {
    fn from(value: f32) -> Self {
        ParamValue::Float(value as f64)
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        ParamValue::Bool(value)
    }
}

impl From<Crop> for ParamValue {
    fn from(value: Crop) -> Self {
        ParamValue::Text(value.as_str().to_string())
    }
}

impl From<Gravity> for ParamValue {
    fn from(value: Gravity) -> Self {
        ParamValue::Text(value.as_str().to_string())
    }
}

impl From<Layer> for ParamValue {
    fn from(value: Layer) -> Self {
        ParamValue::Layer(value)
    }
}

impl From<Transformation> for ParamValue {
    fn from(value: Transformation) -> Self {
        ParamValue::Nested(value)
    }
}

impl<T: Into<ParamValue>> From<Vec<T>> for ParamValue {
    fn from(values: Vec<T>) -> Self {
        ParamValue::List(values.into_iter().map(Into::into).collect())
    }
}
