//! Transformation specs and their canonical URL serialization
//!
//! A [`Transformation`] is an ordered list of parameter groups. Groups are
//! joined by `/`, parameters inside a group by `,`:
//!
//! ```text
//! c_fill,h_150,w_100/a_90/e_sepia
//! ```
//!
//! Within a group parameters are ordered by shortcode so that two specs with
//! the same content always serialize (and sign) identically. A raw
//! transformation string is appended verbatim after the sorted parameters.

pub mod error;
pub mod layer;
pub mod params;

pub use error::TransformationError;
pub use layer::{FontStyle, FontWeight, Layer, LayerResourceType, TextDecoration, TextStyle};
pub use params::{Crop, Gravity, Param, ParamValue};

/// One parameter group (a single `/`-separated URL component)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParamGroup {
    params: Vec<(Param, ParamValue)>,
}

impl ParamGroup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a parameter, replacing any previous value for the same key
    pub fn set(mut self, param: Param, value: impl Into<ParamValue>) -> Self {
        self.insert(param, value.into());
        self
    }

    pub fn get(&self, param: &Param) -> Option<&ParamValue> {
        self.params.iter().find(|(p, _)| p == param).map(|(_, v)| v)
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    fn insert(&mut self, param: Param, value: ParamValue) {
        match self.params.iter_mut().find(|(p, _)| *p == param) {
            Some(slot) => slot.1 = value,
            None => self.params.push((param, value)),
        }
    }

    /// Render this group. Nested chains come first, each as its own segment,
    /// followed by the group itself when it has anything left to emit.
    fn segments(&self) -> Result<Vec<String>, TransformationError> {
        let mut segments = Vec::new();
        let mut components: Vec<(&str, String)> = Vec::with_capacity(self.params.len());
        let mut raw: Option<String> = None;

        for (param, value) in &self.params {
            if let Param::Custom(code) = param {
                if code.is_empty() {
                    return Err(TransformationError::invalid_param(
                        "custom",
                        "parameter key must not be empty",
                    ));
                }
            }

            match (param, value) {
                (Param::RawTransformation, value) => {
                    raw = value.render(param)?;
                }
                (Param::Transformation, ParamValue::Nested(nested)) => {
                    let serialized = nested.to_url_string()?;
                    if !serialized.is_empty() {
                        segments.push(serialized);
                    }
                }
                (param, value) => {
                    if let Some(rendered) = value.render(param)? {
                        components.push((param.shortcode(), rendered));
                    }
                }
            }
        }

        components.sort_by(|a, b| a.0.cmp(b.0));
        let mut group: Vec<String> = components
            .into_iter()
            .map(|(code, value)| format!("{}_{}", code, value))
            .collect();
        if let Some(raw) = raw {
            group.push(raw);
        }
        if !group.is_empty() {
            segments.push(group.join(","));
        }

        Ok(segments)
    }
}

/// Ordered list of parameter groups
///
/// Built by value: each setter writes into the current (last) group and
/// [`Transformation::chain`] starts a new one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Transformation {
    groups: Vec<ParamGroup>,
}

impl Transformation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn groups(&self) -> &[ParamGroup] {
        &self.groups
    }

    pub fn is_empty(&self) -> bool {
        self.groups.iter().all(ParamGroup::is_empty)
    }

    /// Set a parameter on the current group
    pub fn set(mut self, param: Param, value: impl Into<ParamValue>) -> Self {
        if self.groups.is_empty() {
            self.groups.push(ParamGroup::new());
        }
        if let Some(current) = self.groups.last_mut() {
            current.insert(param, value.into());
        }
        self
    }

    /// Close the current group; following setters write to a new one
    pub fn chain(mut self) -> Self {
        if self.groups.last().map_or(true, |g| !g.is_empty()) {
            self.groups.push(ParamGroup::new());
        }
        self
    }

    /// Append a fully built group
    pub fn with_group(mut self, group: ParamGroup) -> Self {
        match self.groups.last() {
            Some(last) if last.is_empty() => {
                if let Some(slot) = self.groups.last_mut() {
                    *slot = group;
                }
            }
            _ => self.groups.push(group),
        }
        self
    }

    pub fn width(self, value: impl Into<ParamValue>) -> Self {
        self.set(Param::Width, value)
    }

    pub fn height(self, value: impl Into<ParamValue>) -> Self {
        self.set(Param::Height, value)
    }

    pub fn crop(self, crop: Crop) -> Self {
        self.set(Param::Crop, crop)
    }

    pub fn gravity(self, gravity: Gravity) -> Self {
        self.set(Param::Gravity, gravity)
    }

    pub fn quality(self, value: impl Into<ParamValue>) -> Self {
        self.set(Param::Quality, value)
    }

    pub fn fetch_format(self, format: impl Into<String>) -> Self {
        self.set(Param::FetchFormat, format.into())
    }

    pub fn effect(self, effect: impl Into<ParamValue>) -> Self {
        self.set(Param::Effect, effect)
    }

    pub fn angle(self, value: impl Into<ParamValue>) -> Self {
        self.set(Param::Angle, value)
    }

    pub fn radius(self, value: impl Into<ParamValue>) -> Self {
        self.set(Param::Radius, value)
    }

    pub fn opacity(self, value: impl Into<ParamValue>) -> Self {
        self.set(Param::Opacity, value)
    }

    pub fn border(self, value: impl Into<ParamValue>) -> Self {
        self.set(Param::Border, value)
    }

    pub fn background(self, value: impl Into<ParamValue>) -> Self {
        self.set(Param::Background, value)
    }

    pub fn color(self, value: impl Into<ParamValue>) -> Self {
        self.set(Param::Color, value)
    }

    pub fn overlay(self, layer: Layer) -> Self {
        self.set(Param::Overlay, layer)
    }

    pub fn underlay(self, layer: Layer) -> Self {
        self.set(Param::Underlay, layer)
    }

    pub fn default_image(self, public_id: impl Into<String>) -> Self {
        self.set(Param::DefaultImage, public_id.into())
    }

    pub fn dpr(self, value: impl Into<ParamValue>) -> Self {
        self.set(Param::Dpr, value)
    }

    pub fn x(self, value: impl Into<ParamValue>) -> Self {
        self.set(Param::X, value)
    }

    pub fn y(self, value: impl Into<ParamValue>) -> Self {
        self.set(Param::Y, value)
    }

    pub fn zoom(self, value: impl Into<ParamValue>) -> Self {
        self.set(Param::Zoom, value)
    }

    pub fn flags(self, flags: impl Into<ParamValue>) -> Self {
        self.set(Param::Flags, flags)
    }

    pub fn page(self, value: impl Into<ParamValue>) -> Self {
        self.set(Param::Page, value)
    }

    pub fn aspect_ratio(self, value: impl Into<ParamValue>) -> Self {
        self.set(Param::AspectRatio, value)
    }

    /// Reference a named transformation defined in the account
    pub fn named(self, name: impl Into<ParamValue>) -> Self {
        self.set(Param::Transformation, name)
    }

    /// Apply `nested` before the current group
    pub fn nested(self, nested: Transformation) -> Self {
        self.set(Param::Transformation, nested)
    }

    pub fn raw_transformation(self, raw: impl Into<String>) -> Self {
        self.set(Param::RawTransformation, raw.into())
    }

    /// Serialize to the canonical URL component. Empty groups are skipped;
    /// an empty transformation serializes to an empty string.
    pub fn to_url_string(&self) -> Result<String, TransformationError> {
        let mut segments = Vec::with_capacity(self.groups.len());
        for group in &self.groups {
            segments.extend(group.segments()?);
        }
        Ok(segments.join("/"))
    }
}
