//! Overlay and underlay layers
//!
//! Image layers render as `[resource_type:][type:]public_id[.format]` with
//! folder separators turned into `:`. Text layers render as
//! `text:{family}_{size}[_weight][_style][_decoration]:{text}`.

use super::error::TransformationError;
use crate::url::encoding::smart_encode;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerResourceType {
    Image,
    Raw,
    Video,
    Auto,
    Text,
    Subtitles,
}

impl LayerResourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Raw => "raw",
            Self::Video => "video",
            Self::Auto => "auto",
            Self::Text => "text",
            Self::Subtitles => "subtitles",
        }
    }

    fn is_textual(&self) -> bool {
        matches!(self, Self::Text | Self::Subtitles)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontWeight {
    Normal,
    Bold,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontStyle {
    Normal,
    Italic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextDecoration {
    None,
    Underline,
    Strikethrough,
}

/// Font settings for text and subtitle layers
#[derive(Debug, Clone, PartialEq)]
pub struct TextStyle {
    pub font_family: String,
    pub font_size: u32,
    pub font_weight: FontWeight,
    pub font_style: FontStyle,
    pub text_decoration: TextDecoration,
}

impl TextStyle {
    pub fn new(font_family: impl Into<String>, font_size: u32) -> Self {
        Self {
            font_family: font_family.into(),
            font_size,
            font_weight: FontWeight::Normal,
            font_style: FontStyle::Normal,
            text_decoration: TextDecoration::None,
        }
    }

    pub fn bold(mut self) -> Self {
        self.font_weight = FontWeight::Bold;
        self
    }

    pub fn italic(mut self) -> Self {
        self.font_style = FontStyle::Italic;
        self
    }

    pub fn underline(mut self) -> Self {
        self.text_decoration = TextDecoration::Underline;
        self
    }

    pub fn strikethrough(mut self) -> Self {
        self.text_decoration = TextDecoration::Strikethrough;
        self
    }

    fn to_param_string(&self) -> Result<String, TransformationError> {
        if self.font_family.trim().is_empty() || self.font_size == 0 {
            return Err(TransformationError::InvalidLayer(
                "text style requires a font family and a non-zero font size".to_string(),
            ));
        }

        let mut parts = vec![self.font_family.replace(' ', "%20"), self.font_size.to_string()];
        if self.font_weight == FontWeight::Bold {
            parts.push("bold".to_string());
        }
        if self.font_style == FontStyle::Italic {
            parts.push("italic".to_string());
        }
        match self.text_decoration {
            TextDecoration::None => {}
            TextDecoration::Underline => parts.push("underline".to_string()),
            TextDecoration::Strikethrough => parts.push("strikethrough".to_string()),
        }
        Ok(parts.join("_"))
    }
}

/// A layer placed over (or under) the base asset
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Layer {
    public_id: Option<String>,
    format: Option<String>,
    resource_type: Option<LayerResourceType>,
    delivery_type: Option<String>,
    text: Option<String>,
    style: Option<TextStyle>,
}

impl Layer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Image layer referencing an uploaded asset
    pub fn image(public_id: impl Into<String>) -> Self {
        Self::new().public_id(public_id)
    }

    pub fn text(text: impl Into<String>, style: TextStyle) -> Self {
        Self {
            resource_type: Some(LayerResourceType::Text),
            text: Some(text.into()),
            style: Some(style),
            ..Self::default()
        }
    }

    pub fn subtitles(public_id: impl Into<String>, style: Option<TextStyle>) -> Self {
        Self {
            resource_type: Some(LayerResourceType::Subtitles),
            public_id: Some(public_id.into()),
            style,
            ..Self::default()
        }
    }

    pub fn public_id(mut self, public_id: impl Into<String>) -> Self {
        self.public_id = Some(public_id.into());
        self
    }

    pub fn format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    pub fn resource_type(mut self, resource_type: LayerResourceType) -> Self {
        self.resource_type = Some(resource_type);
        self
    }

    pub fn delivery_type(mut self, delivery_type: impl Into<String>) -> Self {
        self.delivery_type = Some(delivery_type.into());
        self
    }

    /// Render the layer as an `l_`/`u_` parameter value
    pub fn to_param_string(&self) -> Result<String, TransformationError> {
        let resource_type = self.resource_type.unwrap_or(LayerResourceType::Image);
        let public_id = self.public_id.as_deref().filter(|id| !id.is_empty());

        if !resource_type.is_textual() && public_id.is_none() {
            return Err(TransformationError::InvalidLayer(
                "must supply a public id for a non-text layer".to_string(),
            ));
        }

        let mut components: Vec<String> = Vec::new();
        if resource_type != LayerResourceType::Image {
            components.push(resource_type.as_str().to_string());
        }
        if let Some(delivery_type) = self.delivery_type.as_deref() {
            if !delivery_type.is_empty() && delivery_type != "upload" {
                components.push(delivery_type.to_string());
            }
        }

        match resource_type {
            LayerResourceType::Text => {
                let text = self.text.as_deref().filter(|t| !t.is_empty());
                let (Some(text), Some(style)) = (text, self.style.as_ref()) else {
                    return Err(TransformationError::InvalidLayer(
                        "text layer requires both text and a text style".to_string(),
                    ));
                };
                components.push(style.to_param_string()?);
                components.push(escape_layer_text(text));
            }
            LayerResourceType::Subtitles => {
                let Some(public_id) = public_id else {
                    return Err(TransformationError::InvalidLayer(
                        "subtitles layer requires a public id".to_string(),
                    ));
                };
                if let Some(style) = self.style.as_ref() {
                    components.push(style.to_param_string()?);
                }
                components.push(public_id.replace('/', ":"));
            }
            _ => {
                // Checked above
                let public_id = public_id.unwrap_or_default();
                let mut id = public_id.replace('/', ":");
                if let Some(format) = self.format.as_deref().filter(|f| !f.is_empty()) {
                    id.push('.');
                    id.push_str(format);
                }
                components.push(id);
            }
        }

        Ok(components.join(":"))
    }
}

/// Commas and slashes would be read as parameter and group separators
fn escape_layer_text(text: &str) -> String {
    smart_encode(text).replace('/', "%2F")
}
