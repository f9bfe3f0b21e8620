//! Typed API results
//!
//! Every field is optional: the API only returns what applies to the
//! uploaded resource and the requested features. Unknown fields are kept in
//! `extra` so nothing in the response is lost.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;

use crate::network::NetworkError;

/// Result of an upload
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UploadResult {
    pub public_id: Option<String>,
    #[serde(default, deserialize_with = "version_string")]
    pub version: Option<String>,
    pub url: Option<String>,
    pub secure_url: Option<String>,
    pub resource_type: Option<String>,
    pub signature: Option<String>,
    pub created_at: Option<String>,
    /// Size in bytes
    pub bytes: Option<u64>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub moderation: Option<serde_json::Value>,

    // Image
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub format: Option<String>,
    pub exif: Option<HashMap<String, String>>,
    pub image_metadata: Option<HashMap<String, String>>,
    /// Face rectangles as `[x, y, width, height]`
    pub faces: Option<Vec<Vec<f64>>>,
    pub colors: Option<serde_json::Value>,
    pub phash: Option<String>,
    pub delete_token: Option<String>,
    pub info: Option<Info>,

    // Video
    pub video: Option<VideoInfo>,
    pub audio: Option<AudioInfo>,
    pub frame_rate: Option<f64>,
    pub bit_rate: Option<u64>,
    pub duration: Option<f64>,

    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

impl UploadResult {
    /// Faces found by the Rekognition add-on, if it ran
    pub fn rekognition_faces(&self) -> Option<&[Face]> {
        self.info
            .as_ref()?
            .detection
            .as_ref()?
            .rekognition_face
            .as_ref()
            .map(|r| r.data.as_slice())
    }
}

/// Result of a rename
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RenameResult {
    pub public_id: Option<String>,
    pub format: Option<String>,
    #[serde(default, deserialize_with = "version_string")]
    pub version: Option<String>,
    pub resource_type: Option<String>,
    #[serde(rename = "type")]
    pub delivery_type: Option<String>,
    pub created_at: Option<String>,
    pub bytes: Option<u64>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub url: Option<String>,
    pub secure_url: Option<String>,
    pub next_cursor: Option<String>,
    pub exif: Option<HashMap<String, String>>,
    pub image_metadata: Option<HashMap<String, String>>,
    pub faces: Option<Vec<Vec<f64>>>,
    pub colors: Option<serde_json::Value>,
    #[serde(default)]
    pub derived: Vec<Derived>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub moderation: Option<serde_json::Value>,
    pub context: Option<serde_json::Value>,
    pub phash: Option<String>,
    pub predominant: Option<serde_json::Value>,
    pub coordinates: Option<Coordinates>,
    pub info: Option<Info>,

    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

/// A derived version of a resource
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Derived {
    pub transformation: Option<String>,
    pub format: Option<String>,
    pub bytes: Option<u64>,
    pub id: Option<String>,
    pub url: Option<String>,
    pub secure_url: Option<String>,
}

/// Custom and detected face coordinates, each `[x, y, width, height]`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub custom: Option<Vec<Vec<f64>>>,
    pub faces: Option<Vec<Vec<f64>>>,
}

/// Add-on results
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Info {
    pub detection: Option<Detection>,
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub rekognition_face: Option<RekognitionFace>,
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RekognitionFace {
    pub status: Option<String>,
    #[serde(default)]
    pub data: Vec<Face>,
}

/// A point in image coordinates
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    #[serde(rename = "tl")]
    pub top_left: Option<Coordinate>,
    pub size: Option<Size>,
}

/// A face detected by Rekognition
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Face {
    #[serde(rename = "boundingbox")]
    pub bounding_box: Option<BoundingBox>,
    pub confidence: Option<f64>,
    pub age: Option<f64>,
    pub smile: Option<f64>,
    pub glasses: Option<f64>,
    pub sunglasses: Option<f64>,
    pub beard: Option<f64>,
    pub mustache: Option<f64>,
    pub eye_closed: Option<f64>,
    pub mouth_open_wide: Option<f64>,
    pub beauty: Option<f64>,
    #[serde(rename = "sex")]
    pub gender: Option<f64>,
    pub race: Option<HashMap<String, f64>>,
    pub emotion: Option<HashMap<String, f64>>,
    pub quality: Option<HashMap<String, f64>>,
    pub pose: Option<HashMap<String, f64>>,
    pub eye_left: Option<Coordinate>,
    pub eye_right: Option<Coordinate>,
    #[serde(rename = "e_ll")]
    pub eye_left_left: Option<Coordinate>,
    #[serde(rename = "e_lr")]
    pub eye_left_right: Option<Coordinate>,
    #[serde(rename = "e_lu")]
    pub eye_left_up: Option<Coordinate>,
    #[serde(rename = "e_ld")]
    pub eye_left_down: Option<Coordinate>,
    #[serde(rename = "e_rl")]
    pub eye_right_left: Option<Coordinate>,
    #[serde(rename = "e_rr")]
    pub eye_right_right: Option<Coordinate>,
    #[serde(rename = "e_ru")]
    pub eye_right_up: Option<Coordinate>,
    #[serde(rename = "e_rd")]
    pub eye_right_down: Option<Coordinate>,
    pub nose: Option<Coordinate>,
    #[serde(rename = "n_l")]
    pub nose_left: Option<Coordinate>,
    #[serde(rename = "n_r")]
    pub nose_right: Option<Coordinate>,
    #[serde(rename = "mouth_l")]
    pub mouth_left: Option<Coordinate>,
    #[serde(rename = "mouth_r")]
    pub mouth_right: Option<Coordinate>,
    #[serde(rename = "m_u")]
    pub mouth_up: Option<Coordinate>,
    #[serde(rename = "m_d")]
    pub mouth_down: Option<Coordinate>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VideoInfo {
    #[serde(rename = "pix_format")]
    pub format: Option<String>,
    pub codec: Option<String>,
    pub level: Option<i64>,
    pub bit_rate: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AudioInfo {
    pub codec: Option<String>,
    pub bit_rate: Option<u64>,
    pub frequency: Option<u64>,
    pub channels: Option<u32>,
    pub channel_layout: Option<String>,
}

/// Versions come back as numbers; keep them as strings like URLs use them
fn version_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// Convert a parsed API response into a typed result
pub fn from_json<T: serde::de::DeserializeOwned>(json: serde_json::Value) -> Result<T, NetworkError> {
    serde_json::from_value(json).map_err(|e| NetworkError::InvalidResponse(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_upload_result_parses_image_fields() {
        let result: UploadResult = from_json(json!({
            "public_id": "sample",
            "version": 1315060510,
            "signature": "abcdef",
            "width": 864,
            "height": 576,
            "format": "jpg",
            "resource_type": "image",
            "created_at": "2011-09-03T14:35:10Z",
            "tags": ["a", "b"],
            "bytes": 120253,
            "url": "http://res.cloudinary.com/demo/image/upload/v1315060510/sample.jpg",
            "secure_url": "https://res.cloudinary.com/demo/image/upload/v1315060510/sample.jpg",
            "faces": [[10, 20, 30, 40]],
            "etag": "abc"
        }))
        .unwrap();

        assert_eq!(result.public_id.as_deref(), Some("sample"));
        assert_eq!(result.version.as_deref(), Some("1315060510"));
        assert_eq!(result.width, Some(864));
        assert_eq!(result.bytes, Some(120253));
        assert_eq!(result.tags, vec!["a", "b"]);
        assert_eq!(result.faces, Some(vec![vec![10.0, 20.0, 30.0, 40.0]]));
        assert_eq!(result.extra.get("etag"), Some(&json!("abc")));
    }

    #[test]
    fn test_upload_result_parses_video_fields() {
        let result: UploadResult = from_json(json!({
            "resource_type": "video",
            "duration": 13.5,
            "frame_rate": 25.0,
            "bit_rate": 1000,
            "video": {"pix_format": "yuv420p", "codec": "h264", "level": 31, "bit_rate": 900},
            "audio": {"codec": "aac", "frequency": 44100, "channels": 2, "channel_layout": "stereo"}
        }))
        .unwrap();

        let video = result.video.unwrap();
        assert_eq!(video.format.as_deref(), Some("yuv420p"));
        assert_eq!(video.level, Some(31));
        let audio = result.audio.unwrap();
        assert_eq!(audio.channels, Some(2));
        assert_eq!(result.duration, Some(13.5));
    }

    #[test]
    fn test_rekognition_faces() {
        let result: UploadResult = from_json(json!({
            "info": {"detection": {"rekognition_face": {
                "status": "complete",
                "data": [{
                    "boundingbox": {"tl": {"x": 1.0, "y": 2.0}, "size": {"width": 3.0, "height": 4.0}},
                    "confidence": 0.99,
                    "sex": 0.2,
                    "eye_left": {"x": 5.0, "y": 6.0},
                    "mouth_l": {"x": 7.0, "y": 8.0}
                }]
            }}}
        }))
        .unwrap();

        let faces = result.rekognition_faces().unwrap();
        assert_eq!(faces.len(), 1);
        let face = &faces[0];
        let bb = face.bounding_box.unwrap();
        assert_eq!(bb.top_left, Some(Coordinate { x: 1.0, y: 2.0 }));
        assert_eq!(bb.size, Some(Size { width: 3.0, height: 4.0 }));
        assert_eq!(face.gender, Some(0.2));
        assert_eq!(face.mouth_left, Some(Coordinate { x: 7.0, y: 8.0 }));
    }

    #[test]
    fn test_rename_result() {
        let result: RenameResult = from_json(json!({
            "public_id": "renamed",
            "version": "2",
            "type": "upload",
            "derived": [{"transformation": "c_fill,w_100", "id": "d1"}],
            "coordinates": {"faces": [[1, 2, 3, 4]]}
        }))
        .unwrap();

        assert_eq!(result.public_id.as_deref(), Some("renamed"));
        assert_eq!(result.version.as_deref(), Some("2"));
        assert_eq!(result.delivery_type.as_deref(), Some("upload"));
        assert_eq!(result.derived[0].id.as_deref(), Some("d1"));
        assert!(result.coordinates.unwrap().faces.is_some());
    }

    #[test]
    fn test_wrong_shape_is_invalid_response() {
        let result: Result<UploadResult, _> = from_json(json!({"width": "wide"}));
        assert!(matches!(result, Err(NetworkError::InvalidResponse(_))));
    }
}
