//! The in-memory scene description a [`SceneNode`](crate::SceneNode) is built from.
//!
//! This mirrors the JSON model files:
//!
//! ```json
//! {
//!   "vertices": [[0, 0, 0], [1, 0, 0], [0, 1, 0]],
//!   "faces": [{ "vertices": [0, 1, 2], "fill": "#333", "doublesided": true }],
//!   "subfaces": [{ "vertices": [0, 1, 2], "parent": 0 }],
//!   "z": -10, "xRot": -1.5708, "stroke": "rgb(0, 187, 0)"
//! }
//! ```
//!
//! Faces may also use the legacy encoding of bare index lists
//! (`"faces": [[0, 1, 2], [2, 3, 0]]`), and the rich form may arrive under the
//! older `faces2` key. [`SceneDescription::face_records`] folds all of these into
//! a single shape so nothing downstream has to care.

use serde::Deserialize;

/// One model: geometry, styling and an initial pose.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneDescription {
    #[serde(default)]
    pub vertices: Vec<[f32; 3]>,
    #[serde(default)]
    pub faces: Vec<FaceEntry>,
    /// Older name for the rich face list; wins over `faces` when present.
    #[serde(default)]
    pub faces2: Option<Vec<FaceEntry>>,
    #[serde(default)]
    pub subfaces: Vec<SubfaceRecord>,
    pub x: Option<f32>,
    pub y: Option<f32>,
    pub z: Option<f32>,
    pub scale: Option<f32>,
    pub x_rot: Option<f32>,
    pub y_rot: Option<f32>,
    pub z_rot: Option<f32>,
    pub fill: Option<String>,
    pub stroke: Option<String>,
}

/// A face in either of its two on-disk encodings.
#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
pub enum FaceEntry {
    Indices(Vec<usize>),
    Record(FaceRecord),
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct FaceRecord {
    pub vertices: Vec<usize>,
    pub stroke: Option<String>,
    pub fill: Option<String>,
    #[serde(default)]
    pub doublesided: bool,
}

/// A decal: vertex indices plus the index of the face it sits on.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct SubfaceRecord {
    pub vertices: Vec<usize>,
    pub parent: usize,
    pub stroke: Option<String>,
    pub fill: Option<String>,
}

impl From<FaceEntry> for FaceRecord {
    fn from(entry: FaceEntry) -> Self {
        match entry {
            FaceEntry::Indices(vertices) => FaceRecord {
                vertices,
                ..Default::default()
            },
            FaceEntry::Record(record) => record,
        }
    }
}

impl SceneDescription {
    /// Parses a JSON model.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// All faces in the unified record form, in declaration order.
    pub fn face_records(&self) -> Vec<FaceRecord> {
        let entries = self.faces2.as_ref().unwrap_or(&self.faces);
        entries.iter().cloned().map(FaceRecord::from).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_and_rich_faces_normalize_to_one_shape() {
        let desc = SceneDescription::from_json(
            r#"{
                "vertices": [[0,0,0],[1,0,0],[1,1,0],[0,1,0]],
                "faces": [[0,1,2], {"vertices": [2,3,0], "fill": "red", "doublesided": true}]
            }"#,
        )
        .unwrap();
        let faces = desc.face_records();
        assert_eq!(faces.len(), 2);
        assert_eq!(faces[0].vertices, vec![0, 1, 2]);
        assert_eq!(faces[0].fill, None);
        assert!(!faces[0].doublesided);
        assert_eq!(faces[1].fill.as_deref(), Some("red"));
        assert!(faces[1].doublesided);
    }

    #[test]
    fn faces2_takes_precedence() {
        let desc = SceneDescription::from_json(
            r#"{ "faces": [[0,1,2]], "faces2": [{"vertices": [2,1,0]}] }"#,
        )
        .unwrap();
        let faces = desc.face_records();
        assert_eq!(faces.len(), 1);
        assert_eq!(faces[0].vertices, vec![2, 1, 0]);
    }

    #[test]
    fn pose_fields_are_optional() {
        let desc = SceneDescription::from_json(r#"{ "x": 3, "xRot": 1.5, "z": null }"#).unwrap();
        assert_eq!(desc.x, Some(3.0));
        assert_eq!(desc.x_rot, Some(1.5));
        assert_eq!(desc.z, None);
        assert_eq!(desc.scale, None);
        assert!(desc.vertices.is_empty());
    }

    #[test]
    fn subfaces_parse() {
        let desc = SceneDescription::from_json(
            r#"{ "subfaces": [{"vertices": [0,1,2], "parent": 4, "fill": "white"}] }"#,
        )
        .unwrap();
        assert_eq!(desc.subfaces[0].parent, 4);
        assert_eq!(desc.subfaces[0].fill.as_deref(), Some("white"));
    }
}
