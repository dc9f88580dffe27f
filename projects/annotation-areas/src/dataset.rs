// JSON-document-backed sample store.
//
// This is the narrow interface the area pipeline needs from a dataset
// engine: bulk read of annotation fields and image metadata, typed
// write-back of computed scalar attributes onto nested annotation records,
// and creation of a new order-aligned top-level field. A dataset is one
// JSON document on disk; the backing path is remembered so a run can save
// in place after mutating.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::annotations::{
    AnnotationField, Detections, FieldKind, ImageMetadata, Polylines,
};
use crate::error::AreaError;

/// One visual sample (image) with metadata and named annotation fields.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Sample {
    pub id: String,
    pub filepath: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ImageMetadata>,
    #[serde(default)]
    pub fields: BTreeMap<String, AnnotationField>,
}

impl Sample {
    /// Image dimensions, if present and usable for area math.
    ///
    /// Zero width or height counts as missing: dividing by a zero image
    /// area would propagate inf/NaN into the annotations.
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        self.metadata
            .filter(|m| m.width > 0 && m.height > 0)
            .map(|m| (m.width, m.height))
    }

    pub fn detections(&self, field: &str) -> Option<&Detections> {
        match self.fields.get(field) {
            Some(AnnotationField::Detections(d)) => Some(d),
            _ => None,
        }
    }

    pub fn detections_mut(&mut self, field: &str) -> Option<&mut Detections> {
        match self.fields.get_mut(field) {
            Some(AnnotationField::Detections(d)) => Some(d),
            _ => None,
        }
    }

    pub fn polylines(&self, field: &str) -> Option<&Polylines> {
        match self.fields.get(field) {
            Some(AnnotationField::Polylines(p)) => Some(p),
            _ => None,
        }
    }

    pub fn polylines_mut(&mut self, field: &str) -> Option<&mut Polylines> {
        match self.fields.get_mut(field) {
            Some(AnnotationField::Polylines(p)) => Some(p),
            _ => None,
        }
    }
}

/// A collection of samples backed by a single JSON document.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Dataset {
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub samples: Vec<Sample>,
    #[serde(skip)]
    path: Option<PathBuf>,
}

impl Dataset {
    pub fn new(name: &str) -> Self {
        Dataset {
            name: name.to_string(),
            created_at: Utc::now(),
            samples: Vec::new(),
            path: None,
        }
    }

    pub fn load(path: &Path) -> Result<Self, AreaError> {
        let content = fs::read_to_string(path)?;
        let mut dataset: Dataset = serde_json::from_str(&content)?;
        dataset.path = Some(path.to_path_buf());
        Ok(dataset)
    }

    /// Save back to the file this dataset was loaded from.
    pub fn save(&self) -> Result<(), AreaError> {
        match &self.path {
            Some(path) => self.save_to(path),
            None => Err(AreaError::NoBackingFile),
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<(), AreaError> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn info(&self) {
        tracing::info!("dataset: name: {}", self.name);
        tracing::info!("dataset: samples: {}", self.samples.len());
        let schema = self
            .schema()
            .iter()
            .map(|(name, kind)| format!("{} ({})", name, kind.as_str()))
            .collect::<Vec<String>>()
            .join(", ");
        tracing::info!("dataset: fields: {}", schema);
    }

    /// Field names and kinds present on any sample, in name order.
    pub fn schema(&self) -> BTreeMap<String, FieldKind> {
        let mut schema = BTreeMap::new();
        for sample in &self.samples {
            for (name, value) in &sample.fields {
                schema.entry(name.clone()).or_insert_with(|| value.kind());
            }
        }
        schema
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.samples.iter().any(|s| s.fields.contains_key(field))
    }

    /// Validate that `field` exists and holds the expected annotation kind.
    pub fn expect_field_kind(&self, field: &str, kind: FieldKind) -> Result<(), AreaError> {
        let actual = self
            .samples
            .iter()
            .find_map(|s| s.fields.get(field))
            .ok_or_else(|| AreaError::MissingField(field.to_string()))?;
        if actual.kind() != kind {
            return Err(AreaError::FieldType {
                field: field.to_string(),
                expected: kind.as_str(),
            });
        }
        Ok(())
    }

    /// Bulk read of the detection containers under `field`, one entry per
    /// sample in sample order. Samples without the field yield `None`.
    pub fn detections_values(&self, field: &str) -> Vec<Option<&Detections>> {
        self.samples.iter().map(|s| s.detections(field)).collect()
    }

    /// Create (or replace) a polylines field with one container per sample,
    /// order-aligned with the sample order.
    pub fn set_polylines_field(
        &mut self,
        field: &str,
        containers: Vec<Polylines>,
    ) -> Result<(), AreaError> {
        if containers.len() != self.samples.len() {
            return Err(AreaError::Misaligned {
                expected: self.samples.len(),
                actual: containers.len(),
            });
        }
        for (sample, container) in self.samples.iter_mut().zip(containers) {
            sample
                .fields
                .insert(field.to_string(), AnnotationField::Polylines(container));
        }
        Ok(())
    }

    /// Write a numeric attribute onto every detection addressed by `path`.
    ///
    /// `values` holds one entry per sample in sample order: `None` leaves
    /// the sample untouched, `Some(v)` must align with the sample's
    /// detection list.
    pub fn set_detection_numbers(
        &mut self,
        path: &KeyPath,
        values: &[Option<Vec<f64>>],
    ) -> Result<(), AreaError> {
        if values.len() != self.samples.len() {
            return Err(AreaError::Misaligned {
                expected: self.samples.len(),
                actual: values.len(),
            });
        }

        for (sample, entry) in self.samples.iter_mut().zip(values) {
            let Some(numbers) = entry else {
                continue;
            };
            let container = match sample.fields.get_mut(path.field()) {
                Some(AnnotationField::Detections(d)) => d,
                Some(_) => {
                    return Err(AreaError::FieldType {
                        field: path.field().to_string(),
                        expected: FieldKind::Detections.as_str(),
                    })
                }
                None if numbers.is_empty() => continue,
                None => {
                    return Err(AreaError::Misaligned {
                        expected: 0,
                        actual: numbers.len(),
                    })
                }
            };
            if container.detections.len() != numbers.len() {
                return Err(AreaError::Misaligned {
                    expected: container.detections.len(),
                    actual: numbers.len(),
                });
            }
            for (detection, &value) in container.detections.iter_mut().zip(numbers) {
                match path.attr() {
                    "relative_bbox_area" => detection.relative_bbox_area = Some(value),
                    "absolute_bbox_area" => detection.absolute_bbox_area = Some(value),
                    other => return Err(AreaError::UnknownAttribute(other.to_string())),
                }
            }
        }
        Ok(())
    }
}

/// Name of the derived polylines field for a source field.
pub fn polylines_field_name(field: &str) -> String {
    format!("{field}_polylines")
}

/// Dotted key path addressing a nested annotation attribute, e.g.
/// `ground_truth.detections.absolute_bbox_area`. Centralizes the
/// field-naming convention shared with the storage layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPath {
    field: String,
    container: &'static str,
    attr: String,
}

impl KeyPath {
    pub fn detections_attr(field: &str, attr: &str) -> Self {
        KeyPath {
            field: field.to_string(),
            container: "detections",
            attr: attr.to_string(),
        }
    }

    pub fn polylines_attr(field: &str, attr: &str) -> Self {
        KeyPath {
            field: field.to_string(),
            container: "polylines",
            attr: attr.to_string(),
        }
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn attr(&self) -> &str {
        &self.attr
    }
}

impl fmt::Display for KeyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.field, self.container, self.attr)
    }
}
