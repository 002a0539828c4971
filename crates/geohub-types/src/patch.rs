use serde::{Deserialize, Serialize};

use crate::error::TypeError;
use crate::id::ImageId;
use crate::image::{GeoPoint, Severity};
use crate::layer::Layer;

/// Partial update of a single image inside a photo set.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImagePatch {
    pub image_id: ImageId,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub position: Option<GeoPoint>,
    #[serde(default)]
    pub heading: Option<f64>,
    #[serde(default)]
    pub analysis: Option<String>,
    #[serde(default)]
    pub severity: Option<Severity>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl ImagePatch {
    pub fn new(image_id: ImageId) -> Self {
        Self {
            image_id,
            filename: None,
            position: None,
            heading: None,
            analysis: None,
            severity: None,
            notes: None,
        }
    }
}

/// Partial update of a stored layer. Unset fields are left untouched.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub visible: Option<bool>,
    #[serde(default)]
    pub opacity: Option<f32>,
    #[serde(default)]
    pub image: Option<ImagePatch>,
}

impl LayerPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.visible.is_none() && self.opacity.is_none() && self.image.is_none()
    }

    /// Merge this patch into `layer`.
    ///
    /// The patch is validated in full before anything is written, so on error
    /// the layer is unchanged. An image patch replaces exactly one entry of the
    /// layer's `images` array.
    pub fn apply_to(&self, layer: &mut Layer) -> Result<(), TypeError> {
        if let Some(opacity) = self.opacity {
            if !(0.0..=1.0).contains(&opacity) {
                return Err(TypeError::InvalidOpacity(opacity));
            }
        }

        let image_index = match &self.image {
            Some(patch) => {
                let images = layer
                    .images()
                    .ok_or_else(|| TypeError::NotAPhotoSet(layer.id.clone()))?;
                let index = images
                    .iter()
                    .position(|img| img.id == patch.image_id)
                    .ok_or_else(|| TypeError::ImageNotFound {
                        layer: layer.id.clone(),
                        image: patch.image_id.clone(),
                    })?;
                Some(index)
            }
            None => None,
        };

        if let Some(name) = &self.name {
            layer.name = name.clone();
        }
        if let Some(visible) = self.visible {
            layer.visible = visible;
        }
        if let Some(opacity) = self.opacity {
            layer.opacity = opacity;
        }

        if let (Some(patch), Some(index)) = (&self.image, image_index) {
            if let Some(images) = layer.images_mut() {
                let mut image = images[index].clone();
                if let Some(filename) = &patch.filename {
                    image.filename = filename.clone();
                }
                if let Some(position) = patch.position {
                    image.set_position(Some(position));
                }
                if let Some(heading) = patch.heading {
                    image.heading = Some(heading);
                }
                if let Some(analysis) = &patch.analysis {
                    image.analysis = Some(analysis.clone());
                }
                if let Some(severity) = patch.severity {
                    image.severity = Some(severity);
                }
                if let Some(notes) = &patch.notes {
                    image.notes = Some(notes.clone());
                }
                images[index] = image;
            }
        }
        Ok(())
    }
}
