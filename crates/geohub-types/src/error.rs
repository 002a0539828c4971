use thiserror::Error;

use crate::id::{ImageId, LayerId};

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq)]
pub enum TypeError {
    #[error("opacity must be within 0.0..=1.0, got {0}")]
    InvalidOpacity(f32),

    #[error("layer {0} is not a photo set")]
    NotAPhotoSet(LayerId),

    #[error("image {image} not found in layer {layer}")]
    ImageNotFound { layer: LayerId, image: ImageId },

    #[error("serialization error: {0}")]
    Serialization(String),
}
