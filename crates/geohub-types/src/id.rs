use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Fixed identifier of the demo workspace.
pub const DEMO_WORKSPACE_ID: &str = "demo-session";

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wrap an existing identifier string.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// The identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }
    };
}

string_id!(
    /// Identifier of a [`Workspace`](crate::Workspace).
    WorkspaceId
);

string_id!(
    /// Identifier of a [`Layer`](crate::Layer).
    ///
    /// Generated ids are `layer-<tag>-<millis>-<random>`: unique in practice
    /// but not globally ordered, and collisions are improbable rather than
    /// impossible.
    LayerId
);

string_id!(
    /// Identifier of a [`GeoImage`](crate::GeoImage) inside a photo set.
    ImageId
);

impl WorkspaceId {
    /// The fixed id of the demo workspace.
    pub fn demo() -> Self {
        Self(DEMO_WORKSPACE_ID.to_string())
    }

    /// Returns `true` if this is the demo workspace id.
    pub fn is_demo(&self) -> bool {
        self.0 == DEMO_WORKSPACE_ID
    }

    /// Mint a new timestamp+random workspace id.
    pub fn generate() -> Self {
        Self(format!("ws-{}", time_random_suffix()))
    }
}

impl LayerId {
    /// Mint a new id for a layer; `tag` names its origin (e.g. `splat`, `demo-pc`).
    pub fn generate(tag: &str) -> Self {
        Self(format!("layer-{tag}-{}", time_random_suffix()))
    }
}

impl ImageId {
    /// Mint a new timestamp+random image id.
    pub fn generate() -> Self {
        Self(format!("img-{}", time_random_suffix()))
    }
}

fn time_random_suffix() -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis();
    let random: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(5)
        .map(|b| char::from(b).to_ascii_lowercase())
        .collect();
    format!("{millis}-{random}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_workspace_id() {
        let id = WorkspaceId::demo();
        assert_eq!(id.as_str(), "demo-session");
        assert!(id.is_demo());
        assert!(!WorkspaceId::new("ws-1").is_demo());
    }

    #[test]
    fn generated_layer_ids_carry_tag() {
        let id = LayerId::generate("splat");
        assert!(id.as_str().starts_with("layer-splat-"));
    }

    #[test]
    fn generated_ids_are_distinct() {
        let a = ImageId::generate();
        let b = ImageId::generate();
        assert_ne!(a, b);
        assert!(a.as_str().starts_with("img-"));
    }

    #[test]
    fn serde_is_transparent() {
        let id = LayerId::new("layer-x");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"layer-x\"");
        let parsed: LayerId = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn debug_and_display() {
        let id = WorkspaceId::new("ws-42");
        assert_eq!(format!("{id}"), "ws-42");
        assert_eq!(format!("{id:?}"), "WorkspaceId(ws-42)");
    }
}
