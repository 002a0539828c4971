use std::fmt;

use geohub_ingest::resolve_mime_type;
use tracing::{debug, warn};

use crate::fetch::FetchedPayload;
use crate::source::{AssetSource, Tier};
use crate::validate::PayloadValidator;

/// States of the per-asset acquisition machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AssetState {
    Start,
    RemoteFetch,
    LocalFetch,
    Validate,
    Save,
    MemoryFallback,
    Done,
    AbortAsset,
}

impl fmt::Display for AssetState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Start => "START",
            Self::RemoteFetch => "REMOTE_FETCH",
            Self::LocalFetch => "LOCAL_FETCH",
            Self::Validate => "VALIDATE",
            Self::Save => "SAVE",
            Self::MemoryFallback => "MEMORY_FALLBACK",
            Self::Done => "DONE",
            Self::AbortAsset => "ABORT_ASSET",
        };
        f.write_str(name)
    }
}

/// Log a transition and return the new state.
pub(crate) fn transition(asset: &str, from: AssetState, to: AssetState) -> AssetState {
    debug!(asset, %from, %to, "demo asset transition");
    to
}

/// A validated payload and where it came from.
#[derive(Clone, Debug)]
pub struct Acquired {
    pub payload: FetchedPayload,
    pub tier: Tier,
    pub location: String,
}

impl Acquired {
    pub fn size(&self) -> u64 {
        self.payload.data.len() as u64
    }

    pub fn mime_type(&self) -> String {
        resolve_mime_type(self.payload.media_type(), &self.payload.data)
    }
}

/// Tries sources in order, stopping at the first validated payload.
#[derive(Clone, Copy, Debug, Default)]
pub struct TieredLoader {
    validator: PayloadValidator,
}

impl TieredLoader {
    pub fn new(validator: PayloadValidator) -> Self {
        Self { validator }
    }

    /// Walk `sources` from START to a validated payload, or to ABORT_ASSET
    /// (`None`) once every source has failed fetch or validation.
    pub async fn acquire(&self, asset: &str, sources: &[Box<dyn AssetSource>]) -> Option<Acquired> {
        let mut state = AssetState::Start;
        for source in sources {
            let fetch_state = match source.tier() {
                Tier::Remote => AssetState::RemoteFetch,
                Tier::Local => AssetState::LocalFetch,
            };
            state = transition(asset, state, fetch_state);

            let payload = match source.fetch().await {
                Ok(payload) => payload,
                Err(err) => {
                    warn!(asset, tier = %source.tier(), error = %err, "demo source failed");
                    continue;
                }
            };

            state = transition(asset, state, AssetState::Validate);
            match self.validator.validate(source.location(), &payload) {
                Ok(()) => {
                    return Some(Acquired {
                        payload,
                        tier: source.tier(),
                        location: source.location().to_string(),
                    });
                }
                Err(err) => {
                    warn!(asset, tier = %source.tier(), error = %err, "demo payload rejected");
                }
            }
        }

        transition(asset, state, AssetState::AbortAsset);
        warn!(asset, "every source failed, asset skipped");
        None
    }
}
