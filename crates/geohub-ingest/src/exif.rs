//! GPS tag extraction from image bytes.

use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use serde_json::Value;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

use crate::gps::{parse_dms_list, DmsComponent, GpsTags};

/// Reads raw GPS tags from an encoded image.
///
/// Implementations never fail: anything that prevents reading a complete GPS
/// block yields `None`.
#[async_trait]
pub trait GpsExtractor: Send + Sync {
    async fn read_gps(&self, data: &[u8]) -> Option<GpsTags>;
}

/// Extractor for environments without a metadata parser.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoGpsExtractor;

#[async_trait]
impl GpsExtractor for NoGpsExtractor {
    async fn read_gps(&self, _data: &[u8]) -> Option<GpsTags> {
        None
    }
}

/// Extractor that answers every image with the same tags.
#[derive(Clone, Debug, Default)]
pub struct FixedGpsExtractor(pub Option<GpsTags>);

#[async_trait]
impl GpsExtractor for FixedGpsExtractor {
    async fn read_gps(&self, _data: &[u8]) -> Option<GpsTags> {
        self.0.clone()
    }
}

/// Extractor backed by an `exiftool` executable.
///
/// Image bytes are streamed to the tool on stdin; coordinates are requested in
/// raw degrees/minutes/seconds form so the conversion stays in-process.
#[derive(Clone, Debug)]
pub struct ExifToolExtractor {
    exe: PathBuf,
}

impl ExifToolExtractor {
    pub fn new(exe: impl Into<PathBuf>) -> Self {
        Self { exe: exe.into() }
    }

    async fn run(&self, data: &[u8]) -> std::io::Result<Vec<u8>> {
        let mut child = Command::new(&self.exe)
            .args([
                "-json",
                "-c",
                "%d %d %.8f",
                "-EXIF:GPSLatitude",
                "-EXIF:GPSLatitudeRef",
                "-EXIF:GPSLongitude",
                "-EXIF:GPSLongitudeRef",
                "-",
            ])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(data).await?;
            stdin.shutdown().await?;
        }

        let output = child.wait_with_output().await?;
        if !output.status.success() {
            return Err(std::io::Error::other(format!(
                "exiftool exited with {}",
                output.status
            )));
        }
        Ok(output.stdout)
    }
}

impl Default for ExifToolExtractor {
    fn default() -> Self {
        Self::new("exiftool")
    }
}

#[async_trait]
impl GpsExtractor for ExifToolExtractor {
    async fn read_gps(&self, data: &[u8]) -> Option<GpsTags> {
        let stdout = match self.run(data).await {
            Ok(stdout) => stdout,
            Err(err) => {
                debug!(error = %err, "exiftool unavailable, skipping GPS");
                return None;
            }
        };
        let entries: Vec<Value> = match serde_json::from_slice(&stdout) {
            Ok(entries) => entries,
            Err(err) => {
                debug!(error = %err, "unreadable exiftool output");
                return None;
            }
        };
        entries.first().and_then(parse_gps_entry)
    }
}

/// Pull GPS tags out of one `exiftool -json` entry.
pub fn parse_gps_entry(entry: &Value) -> Option<GpsTags> {
    let latitude = get_components(entry, "GPSLatitude")?;
    let longitude = get_components(entry, "GPSLongitude")?;
    Some(GpsTags {
        latitude,
        latitude_ref: get_string(entry, "GPSLatitudeRef").unwrap_or_default(),
        longitude,
        longitude_ref: get_string(entry, "GPSLongitudeRef").unwrap_or_default(),
    })
}

fn get_components(entry: &Value, key: &str) -> Option<Vec<DmsComponent>> {
    match entry.get(key)? {
        Value::String(s) => Some(parse_dms_list(s)),
        Value::Number(n) => n.as_f64().map(|v| vec![DmsComponent::Number(v)]),
        Value::Array(items) => Some(
            items
                .iter()
                .filter_map(|v| match v {
                    Value::Number(n) => n.as_f64().map(DmsComponent::Number),
                    Value::String(s) => s.parse().ok(),
                    _ => None,
                })
                .collect(),
        ),
        _ => None,
    }
}

fn get_string(entry: &Value, key: &str) -> Option<String> {
    entry.get(key).and_then(|v| match v {
        Value::String(s) => Some(s.clone()),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gps::resolve_position;
    use serde_json::json;

    #[test]
    fn parses_formatted_entry() {
        let entry = json!({
            "SourceFile": "-",
            "GPSLatitude": "22 53 44.88000000",
            "GPSLatitudeRef": "South",
            "GPSLongitude": "43 10 55.92000000",
            "GPSLongitudeRef": "West"
        });
        let tags = parse_gps_entry(&entry).unwrap();
        assert_eq!(tags.latitude.len(), 3);
        let point = resolve_position(Some(&tags)).unwrap();
        assert!(point.lat < 0.0 && point.lng < 0.0);
    }

    #[test]
    fn entry_without_gps_is_none() {
        let entry = json!({ "SourceFile": "-", "ImageWidth": 4000 });
        assert!(parse_gps_entry(&entry).is_none());
    }

    #[test]
    fn numeric_entry_is_incomplete() {
        let entry = json!({ "GPSLatitude": 22.8958, "GPSLongitude": 43.1822 });
        let tags = parse_gps_entry(&entry).unwrap();
        assert_eq!(resolve_position(Some(&tags)), None);
    }

    #[tokio::test]
    async fn missing_executable_yields_none() {
        let extractor = ExifToolExtractor::new("/nonexistent/exiftool-for-tests");
        assert!(extractor.read_gps(b"\xff\xd8\xff").await.is_none());
    }

    #[tokio::test]
    async fn no_gps_extractor() {
        assert!(NoGpsExtractor.read_gps(b"anything").await.is_none());
    }
}
