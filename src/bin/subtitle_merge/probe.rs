use std::path::Path;
use std::process::Command;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Audio stream info from ffprobe.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AudioStream {
    #[serde(default)]
    pub channels: Option<u32>,
    #[serde(default)]
    pub tags: StreamTags,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct StreamTags {
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<AudioStream>,
}

impl AudioStream {
    /// Language tag in lower case, `und` if missing.
    pub fn language(&self) -> String {
        self.tags
            .language
            .as_deref()
            .map(str::trim)
            .filter(|language| !language.is_empty())
            .map_or_else(|| "und".to_string(), str::to_lowercase)
    }

    pub fn is_commentary(&self) -> bool {
        self.tags
            .title
            .as_deref()
            .is_some_and(|title| title.to_lowercase().contains("commentary"))
    }
}

/// Get the audio streams of a video file in stream order.
pub fn probe_audio_streams(path: &Path) -> Result<Vec<AudioStream>> {
    let output = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-select_streams",
            "a",
            "-show_entries",
            "stream=index,channels:stream_tags=language,title",
            "-of",
            "json",
        ])
        .arg(path)
        .output()
        .context("Failed to execute ffprobe")?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        anyhow::bail!("ffprobe failed: {}", stderr.trim());
    }

    parse_probe_output(&String::from_utf8_lossy(&output.stdout))
}

fn parse_probe_output(json: &str) -> Result<Vec<AudioStream>> {
    let output: ProbeOutput = serde_json::from_str(json).context("Failed to parse ffprobe JSON output")?;
    Ok(output.streams)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_probe_output_reads_streams() {
        let json = r#"{
            "programs": [],
            "streams": [
                { "index": 1, "channels": 6, "tags": { "language": "eng", "title": "Surround 5.1" } },
                { "index": 2, "channels": 2, "tags": { "language": "fre" } },
                { "index": 3, "channels": 2 }
            ]
        }"#;
        let streams = parse_probe_output(json).unwrap();
        assert_eq!(streams.len(), 3);
        assert_eq!(streams[0].channels, Some(6));
        assert_eq!(streams[0].language(), "eng");
        assert_eq!(streams[1].language(), "fre");
        assert_eq!(streams[2].language(), "und");
    }

    #[test]
    fn parse_probe_output_without_streams() {
        let streams = parse_probe_output("{}").unwrap();
        assert!(streams.is_empty());
    }

    #[test]
    fn parse_probe_output_rejects_invalid_json() {
        assert!(parse_probe_output("not json").is_err());
    }

    #[test]
    fn commentary_is_detected_from_title() {
        let stream = AudioStream {
            channels: Some(2),
            tags: StreamTags {
                language: Some("ENG".to_string()),
                title: Some("Director's Commentary".to_string()),
            },
        };
        assert!(stream.is_commentary());
        assert_eq!(stream.language(), "eng");
        assert!(!AudioStream::default().is_commentary());
    }
}
