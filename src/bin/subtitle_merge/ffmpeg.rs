//! ffmpeg command lines for muxing subtitles into mp4 files.

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::probe::AudioStream;

/// Language set for video, subtitle and kept audio tracks.
const TRACK_LANGUAGE: &str = "eng";

/// Subtitle codec supported by the mp4 container.
const SUBTITLE_CODEC: &str = "mov_text";

/// Audio track arguments: keep and label wanted languages, drop the rest.
///
/// Metadata indices refer to output streams,
/// so they only count the tracks that are kept.
pub fn audio_track_args(streams: &[AudioStream], keep_languages: &[String]) -> Vec<String> {
    let mut args = Vec::new();
    let mut output_index = 0;
    for (input_index, stream) in streams.iter().enumerate() {
        let language = stream.language();
        if keep_languages.iter().any(|keep| keep.eq_ignore_ascii_case(&language)) {
            args.push(format!("-metadata:s:a:{output_index}"));
            args.push(format!("language={TRACK_LANGUAGE}"));
            args.push(format!("-metadata:s:a:{output_index}"));
            args.push(format!("title={}", audio_track_title(stream)));
            output_index += 1;
        } else {
            args.push("-map".to_string());
            args.push(format!("-0:a:{input_index}"));
        }
    }
    args
}

/// Audio track title from channel count.
pub fn audio_track_title(stream: &AudioStream) -> String {
    let title = match stream.channels {
        Some(1) => "Mono Audio",
        Some(2) => "Stereo Audio",
        _ => "Surround Audio",
    };
    if stream.is_commentary() {
        format!("{title} (Commentary)")
    } else {
        title.to_string()
    }
}

/// Subtitle track title from the subtitle file name.
pub fn subtitle_track_title(subtitle: &Path) -> &'static str {
    let name = media_tools::path_to_filename_string(subtitle).to_lowercase();
    if name.contains("sdh") {
        "Subtitle Track [SDH]"
    } else if name.contains("forced") {
        "Subtitle Track [Forced]"
    } else if name.contains("cc") {
        "Subtitle Track [CC]"
    } else {
        "Subtitle Track"
    }
}

/// Output path for a merged file: `<stem>.output.mp4` next to the video.
pub fn output_path(video: &Path) -> PathBuf {
    media_tools::insert_suffix_before_extension(video, ".output")
}

/// Command for muxing one episode with its matching subtitle file.
pub fn episode_command(video: &Path, subtitle: &Path, audio_args: &[String], output: &Path) -> Command {
    let mut command = base_command();
    command
        .arg("-i")
        .arg(video)
        .arg("-i")
        .arg(subtitle)
        .args(["-map", "0", "-map", "1"])
        .args(["-c:v", "copy", "-c:a", "copy", "-c:s", SUBTITLE_CODEC])
        .args(["-metadata:s:v:0", &format!("language={TRACK_LANGUAGE}")])
        .args(["-metadata:s:s:0", &format!("language={TRACK_LANGUAGE}")])
        .args(audio_args)
        .arg(output);
    command
}

/// Command for muxing a movie with all of its subtitle files.
pub fn movie_command(video: &Path, subtitles: &[PathBuf], audio_args: &[String], output: &Path) -> Command {
    let mut command = base_command();
    command.arg("-i").arg(video);
    for subtitle in subtitles {
        command.arg("-i").arg(subtitle);
    }
    command.args(["-map", "0", "-c:v", "copy", "-c:a", "copy"]);
    for (index, subtitle) in subtitles.iter().enumerate() {
        command
            .args(["-map", &(index + 1).to_string()])
            .args([
                &format!("-metadata:s:s:{index}"),
                &format!("language={TRACK_LANGUAGE}"),
            ])
            .args([
                &format!("-metadata:s:s:{index}"),
                &format!("title={}", subtitle_track_title(subtitle)),
            ]);
    }
    command
        .args(audio_args)
        .args(["-metadata:s:v:0", &format!("language={TRACK_LANGUAGE}")])
        .args(["-c:s", SUBTITLE_CODEC])
        .arg(output);
    command
}

fn base_command() -> Command {
    let mut command = Command::new("ffmpeg");
    command.args(["-hide_banner", "-loglevel", "warning", "-nostdin", "-y"]);
    command
}
