//! End-to-end renaming scenarios on temporary folders.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use media_tools::episode::{
    DebugLog, EpisodeRenamer, MatchMode, RenameOptions, RunStats, TITLE_LIST_FILE_NAME,
};

const TITLES: &str = "s01e01 Pilot\ns01e02 Second Chance\ns01e03 Third Time\n";

fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).expect("Failed to write test file");
    path
}

fn file_names(dir: &Path) -> Vec<String> {
    media_tools::sorted_dir_entries(dir)
        .unwrap()
        .iter()
        .map(|path| media_tools::path_to_filename_string(path))
        .collect()
}

fn rename(root: &Path, options: RenameOptions) -> RunStats {
    EpisodeRenamer::without_log(root.to_path_buf(), options).run().unwrap()
}

#[test]
fn renames_single_and_multi_episode_files() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    write_file(root, TITLE_LIST_FILE_NAME, TITLES);
    write_file(root, "s01e01 something.mp4", "one");
    write_file(root, "s01e02-e03 x.mkv", "two");

    let stats = rename(root, RenameOptions::default());

    assert_eq!(stats.renamed, 2);
    assert_eq!(
        file_names(root),
        vec![
            TITLE_LIST_FILE_NAME,
            "s01e01 Pilot.mp4",
            "s01e02-e03 Second Chance & Third Time.mkv",
        ]
    );
    assert_eq!(fs::read_to_string(root.join("s01e01 Pilot.mp4")).unwrap(), "one");
}

#[test]
fn missing_title_leaves_file_unchanged() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    write_file(root, TITLE_LIST_FILE_NAME, TITLES);
    write_file(root, "s01e05 unknown.mp4", "");
    write_file(root, "s01e03-e04 partial.mp4", "");

    let stats = rename(root, RenameOptions::default());

    assert_eq!(stats.renamed, 0);
    assert_eq!(stats.skipped, 2);
    assert_eq!(
        file_names(root),
        vec![TITLE_LIST_FILE_NAME, "s01e03-e04 partial.mp4", "s01e05 unknown.mp4"]
    );
}

#[test]
fn files_without_key_or_other_extensions_are_ignored() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    write_file(root, TITLE_LIST_FILE_NAME, TITLES);
    write_file(root, "Behind the scenes.mp4", "");
    write_file(root, "s01e01.srt", "");

    let stats = rename(root, RenameOptions::default());

    assert_eq!(stats.renamed, 0);
    assert_eq!(stats.skipped, 1);
    assert!(root.join("s01e01.srt").exists());
}

#[test]
fn second_run_is_unchanged() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    write_file(root, TITLE_LIST_FILE_NAME, TITLES);
    write_file(root, "s01e01 a.mp4", "");
    write_file(root, "s01e02 b.mp4", "");

    let first = rename(root, RenameOptions::default());
    let names_after_first = file_names(root);
    let second = rename(root, RenameOptions::default());

    assert_eq!(first.renamed, 2);
    assert_eq!(second.renamed, 0);
    assert_eq!(second.unchanged, 2);
    assert_eq!(file_names(root), names_after_first);
}

#[test]
fn dryrun_does_not_rename() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    write_file(root, TITLE_LIST_FILE_NAME, TITLES);
    write_file(root, "s01e01 a.mp4", "");

    let options = RenameOptions {
        dryrun: true,
        ..Default::default()
    };
    let stats = rename(root, options);

    assert_eq!(stats.renamed, 1);
    assert_eq!(file_names(root), vec![TITLE_LIST_FILE_NAME, "s01e01 a.mp4"]);
}

#[test]
fn destination_conflict_is_skipped_unless_forced() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    write_file(root, TITLE_LIST_FILE_NAME, TITLES);
    write_file(root, "s01e01 Pilot.mp4", "existing");
    write_file(root, "s01e01 copy.mp4", "new");

    let stats = rename(root, RenameOptions::default());
    assert_eq!(stats.skipped, 1);
    assert_eq!(fs::read_to_string(root.join("s01e01 Pilot.mp4")).unwrap(), "existing");
    assert!(root.join("s01e01 copy.mp4").exists());

    let options = RenameOptions {
        overwrite: true,
        ..Default::default()
    };
    rename(root, options);
    assert!(!root.join("s01e01 copy.mp4").exists());
    assert_eq!(fs::read_to_string(root.join("s01e01 Pilot.mp4")).unwrap(), "new");
}

#[test]
fn capitalization_conflict_keeps_existing_file() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    write_file(root, TITLE_LIST_FILE_NAME, "s01e01 Pilot\n");
    write_file(root, "s01e01 Pilot.mp4", "keep");
    write_file(root, "s01e01 PILOT.mp4", "other");
    if file_names(root).len() < 3 {
        // Case-insensitive file system
        return;
    }

    let stats = rename(root, RenameOptions::default());

    assert_eq!(stats.renamed, 0);
    assert_eq!(stats.unchanged, 1);
    assert_eq!(stats.skipped, 1);
    assert_eq!(fs::read_to_string(root.join("s01e01 Pilot.mp4")).unwrap(), "keep");
    assert_eq!(fs::read_to_string(root.join("s01e01 PILOT.mp4")).unwrap(), "other");
}

#[test]
fn title_with_path_separator_stays_in_folder() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    write_file(root, TITLE_LIST_FILE_NAME, "s01e01 Part 1/2\ns01e02 ../Escape\n");
    write_file(root, "s01e01 a.mp4", "");
    write_file(root, "s01e02 b.mp4", "");

    let stats = rename(root, RenameOptions::default());

    assert_eq!(stats.renamed, 2);
    assert_eq!(
        file_names(root),
        vec![TITLE_LIST_FILE_NAME, "s01e01 Part 1-2.mp4", "s01e02 ..-Escape.mp4"]
    );
}

#[test]
fn show_mode_moves_into_season_folders() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    let season_one = root.join("season 1");
    let season_two = root.join("Season 2");
    let extras = root.join("Extras");
    for dir in [&season_one, &season_two, &extras] {
        fs::create_dir(dir).unwrap();
    }
    write_file(&season_one, TITLE_LIST_FILE_NAME, TITLES);
    write_file(&season_one, "s01e01 x.mp4", "");
    write_file(&season_two, TITLE_LIST_FILE_NAME, "s02e01 Return\n");
    write_file(&season_two, "s02e01 y.mp4", "");
    write_file(&extras, "s09e09 z.mp4", "");

    let options = RenameOptions {
        seasons: true,
        move_to_season: true,
        ..Default::default()
    };
    let stats = rename(root, options);

    assert_eq!(stats.renamed, 2);
    assert!(root.join("Season 01").join("s01e01 Pilot.mp4").is_file());
    assert_eq!(file_names(&season_two), vec![TITLE_LIST_FILE_NAME]);
    assert!(root.join("Season 02").join("s02e01 Return.mp4").is_file());
    assert!(extras.join("s09e09 z.mp4").is_file());
}

#[test]
fn show_mode_skips_season_without_title_list() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    let season_one = root.join("Season 01");
    let season_two = root.join("Season 02");
    fs::create_dir(&season_one).unwrap();
    fs::create_dir(&season_two).unwrap();
    write_file(&season_one, "s01e01 x.mp4", "");
    write_file(&season_two, TITLE_LIST_FILE_NAME, "s02e01 Return\n");
    write_file(&season_two, "s02e01 y.mp4", "");

    let options = RenameOptions {
        seasons: true,
        ..Default::default()
    };
    let stats = rename(root, options);

    assert_eq!(stats.folders_skipped, 1);
    assert_eq!(stats.renamed, 1);
    assert!(season_one.join("s01e01 x.mp4").exists());
    assert!(season_two.join("s02e01 Return.mp4").exists());
}

#[test]
fn flat_mode_without_title_list_skips_folder() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    write_file(root, "s01e01 x.mp4", "");

    let stats = rename(root, RenameOptions::default());

    assert_eq!(stats.folders_skipped, 1);
    assert!(root.join("s01e01 x.mp4").exists());
}

#[test]
fn title_mode_corrects_episode_order() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    let season = root.join("Season 1");
    fs::create_dir(&season).unwrap();
    write_file(&season, TITLE_LIST_FILE_NAME, "s01e01 Pilot\ns02e01 Second Chance\n");
    write_file(&season, "03 second chance.mp4", "");
    write_file(&season, "01 Pilot.mkv", "");

    let options = RenameOptions {
        seasons: true,
        move_to_season: true,
        match_mode: MatchMode::Title,
        ..Default::default()
    };
    let stats = rename(root, options);

    assert_eq!(stats.renamed, 2);
    assert!(root.join("Season 01").join("s01e01 Pilot.mkv").is_file());
    assert!(root.join("Season 02").join("s02e01 second chance.mp4").is_file());
}

#[test]
fn debug_log_records_decisions() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    write_file(root, TITLE_LIST_FILE_NAME, TITLES);
    write_file(root, "s01e01 x.mp4", "");
    write_file(root, "s01e09 y.mp4", "");
    let log_path = root.join("decisions.log");

    let log = DebugLog::create(&log_path).unwrap();
    EpisodeRenamer::new(root.to_path_buf(), RenameOptions::default(), Box::new(log))
        .run()
        .unwrap();

    let text = fs::read_to_string(&log_path).unwrap();
    assert!(text.contains("(3 titles)"));
    assert!(text.contains("new name: s01e01 Pilot.mp4"));
    assert!(text.contains("RENAME \"s01e01 x.mp4\""));
    assert!(text.contains("SKIP \"s01e09 y.mp4\" | Title not found for one or more episodes: s01e09"));
}
