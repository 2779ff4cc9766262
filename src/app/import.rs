use std::{
	collections::BTreeMap,
	fs,
	path::{Path, PathBuf},
	sync::OnceLock,
	time::{SystemTime, UNIX_EPOCH},
};

use log::{info, warn};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use unicase::UniCase;

use crate::app::{
	song::{slugify, Instrument, Song},
	source::MANIFEST_FILE_NAME,
};

pub const SYNC_STATE_FILE_NAME: &str = ".sync_state.json";

const COMPLETED_STATUS: &str = "completed";
const FIRST_DATA_ROW: usize = 2;
const MIN_DRIVE_ID_LENGTH: usize = 20;

mod column {
	pub const STATUS: &str = "Status";
	pub const SONG_NAME: &str = "Song Name";
	pub const ALTERNATIVE_NAMES: &str = "Alternative Names";
	pub const PRODUCER: &str = "Producer";
	pub const ADDITIONAL_PRODUCERS: &str = "Additional Producers (comma sep)";
	pub const ORIGINAL_VOICE: &str = "Original Voice";
	pub const ADDITIONAL_VOICES: &str = "Additional Voices (comma sep)";
	pub const RELEASE_DATE: &str = "Release Date (ISO)";
	pub const LABELS: &str = "Labels (comma sep)";
	pub const TRANSCRIBER: &str = "Transcriber";
	pub const YOUTUBE: &str = "Youtube";
}

pub type Row = Map<String, Value>;

#[derive(thiserror::Error, Debug)]
pub enum Error {
	#[error("Filesystem error for `{0}`: `{1}`")]
	Io(PathBuf, std::io::Error),
	#[error("Could not parse `{0}`: {1}")]
	Parse(PathBuf, serde_json::Error),
	#[error("Could not serialize catalog data: {0}")]
	Serialize(#[from] serde_json::Error),
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncState {
	pub last_sync: u64,
	pub songs_hash: String,
	pub total_songs: usize,
	pub forced_sync: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
	Unchanged,
	Written { songs: usize, files: Vec<String> },
}

/// Imports a spreadsheet export into `songs_directory`, one JSON file per song plus a manifest.
/// Unless `force` is set, nothing is written when the accepted rows match the previous import.
pub fn import(input: &Path, songs_directory: &Path, force: bool) -> Result<Outcome, Error> {
	let rows = read_rows(input)?;
	let accepted = accept_rows(&rows);
	info!("Found {} importable rows out of {}", accepted.len(), rows.len());

	let songs_hash = hash_rows(&accepted)?;
	let state_path = songs_directory.join(SYNC_STATE_FILE_NAME);
	let previous_state = read_sync_state(&state_path);
	if !force && previous_state.map(|s| s.songs_hash) == Some(songs_hash.clone()) {
		info!("No changes detected since the last import, skipping");
		return Ok(Outcome::Unchanged);
	}

	let songs = merge_by_title(accepted.into_iter().map(normalize_row).collect());
	let files = write_catalog(songs_directory, &songs)?;

	let state = SyncState {
		last_sync: SystemTime::now()
			.duration_since(UNIX_EPOCH)
			.map(|d| d.as_secs())
			.unwrap_or_default(),
		songs_hash,
		total_songs: songs.len(),
		forced_sync: force,
	};
	let content = serde_json::to_string_pretty(&state)?;
	fs::write(&state_path, content).map_err(|e| Error::Io(state_path.clone(), e))?;

	info!("Imported {} songs into {}", songs.len(), songs_directory.display());
	Ok(Outcome::Written {
		songs: songs.len(),
		files,
	})
}

pub fn read_rows(path: &Path) -> Result<Vec<Row>, Error> {
	let content = fs::read_to_string(path).map_err(|e| Error::Io(path.to_owned(), e))?;
	serde_json::from_str(&content).map_err(|e| Error::Parse(path.to_owned(), e))
}

fn read_sync_state(path: &Path) -> Option<SyncState> {
	let content = fs::read_to_string(path).ok()?;
	match serde_json::from_str(&content) {
		Ok(state) => Some(state),
		Err(e) => {
			warn!("Ignoring unreadable sync state {}: {}", path.display(), e);
			None
		}
	}
}

fn hash_rows(rows: &[&Row]) -> Result<String, Error> {
	let mut hasher = Sha256::new();
	hasher.update(serde_json::to_string(rows)?);
	Ok(hasher
		.finalize()
		.iter()
		.map(|byte| format!("{:02x}", byte))
		.collect())
}

/// Keeps completed rows that have a title and at least one usable PDF link.
pub fn accept_rows(rows: &[Row]) -> Vec<&Row> {
	let mut accepted = Vec::new();
	for (index, row) in rows.iter().enumerate() {
		let row_number = index + FIRST_DATA_ROW;

		if UniCase::new(cell(row, column::STATUS).as_str()) != UniCase::new(COMPLETED_STATUS) {
			continue;
		}

		let song_name = cell(row, column::SONG_NAME);
		if song_name.is_empty() {
			warn!("Row {}: empty song name", row_number);
			continue;
		}

		let has_pdf = Instrument::ALL
			.iter()
			.any(|i| drive_file_id(&cell(row, i.key())).is_some());
		if !has_pdf {
			warn!("Row {}: no valid PDF files found for `{}`", row_number, song_name);
			continue;
		}

		accepted.push(row);
	}
	accepted
}

pub fn normalize_row(row: &Row) -> Song {
	let mut video_links = BTreeMap::new();
	let youtube = cell(row, column::YOUTUBE);
	if !youtube.is_empty() {
		video_links.insert("YouTube".to_owned(), youtube);
	}

	let pdfs = Instrument::ALL
		.iter()
		.filter_map(|i| {
			drive_file_id(&cell(row, i.key()))
				.map(|id| (*i, format!("https://drive.google.com/file/d/{}/view", id)))
		})
		.collect();

	let transcriber = Some(cell(row, column::TRANSCRIBER)).filter(|t| !t.is_empty());

	Song {
		title: cell(row, column::SONG_NAME),
		alternative_names: split_list(&cell(row, column::ALTERNATIVE_NAMES)),
		producer: cell(row, column::PRODUCER),
		additional_producers: split_list(&cell(row, column::ADDITIONAL_PRODUCERS)),
		singer: cell(row, column::ORIGINAL_VOICE),
		additional_voices: split_list(&cell(row, column::ADDITIONAL_VOICES)),
		release_date: format_date(&cell(row, column::RELEASE_DATE)),
		labels: split_list(&cell(row, column::LABELS)),
		transcriber,
		video_links,
		pdfs,
	}
}

/// Rows sharing a title collapse into one song. The later row wins but keeps the first position.
pub fn merge_by_title(songs: Vec<Song>) -> Vec<Song> {
	let mut merged: Vec<Song> = Vec::with_capacity(songs.len());
	for song in songs {
		if song.title.is_empty() {
			continue;
		}
		match merged.iter_mut().find(|s| s.title == song.title) {
			Some(existing) => *existing = song,
			None => merged.push(song),
		}
	}
	merged
}

/// Writes `<slug>.json` for every song and a sorted manifest. Returns the manifest entries.
pub fn write_catalog(songs_directory: &Path, songs: &[Song]) -> Result<Vec<String>, Error> {
	fs::create_dir_all(songs_directory).map_err(|e| Error::Io(songs_directory.to_owned(), e))?;

	let mut files = Vec::with_capacity(songs.len());
	for song in songs {
		let file_name = format!("{}.json", slugify(&song.title).trim_matches('-'));
		let path = songs_directory.join(&file_name);
		let content = serde_json::to_string_pretty(song)?;
		fs::write(&path, content).map_err(|e| Error::Io(path.clone(), e))?;
		info!("Wrote {}", path.display());
		files.push(file_name);
	}

	files.sort();
	files.dedup();
	let manifest_path = songs_directory.join(MANIFEST_FILE_NAME);
	let content = serde_json::to_string_pretty(&files)?;
	fs::write(&manifest_path, content).map_err(|e| Error::Io(manifest_path.clone(), e))?;
	Ok(files)
}

fn cell(row: &Row, column: &str) -> String {
	match row.get(column) {
		Some(Value::String(s)) => s.trim().to_owned(),
		Some(Value::Number(n)) => n.to_string(),
		Some(Value::Bool(b)) => b.to_string(),
		_ => String::new(),
	}
}

fn split_list(value: &str) -> Vec<String> {
	value
		.split(',')
		.map(str::trim)
		.filter(|v| !v.is_empty())
		.map(str::to_owned)
		.collect()
}

fn date_regexes() -> &'static [Regex; 3] {
	static REGEXES: OnceLock<[Regex; 3]> = OnceLock::new();
	REGEXES.get_or_init(|| {
		[
			Regex::new(r"^(?P<month>\d{1,2})[/-](?P<day>\d{1,2})[/-](?P<year>\d{4})$").unwrap(),
			Regex::new(r"^(?P<year>\d{4})-(?P<month>\d{1,2})-(?P<day>\d{1,2})$").unwrap(),
			Regex::new(r"^(?P<year>\d{4})(?P<month>\d{2})(?P<day>\d{2})$").unwrap(),
		]
	})
}

/// Normalizes the date formats found in the sheet to `YYYYMMDD`.
pub fn format_date(date: &str) -> String {
	let date = date.trim();
	if date.is_empty() {
		return String::new();
	}

	for regex in date_regexes() {
		if let Some(captures) = regex.captures(date) {
			return format!(
				"{}{:0>2}{:0>2}",
				&captures["year"], &captures["month"], &captures["day"]
			);
		}
	}

	warn!("Could not parse date `{}`", date);
	date.to_owned()
}

/// Extracts a Drive file id from a sharing link or takes `value` as a bare id.
pub fn drive_file_id(value: &str) -> Option<String> {
	let value = value.trim();
	let mut id = value;
	if value.contains("drive.google.com") {
		if let Some((_, rest)) = value.split_once("/d/") {
			id = rest.split('/').next().unwrap_or_default();
		} else if let Some((_, rest)) = value.split_once("id=") {
			id = rest.split('&').next().unwrap_or_default();
		}
	}

	let is_valid = id.len() >= MIN_DRIVE_ID_LENGTH
		&& id
			.chars()
			.all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
	is_valid.then(|| id.to_owned())
}
