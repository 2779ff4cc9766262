use std::path::{Path, PathBuf};

use crate::app::song::Song;

pub const MANIFEST_FILE_NAME: &str = "manifest.json";

#[derive(thiserror::Error, Debug)]
pub enum Error {
	#[error("Filesystem error for `{0}`: `{1}`")]
	Io(PathBuf, std::io::Error),
	#[error("Could not parse `{0}`: {1}")]
	Parse(PathBuf, serde_json::Error),
}

/// Where song records come from: an enumerable manifest of identifiers, fetched one at a time.
pub trait Source: Send + Sync {
	fn manifest(&self) -> Result<Vec<String>, Error>;
	fn fetch(&self, id: &str) -> Result<Song, Error>;
}

/// Reads one JSON file per song from a directory.
#[derive(Clone, Debug)]
pub struct DirectorySource {
	directory: PathBuf,
}

impl DirectorySource {
	pub fn new<P: AsRef<Path>>(directory: P) -> Self {
		Self {
			directory: directory.as_ref().to_owned(),
		}
	}

	fn read_manifest_file(&self, path: &Path) -> Result<Vec<String>, Error> {
		let content = std::fs::read_to_string(path).map_err(|e| Error::Io(path.to_owned(), e))?;
		serde_json::from_str(&content).map_err(|e| Error::Parse(path.to_owned(), e))
	}

	fn list_json_files(&self) -> Result<Vec<String>, Error> {
		let entries = std::fs::read_dir(&self.directory)
			.map_err(|e| Error::Io(self.directory.clone(), e))?;
		let mut file_names = Vec::new();
		for entry in entries {
			let entry = entry.map_err(|e| Error::Io(self.directory.clone(), e))?;
			let path = entry.path();
			let is_json = path
				.extension()
				.and_then(|e| e.to_str())
				.map(|e| e.eq_ignore_ascii_case("json"))
				.unwrap_or(false);
			if !is_json || !path.is_file() {
				continue;
			}
			if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
				if name != MANIFEST_FILE_NAME && !name.starts_with('.') {
					file_names.push(name.to_owned());
				}
			}
		}
		file_names.sort();
		Ok(file_names)
	}
}

impl Source for DirectorySource {
	fn manifest(&self) -> Result<Vec<String>, Error> {
		let manifest_path = self.directory.join(MANIFEST_FILE_NAME);
		if manifest_path.is_file() {
			self.read_manifest_file(&manifest_path)
		} else {
			self.list_json_files()
		}
	}

	fn fetch(&self, id: &str) -> Result<Song, Error> {
		let path = self.directory.join(id);
		let content = std::fs::read_to_string(&path).map_err(|e| Error::Io(path.clone(), e))?;
		serde_json::from_str(&content).map_err(|e| Error::Parse(path, e))
	}
}
