use std::path::PathBuf;

use crate::options::CLIOptions;

pub struct Paths {
	pub config_file_path: Option<PathBuf>,
	pub songs_dir_path: Option<PathBuf>,
	pub default_songs_dir_path: PathBuf,
	pub log_file_path: Option<PathBuf>,
}

impl Default for Paths {
	fn default() -> Self {
		Self {
			config_file_path: None,
			songs_dir_path: None,
			default_songs_dir_path: [".", "data"].iter().collect(),
			log_file_path: None,
		}
	}
}

impl Paths {
	fn from_build() -> Self {
		let defaults = Self::default();
		Self {
			default_songs_dir_path: option_env!("LEADSHEETS_DATA_DIR")
				.map(PathBuf::from)
				.unwrap_or(defaults.default_songs_dir_path),
			log_file_path: option_env!("LEADSHEETS_LOG_DIR")
				.map(PathBuf::from)
				.map(|p| p.join("leadsheets.log"))
				.or(defaults.log_file_path),
			..defaults
		}
	}

	pub fn new(cli_options: &CLIOptions) -> Self {
		let mut paths = Self::from_build();
		if let Some(path) = &cli_options.config_file_path {
			paths.config_file_path = Some(path.clone());
		}
		if let Some(path) = &cli_options.data_dir_path {
			paths.songs_dir_path = Some(path.clone());
		}
		if let Some(path) = &cli_options.log_file_path {
			paths.log_file_path = Some(path.clone());
		}
		paths
	}
}
