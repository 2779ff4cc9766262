use std::{path::PathBuf, sync::Arc};

use log::info;

use crate::paths::Paths;

pub mod config;
pub mod engine;
pub mod import;
pub mod navigation;
pub mod pdf;
pub mod repository;
pub mod session;
pub mod song;
pub mod source;


#[derive(thiserror::Error, Debug)]
pub enum Error {
	#[error(transparent)]
	Config(#[from] config::Error),
	#[error(transparent)]
	Engine(#[from] engine::Error),
	#[error(transparent)]
	Import(#[from] import::Error),
	#[error(transparent)]
	Instrument(#[from] song::UnknownInstrument),
	#[error(transparent)]
	Navigation(#[from] navigation::Error),
}

#[derive(Clone)]
pub struct App {
	pub songs_dir_path: PathBuf,
	pub config_manager: config::Manager,
	pub repository: repository::Manager,
}

impl App {
	pub async fn new(paths: &Paths) -> Result<Self, Error> {
		let config = match &paths.config_file_path {
			Some(path) => {
				info!("Reading configuration from {}", path.display());
				config::Config::from_path(path)?
			}
			None => config::Config::default(),
		};
		let config_manager = config::Manager::new(config)?;

		let songs_dir_path = match &paths.songs_dir_path {
			Some(path) => path.clone(),
			None => config_manager
				.get_songs_directory()
				.await
				.unwrap_or_else(|| paths.default_songs_dir_path.clone()),
		};
		info!("Songs directory is {}", songs_dir_path.display());

		let source = source::DirectorySource::new(&songs_dir_path);
		let repository = repository::Manager::new(Arc::new(source));

		Ok(Self {
			songs_dir_path,
			config_manager,
			repository,
		})
	}
}
