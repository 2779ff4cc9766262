use std::{
	path::{Path, PathBuf},
	sync::Arc,
};

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::app::{
	engine::{self, Grouping, SortOrder},
	song::{Instrument, UnknownInstrument},
};

#[derive(thiserror::Error, Debug)]
pub enum Error {
	#[error("Filesystem error for `{0}`: `{1}`")]
	Io(PathBuf, std::io::Error),
	#[error("Could not parse config file: {0}")]
	Toml(#[from] toml::de::Error),
	#[error(transparent)]
	Instrument(#[from] UnknownInstrument),
	#[error(transparent)]
	Mode(#[from] engine::Error),
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct Config {
	#[serde(skip_serializing_if = "Option::is_none")]
	pub songs_directory: Option<PathBuf>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub default_instrument: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub group_by: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub sort_by: Option<String>,
}

impl Config {
	pub fn from_path(path: &Path) -> Result<Self, Error> {
		let content = std::fs::read_to_string(path).map_err(|e| Error::Io(path.to_owned(), e))?;
		let config = toml::de::from_str::<Self>(&content)?;
		Ok(config)
	}
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
struct Settings {
	songs_directory: Option<PathBuf>,
	default_instrument: Instrument,
	grouping: Grouping,
	sort_order: SortOrder,
}

impl TryFrom<Config> for Settings {
	type Error = Error;

	fn try_from(config: Config) -> Result<Self, Self::Error> {
		Ok(Settings {
			songs_directory: config.songs_directory,
			default_instrument: match config.default_instrument {
				Some(i) => i.parse()?,
				None => Instrument::default(),
			},
			grouping: match config.group_by {
				Some(g) => g.parse()?,
				None => Grouping::default(),
			},
			sort_order: match config.sort_by {
				Some(s) => s.parse()?,
				None => SortOrder::default(),
			},
		})
	}
}

#[derive(Clone)]
pub struct Manager {
	settings: Arc<RwLock<Settings>>,
}

impl Manager {
	pub fn new(config: Config) -> Result<Self, Error> {
		Ok(Self {
			settings: Arc::new(RwLock::new(config.try_into()?)),
		})
	}

	pub async fn get_songs_directory(&self) -> Option<PathBuf> {
		self.settings.read().await.songs_directory.clone()
	}

	pub async fn get_default_instrument(&self) -> Instrument {
		self.settings.read().await.default_instrument
	}

	pub async fn get_grouping(&self) -> Grouping {
		self.settings.read().await.grouping
	}

	pub async fn get_sort_order(&self) -> SortOrder {
		self.settings.read().await.sort_order
	}
}

#[cfg(test)]
mod test {
	use super::*;
	use crate::app::test;
	use crate::test_name;

	#[tokio::test]
	async fn defaults_without_config() {
		let ctx = test::ContextBuilder::new(test_name!()).build().await;
		assert_eq!(ctx.config_manager.get_songs_directory().await, None);
		assert_eq!(ctx.config_manager.get_default_instrument().await, Instrument::C);
		assert_eq!(ctx.config_manager.get_grouping().await, Grouping::Singer);
		assert_eq!(ctx.config_manager.get_sort_order().await, SortOrder::AToZ);
	}

	#[tokio::test]
	async fn settings_come_from_config() {
		let ctx = test::ContextBuilder::new(test_name!())
			.config(Config {
				songs_directory: Some(PathBuf::from("sheets")),
				default_instrument: Some("bb".to_owned()),
				group_by: Some("producer".to_owned()),
				sort_by: Some("z-a".to_owned()),
			})
			.build()
			.await;
		assert_eq!(
			ctx.config_manager.get_songs_directory().await,
			Some(PathBuf::from("sheets"))
		);
		assert_eq!(ctx.config_manager.get_default_instrument().await, Instrument::Bb);
		assert_eq!(ctx.config_manager.get_grouping().await, Grouping::Producer);
		assert_eq!(ctx.config_manager.get_sort_order().await, SortOrder::ZToA);
	}

	#[test]
	fn invalid_config_is_rejected() {
		let bad_grouping = Config {
			group_by: Some("label".to_owned()),
			..Default::default()
		};
		assert!(matches!(
			Manager::new(bad_grouping),
			Err(Error::Mode(engine::Error::UnknownGrouping(_)))
		));

		let bad_instrument = Config {
			default_instrument: Some("Kazoo".to_owned()),
			..Default::default()
		};
		assert!(matches!(
			Manager::new(bad_instrument),
			Err(Error::Instrument(_))
		));
	}

	#[test]
	fn can_read_config_file() {
		let directory = crate::test::prepare_test_directory(test_name!());
		let path = crate::test::write_file(
			&directory,
			"leadsheets.toml",
			"songs_directory = \"data\"\ndefault_instrument = \"Vocals\"\nsort_by = \"z-a\"\n",
		);

		let config = Config::from_path(&path).unwrap();
		assert_eq!(
			config,
			Config {
				songs_directory: Some(PathBuf::from("data")),
				default_instrument: Some("Vocals".to_owned()),
				group_by: None,
				sort_by: Some("z-a".to_owned()),
			}
		);
	}
}
