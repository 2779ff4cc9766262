use std::{
	collections::BTreeSet,
	panic::{self, AssertUnwindSafe},
	sync::{
		atomic::{AtomicBool, Ordering},
		Arc, RwLock,
	},
};

use log::{debug, error, info};
use tokio::task::{spawn_blocking, JoinError, JoinSet};

use crate::app::{
	song::Song,
	source::{self, Source},
};

#[derive(thiserror::Error, Debug)]
pub enum Error {
	#[error(transparent)]
	Source(#[from] source::Error),
	#[error("Song loading task failed: {0}")]
	Task(#[from] JoinError),
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum State {
	#[default]
	Initial,
	Loading,
	Ready,
	Failed(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Failure {
	pub id: String,
	pub reason: String,
}

#[derive(Default)]
struct Contents {
	songs: Arc<Vec<Song>>,
	state: State,
	failures: Vec<Failure>,
}

/// Releases the loading flag however `load()` ends, including when its future is dropped.
struct LoadGuard<'a> {
	is_loading: &'a AtomicBool,
	contents: &'a RwLock<Contents>,
}

impl Drop for LoadGuard<'_> {
	fn drop(&mut self) {
		if let Ok(mut contents) = self.contents.write() {
			if contents.state == State::Loading {
				contents.state = State::Failed("Song loading was interrupted".to_owned());
			}
		}
		self.is_loading.store(false, Ordering::SeqCst);
	}
}

#[derive(Clone)]
pub struct Manager {
	source: Arc<dyn Source>,
	contents: Arc<RwLock<Contents>>, // Never held across an await point
	is_loading: Arc<AtomicBool>,
}

impl Manager {
	pub fn new(source: Arc<dyn Source>) -> Self {
		Self {
			source,
			contents: Arc::default(),
			is_loading: Arc::new(AtomicBool::new(false)),
		}
	}

	pub fn state(&self) -> State {
		self.contents.read().unwrap().state.clone()
	}

	pub fn failures(&self) -> Vec<Failure> {
		self.contents.read().unwrap().failures.clone()
	}

	/// Current list of songs, in manifest order.
	pub fn songs(&self) -> Arc<Vec<Song>> {
		self.contents.read().unwrap().songs.clone()
	}

	pub fn num_songs(&self) -> usize {
		self.contents.read().unwrap().songs.len()
	}

	/// Loads every song listed by the source. Songs that fail to load are skipped
	/// and recorded in `failures()`. Calling this while a load is running does nothing.
	pub async fn load(&self) -> State {
		if self.is_loading.swap(true, Ordering::SeqCst) {
			debug!("Ignoring song load request, a load is already in progress");
			return State::Loading;
		}
		let _guard = LoadGuard {
			is_loading: &self.is_loading,
			contents: &self.contents,
		};

		self.contents.write().unwrap().state = State::Loading;

		let outcome = self.fetch_all().await;

		let mut contents = self.contents.write().unwrap();
		match outcome {
			Ok((songs, failures)) => {
				info!("Loaded {} songs ({} failed)", songs.len(), failures.len());
				contents.songs = Arc::new(songs);
				contents.failures = failures;
				contents.state = State::Ready;
			}
			Err(e) => {
				error!("Failed to load songs: {}", e);
				contents.songs = Arc::default();
				contents.failures = Vec::new();
				contents.state = State::Failed(e.to_string());
			}
		}
		contents.state.clone()
	}

	pub async fn refresh(&self) -> State {
		if !self.is_loading.load(Ordering::SeqCst) {
			let mut contents = self.contents.write().unwrap();
			contents.songs = Arc::default();
			contents.failures = Vec::new();
		}
		self.load().await
	}

	async fn fetch_all(&self) -> Result<(Vec<Song>, Vec<Failure>), Error> {
		let manifest = spawn_blocking({
			let source = self.source.clone();
			move || source.manifest()
		})
		.await??;

		let mut fetches = JoinSet::new();
		for (position, id) in manifest.iter().cloned().enumerate() {
			let source = self.source.clone();
			fetches.spawn_blocking(move || {
				let result = panic::catch_unwind(AssertUnwindSafe(|| source.fetch(&id)))
					.map_err(|_| "Reading the song panicked".to_owned())
					.and_then(|r| r.map_err(|e| e.to_string()));
				(position, id, result)
			});
		}

		let mut results = Vec::with_capacity(manifest.len());
		while let Some(joined) = fetches.join_next().await {
			match joined {
				Ok(result) => results.push(result),
				Err(e) => error!("Song fetch task did not complete: {}", e),
			}
		}
		results.sort_by_key(|(position, _, _)| *position);

		let mut songs = Vec::new();
		let mut failures = Vec::new();
		for (_, id, result) in results {
			match result {
				Ok(song) => {
					debug!("Loaded {}", id);
					songs.push(song);
				}
				Err(reason) => {
					error!("Failed to load {}: {}", id, reason);
					failures.push(Failure { id, reason });
				}
			}
		}

		info!("Song files loaded: {}/{}", songs.len(), manifest.len());
		Ok((songs, failures))
	}

	/// Returns the first song whose title slugifies to `slug`.
	pub fn get_by_slug(&self, slug: &str) -> Option<Song> {
		let contents = self.contents.read().unwrap();
		contents.songs.iter().find(|s| s.slug() == slug).cloned()
	}

	pub fn distinct_producers(&self) -> Vec<String> {
		distinct_producers(&self.songs())
	}

	pub fn distinct_singers(&self) -> Vec<String> {
		distinct_singers(&self.songs())
	}

	pub fn distinct_labels(&self) -> Vec<String> {
		distinct_labels(&self.songs())
	}
}

fn collect_distinct<'a, I: Iterator<Item = &'a String>>(values: I) -> Vec<String> {
	values
		.filter(|v| !v.is_empty())
		.cloned()
		.collect::<BTreeSet<_>>()
		.into_iter()
		.collect()
}

pub fn distinct_producers(songs: &[Song]) -> Vec<String> {
	collect_distinct(
		songs
			.iter()
			.flat_map(|s| std::iter::once(&s.producer).chain(&s.additional_producers)),
	)
}

pub fn distinct_singers(songs: &[Song]) -> Vec<String> {
	collect_distinct(
		songs
			.iter()
			.flat_map(|s| std::iter::once(&s.singer).chain(&s.additional_voices)),
	)
}

pub fn distinct_labels(songs: &[Song]) -> Vec<String> {
	collect_distinct(songs.iter().flat_map(|s| &s.labels))
}
