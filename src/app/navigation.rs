use std::{collections::BTreeMap, fmt, str::FromStr};

use log::debug;
use rand::Rng;

use crate::app::{
	engine, repository,
	song::{Instrument, Song},
};

pub const INSTRUMENT_PARAMETER: &str = "instrument";

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum Error {
	#[error("Unknown route `{0}`")]
	UnknownRoute(String),
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Target {
	#[default]
	Home,
	SheetView {
		song_slug: String,
	},
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Route {
	pub target: Target,
	pub query: BTreeMap<String, String>,
}

impl Route {
	pub fn home() -> Self {
		Self::default()
	}

	pub fn sheet_view<S: Into<String>>(song_slug: S) -> Self {
		Self {
			target: Target::SheetView {
				song_slug: song_slug.into(),
			},
			query: BTreeMap::new(),
		}
	}

	pub fn with_instrument(mut self, instrument: Instrument) -> Self {
		self.query
			.insert(INSTRUMENT_PARAMETER.to_owned(), instrument.key().to_owned());
		self
	}
}

impl FromStr for Route {
	type Err = Error;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let (path, query_string) = match s.trim().split_once('?') {
			Some((path, query_string)) => (path, Some(query_string)),
			None => (s.trim(), None),
		};

		let segments = path
			.split('/')
			.filter(|s| !s.is_empty())
			.collect::<Vec<_>>();
		let target = match segments.as_slice() {
			[] => Target::Home,
			["view", slug] => Target::SheetView {
				song_slug: (*slug).to_owned(),
			},
			_ => return Err(Error::UnknownRoute(s.to_owned())),
		};

		let mut query = BTreeMap::new();
		for pair in query_string.unwrap_or_default().split('&') {
			if pair.is_empty() {
				continue;
			}
			let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
			query.insert(key.to_owned(), value.to_owned());
		}

		Ok(Route { target, query })
	}
}

impl fmt::Display for Route {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match &self.target {
			Target::Home => f.write_str("/")?,
			Target::SheetView { song_slug } => write!(f, "/view/{}", song_slug)?,
		}
		for (index, (key, value)) in self.query.iter().enumerate() {
			let separator = if index == 0 { '?' } else { '&' };
			write!(f, "{}{}={}", separator, key, value)?;
		}
		Ok(())
	}
}

pub trait Router {
	fn route(&self) -> &Route;
	fn push(&mut self, route: Route);
	fn replace(&mut self, route: Route);
}

/// In-memory browsing history.
#[derive(Clone, Debug)]
pub struct History {
	entries: Vec<Route>,
}

impl History {
	pub fn new(initial: Route) -> Self {
		Self {
			entries: vec![initial],
		}
	}

	pub fn entries(&self) -> &[Route] {
		&self.entries
	}
}

impl Default for History {
	fn default() -> Self {
		Self::new(Route::home())
	}
}

impl Router for History {
	fn route(&self) -> &Route {
		// Never empty: created with one entry and replace() swaps in place
		&self.entries[self.entries.len() - 1]
	}

	fn push(&mut self, route: Route) {
		debug!("Navigating to {}", route);
		self.entries.push(route);
	}

	fn replace(&mut self, route: Route) {
		debug!("Replacing route with {}", route);
		let last = self.entries.len() - 1;
		self.entries[last] = route;
	}
}

pub struct Navigator<R: Router> {
	router: R,
	repository: repository::Manager,
}

impl<R: Router> Navigator<R> {
	pub fn new(router: R, repository: repository::Manager) -> Self {
		Self { router, repository }
	}

	pub fn router(&self) -> &R {
		&self.router
	}

	pub fn route(&self) -> &Route {
		self.router.route()
	}

	pub fn current_slug(&self) -> Option<&str> {
		match &self.router.route().target {
			Target::Home => None,
			Target::SheetView { song_slug } => Some(song_slug),
		}
	}

	/// Instrument from the route query. Missing or unknown values read as `C`.
	pub fn current_instrument(&self) -> Instrument {
		self.router
			.route()
			.query
			.get(INSTRUMENT_PARAMETER)
			.and_then(|i| i.parse().ok())
			.unwrap_or_default()
	}

	pub fn current_song(&self) -> Option<Song> {
		self.current_slug()
			.and_then(|slug| self.repository.get_by_slug(slug))
	}

	pub fn select_instrument(&mut self, instrument: Instrument) {
		let route = self.router.route().clone().with_instrument(instrument);
		self.router.replace(route);
	}

	pub fn open_song(&mut self, slug: &str) {
		self.router.push(Route::sheet_view(slug));
	}

	/// Opens a random song among `filtered`, carrying over the instrument parameter.
	/// Returns the song that was opened, if any.
	pub fn pick_random_song<'a, G: Rng + ?Sized>(
		&mut self,
		filtered: &[&'a Song],
		rng: &mut G,
	) -> Option<&'a Song> {
		let song = engine::pick_random(filtered, rng)?;
		let mut route = Route::sheet_view(song.slug());
		if let Some(instrument) = self.router.route().query.get(INSTRUMENT_PARAMETER) {
			route
				.query
				.insert(INSTRUMENT_PARAMETER.to_owned(), instrument.clone());
		}
		self.router.push(route);
		Some(song)
	}
}

/// Link to print for an instrument, falling back to the concert pitch sheet.
pub fn resolve_print_target(song: &Song, instrument: Instrument) -> Option<&str> {
	song.pdf(instrument).or_else(|| song.pdf(Instrument::C))
}

pub fn resolve_video_link<'a>(song: &'a Song, source: &str) -> Option<&'a str> {
	song.video_links.get(source).map(String::as_str)
}
