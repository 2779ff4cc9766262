use rand::Rng;

use crate::app::{
	config,
	engine::{self, Criteria, DateRange, Group, Grouping, SortOrder},
	song::{Instrument, Song},
};

/// Filter, grouping and display state for one browsing session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Session {
	pub criteria: Criteria,
	pub grouping: Grouping,
	pub sort_order: SortOrder,
	pub is_filter_modal_showing: bool,
	pub are_groups_collapsed: bool,
	pub is_sidebar_collapsed: bool,
}

impl Default for Session {
	fn default() -> Self {
		Self {
			criteria: Criteria::default(),
			grouping: Grouping::default(),
			sort_order: SortOrder::default(),
			is_filter_modal_showing: false,
			are_groups_collapsed: false,
			is_sidebar_collapsed: true,
		}
	}
}

impl Session {
	pub async fn new(config_manager: &config::Manager) -> Self {
		let mut session = Self::default();
		session.criteria.instrument = config_manager.get_default_instrument().await;
		session.grouping = config_manager.get_grouping().await;
		session.sort_order = config_manager.get_sort_order().await;
		session
	}

	pub fn set_instrument(&mut self, instrument: Instrument) {
		self.criteria.instrument = instrument;
	}

	/// Clears the search text and every advanced filter. The instrument is kept.
	pub fn reset_search(&mut self) {
		self.criteria.search_query.clear();
		self.criteria.labels.clear();
		self.criteria.producers.clear();
		self.criteria.singers.clear();
		self.criteria.date_range = DateRange::default();
	}

	pub fn reset_all_filters(&mut self) {
		self.reset_search();
	}

	pub fn toggle_filter_modal(&mut self) {
		self.is_filter_modal_showing = !self.is_filter_modal_showing;
	}

	pub fn toggle_groups_collapsed(&mut self) {
		self.are_groups_collapsed = !self.are_groups_collapsed;
	}

	pub fn toggle_sidebar_collapsed(&mut self) {
		self.is_sidebar_collapsed = !self.is_sidebar_collapsed;
	}

	pub fn filtered_songs<'a>(&self, songs: &'a [Song]) -> Vec<&'a Song> {
		engine::filter(songs, &self.criteria)
	}

	pub fn ordered_songs(&self, songs: &[Song]) -> Vec<Group> {
		engine::arrange(songs, &self.criteria, self.grouping, self.sort_order)
	}

	pub fn pick_random_song<'a, R: Rng + ?Sized>(
		&self,
		songs: &'a [Song],
		rng: &mut R,
	) -> Option<&'a Song> {
		engine::pick_random(&self.filtered_songs(songs), rng)
	}
}
