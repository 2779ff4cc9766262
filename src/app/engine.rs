use std::{cmp::Ordering, collections::BTreeSet, fmt, str::FromStr};

use icu_collator::{Collator, CollatorOptions, Strength};
use rand::{seq::SliceRandom, Rng};

use crate::app::song::{date_digits, Instrument, Song};

pub const UNGROUPED_NAME: &str = "All Songs";

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum Error {
	#[error("Unknown grouping `{0}` (expected none, singer or producer)")]
	UnknownGrouping(String),
	#[error("Unknown sort order `{0}` (expected a-z or z-a)")]
	UnknownSortOrder(String),
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Grouping {
	None,
	#[default]
	Singer,
	Producer,
}

impl FromStr for Grouping {
	type Err = Error;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.trim() {
			"none" => Ok(Grouping::None),
			"singer" => Ok(Grouping::Singer),
			"producer" => Ok(Grouping::Producer),
			_ => Err(Error::UnknownGrouping(s.to_owned())),
		}
	}
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SortOrder {
	#[default]
	AToZ,
	ZToA,
}

impl FromStr for SortOrder {
	type Err = Error;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.trim() {
			"a-z" => Ok(SortOrder::AToZ),
			"z-a" => Ok(SortOrder::ZToA),
			_ => Err(Error::UnknownSortOrder(s.to_owned())),
		}
	}
}

impl fmt::Display for SortOrder {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			SortOrder::AToZ => f.write_str("a-z"),
			SortOrder::ZToA => f.write_str("z-a"),
		}
	}
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DateRange {
	pub start: Option<String>,
	pub end: Option<String>,
}

impl DateRange {
	pub fn contains(&self, release_date: &str) -> bool {
		let release_date = date_digits(release_date);
		let within_start = match bound(&self.start) {
			Some(start) => release_date >= start,
			None => true,
		};
		let within_end = match bound(&self.end) {
			Some(end) => release_date <= end,
			None => true,
		};
		within_start && within_end
	}
}

fn bound(date: &Option<String>) -> Option<String> {
	date.as_deref()
		.map(date_digits)
		.filter(|digits| !digits.is_empty())
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Criteria {
	pub search_query: String,
	pub instrument: Instrument,
	pub labels: BTreeSet<String>,
	pub producers: BTreeSet<String>,
	pub singers: BTreeSet<String>,
	pub date_range: DateRange,
}

impl Criteria {
	pub fn matches(&self, song: &Song) -> bool {
		let query = self.search_query.to_lowercase();
		let matches_query = song.title.to_lowercase().contains(&query);

		let has_pdf = song.pdf(self.instrument).is_some();

		let matches_labels =
			self.labels.is_empty() || song.labels.iter().any(|l| self.labels.contains(l));

		let matches_producers = self.producers.is_empty()
			|| self.producers.contains(&song.producer)
			|| song
				.additional_producers
				.iter()
				.any(|p| self.producers.contains(p));

		let matches_singers = self.singers.is_empty()
			|| self.singers.contains(&song.singer)
			|| song
				.additional_voices
				.iter()
				.any(|s| self.singers.contains(s));

		let matches_dates = self.date_range.contains(&song.release_date);

		matches_query
			&& has_pdf
			&& matches_labels
			&& matches_producers
			&& matches_singers
			&& matches_dates
	}
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Group {
	pub name: String,
	pub songs: Vec<Song>,
}

pub fn make_collator() -> Collator {
	let options = {
		let mut o = CollatorOptions::new();
		o.strength = Some(Strength::Secondary);
		o
	};
	Collator::try_new(&Default::default(), options).unwrap()
}

pub fn filter<'a>(songs: &'a [Song], criteria: &Criteria) -> Vec<&'a Song> {
	songs.iter().filter(|s| criteria.matches(s)).collect()
}

pub fn group(songs: Vec<&Song>, grouping: Grouping) -> Vec<Group> {
	if grouping == Grouping::None {
		return vec![Group {
			name: UNGROUPED_NAME.to_owned(),
			songs: songs.into_iter().cloned().collect(),
		}];
	}

	let mut groups: Vec<Group> = Vec::new();
	for song in songs {
		let name = group_key(song, grouping);
		match groups.iter_mut().find(|g| g.name == name) {
			Some(group) => group.songs.push(song.clone()),
			None => groups.push(Group {
				name: name.to_owned(),
				songs: vec![song.clone()],
			}),
		}
	}
	groups
}

fn group_key(song: &Song, grouping: Grouping) -> &str {
	match grouping {
		Grouping::None => UNGROUPED_NAME,
		Grouping::Singer => &song.singer,
		Grouping::Producer => &song.producer,
	}
}

pub fn sort(groups: &mut [Group], order: SortOrder) {
	let collator = make_collator();
	let compare = |a: &str, b: &str| -> Ordering {
		match order {
			SortOrder::AToZ => collator.compare(a, b),
			SortOrder::ZToA => collator.compare(b, a),
		}
	};
	groups.sort_by(|a, b| compare(&a.name, &b.name));
	for group in groups.iter_mut() {
		group.songs.sort_by(|a, b| compare(&a.title, &b.title));
	}
}

/// Filters, groups and sorts `songs` into the list of groups to display.
pub fn arrange(
	songs: &[Song],
	criteria: &Criteria,
	grouping: Grouping,
	order: SortOrder,
) -> Vec<Group> {
	let mut groups = group(filter(songs, criteria), grouping);
	sort(&mut groups, order);
	groups
}

/// Yields `None` on an empty selection.
pub fn pick_random<'a, R: Rng + ?Sized>(songs: &[&'a Song], rng: &mut R) -> Option<&'a Song> {
	songs.choose(rng).copied()
}

#[cfg(test)]
mod test {
	use std::collections::{BTreeMap, HashSet};

	use rand::{rngs::StdRng, SeedableRng};

	use super::*;

	fn song(title: &str, producer: &str, singer: &str, release_date: &str) -> Song {
		Song {
			title: title.to_owned(),
			producer: producer.to_owned(),
			singer: singer.to_owned(),
			release_date: release_date.to_owned(),
			pdfs: BTreeMap::from([(Instrument::C, format!("https://example.com/{title}.pdf"))]),
			..Default::default()
		}
	}

	fn miku_songs() -> Vec<Song> {
		vec![
			song("World is Mine", "ryo", "Hatsune Miku", "20070831"),
			song("Tell Your World", "livetune", "Hatsune Miku", "20120229"),
		]
	}

	fn titles(groups: &[Group]) -> Vec<Vec<&str>> {
		groups
			.iter()
			.map(|g| g.songs.iter().map(|s| s.title.as_str()).collect())
			.collect()
	}

	fn names(groups: &[Group]) -> Vec<&str> {
		groups.iter().map(|g| g.name.as_str()).collect()
	}

	#[test]
	fn groups_by_singer_alphabetically() {
		let groups = arrange(
			&miku_songs(),
			&Criteria::default(),
			Grouping::Singer,
			SortOrder::AToZ,
		);
		assert_eq!(names(&groups), vec!["Hatsune Miku"]);
		assert_eq!(
			titles(&groups),
			vec![vec!["Tell Your World", "World is Mine"]]
		);
	}

	#[test]
	fn search_is_case_insensitive_substring() {
		let criteria = Criteria {
			search_query: "mine".to_owned(),
			..Default::default()
		};
		let songs = miku_songs();
		let filtered = filter(&songs, &criteria);
		assert_eq!(filtered.len(), 1);
		assert_eq!(filtered[0].title, "World is Mine");
	}

	#[test]
	fn singer_filter_does_not_match_producers() {
		let criteria = Criteria {
			singers: BTreeSet::from(["livetune".to_owned()]),
			..Default::default()
		};
		let groups = arrange(&miku_songs(), &criteria, Grouping::Singer, SortOrder::AToZ);
		assert!(groups.is_empty());

		let criteria = Criteria {
			producers: BTreeSet::from(["livetune".to_owned()]),
			..Default::default()
		};
		let groups = arrange(&miku_songs(), &criteria, Grouping::Singer, SortOrder::AToZ);
		assert_eq!(titles(&groups), vec![vec!["Tell Your World"]]);
	}

	#[test]
	fn additional_credits_count_towards_filters() {
		let mut duet = song("Magnet", "minato", "Hatsune Miku", "20090302");
		duet.additional_voices = vec!["Megurine Luka".to_owned()];
		duet.additional_producers = vec!["ryo".to_owned()];
		let songs = vec![duet];

		let by_voice = Criteria {
			singers: BTreeSet::from(["Megurine Luka".to_owned()]),
			..Default::default()
		};
		assert_eq!(filter(&songs, &by_voice).len(), 1);

		let by_producer = Criteria {
			producers: BTreeSet::from(["ryo".to_owned()]),
			..Default::default()
		};
		assert_eq!(filter(&songs, &by_producer).len(), 1);
	}

	#[test]
	fn labels_match_on_intersection() {
		let mut songs = miku_songs();
		songs[0].labels = vec!["Classic".to_owned(), "Supercell".to_owned()];
		let criteria = Criteria {
			labels: BTreeSet::from(["Supercell".to_owned(), "Project DIVA".to_owned()]),
			..Default::default()
		};
		let filtered = filter(&songs, &criteria);
		assert_eq!(filtered.len(), 1);
		assert_eq!(filtered[0].title, "World is Mine");
	}

	#[test]
	fn date_range_bounds_are_inclusive() {
		let songs = miku_songs();
		let mut criteria = Criteria {
			date_range: DateRange {
				start: Some("2007-08-31".to_owned()),
				end: Some("2007-08-31".to_owned()),
			},
			..Default::default()
		};
		let filtered = filter(&songs, &criteria);
		assert_eq!(filtered.len(), 1);
		assert_eq!(filtered[0].title, "World is Mine");

		criteria.date_range.end = Some("2007-08-30".to_owned());
		assert!(filter(&songs, &criteria).is_empty());
	}

	#[test]
	fn empty_date_bounds_are_unbounded() {
		let songs = miku_songs();
		let criteria = Criteria {
			date_range: DateRange {
				start: Some("".to_owned()),
				end: Some("2010-01-01".to_owned()),
			},
			..Default::default()
		};
		assert_eq!(filter(&songs, &criteria).len(), 1);

		let criteria = Criteria {
			date_range: DateRange {
				start: Some("2010-01-01".to_owned()),
				end: None,
			},
			..Default::default()
		};
		let filtered = filter(&songs, &criteria);
		assert_eq!(filtered.len(), 1);
		assert_eq!(filtered[0].title, "Tell Your World");
	}

	#[test]
	fn blank_pdf_excludes_song_for_instrument() {
		let mut songs = miku_songs();
		songs[0].pdfs.insert(Instrument::Bb, "   ".to_owned());
		songs[1]
			.pdfs
			.insert(Instrument::Bb, "https://example.com/bb.pdf".to_owned());
		let criteria = Criteria {
			instrument: Instrument::Bb,
			..Default::default()
		};
		let filtered = filter(&songs, &criteria);
		assert_eq!(filtered.len(), 1);
		assert_eq!(filtered[0].title, "Tell Your World");
	}

	#[test]
	fn restrictions_never_grow_results() {
		let mut songs = miku_songs();
		songs.push(song("Senbonzakura", "Kurousa-P", "Hatsune Miku", "20110917"));
		songs.push(song("Ievan Polkka", "Otomania", "Hatsune Miku", "20070904"));
		songs[2].labels = vec!["Wafuu".to_owned()];

		let base = Criteria::default();
		let base_count = filter(&songs, &base).len();

		let restricted = [
			Criteria {
				labels: BTreeSet::from(["Wafuu".to_owned()]),
				..base.clone()
			},
			Criteria {
				producers: BTreeSet::from(["ryo".to_owned()]),
				..base.clone()
			},
			Criteria {
				singers: BTreeSet::from(["Kagamine Len".to_owned()]),
				..base.clone()
			},
		];
		for criteria in restricted {
			assert!(filter(&songs, &criteria).len() <= base_count);
		}
	}

	#[test]
	fn arranging_is_idempotent() {
		let songs = miku_songs();
		let criteria = Criteria {
			search_query: "world".to_owned(),
			..Default::default()
		};
		let first = arrange(&songs, &criteria, Grouping::Producer, SortOrder::ZToA);
		let second = arrange(&songs, &criteria, Grouping::Producer, SortOrder::ZToA);
		assert_eq!(first, second);
	}

	#[test]
	fn groups_partition_the_filtered_set() {
		let mut songs = miku_songs();
		songs.push(song("Senbonzakura", "Kurousa-P", "Hatsune Miku", "20110917"));
		songs.push(song("Meltdown", "iroha", "Kagamine Rin", "20080621"));
		songs.push(song("Ah, It's a Wonderful Cat's Life", "cosMo", "Kagamine Rin", "20120112"));

		let criteria = Criteria::default();
		let expected = filter(&songs, &criteria)
			.into_iter()
			.map(|s| s.title.clone())
			.collect::<HashSet<_>>();

		for grouping in [Grouping::None, Grouping::Singer, Grouping::Producer] {
			let groups = arrange(&songs, &criteria, grouping, SortOrder::AToZ);
			let all = groups
				.iter()
				.flat_map(|g| g.songs.iter().map(|s| s.title.clone()))
				.collect::<Vec<_>>();
			assert_eq!(all.len(), expected.len());
			assert_eq!(all.into_iter().collect::<HashSet<_>>(), expected);
		}
	}

	#[test]
	fn ungrouped_songs_share_one_group() {
		let groups = arrange(
			&miku_songs(),
			&Criteria::default(),
			Grouping::None,
			SortOrder::ZToA,
		);
		assert_eq!(names(&groups), vec![UNGROUPED_NAME]);
		assert_eq!(
			titles(&groups),
			vec![vec!["World is Mine", "Tell Your World"]]
		);
	}

	#[test]
	fn group_names_sort_case_insensitively() {
		let songs = vec![
			song("Rolling Girl", "wowaka", "Hatsune Miku", "20100214"),
			song("Unknown Mother-Goose", "wowaka", "Hatsune Miku", "20170818"),
			song("Ghost Rule", "DECO*27", "Hatsune Miku", "20160123"),
			song("Lost One's Weeping", "Neru", "Kagamine Rin", "20131201"),
		];

		let groups = arrange(&songs, &Criteria::default(), Grouping::Producer, SortOrder::AToZ);
		assert_eq!(names(&groups), vec!["DECO*27", "Neru", "wowaka"]);

		let groups = arrange(&songs, &Criteria::default(), Grouping::Producer, SortOrder::ZToA);
		assert_eq!(names(&groups), vec!["wowaka", "Neru", "DECO*27"]);
		assert_eq!(groups[0].songs[0].title, "Unknown Mother-Goose");
	}

	#[test]
	fn grouping_keys_are_case_sensitive() {
		let songs = vec![
			song("Melt", "ryo", "Hatsune Miku", "20071207"),
			song("Black Rock Shooter", "Ryo", "Hatsune Miku", "20080613"),
		];
		let groups = arrange(&songs, &Criteria::default(), Grouping::Producer, SortOrder::AToZ);
		assert_eq!(groups.len(), 2);
	}

	#[test]
	fn sorting_is_stable_for_equal_titles() {
		let mut first = song("Melt", "ryo", "Hatsune Miku", "20071207");
		first.labels = vec!["first".to_owned()];
		let mut second = song("melt", "ryo", "Hatsune Miku", "20071207");
		second.labels = vec!["second".to_owned()];
		let songs = vec![first, second];

		for order in [SortOrder::AToZ, SortOrder::ZToA] {
			let groups = arrange(&songs, &Criteria::default(), Grouping::None, order);
			let labels = groups[0]
				.songs
				.iter()
				.map(|s| s.labels[0].as_str())
				.collect::<Vec<_>>();
			assert_eq!(labels, vec!["first", "second"]);

			let mut resorted = groups.clone();
			sort(&mut resorted, order);
			assert_eq!(resorted, groups);
		}
	}

	#[test]
	fn random_pick_comes_from_the_filtered_set() {
		let songs = miku_songs();
		let filtered = filter(&songs, &Criteria::default());
		let mut rng = StdRng::seed_from_u64(7);
		for _ in 0..16 {
			let picked = pick_random(&filtered, &mut rng).unwrap();
			assert!(filtered.iter().any(|s| s.title == picked.title));
		}
	}

	#[test]
	fn random_pick_on_empty_set_yields_nothing() {
		let mut rng = StdRng::seed_from_u64(7);
		assert_eq!(pick_random(&[], &mut rng), None);
	}

	#[test]
	fn modes_parse_from_their_names() {
		assert_eq!("producer".parse::<Grouping>(), Ok(Grouping::Producer));
		assert_eq!("z-a".parse::<SortOrder>(), Ok(SortOrder::ZToA));
		assert_eq!(
			"artist".parse::<Grouping>(),
			Err(Error::UnknownGrouping("artist".to_owned()))
		);
	}
}
