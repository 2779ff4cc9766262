use std::{collections::BTreeMap, fmt, str::FromStr};

use log::warn;
use serde::{Deserialize, Deserializer, Serialize};
use unicase::UniCase;

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
#[error("Unknown instrument `{0}`")]
pub struct UnknownInstrument(pub String);

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Instrument {
	#[default]
	C,
	Bb,
	Eb,
	F,
	G,
	Vocals,
	Alto,
	Bass,
	Percussion,
}

impl Instrument {
	pub const ALL: [Instrument; 9] = [
		Instrument::C,
		Instrument::Bb,
		Instrument::Eb,
		Instrument::F,
		Instrument::G,
		Instrument::Vocals,
		Instrument::Alto,
		Instrument::Bass,
		Instrument::Percussion,
	];

	pub fn key(&self) -> &'static str {
		match self {
			Instrument::C => "C",
			Instrument::Bb => "Bb",
			Instrument::Eb => "Eb",
			Instrument::F => "F",
			Instrument::G => "G",
			Instrument::Vocals => "Vocals",
			Instrument::Alto => "Alto",
			Instrument::Bass => "Bass",
			Instrument::Percussion => "Percussion",
		}
	}
}

impl fmt::Display for Instrument {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.key())
	}
}

impl FromStr for Instrument {
	type Err = UnknownInstrument;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let wanted = UniCase::new(s.trim());
		Instrument::ALL
			.into_iter()
			.find(|i| UniCase::new(i.key()) == wanted)
			.ok_or_else(|| UnknownInstrument(s.to_owned()))
	}
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Song {
	pub title: String,
	#[serde(default, deserialize_with = "null_as_default")]
	pub alternative_names: Vec<String>,
	#[serde(default, deserialize_with = "null_as_default")]
	pub producer: String,
	#[serde(default, deserialize_with = "null_as_default")]
	pub additional_producers: Vec<String>,
	#[serde(default, deserialize_with = "null_as_default")]
	pub singer: String,
	#[serde(default, alias = "additionalSingers", deserialize_with = "null_as_default")]
	pub additional_voices: Vec<String>,
	#[serde(default, deserialize_with = "null_as_default")]
	pub release_date: String,
	#[serde(default, deserialize_with = "null_as_default")]
	pub labels: Vec<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub transcriber: Option<String>,
	#[serde(default, deserialize_with = "null_as_default")]
	pub video_links: BTreeMap<String, String>,
	#[serde(default, deserialize_with = "known_instruments")]
	pub pdfs: BTreeMap<Instrument, String>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
	D: Deserializer<'de>,
	T: Default + Deserialize<'de>,
{
	Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Keeps the sheets of known instruments and drops the rest.
fn known_instruments<'de, D>(deserializer: D) -> Result<BTreeMap<Instrument, String>, D::Error>
where
	D: Deserializer<'de>,
{
	let raw: BTreeMap<String, Option<String>> = null_as_default(deserializer)?;
	let mut pdfs = BTreeMap::new();
	for (key, url) in raw {
		match key.parse::<Instrument>() {
			Ok(instrument) => {
				if let Some(url) = url {
					pdfs.insert(instrument, url);
				}
			}
			Err(e) => warn!("Ignoring sheet link: {}", e),
		}
	}
	Ok(pdfs)
}

impl Song {
	pub fn slug(&self) -> String {
		slugify(&self.title)
	}

	/// Returns the PDF link for an instrument, ignoring blank entries.
	pub fn pdf(&self, instrument: Instrument) -> Option<&str> {
		self.pdfs
			.get(&instrument)
			.map(|url| url.trim())
			.filter(|url| !url.is_empty())
	}
}

/// Lowercases `title` and collapses every run of characters outside `[a-z0-9]` into one `-`.
/// Separators at either end are kept.
pub fn slugify(title: &str) -> String {
	let mut slug = String::with_capacity(title.len());
	let mut in_separator = false;
	for c in title.chars().flat_map(char::to_lowercase) {
		if c.is_ascii_lowercase() || c.is_ascii_digit() {
			in_separator = false;
			slug.push(c);
		} else if !in_separator {
			in_separator = true;
			slug.push('-');
		}
	}
	slug
}

/// Keeps only the digits of a date, so `2007-08-31` and `20070831` compare equal.
pub fn date_digits(date: &str) -> String {
	date.chars().filter(char::is_ascii_digit).collect()
}
