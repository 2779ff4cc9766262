use std::{sync::OnceLock, time::Duration};

use log::{debug, warn};
use regex::Regex;
use tokio::task::spawn_blocking;

const HEAD_TIMEOUT: Duration = Duration::from_secs(10);

fn drive_file_regex() -> &'static Regex {
	static REGEX: OnceLock<Regex> = OnceLock::new();
	REGEX.get_or_init(|| {
		Regex::new(r"https://drive\.google\.com/file/d/([a-zA-Z0-9_-]+)").unwrap()
	})
}

fn drive_file_id(url: &str) -> Option<&str> {
	drive_file_regex()
		.captures(url)
		.and_then(|c| c.get(1))
		.map(|m| m.as_str())
}

/// URL suitable for embedding a sheet in a viewer.
pub fn display_url(url: &str) -> String {
	match drive_file_id(url) {
		Some(id) => format!("https://drive.google.com/file/d/{}/preview", id),
		None => url.to_owned(),
	}
}

/// URL that downloads the sheet file directly.
pub fn download_url(url: &str) -> String {
	match drive_file_id(url) {
		Some(id) => format!("https://drive.google.com/uc?export=download&id={}", id),
		None => url.to_owned(),
	}
}

/// Sends a HEAD request to `url`. Any error status or network failure counts as inaccessible.
pub fn is_accessible(url: &str) -> bool {
	if url.is_empty() {
		return false;
	}
	let agent = ureq::AgentBuilder::new().timeout(HEAD_TIMEOUT).build();
	match agent.head(url).call() {
		Ok(response) => {
			debug!("{} answered with status {}", url, response.status());
			true
		}
		Err(ureq::Error::Status(code, _)) => {
			warn!("{} answered with status {}", url, code);
			false
		}
		Err(e) => {
			warn!("Could not reach {}: {}", url, e);
			false
		}
	}
}

pub async fn check_reachable(url: String) -> bool {
	spawn_blocking(move || is_accessible(&url))
		.await
		.unwrap_or(false)
}
