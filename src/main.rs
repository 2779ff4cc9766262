use log::{error, info};
use options::CLIOptions;
use simplelog::{
	ColorChoice, CombinedLogger, ConfigBuilder, LevelFilter, SharedLogger, TermLogger,
	TerminalMode, WriteLogger,
};
use std::{fs, path::PathBuf};

use app::{
	engine::Group,
	import, navigation,
	navigation::{History, Navigator, Route, Router, Target},
	pdf,
	repository::State,
	session::Session,
	song::{Instrument, Song},
	App,
};

mod app;
mod options;
mod paths;

#[derive(thiserror::Error, Debug)]
enum Error {
	#[error(transparent)]
	App(#[from] app::Error),
	#[error("Could not parse command line arguments:\n\n{0}")]
	CliArgsParsing(getopts::Fail),
	#[error("Could not create log directory `{0}`:\n\n{1}")]
	LogDirectoryCreationError(PathBuf, std::io::Error),
	#[error("Could not create log file `{0}`:\n\n{1}")]
	LogFileCreationError(PathBuf, std::io::Error),
	#[error("Could not initialize log system:\n\n{0}")]
	LogInitialization(log::SetLoggerError),
	#[error("Import task failed: {0}")]
	ImportTask(tokio::task::JoinError),
	#[error("Unknown listing `{0}` (expected producers, singers or labels)")]
	UnknownListing(String),
}

fn init_logging(
	log_level: LevelFilter,
	log_file_path: &Option<PathBuf>,
) -> Result<(), Error> {
	let log_config = ConfigBuilder::new()
		.set_location_level(LevelFilter::Off)
		.set_thread_level(LevelFilter::Off)
		.build();

	let mut loggers: Vec<Box<dyn SharedLogger>> = vec![TermLogger::new(
		log_level,
		log_config.clone(),
		TerminalMode::Stderr,
		ColorChoice::Auto,
	)];

	if let Some(path) = log_file_path {
		if let Some(parent) = path.parent() {
			fs::create_dir_all(parent)
				.map_err(|e| Error::LogDirectoryCreationError(parent.to_owned(), e))?;
		}
		loggers.push(WriteLogger::new(
			log_level,
			log_config,
			fs::OpenOptions::new()
				.create(true)
				.append(true)
				.open(path)
				.map_err(|e| Error::LogFileCreationError(path.to_owned(), e))?,
		));
	}

	CombinedLogger::init(loggers).map_err(Error::LogInitialization)?;
	Ok(())
}

#[tokio::main]
async fn main() {
	if let Err(e) = main_with_result().await {
		error!("{}", e);
		eprintln!("Error: {}", e);
		std::process::exit(1);
	}
}

async fn main_with_result() -> Result<(), Error> {
	let args: Vec<String> = std::env::args().collect();
	let options_manager = options::Manager::new();
	let cli_options = options_manager
		.parse(&args[1..])
		.map_err(Error::CliArgsParsing)?;

	if cli_options.show_help {
		let program = args[0].clone();
		let brief = format!("Usage: {} [options]", program);
		print!("{}", options_manager.usage(&brief));
		return Ok(());
	}

	let paths = paths::Paths::new(&cli_options);

	let log_level = cli_options.log_level.unwrap_or(LevelFilter::Info);
	init_logging(log_level, &paths.log_file_path)?;

	if let Some(path) = &paths.config_file_path {
		info!("Config file location is {:#?}", path);
	}
	if let Some(path) = &paths.log_file_path {
		info!("Log file location is {:#?}", path);
	}

	let app = App::new(&paths).await?;

	if let Some(input) = cli_options.import_file_path.clone() {
		return run_import(&app, input, cli_options.force).await;
	}

	match app.repository.load().await {
		State::Failed(message) => println!("Could not load songs: {}", message),
		_ => {
			for failure in app.repository.failures() {
				println!("Skipped {}: {}", failure.id, failure.reason);
			}
		}
	}
	let songs = app.repository.songs();

	let mut session = Session::new(&app.config_manager).await;
	apply_filters(&mut session, &cli_options)?;

	if let Some(kind) = &cli_options.list {
		let values = match kind.as_str() {
			"producers" => app.repository.distinct_producers(),
			"singers" => app.repository.distinct_singers(),
			"labels" => app.repository.distinct_labels(),
			_ => return Err(Error::UnknownListing(kind.clone())),
		};
		for value in values {
			println!("{}", value);
		}
		return Ok(());
	}

	let initial_route = match (&cli_options.route, &cli_options.song_slug) {
		(Some(route), _) => route.parse::<Route>().map_err(app::Error::from)?,
		(None, Some(slug)) => Route::sheet_view(slug.as_str()),
		(None, None) => Route::home(),
	};
	let mut navigator = Navigator::new(History::new(initial_route), app.repository.clone());
	let has_route_instrument = navigator
		.route()
		.query
		.contains_key(navigation::INSTRUMENT_PARAMETER);
	if cli_options.instrument.is_some() || !has_route_instrument {
		navigator.select_instrument(session.criteria.instrument);
	} else {
		session.set_instrument(navigator.current_instrument());
	}

	if cli_options.random {
		let filtered = session.filtered_songs(&songs);
		if navigator
			.pick_random_song(&filtered, &mut rand::thread_rng())
			.is_none()
		{
			println!("No songs match the current filters");
			return Ok(());
		}
	}

	match navigator.route().target {
		Target::Home => print_listing(&session.ordered_songs(&songs), session.are_groups_collapsed),
		Target::SheetView { .. } => show_song(&navigator, &cli_options).await,
	}

	Ok(())
}

async fn run_import(app: &App, input: PathBuf, force: bool) -> Result<(), Error> {
	let songs_dir_path = app.songs_dir_path.clone();
	let outcome =
		tokio::task::spawn_blocking(move || import::import(&input, &songs_dir_path, force))
			.await
			.map_err(Error::ImportTask)?
			.map_err(app::Error::from)?;
	match outcome {
		import::Outcome::Unchanged => println!("Nothing changed since the last import"),
		import::Outcome::Written { songs, .. } => println!("Imported {} songs", songs),
	}
	Ok(())
}

fn apply_filters(session: &mut Session, cli_options: &CLIOptions) -> Result<(), app::Error> {
	if let Some(instrument) = &cli_options.instrument {
		session.set_instrument(instrument.parse::<Instrument>()?);
	}
	if let Some(grouping) = &cli_options.group_by {
		session.grouping = grouping.parse()?;
	}
	if let Some(sort_order) = &cli_options.sort_by {
		session.sort_order = sort_order.parse()?;
	}

	let criteria = &mut session.criteria;
	if let Some(query) = &cli_options.search_query {
		criteria.search_query = query.clone();
	}
	criteria.labels.extend(cli_options.labels.iter().cloned());
	criteria.producers.extend(cli_options.producers.iter().cloned());
	criteria.singers.extend(cli_options.singers.iter().cloned());
	criteria.date_range.start = cli_options.date_from.clone();
	criteria.date_range.end = cli_options.date_to.clone();
	Ok(())
}

fn print_listing(groups: &[Group], collapsed: bool) {
	if groups.iter().all(|g| g.songs.is_empty()) {
		println!("No songs match the current filters");
		return;
	}
	for group in groups {
		println!("{} ({})", group.name, group.songs.len());
		if collapsed {
			continue;
		}
		for song in &group.songs {
			println!("  {} - {} [{}]", song.title, song.producer, song.slug());
		}
	}
}

async fn show_song<R: Router>(navigator: &Navigator<R>, cli_options: &CLIOptions) {
	let Some(song) = navigator.current_song() else {
		println!("Song not found: {}", navigator.current_slug().unwrap_or_default());
		return;
	};
	let instrument = navigator.current_instrument();

	print_song(&song);
	println!("{}", navigator.route());
	match song.pdf(instrument) {
		Some(url) => {
			println!("{} sheet: {}", instrument, pdf::display_url(url));
			println!("Download: {}", pdf::download_url(url));
		}
		None => println!("No {} sheet for this song", instrument),
	}

	if cli_options.print {
		match navigation::resolve_print_target(&song, instrument) {
			Some(url) => println!("Print: {}", pdf::display_url(url)),
			None => println!("Nothing to print for this song"),
		}
	}

	if let Some(source) = &cli_options.video_source {
		match navigation::resolve_video_link(&song, source) {
			Some(url) => println!("{}: {}", source, url),
			None => println!("No {} link for this song", source),
		}
	}

	if cli_options.check {
		if let Some(url) = navigation::resolve_print_target(&song, instrument) {
			let reachable = pdf::check_reachable(pdf::download_url(url)).await;
			println!(
				"Sheet is {}",
				if reachable { "reachable" } else { "unreachable" }
			);
		}
	}
}

fn print_song(song: &Song) {
	println!("{}", song.title);
	if !song.alternative_names.is_empty() {
		println!("  Also known as: {}", song.alternative_names.join(", "));
	}
	println!("  Producer: {}", song.producer);
	println!("  Singer: {}", song.singer);
	if !song.release_date.is_empty() {
		println!("  Released: {}", song.release_date);
	}
	if !song.labels.is_empty() {
		println!("  Labels: {}", song.labels.join(", "));
	}
	if let Some(transcriber) = &song.transcriber {
		println!("  Transcribed by: {}", transcriber);
	}
}
