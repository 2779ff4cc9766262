use simplelog::LevelFilter;
use std::path::PathBuf;

pub struct CLIOptions {
	pub show_help: bool,
	pub config_file_path: Option<PathBuf>,
	pub data_dir_path: Option<PathBuf>,
	pub log_file_path: Option<PathBuf>,
	pub log_level: Option<LevelFilter>,
	pub search_query: Option<String>,
	pub instrument: Option<String>,
	pub labels: Vec<String>,
	pub producers: Vec<String>,
	pub singers: Vec<String>,
	pub date_from: Option<String>,
	pub date_to: Option<String>,
	pub group_by: Option<String>,
	pub sort_by: Option<String>,
	pub route: Option<String>,
	pub song_slug: Option<String>,
	pub random: bool,
	pub print: bool,
	pub video_source: Option<String>,
	pub check: bool,
	pub list: Option<String>,
	pub import_file_path: Option<PathBuf>,
	pub force: bool,
}

pub struct Manager {
	protocol: getopts::Options,
}

impl Manager {
	pub fn new() -> Self {
		Self {
			protocol: get_options(),
		}
	}

	pub fn parse(&self, input: &[String]) -> Result<CLIOptions, getopts::Fail> {
		let matches = self.protocol.parse(input)?;

		Ok(CLIOptions {
			show_help: matches.opt_present("h"),
			config_file_path: matches.opt_str("c").map(PathBuf::from),
			data_dir_path: matches.opt_str("d").map(PathBuf::from),
			log_file_path: matches.opt_str("log").map(PathBuf::from),
			log_level: matches.opt_str("log-level").and_then(|l| l.parse().ok()),
			search_query: matches.opt_str("q"),
			instrument: matches.opt_str("i"),
			labels: matches.opt_strs("label"),
			producers: matches.opt_strs("producer"),
			singers: matches.opt_strs("singer"),
			date_from: matches.opt_str("from"),
			date_to: matches.opt_str("to"),
			group_by: matches.opt_str("g"),
			sort_by: matches.opt_str("s"),
			route: matches.opt_str("route"),
			song_slug: matches.opt_str("song"),
			random: matches.opt_present("random"),
			print: matches.opt_present("print"),
			video_source: matches.opt_str("video"),
			check: matches.opt_present("check"),
			list: matches.opt_str("list"),
			import_file_path: matches.opt_str("import").map(PathBuf::from),
			force: matches.opt_present("force"),
		})
	}

	pub fn usage(&self, brief: &str) -> String {
		self.protocol.usage(brief)
	}
}

fn get_options() -> getopts::Options {
	let mut options = getopts::Options::new();
	options.optopt("c", "config", "set the configuration file", "FILE");
	options.optopt(
		"d",
		"data",
		"set the directory containing song files",
		"DIRECTORY",
	);
	options.optopt("", "log", "set the path to the log file", "FILE");
	options.optopt(
		"",
		"log-level",
		"set the log level (off, error, warn, info, debug or trace)",
		"LEVEL",
	);

	options.optopt("q", "query", "only show songs whose title contains TEXT", "TEXT");
	options.optopt("i", "instrument", "select the instrument sheets to use", "KEY");
	options.optmulti("", "label", "only show songs with this label", "NAME");
	options.optmulti("", "producer", "only show songs by this producer", "NAME");
	options.optmulti("", "singer", "only show songs sung by this voice", "NAME");
	options.optopt("", "from", "only show songs released on or after DATE", "DATE");
	options.optopt("", "to", "only show songs released on or before DATE", "DATE");
	options.optopt("g", "group", "group songs by none, singer or producer", "MODE");
	options.optopt("s", "sort", "sort songs a-z or z-a", "ORDER");

	options.optopt("", "route", "open a route such as /view/<slug>", "PATH");
	options.optopt("", "song", "open the song with this slug", "SLUG");
	options.optflag("", "random", "open a random song among the matches");
	options.optflag("", "print", "show the sheet to print for the open song");
	options.optopt("", "video", "show the open song's video link", "SOURCE");
	options.optflag("", "check", "check that the open song's sheet is reachable");
	options.optopt(
		"",
		"list",
		"list the distinct producers, singers or labels",
		"KIND",
	);

	options.optopt(
		"",
		"import",
		"import a spreadsheet export into the songs directory",
		"FILE",
	);
	options.optflag("", "force", "import even if the export did not change");

	options.optflag("h", "help", "print this help menu");
	options
}
