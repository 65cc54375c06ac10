use std::path::PathBuf;

use clap::{Parser, Subcommand};
use color_eyre::Section;
use dradismd::{
	config::AppConfig,
	convert::{ConvertArgs, convert_command},
	dradis::{BoxedDradisClient, HttpDradisClient, MockDradisClient},
	error::DradisError,
	library::{AddIssueArgs, IssuesArgs, add_issue_command, issues_command},
	project::{GetArgs, ProjectsArgs, UpdateArgs, get_command, projects_command, update_command},
	rename::{RenameArgs, rename_command},
};
use miette::Diagnostic;
use tracing_subscriber::EnvFilter;

const VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), " (", env!("GIT_HASH"), ")");

#[derive(Parser)]
#[command(author, version = VERSION, about, long_about = None)]
struct Cli {
	#[command(subcommand)]
	command: Commands,

	/// Config file. Defaults to `$XDG_CONFIG_HOME/dradismd/config.toml`
	#[arg(long, global = true)]
	config: Option<PathBuf>,

	/// More logs (-v info, -vv debug). RUST_LOG takes precedence
	#[arg(short, long, global = true, action = clap::ArgAction::Count)]
	verbose: u8,

	/// Use an in-memory Dradis, loaded from (and saved to) the file in $DRADISMD_MOCK_STATE
	#[arg(long, global = true, hide = true)]
	mock: bool,
}

#[derive(Subcommand)]
enum Commands {
	#[command(visible_alias = "list")]
	Projects(ProjectsArgs),
	#[command(visible_alias = "import")]
	Get(GetArgs),
	#[command(visible_alias = "export")]
	Update(UpdateArgs),
	#[command(visible_alias = "search")]
	Issues(IssuesArgs),
	#[command(name = "add_issue", visible_alias = "add")]
	AddIssue(AddIssueArgs),
	Convert(ConvertArgs),
	Rename(RenameArgs),
}

fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;
	let cli = Cli::parse();
	init_logging(cli.verbose);

	run(cli).map_err(report)
}

fn run(cli: Cli) -> dradismd::Result<()> {
	// Converting and renaming are purely local
	let config = match &cli.command {
		Commands::Convert(_) => None,
		Commands::Rename(_) => Some(AppConfig::load(cli.config.as_deref()).unwrap_or_else(|e| {
			tracing::debug!("no usable config: {e}");
			AppConfig::default()
		})),
		_ => Some(AppConfig::load(cli.config.as_deref())?),
	};
	let config = config.unwrap_or_default();
	let remote = || remote_client(&config, cli.mock);

	match cli.command {
		Commands::Projects(args) => projects_command(&config, &*remote()?, args),
		Commands::Get(args) => get_command(&config, &*remote()?, args),
		Commands::Update(args) => update_command(&*remote()?, args),
		Commands::Issues(args) => issues_command(&*remote()?, args),
		Commands::AddIssue(args) => {
			let client = match args.id {
				Some(_) => Some(remote()?),
				None => None,
			};
			add_issue_command(&config, client.as_deref(), args)
		}
		Commands::Convert(args) => convert_command(args),
		Commands::Rename(args) => rename_command(&config, args),
	}
}

fn remote_client(config: &AppConfig, mock: bool) -> dradismd::Result<BoxedDradisClient> {
	if mock {
		tracing::debug!("using mock Dradis");
		return Ok(Box::new(MockDradisClient::from_env()?));
	}
	Ok(Box::new(HttpDradisClient::new(config)?))
}

fn init_logging(verbose: u8) {
	let default_directives = option_env!("LOG_DIRECTIVES").unwrap_or(match verbose {
		0 => "warn",
		1 => "info",
		_ => "debug",
	});
	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives));
	tracing_subscriber::fmt().with_env_filter(filter).with_target(false).with_writer(std::io::stderr).init();
}

/// Keep the diagnostic's help visible once it goes through eyre.
fn report(e: DradisError) -> color_eyre::Report {
	let help = e.help().map(|h| h.to_string());
	let report = color_eyre::Report::new(e);
	match help {
		Some(help) => report.suggestion(help),
		None => report,
	}
}
