pub mod bootstrap;
pub mod commit;
pub mod config;
pub mod fetch;
pub mod git;
pub mod logging;
pub mod project;
pub mod push;
pub mod resolve;
pub mod state;
pub mod sync;
pub mod upload;

use std::io::IsTerminal;

use clap::Parser;

use crate::config::Config;
use crate::git::GitCli;
use crate::resolve::{ConflictStrategy, InteractivePrompt, PreferSupplied};
use crate::sync::{SyncError, SyncOptions, SyncRun};
use crate::upload::TerminalCredentials;

#[derive(Parser)]
#[command(
    name = "sharelatex-git",
    about = "Mirror a ShareLaTeX project into the local git repository",
    after_help = "Examples:\n  \
        sharelatex-git -m 'Wrote Thesis introduction' https://www.sharelatex.com/project/56147712cc7f5d0adeadbeef\n  \
        sharelatex-git -m 'Wrote Thesis introduction' 56147712cc7f5d0adeadbeef\n  \
        sharelatex-git -m 'Wrote Thesis introduction'    [id from last invocation is used]\n  \
        sharelatex-git                                   [id from last invocation is used, nothing is added to commit message]"
)]
struct Cli {
    /// Project id or project URL
    id: Option<String>,

    /// Commit message
    #[arg(short, long, default_value = "")]
    message: String,

    /// Push after doing commit [EXPERIMENTAL]
    #[arg(short = 'p', long)]
    push: bool,

    /// Push to sharelatex [EXPERIMENTAL]
    #[arg(short = 'P', long = "push-to-sharelatex")]
    push_to_sharelatex: bool,

    /// Don't commit, just download new files
    #[arg(short = 'n', long)]
    no_commit: bool,
}

fn main() {
    logging::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("{}", logging::fatal_line(&e.to_string()));
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), SyncError> {
    let id = match cli.id.as_deref() {
        Some(input) => project::extract_from_input(input)?,
        None => None,
    };

    let workdir = std::env::current_dir()?;
    let config = Config::from_env();
    let vcs = GitCli::new(&workdir);

    let mut interactive;
    let mut batch = PreferSupplied;
    let strategy: &mut dyn ConflictStrategy = if std::io::stdin().is_terminal() {
        interactive = InteractivePrompt::stdio();
        &mut interactive
    } else {
        log::debug!("stdin is not a terminal, conflicting ids resolve to the supplied one");
        &mut batch
    };

    let options = SyncOptions {
        id,
        message: Some(cli.message).filter(|m| !m.is_empty()),
        push: cli.push,
        upload: cli.push_to_sharelatex,
        no_commit: cli.no_commit,
    };

    let report = SyncRun {
        config: &config,
        workdir: &workdir,
        vcs: &vcs,
        strategy,
        credentials: &mut TerminalCredentials,
    }
    .run(options)?;

    log::debug!(
        "synced {} ({}), commit: {:?}",
        report.id,
        report.title.as_deref().unwrap_or("untitled"),
        report.commit
    );
    Ok(())
}
