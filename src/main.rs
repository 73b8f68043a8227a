use std::path::Path;
use std::process::ExitCode;

use anyhow::Context as _;
use clap::Parser as _;

fn main() -> ExitCode {
    if let Err(err) = try_main() {
        eprintln!("{err:#}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

fn try_main() -> anyhow::Result<()> {
    bookdrip::logging::init().context("init logging")?;

    let cli = bookdrip::cli::Cli::parse();
    tracing::debug!(?cli, "parsed cli");

    let library = Path::new(&cli.library);
    match cli.command {
        bookdrip::cli::Command::Ingest(args) => {
            bookdrip::commands::ingest(library, args).context("ingest")?;
        }
        bookdrip::cli::Command::List => {
            bookdrip::commands::list(library).context("list")?;
        }
        bookdrip::cli::Command::Toc(args) => {
            bookdrip::commands::toc(library, args).context("toc")?;
        }
        bookdrip::cli::Command::Read(args) => {
            bookdrip::commands::read(library, args).context("read")?;
        }
        bookdrip::cli::Command::Unread(args) => {
            bookdrip::commands::unread(library, args).context("unread")?;
        }
        bookdrip::cli::Command::Restart(args) => {
            bookdrip::commands::restart(library, args).context("restart")?;
        }
        bookdrip::cli::Command::Rechunk(args) => {
            bookdrip::commands::rechunk(library, args).context("rechunk")?;
        }
        bookdrip::cli::Command::Check(args) => {
            bookdrip::commands::check(library, args).context("check")?;
        }
        bookdrip::cli::Command::Repair(args) => {
            bookdrip::commands::repair(library, args).context("repair")?;
        }
    }

    Ok(())
}
