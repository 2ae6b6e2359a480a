//! Rewrites Jupyter notebooks into a canonical form so that diffs between
//! revisions stay reviewable. See [`burn_classic::notebook`].

use anyhow::Context;
use std::path::PathBuf;

const HELP: &str = "\
nbfmt

Canonicalizes field ordering and values in a Jupyter notebook: execution
counts are reset, object members are sorted, and the JSON is re-indented,
so that edits made in different tools produce minimal diffs.

USAGE:
    nbfmt [OPTIONS] <path-to-notebook>

The canonical form is printed to stdout unless -w is given.

FLAGS:
    -h, --help      Show this help message and exit
    -w, --write     Rewrite the notebook file in place instead of printing
";

#[derive(Debug)]
struct AppArgs {
    write: bool,
    notebook: PathBuf,
}

impl AppArgs {
    fn parse() -> Result<Self, pico_args::Error> {
        let mut pargs = pico_args::Arguments::from_env();

        // Help has a higher priority and should be handled separately.
        if pargs.contains(["-h", "--help"]) {
            println!("{HELP}");
            std::process::exit(0);
        }

        let args = AppArgs {
            write: pargs.contains(["-w", "--write"]),
            notebook: pargs.free_from_os_str(parse_path)?,
        };

        let remaining = pargs.finish();
        if !remaining.is_empty() {
            panic!("unused arguments: {remaining:?}");
        }

        Ok(args)
    }
}

fn parse_path(s: &std::ffi::OsStr) -> Result<PathBuf, &'static str> {
    Ok(s.into())
}

fn main() -> anyhow::Result<()> {
    let args = match AppArgs::parse() {
        Ok(args) => args,
        Err(err) => {
            eprintln!("{err}");
            eprintln!("{HELP}");
            std::process::exit(1);
        }
    };

    let input = std::fs::read_to_string(&args.notebook)
        .with_context(|| format!("failed to read {:?}", args.notebook))?;
    let output = burn_classic::notebook::canonicalize_str(&input)
        .with_context(|| format!("{:?} is not valid notebook JSON", args.notebook))?;

    if args.write {
        std::fs::write(&args.notebook, &output)
            .with_context(|| format!("failed to write {:?}", args.notebook))?;
    } else {
        print!("{output}");
    }

    Ok(())
}
