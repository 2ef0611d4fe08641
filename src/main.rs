//! vuexdoc: publish a documentation site from doclet dumps.
//!
//! Takes the JSON doclet arrays a documentation host exports (its
//! "explain" output), applies the store/component/model vocabulary and
//! writes a cross-linked HTML site.
//!
//! - `vuexdoc -d docs doclets.json`
//! - `host -X src | vuexdoc -d docs -`
//! - `vuexdoc -X doclets/` prints the normalized collection instead

use anyhow::{Context, Result};
use clap::Parser;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use vuexdoc::config::{Config, Opts};
use vuexdoc::{publish, Doclet};

#[derive(Parser)]
#[command(
    name = "vuexdoc",
    version,
    about = "Publish Vue/Vuex documentation sites from doclet dumps"
)]
struct Cli {
    /// Doclet dumps (glob patterns and directories supported, `-` for stdin)
    #[arg(required = true)]
    doclets: Vec<String>,

    /// Output directory [default: ./out/]
    #[arg(short = 'd', long)]
    destination: Option<PathBuf>,

    /// JSON configuration file
    #[arg(short = 'c', long)]
    configure: Option<PathBuf>,

    /// Template directory holding templates/ and static/
    #[arg(short = 't', long)]
    template: Option<PathBuf>,

    /// README rendered on the home page
    #[arg(short = 'R', long)]
    readme: Option<PathBuf>,

    /// Tutorials directory
    #[arg(short = 'u', long)]
    tutorials: Option<PathBuf>,

    /// Source file encoding [default: utf8]
    #[arg(short = 'e', long)]
    encoding: Option<String>,

    /// Heading of the home page
    #[arg(long)]
    mainpagetitle: Option<String>,

    /// Keep doclets marked @private
    #[arg(short = 'p', long)]
    private: bool,

    /// Print the normalized doclets as JSON instead of writing a site
    #[arg(short = 'X', long)]
    explain: bool,

    /// Log every page written
    #[arg(short = 'v', long)]
    verbose: bool,
}

impl Cli {
    fn opts(&self) -> Opts {
        Opts {
            destination: self.destination.clone(),
            encoding: self.encoding.clone(),
            readme: self.readme.clone(),
            template: self.template.clone(),
            tutorials: self.tutorials.clone(),
            mainpagetitle: self.mainpagetitle.clone(),
            private: self.private.then_some(true),
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_writer(io::stderr)
        .init();

    let mut config = match cli.configure {
        Some(ref path) => Config::load(path)
            .with_context(|| format!("failed to load configuration {}", path.display()))?,
        None => Config::default(),
    };
    config.opts = config.opts.overlay(cli.opts());

    let doclets = read_doclets(&cli.doclets)?;
    tracing::info!("read {} doclets", doclets.len());

    if cli.explain {
        let prepared = vuexdoc::publish::prepare(doclets, &config)
            .context("failed to normalize doclets")?;
        let json = serde_json::to_string_pretty(prepared.docs.as_slice())
            .context("failed to serialize doclets")?;
        println!("{}", json);
        return Ok(());
    }

    let summary = publish(doclets, &config).context("publish failed")?;
    tracing::info!(
        "done: {} pages, {} tutorials, {} assets in {}",
        summary.entity_pages,
        summary.tutorial_pages,
        summary.assets,
        summary.outdir.display()
    );
    Ok(())
}

/// Read and concatenate every doclet array named on the command line.
fn read_doclets(inputs: &[String]) -> Result<Vec<Doclet>> {
    let mut doclets = Vec::new();
    for input in inputs {
        if input == "-" {
            let mut json = String::new();
            io::stdin()
                .read_to_string(&mut json)
                .context("failed to read stdin")?;
            doclets.extend(parse_dump(&json).context("invalid doclet dump on stdin")?);
            continue;
        }
        for path in expand_globs(std::slice::from_ref(input))? {
            let json = fs::read_to_string(&path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            doclets.extend(
                parse_dump(&json).with_context(|| format!("invalid doclet dump {}", path.display()))?,
            );
        }
    }
    Ok(doclets)
}

fn parse_dump(json: &str) -> serde_json::Result<Vec<Doclet>> {
    serde_json::from_str(json)
}

/// Expand glob patterns into a list of real file paths.
/// Bare directories are scanned (non-recursively) for `*.json`.
fn expand_globs(patterns: &[String]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for pattern in patterns {
        let path = Path::new(pattern);
        if path.is_file() {
            files.push(path.to_path_buf());
            continue;
        }
        if path.is_dir() {
            let entries = fs::read_dir(path)
                .with_context(|| format!("failed to read directory: {}", path.display()))?;
            for entry in entries.flatten() {
                let p = entry.path();
                if p.is_file() && p.extension().and_then(|e| e.to_str()) == Some("json") {
                    files.push(p);
                }
            }
            continue;
        }
        let matches: Vec<_> = glob::glob(pattern)
            .with_context(|| format!("invalid glob pattern: {}", pattern))?
            .filter_map(|r| r.ok())
            .filter(|p| p.is_file())
            .collect();
        if matches.is_empty() {
            anyhow::bail!("no files matched: {}", pattern);
        }
        files.extend(matches);
    }
    files.sort();
    files.dedup();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directory_inputs_pick_json_only() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.json"), "[]").unwrap();
        fs::write(dir.path().join("a.json"), "[]").unwrap();
        fs::write(dir.path().join("notes.txt"), "").unwrap();
        let files = expand_globs(&[dir.path().to_string_lossy().into_owned()]).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, ["a.json", "b.json"]);
    }

    #[test]
    fn unmatched_pattern_is_an_error() {
        assert!(expand_globs(&["/no/such/*.json".to_string()]).is_err());
    }

    #[test]
    fn cli_flags_become_opts() {
        let cli = Cli::parse_from(["vuexdoc", "-d", "site", "-p", "dump.json"]);
        let opts = cli.opts();
        assert_eq!(opts.destination, Some(PathBuf::from("site")));
        assert_eq!(opts.private, Some(true));
        assert!(Cli::parse_from(["vuexdoc", "dump.json"]).opts().private.is_none());
    }
}
