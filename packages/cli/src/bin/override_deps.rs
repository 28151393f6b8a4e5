use std::fs;
use std::path::PathBuf;
use std::process;

use anyhow::{anyhow, Context, Result};
use clap::{Arg, ArgAction, ArgMatches, Command};
use override_deps::{OverrideDeps, PluginOptions};
use override_deps_cli::{expand_inputs, rewrite_files, FileOutcome};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let matches = Command::new("override-deps")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Inspect build-time dependency overrides")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("PATH")
                .help("Path to the override configuration (JSON)")
                .default_value("override-deps.json")
                .global(true),
        )
        .subcommand_required(true)
        .subcommand(
            Command::new("rewrite")
                .about("Redirect imports of overridden packages in source files")
                .arg(
                    Arg::new("files")
                        .value_name("FILES")
                        .help("Files or glob patterns")
                        .required(true)
                        .num_args(1..),
                )
                .arg(
                    Arg::new("write")
                        .short('w')
                        .long("write")
                        .help("Write rewritten files in place instead of printing them")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("load")
                .about("Print the virtual module behind an alias")
                .arg(Arg::new("alias").value_name("ALIAS").required(true)),
        )
        .subcommand(
            Command::new("exports")
                .about("Print the export names discovered for a package")
                .arg(Arg::new("package").value_name("PACKAGE").required(true)),
        )
        .get_matches();

    if let Err(e) = run(&matches) {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

fn run(matches: &ArgMatches) -> Result<()> {
    let config = matches
        .get_one::<String>("config")
        .map(PathBuf::from)
        .ok_or_else(|| anyhow!("no configuration given"))?;
    let options = PluginOptions::load(&config)?;
    let plugin = OverrideDeps::new(options)?;

    match matches.subcommand() {
        Some(("rewrite", sub)) => {
            let inputs: Vec<String> = sub
                .get_many::<String>("files")
                .map(|files| files.cloned().collect())
                .unwrap_or_default();
            run_rewrite(&plugin, &inputs, sub.get_flag("write"))
        }
        Some(("load", sub)) => {
            let alias = sub.get_one::<String>("alias").map(String::as_str).unwrap_or_default();
            run_load(&plugin, alias)
        }
        Some(("exports", sub)) => {
            let package = sub.get_one::<String>("package").map(String::as_str).unwrap_or_default();
            for name in plugin.exports_of(package) {
                println!("{}", name);
            }
            Ok(())
        }
        _ => Err(anyhow!("unknown command")),
    }
}

fn run_rewrite(plugin: &OverrideDeps, inputs: &[String], write: bool) -> Result<()> {
    let files = expand_inputs(inputs)?;
    let outcomes = rewrite_files(plugin, &files)?;

    let mut rewritten = 0;
    for outcome in &outcomes {
        match outcome {
            FileOutcome::Rewritten { path, code } if write => {
                fs::write(path, code).with_context(|| format!("failed to write {}", path.display()))?;
                rewritten += 1;
            }
            FileOutcome::Rewritten { path, code } => {
                println!("// {}", path.display());
                println!("{}", code);
                rewritten += 1;
            }
            FileOutcome::Unchanged { .. } => {
                eprintln!("skipped {} (nothing to redirect)", outcome.path().display());
            }
        }
    }
    eprintln!("{} of {} files rewritten", rewritten, outcomes.len());
    Ok(())
}

fn run_load(plugin: &OverrideDeps, alias: &str) -> Result<()> {
    let id = plugin
        .resolve_id(alias)
        .ok_or_else(|| anyhow!("`{}` is not a configured alias", alias))?;
    let code = plugin
        .load(&id)?
        .ok_or_else(|| anyhow!("no virtual module behind `{}`", alias))?;
    println!("{}", code);
    Ok(())
}
