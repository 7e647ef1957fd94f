//! Command-line interface to the resolver.

#![allow(clippy::print_stderr)]

use anyhow::Context;
use clap::Parser;
use std::{fs, path::PathBuf, process::ExitCode};
use strata_driver::{typecheck::Module as _, util::get_visible_path, Options, Session};
use strata_render::{render_symbol, Render};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[clap(
    name = "Strata",
    bin_name = "stratac",
    about = "Resolve and type-check instruction listings"
)]
enum Args {
    /// Resolve every block in a listing and report diagnostics.
    Check {
        path: PathBuf,

        /// Don't report calls that fail to resolve.
        #[clap(long)]
        silent: bool,

        /// A JSON file with resolver options.
        #[clap(long)]
        config: Option<PathBuf>,

        #[clap(long)]
        max_type_variables: Option<u32>,

        #[clap(long)]
        recursion_limit: Option<u32>,

        /// Print every resolved function, including specializations.
        #[clap(long)]
        print: bool,

        /// Print diagnostics as JSON on standard output.
        #[clap(long)]
        json: bool,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    match run() {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(error) => {
            eprintln!("{error:#}");
            ExitCode::FAILURE
        }
    }
}

/// Returns whether the listing is free of errors.
fn run() -> anyhow::Result<bool> {
    let Args::Check {
        path,
        silent,
        config,
        max_type_variables,
        recursion_limit,
        print,
        json,
    } = Args::parse();

    let mut options = match &config {
        Some(config) => Options::load(config)?,
        None => Options::default(),
    };

    options.silent |= silent;

    if let Some(max_type_variables) = max_type_variables {
        options.max_type_variables = max_type_variables;
    }

    if let Some(recursion_limit) = recursion_limit {
        options.recursion_limit = recursion_limit;
    }

    tracing::debug!("checking {} with {:?}", path.display(), options);

    let code = fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;

    let render = Render::new(get_visible_path(&path), code.as_str());
    let session = Session::new(options);

    let checked = match session.check(&code) {
        Ok(checked) => checked,
        Err(error) => {
            eprintln!("{}", render.render_error(&error));
            return Ok(false);
        }
    };

    let diagnostics = checked
        .report
        .diagnostics
        .iter()
        .map(|diagnostic| render.render_diagnostic(&checked, diagnostic))
        .collect::<Vec<_>>();

    if json {
        println!("{}", serde_json::to_string_pretty(&diagnostics)?);
    } else {
        for diagnostic in &diagnostics {
            eprintln!("{}", render.render_diagnostic_to_debug_string(diagnostic));
        }
    }

    if print {
        let catalog = session.catalog();

        for module in catalog.module_names() {
            let Some(scope) = catalog.find_module(&module) else {
                continue;
            };

            for function in scope.function_names() {
                for symbol in scope.candidates(&function) {
                    if symbol.body.is_some() {
                        println!("{}\n", render_symbol(&symbol));
                    }
                }
            }
        }
    }

    Ok(!checked.erroneous)
}
