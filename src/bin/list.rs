//! xkb-list - print every model, layout and option group of a ruleset
//!
//! Usage:
//!     xkb-list                      List the default ruleset
//!     xkb-list base                 List the "base" ruleset
//!     xkb-list -i ./custom evdev    Search ./custom before the defaults

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use xkb_registry::{Context, DEFAULT_RULESET};

#[derive(Parser)]
#[command(name = "xkb-list")]
#[command(about = "List the models, layouts and options of an XKB ruleset")]
#[command(version)]
struct Cli {
    /// Extra include path, searched before the defaults (repeatable)
    #[arg(long, short = 'i')]
    include: Vec<PathBuf>,

    /// Do not search the default include paths
    #[arg(long)]
    no_default_includes: bool,

    /// Ruleset to load
    #[arg(default_value = DEFAULT_RULESET)]
    ruleset: String,
}

fn or_empty(field: Option<&str>) -> &str {
    field.unwrap_or("")
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    let ctx = Context::with_no_default_includes();
    for path in &cli.include {
        if let Err(err) = ctx.include_path_append(path) {
            eprintln!("xkb-list: {err}");
            return ExitCode::FAILURE;
        }
    }
    if !cli.no_default_includes {
        // Explicit includes may carry the ruleset on their own.
        if ctx.include_path_append_default().is_err() && cli.include.is_empty() {
            eprintln!("xkb-list: no usable include path");
            return ExitCode::FAILURE;
        }
    }

    if let Err(err) = ctx.parse(&cli.ruleset) {
        eprintln!("xkb-list: {err}");
        return ExitCode::FAILURE;
    }

    println!("Models:");
    for m in ctx.models() {
        println!(
            "- {}:{}:{}",
            or_empty(m.name()),
            or_empty(m.vendor()),
            or_empty(m.description())
        );
    }

    println!("Layouts:");
    for l in ctx.layouts() {
        println!(
            "- {}:{}:{}",
            or_empty(l.name()),
            or_empty(l.brief()),
            or_empty(l.description())
        );
        for v in l.variants() {
            println!(
                "  - {}:{}:{}",
                or_empty(v.name()),
                or_empty(v.brief()),
                or_empty(v.description())
            );
        }
    }

    println!("Options:");
    for g in ctx.option_groups() {
        println!(
            "- {}:{} ({})",
            or_empty(g.name()),
            or_empty(g.description()),
            if g.allows_multiple() { "multiple" } else { "single" }
        );
        for o in g.options() {
            println!(
                "  - {}:{}:{}",
                or_empty(o.name()),
                or_empty(o.brief()),
                or_empty(o.description())
            );
        }
    }

    ExitCode::SUCCESS
}
