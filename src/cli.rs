//! Main `dexfacts` binary command line arguments options.
//!
//! This module declares a function to build `clap` command line arguments
//! parser, so that it can be used from other places than the main binary,
//! such as from bash completion file generator.

use clap::{value_parser, Arg, ArgAction, Command};
use clap_complete::Shell;

const NAME: &str = env!("CARGO_PKG_NAME");
const VERSION: &str = env!("CARGO_PKG_VERSION");
const AUTHORS: &str = env!("CARGO_PKG_AUTHORS");
const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

fn arg_debug() -> Arg {
    Arg::new("debug")
        .short('d')
        .long("debug")
        .action(ArgAction::SetTrue)
        .help("Activate debug mode")
}

fn arg_verbose() -> Arg {
    Arg::new("verbose")
        .short('v')
        .long("verbose")
        .action(ArgAction::SetTrue)
        .help("Activate verbose mode")
}

fn arg_ecslog() -> Arg {
    Arg::new("ecslog")
        .short('e')
        .long("ecslog")
        .action(ArgAction::SetTrue)
        .help("Output logs in ECS format")
}

fn arg_input() -> Arg {
    Arg::new("input")
        .short('i')
        .long("input")
        .action(ArgAction::Append)
        .num_args(1..)
        .required(true)
        .help("Input container file(s)")
}

fn arg_output(help: &str) -> Arg {
    Arg::new("output")
        .short('o')
        .long("output")
        .action(ArgAction::Set)
        .help(help.to_string())
}

fn arg_filter_class() -> Arg {
    Arg::new("filter-class")
        .long("filter-class")
        .action(ArgAction::Set)
        .help("Class(es) regex filter")
}

fn arg_filter_method() -> Arg {
    Arg::new("filter-method")
        .long("filter-method")
        .action(ArgAction::Set)
        .help("Method(s) regex filter")
}

#[must_use]
pub fn dexfacts() -> Command {
    Command::new(NAME)
        .version(VERSION)
        .author(AUTHORS)
        .about(DESCRIPTION)
        .subcommand(disas())
        .subcommand(generate())
        .subcommand(
            Command::new("gen-completions")
                .about("Generates completions file")
                .arg(
                    Arg::new("shell")
                        .short('s')
                        .long("shell")
                        .action(ArgAction::Set)
                        .value_parser(value_parser!(Shell))
                        .required(true)
                        .help("Shell type for completion generation"),
                ),
        )
}

#[must_use]
pub fn disas() -> Command {
    Command::new("disas")
        .bin_name("df-disas")
        .version(VERSION)
        .author(AUTHORS)
        .about("Lists instructions with their fact index and address")
        .arg(arg_debug())
        .arg(arg_verbose())
        .arg(arg_ecslog())
        .arg(arg_input())
        .arg(arg_filter_class())
        .arg(arg_filter_method())
        .arg(
            Arg::new("no-color")
                .long("no-color")
                .action(ArgAction::SetTrue)
                .help("Disable colored output"),
        )
}

#[must_use]
pub fn generate() -> Command {
    Command::new("generate")
        .bin_name("df-generate")
        .version(VERSION)
        .author(AUTHORS)
        .about("Generates points-to analysis facts")
        .arg(arg_debug())
        .arg(arg_verbose())
        .arg(arg_ecslog())
        .arg(arg_input())
        .arg(arg_output("Output facts directory").required(true))
        .arg(arg_filter_class())
        .arg(
            Arg::new("cores")
                .short('j')
                .long("cores")
                .action(ArgAction::Set)
                .value_parser(value_parser!(usize))
                .help("Number of worker threads (default: available parallelism)"),
        )
        .arg(
            Arg::new("group-size")
                .long("group-size")
                .action(ArgAction::Set)
                .value_parser(value_parser!(usize))
                .default_value("80")
                .help("Number of classes translated in a row by one worker"),
        )
        .arg(
            Arg::new("fail-fast")
                .long("fail-fast")
                .action(ArgAction::SetTrue)
                .help("Abort after the first failing class group"),
        )
        .arg(
            Arg::new("app-regex")
                .long("app-regex")
                .action(ArgAction::Set)
                .help("Application classes regex (default: every class)"),
        )
        .arg(
            Arg::new("no-phantoms")
                .long("no-phantoms")
                .action(ArgAction::SetTrue)
                .help("Do not report phantom types, methods and fields"),
        )
        .arg(
            Arg::new("summary")
                .short('s')
                .long("summary")
                .action(ArgAction::Set)
                .help("Write a JSON run summary to the given file"),
        )
}
