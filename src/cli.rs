//! Main `absint` binary command line arguments options.
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

#[must_use]
pub fn absint() -> Command {
    Command::new(NAME)
        .version(VERSION)
        .author(AUTHORS)
        .about(DESCRIPTION)
        .subcommand(parse())
        .subcommand(wto())
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
pub fn parse() -> Command {
    Command::new("parse")
        .bin_name("dw-parse")
        .version(VERSION)
        .author(AUTHORS)
        .about("Reads s-expressions and prints them in normal form")
        .arg(arg_debug())
        .arg(arg_verbose())
        .arg(arg_ecslog())
        .arg(
            Arg::new("expr")
                .short('x')
                .long("expr")
                .action(ArgAction::Set)
                .required(true)
                .help("Text holding the s-expressions to read"),
        )
}

#[must_use]
pub fn wto() -> Command {
    Command::new("wto")
        .bin_name("dw-wto")
        .version(VERSION)
        .author(AUTHORS)
        .about("Prints the weak topological ordering of a graph")
        .arg(arg_debug())
        .arg(arg_verbose())
        .arg(arg_ecslog())
        .arg(
            Arg::new("root")
                .short('r')
                .long("root")
                .action(ArgAction::Set)
                .value_parser(value_parser!(u32))
                .required(true)
                .help("Root node"),
        )
        .arg(
            Arg::new("edge")
                .long("edge")
                .action(ArgAction::Append)
                .help("Graph edge, in the form 'A->B' (can be repeated)"),
        )
        .arg(
            Arg::new("color")
                .short('c')
                .long("color")
                .action(ArgAction::SetTrue)
                .help("Highlight the heads of strongly connected components"),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_commands() {
        absint().debug_assert();
        parse().debug_assert();
        wto().debug_assert();
    }

    #[test]
    fn repeated_edges() {
        let args = wto()
            .try_get_matches_from(["dw-wto", "--root", "1", "--edge", "1->2", "--edge", "2->1"])
            .unwrap();
        assert_eq!(args.get_one::<u32>("root"), Some(&1));
        assert_eq!(args.get_many::<String>("edge").unwrap().count(), 2);
    }
}
