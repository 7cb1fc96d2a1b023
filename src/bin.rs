use absint::prelude::*;
use absint::{cli, dw_parse, dw_wto};
use clap::ArgMatches;
use clap_complete::{generate, Shell};
use std::io;

fn main() -> AbsintResult<()> {
    let args = cli::absint().get_matches();

    match &args.subcommand() {
        Some(("parse", cmd_args)) => dw_parse::run(cmd_args),
        Some(("wto", cmd_args)) => dw_wto::run(cmd_args),
        Some(("gen-completions", sub_args)) => subcommand_gen_completions(sub_args),
        Some((subcommand, _)) => Err(AbsintError::BadArguments(format!(
            "unknown subcommand '{subcommand}'"
        ))),
        None => Err(AbsintError::BadArguments("missing subcommand".to_string())),
    }
}

fn subcommand_gen_completions(sub_args: &ArgMatches) -> AbsintResult<()> {
    let generator = *sub_args
        .get_one::<Shell>("shell")
        .ok_or_else(|| AbsintError::BadArguments("--shell needed".to_string()))?;
    let mut cmd = cli::absint();
    let cmd_name = cmd.get_name().to_string();
    generate(generator, &mut cmd, cmd_name, &mut io::stdout());
    Ok(())
}
