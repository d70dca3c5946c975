use clap::ArgMatches;
use clap_complete::{generate, Shell};
use dexfacts::prelude::*;
use dexfacts::{cli, df_disas, df_generate};
use std::io;

fn main() -> DfResult<()> {
    let args = cli::dexfacts().get_matches();

    match &args.subcommand() {
        Some(("disas", cmd_args)) => df_disas::run(cmd_args),
        Some(("generate", cmd_args)) => df_generate::run(cmd_args),
        Some(("gen-completions", sub_args)) => subcommand_gen_completions(sub_args),
        Some((subcommand, _)) => Err(DfError::BadArguments(format!(
            "unknown subcommand '{subcommand}'"
        ))),
        None => Err(DfError::BadArguments("missing subcommand".to_string())),
    }
}

fn subcommand_gen_completions(sub_args: &ArgMatches) -> DfResult<()> {
    let generator = *sub_args
        .get_one::<Shell>("shell")
        .ok_or_else(|| DfError::BadArguments("--shell needed".to_string()))?;
    let mut cmd = cli::dexfacts();
    let cmd_name = cmd.get_name().to_string();
    generate(generator, &mut cmd, cmd_name, &mut io::stdout());
    Ok(())
}
