use dexfacts::prelude::DfResult;
use dexfacts::{cli, df_generate};

fn main() -> DfResult<()> {
    let args = cli::generate().get_matches();
    df_generate::run(&args)
}
