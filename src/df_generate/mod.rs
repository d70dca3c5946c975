use crate::dex;
use crate::prelude::*;
use clap::ArgMatches;
use log::info;
use regex::Regex;
use std::fs::File;
use std::io::BufWriter;

pub fn run(args: &ArgMatches) -> DfResult<()> {
    init_logger(args);

    let inputs: Vec<&String> = args
        .get_many::<String>("input")
        .ok_or_else(|| DfError::BadArguments("--input needed".to_string()))?
        .collect();
    let output = args
        .get_one::<String>("output")
        .ok_or_else(|| DfError::BadArguments("--output needed".to_string()))?;
    let options = options(args)?;

    let containers = inputs
        .into_iter()
        .map(dex::open)
        .collect::<Result<Vec<_>, _>>()?;

    let database = Database::create(output)?;
    let driver = Driver::new(&database, options);
    let result = driver.run(&containers);
    // rows written before a fail fast abort are still flushed
    database.flush()?;
    let stats = result?;
    info!(
        "facts written to {} ({} failures)",
        database.dir().display(),
        stats.failures
    );

    if let Some(summary) = args.get_one::<String>("summary") {
        let writer = BufWriter::new(File::create(summary)?);
        serde_json::to_writer_pretty(writer, &stats)?;
        info!("summary written to {summary}");
    }

    Ok(())
}

fn options(args: &ArgMatches) -> DfResult<Options> {
    let mut options = Options::default();
    if let Some(cores) = args.get_one::<usize>("cores") {
        if *cores == 0 {
            return Err(DfError::BadArguments("--cores must be positive".to_string()));
        }
        options.cores = *cores;
    }
    if let Some(group_size) = args.get_one::<usize>("group-size") {
        if *group_size == 0 {
            return Err(DfError::BadArguments(
                "--group-size must be positive".to_string(),
            ));
        }
        options.group_size = *group_size;
    }
    options.fail_fast = args.get_flag("fail-fast");
    options.phantoms = !args.get_flag("no-phantoms");
    options.app_regex = args
        .get_one::<String>("app-regex")
        .map(|r| Regex::new(r))
        .transpose()?;
    options.class_filter = args
        .get_one::<String>("filter-class")
        .map(|r| Regex::new(r))
        .transpose()?;
    Ok(options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli;

    fn matches(extra: &[&str]) -> ArgMatches {
        let mut argv = vec!["df-generate", "-i", "a.json", "-o", "facts"];
        argv.extend_from_slice(extra);
        cli::generate().try_get_matches_from(argv).unwrap()
    }

    #[test]
    fn default_options() {
        let options = options(&matches(&[])).unwrap();
        assert_eq!(options.group_size, 80);
        assert!(!options.fail_fast);
        assert!(options.phantoms);
        assert!(options.app_regex.is_none());
        assert!(options.class_filter.is_none());
    }

    #[test]
    fn explicit_options() {
        let options = options(&matches(&[
            "--cores", "3", "--group-size", "10", "--fail-fast", "--no-phantoms",
            "--app-regex", "^com\\.app\\.", "--filter-class", "Main$",
        ]))
        .unwrap();
        assert_eq!(options.cores, 3);
        assert_eq!(options.group_size, 10);
        assert!(options.fail_fast);
        assert!(!options.phantoms);
        assert!(options.is_application_class("com.app.Main"));
        assert!(!options.is_application_class("android.app.Activity"));
        assert!(options.accepts_class("com.app.Main"));
        assert!(!options.accepts_class("com.app.Other"));
    }

    #[test]
    fn rejected_options() {
        assert!(matches!(
            options(&matches(&["--cores", "0"])),
            Err(DfError::BadArguments(_))
        ));
        assert!(matches!(
            options(&matches(&["--app-regex", "("])),
            Err(DfError::Regex(_))
        ));
    }
}
