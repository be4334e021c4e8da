use anyhow::{anyhow, Result};
use clap::{Arg, ArgAction, ArgMatches, Command, ValueHint};
use log::LevelFilter;
use std::path::PathBuf;

use redeem_logistic::config::{load_train_config, TrainConfig};
use redeem_logistic::formula::Formula;
use redeem_logistic::io::{delimited::read_delimited_rows_with_config, DelimitedReaderConfig};
use redeem_logistic::trainer::LogisticTrainer;

fn main() -> Result<()> {
    env_logger::Builder::default()
        .filter_level(LevelFilter::Error)
        .parse_env(env_logger::Env::default().filter_or("REDEEM_LOG", "error,redeem_logistic=info"))
        .init();

    let matches = Command::new("redeem-logistic")
        .version(clap::crate_version!())
        .author("Justin Sing <justincsing@gmail.com>")
        .about("Multinomial logistic regression with adaptive encoding of high-cardinality categoricals")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("train")
                .about("Fit a model to a delimited data file and print the solution")
                .arg(
                    Arg::new("data")
                        .help("Path to the training data (*.csv or *.tsv, header row required)")
                        .required(true)
                        .value_parser(clap::value_parser!(PathBuf))
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("formula")
                        .short('f')
                        .long("formula")
                        .help("Model formula, e.g. \"outcome ~ a + b + c\"")
                        .required(true)
                        .value_parser(clap::builder::NonEmptyStringValueParser::new()),
                )
                .arg(
                    Arg::new("weight")
                        .short('w')
                        .long("weight")
                        .help("Field holding non-negative row weights")
                        .value_parser(clap::builder::NonEmptyStringValueParser::new()),
                )
                .arg(
                    Arg::new("config")
                        .short('c')
                        .long("config")
                        .help("Path to a JSON training configuration file")
                        .value_parser(clap::value_parser!(PathBuf))
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("max_explicit_levels")
                        .long("max-levels")
                        .help("Re-encode categorical variables with more levels than this. Overrides the config file.")
                        .value_parser(clap::value_parser!(usize)),
                )
                .arg(
                    Arg::new("seed")
                        .long("seed")
                        .help("Seed for level-statistic subsampling. Overrides the config file.")
                        .value_parser(clap::value_parser!(u64)),
                )
                .arg(
                    Arg::new("delimiter")
                        .short('d')
                        .long("delimiter")
                        .help("Field delimiter. Defaults to tab for *.tsv files and comma otherwise.")
                        .value_parser(clap::builder::NonEmptyStringValueParser::new()),
                )
                .arg(
                    Arg::new("polish")
                        .long("polish")
                        .help("Refine the solution with a short gradient polish in the full space.")
                        .action(ArgAction::SetTrue),
                ),
        )
        .help_template(
            "{usage-heading} {usage}\n\n\
             {about-with-newline}\n\
             Written by {author-with-newline}Version {version}\n\n\
             {all-args}{after-help}",
        )
        .get_matches();

    match matches.subcommand() {
        Some(("train", sub_m)) => match handle_train(sub_m) {
            Ok(()) => Ok(()),
            Err(e) => {
                log::error!("Training failed: {:#}", e);
                std::process::exit(1)
            }
        },
        _ => unreachable!("Subcommand is required by CLI configuration"),
    }
}

fn train_config(matches: &ArgMatches) -> Result<TrainConfig> {
    let mut config = match matches.get_one::<PathBuf>("config") {
        Some(path) => {
            log::info!("Using config: {:?}", path);
            load_train_config(path)?
        }
        None => TrainConfig::default(),
    };
    if let Some(levels) = matches.get_one::<usize>("max_explicit_levels") {
        config.max_explicit_levels = *levels;
    }
    if let Some(seed) = matches.get_one::<u64>("seed") {
        config.seed = *seed;
    }
    if matches.get_flag("polish") {
        config.gradient_polish = true;
    }
    Ok(config)
}

fn handle_train(matches: &ArgMatches) -> Result<()> {
    let data_path = matches
        .get_one::<PathBuf>("data")
        .ok_or_else(|| anyhow!("Missing data file"))?;
    let formula: Formula = matches
        .get_one::<String>("formula")
        .ok_or_else(|| anyhow!("Missing formula"))?
        .parse()
        .map_err(|e: String| anyhow!(e))?;
    let weight_key = matches.get_one::<String>("weight").map(String::as_str);
    let config = train_config(matches)?;

    let mut reader_config = DelimitedReaderConfig::for_path(data_path);
    if let Some(delimiter) = matches.get_one::<String>("delimiter") {
        reader_config.delimiter = match delimiter.as_str() {
            "\\t" | "tab" => b'\t',
            other if other.len() == 1 => other.as_bytes()[0],
            other => return Err(anyhow!("Delimiter must be a single byte, got '{}'", other)),
        };
    }
    let rows = read_delimited_rows_with_config(data_path, &reader_config)?;

    let trainer = LogisticTrainer::new(config);
    let (model, report) = trainer.train_with_report(&rows, &formula, weight_key)?;

    print!("{}", report.schema_summary);
    if !report.flagged.is_empty() {
        println!("adaptive encoding: {}", report.flagged.join(", "));
    }
    for pass in &report.passes {
        println!(
            "pass {}\tdim {}\tf {:.6}\t{}",
            pass.pass,
            pass.dim,
            pass.fx,
            if pass.accepted { "accepted" } else { "rejected" }
        );
    }
    print!("{}", model);
    match report.train_accuracy {
        Some(acc) => println!("training accuracy: {:.4}", acc),
        None => println!("training accuracy: unavailable"),
    }
    Ok(())
}
