use anyhow::{anyhow, Result};
use clap::{arg, ArgAction, Command};
use packgraph_engine::{
    compile_rules, enumerate_rules, solve_instance, Budget, Catalog, Instance, Track,
};
use packgraph_structs::{
    config::{EnumerationScope, SolveConfig},
    core::{Solution, Status},
};
use packgraph_utils::{compress_obj, jsonify, load_json, u8s_from_str};
use serde_json::json;
use std::{fs, path::PathBuf};

fn cli() -> Command {
    Command::new("packgraph")
        .about("Packs an inventory into the fewest packs allowed by a set of packing rules")
        .arg_required_else_help(true)
        .subcommand(
            Command::new("solve")
                .about("Computes a minimum pack sequence")
                .arg(
                    arg!(<INSTANCE> "Instance json string, path to json file, or '-' for stdin")
                        .value_parser(clap::value_parser!(String)),
                )
                .arg(
                    arg!(--config [CONFIG] "Solve config json string or path to json file")
                        .value_parser(clap::value_parser!(String)),
                )
                .arg(
                    arg!(--"max-steps" [MAX_STEPS] "Maximum enumeration and search steps")
                        .value_parser(clap::value_parser!(u64)),
                )
                .arg(
                    arg!(--"time-limit-ms" [TIME_LIMIT_MS] "Wall-clock limit in milliseconds")
                        .value_parser(clap::value_parser!(u64)),
                )
                .arg(
                    arg!(--"full-catalog" "Enumerate every rule over the whole item catalog")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    arg!(--sequential "Enumerate rules on the current thread only")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    arg!(--output [OUTPUT_FILE] "If set, the output data will be saved to this file path (default json)")
                        .value_parser(clap::value_parser!(PathBuf)),
                )
                .arg(
                    arg!(--compress "If output file is set, the output data will be compressed as zlib")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("verify")
                .about("Verifies a solution against an instance")
                .arg(
                    arg!(<INSTANCE> "Instance json string, path to json file, or '-' for stdin")
                        .value_parser(clap::value_parser!(String)),
                )
                .arg(
                    arg!(<SOLUTION> "Solution json string, path to json file, or '-' for stdin")
                        .value_parser(clap::value_parser!(String)),
                ),
        )
        .subcommand(
            Command::new("generate")
                .about("Generates a random instance")
                .arg(
                    arg!(<SEED> "A string used in seed generation")
                        .value_parser(clap::value_parser!(String)),
                )
                .arg(
                    arg!(--"num-items" [NUM_ITEMS] "Number of distinct items")
                        .default_value("6")
                        .value_parser(clap::value_parser!(usize)),
                )
                .arg(
                    arg!(--"num-categories" [NUM_CATEGORIES] "Number of item categories")
                        .default_value("3")
                        .value_parser(clap::value_parser!(usize)),
                )
                .arg(
                    arg!(--"max-count" [MAX_COUNT] "Maximum available count per item")
                        .default_value("3")
                        .value_parser(clap::value_parser!(u32)),
                )
                .arg(
                    arg!(--"num-rules" [NUM_RULES] "Number of random packing rules")
                        .default_value("3")
                        .value_parser(clap::value_parser!(usize)),
                ),
        )
        .subcommand(
            Command::new("edges")
                .about("Lists the maximal packs each rule allows")
                .arg(
                    arg!(<INSTANCE> "Instance json string, path to json file, or '-' for stdin")
                        .value_parser(clap::value_parser!(String)),
                )
                .arg(
                    arg!(--"full-catalog" "Enumerate every rule over the whole item catalog")
                        .action(ArgAction::SetTrue),
                ),
        )
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let matches = cli().get_matches();

    if let Err(e) = match matches.subcommand() {
        Some(("solve", sub_m)) => solve(
            sub_m.get_one::<String>("INSTANCE").unwrap().clone(),
            sub_m.get_one::<String>("config").cloned(),
            sub_m.get_one::<u64>("max-steps").cloned(),
            sub_m.get_one::<u64>("time-limit-ms").cloned(),
            sub_m.get_flag("full-catalog"),
            sub_m.get_flag("sequential"),
            sub_m.get_one::<PathBuf>("output").cloned(),
            sub_m.get_flag("compress"),
        ),
        Some(("verify", sub_m)) => verify(
            sub_m.get_one::<String>("INSTANCE").unwrap().clone(),
            sub_m.get_one::<String>("SOLUTION").unwrap().clone(),
        ),
        Some(("generate", sub_m)) => generate(
            sub_m.get_one::<String>("SEED").unwrap().clone(),
            Track {
                num_items: *sub_m.get_one::<usize>("num-items").unwrap(),
                num_categories: *sub_m.get_one::<usize>("num-categories").unwrap(),
                max_count: *sub_m.get_one::<u32>("max-count").unwrap(),
                num_rules: *sub_m.get_one::<usize>("num-rules").unwrap(),
            },
        ),
        Some(("edges", sub_m)) => edges(
            sub_m.get_one::<String>("INSTANCE").unwrap().clone(),
            sub_m.get_flag("full-catalog"),
        ),
        _ => Err(anyhow!("Invalid subcommand")),
    } {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

pub fn solve(
    instance: String,
    config: Option<String>,
    max_steps: Option<u64>,
    time_limit_ms: Option<u64>,
    full_catalog: bool,
    sequential: bool,
    output_file: Option<PathBuf>,
    compress: bool,
) -> Result<()> {
    let instance = load_json::<Instance>(&instance)?;
    let mut config = match config {
        Some(config) => load_json::<SolveConfig>(&config)?,
        None => SolveConfig::default(),
    };
    if max_steps.is_some() {
        config.max_steps = max_steps;
    }
    if time_limit_ms.is_some() {
        config.time_limit_ms = time_limit_ms;
    }
    if full_catalog {
        config.scope = EnumerationScope::FullCatalog;
    }
    if sequential {
        config.parallel = false;
    }

    let report = solve_instance(&instance, &config)?;
    let output_data = report.to_output_data();
    if let Some(path) = output_file {
        if compress {
            fs::write(&path, compress_obj(&output_data)?)?;
        } else {
            fs::write(&path, jsonify(&output_data)?)?;
        }
        println!("output_data written to: {:?}", path);
    } else {
        println!("{}", jsonify(&output_data)?);
    }

    match output_data.status {
        Status::Solved => Ok(()),
        Status::Infeasible => {
            log::warn!("No solution exists");
            std::process::exit(85);
        }
        Status::Aborted => {
            log::warn!(
                "Search aborted: exceeded budget during {}",
                output_data
                    .aborted_stage()
                    .map_or("solve".to_string(), |stage| stage.to_string())
            );
            std::process::exit(86);
        }
    }
}

pub fn verify(instance: String, solution: String) -> Result<()> {
    let instance = load_json::<Instance>(&instance)?;
    let solution = load_json::<Solution>(&solution)?;
    match instance.verify_solution(&solution) {
        Ok(_) => {
            println!("Solution is valid");
            Ok(())
        }
        Err(e) => Err(anyhow!("Invalid solution: {}", e)),
    }
}

pub fn generate(seed: String, track: Track) -> Result<()> {
    let instance = Instance::generate_instance(&u8s_from_str(&seed), &track)?;
    println!("{}", jsonify(&instance)?);
    Ok(())
}

pub fn edges(instance: String, full_catalog: bool) -> Result<()> {
    let instance = load_json::<Instance>(&instance)?;
    instance.validate()?;
    let scope = if full_catalog {
        EnumerationScope::FullCatalog
    } else {
        EnumerationScope::RuleCategories
    };
    let catalog = Catalog::new(&instance.items)?;
    let mut rules = compile_rules(&instance, &catalog, scope)?;
    if !enumerate_rules(&mut rules, &catalog, &Budget::unlimited(), true) {
        return Err(anyhow!("Edge enumeration did not complete"));
    }

    let listing: Vec<_> = rules
        .iter()
        .enumerate()
        .map(|(i, rule)| {
            json!({
                "rule": i,
                "categories": rule.categories(),
                "edges": rule
                    .edges()
                    .iter()
                    .map(|edge| catalog.pack_items(edge))
                    .collect::<Vec<_>>(),
            })
        })
        .collect();
    println!("{}", jsonify(&listing)?);
    Ok(())
}
