/**
 * SvdReco
 * Copyright (C) 2018 Sebastian Schelter
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with this program. If not, see <http://www.gnu.org/licenses/>.
 */

extern crate env_logger;
extern crate getopts;
extern crate num_cpus;
extern crate serde_json;
extern crate svdreco;

use std::env;
use std::error::Error;
use std::process;
use std::str::FromStr;

use getopts::{Matches, Options};

use svdreco::io;
use svdreco::svd::DenseSvd;
use svdreco::types::Interaction;
use svdreco::Report;

struct Settings {
    interactions_path: String,
    rank: usize,
    top: usize,
    example_user: usize,
    example_item: usize,
    num_recommendations: Option<usize>,
    recommendations_path: Option<String>,
    json: bool,
}

fn main() {

    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let program = args[0].clone();

    let mut opts = Options::new();
    opts.optopt("i", "inputfile", "Input file name (required). The input consists of ratings of \
        items by users. The input file must contain a user, an item, a numeric rating and \
        optionally a timestamp per line, separated by tabs.", "PATH");
    opts.optopt("k", "rank", "Number of latent factors to compute (optional, defaults to 20). \
        Must be smaller than both the number of users and the number of items.", "NUMBER");
    opts.optopt("t", "top", "Number of singular values and energies to show (optional, \
        defaults to 10).", "NUMBER");
    opts.optopt("u", "user", "Index of the user for the example prediction (optional, \
        defaults to 0).", "INDEX");
    opts.optopt("m", "item", "Index of the item for the example prediction (optional, \
        defaults to 0).", "INDEX");
    opts.optopt("n", "num-recommendations", "Number of items to recommend per user (optional, \
        no recommendations are computed by default).", "NUMBER");
    opts.optopt("o", "outputfile", "Output file name for the recommendations (optional, output \
        will be written to stdout by default).", "PATH");
    opts.optflag("j", "json", "Print the report as JSON instead of text");
    opts.optflag("h", "help", "Print this help menu");

    let matches = match opts.parse(&args[1..]) {
        Ok(matches) => matches,
        Err(failure) => {
            let hint = failure.to_string();
            return print_usage_and_exit(&program, opts, Some(&hint))
        },
    };

    if matches.opt_present("h") {
        return print_usage_and_exit(&program, opts, None);
    }

    let interactions_path = match matches.opt_str("i") {
        Some(path) => path,
        None => {
            return print_usage_and_exit(
                &program,
                opts,
                Some("Please specify an inputfile via --inputfile."),
            );
        },
    };

    let settings = match parse_settings(interactions_path, &matches) {
        Ok(settings) => settings,
        Err(hint) => return print_usage_and_exit(&program, opts, Some(&hint)),
    };

    if let Err(failure) = compute_report(&settings) {
        eprintln!("\n{}\n", failure);
        process::exit(1);
    }
}

fn print_usage_and_exit(
    program: &str,
    opts: Options,
    hint: Option<&str>
) {

    if let Some(hint) = hint {
        eprintln!("\n{}\n", hint);
    }

    let brief = format!("Usage: {} [options]", program);
    eprint!("{}", opts.usage(&brief));

    process::exit(if hint.is_some() { 2 } else { 0 });
}

fn numeric_option<T: FromStr>(matches: &Matches, name: &str, default: T) -> Result<T, String>
    where T::Err: ToString {

    matches.opt_get_default(name, default)
        .map_err(|failure| format!("Problem with option '{}': {}", name, failure.to_string()))
}

fn parse_settings(interactions_path: String, matches: &Matches) -> Result<Settings, String> {

    let num_recommendations = matches.opt_get::<usize>("n")
        .map_err(|failure| format!("Problem with option 'n': {}", failure.to_string()))?;

    Ok(Settings {
        interactions_path,
        rank: numeric_option(matches, "k", 20)?,
        top: numeric_option(matches, "t", 10)?,
        example_user: numeric_option(matches, "u", 0)?,
        example_item: numeric_option(matches, "m", 0)?,
        num_recommendations,
        recommendations_path: matches.opt_str("o"),
        json: matches.opt_present("j"),
    })
}

fn compute_report(settings: &Settings) -> Result<(), Box<dyn Error>> {

    println!("Reading {}", settings.interactions_path);

    let mut reader = io::csv_reader(&settings.interactions_path)?;
    let interactions: Vec<Interaction<u64, u64>> = io::interactions_from_csv(&mut reader)?;

    println!("Computing truncated SVD with k={}", settings.rank);

    let factorization = svdreco::factorize(&interactions, settings.rank, &DenseSvd::default())?;
    let report = factorization.report(settings.example_user, settings.example_item)?;

    if settings.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report, settings.top);
    }

    if let Some(num_items_to_recommend) = settings.num_recommendations {
        println!("Computing {} recommendations per user...", num_items_to_recommend);

        let recommendations = factorization.recommend(num_items_to_recommend, num_cpus::get());

        io::write_recommendations(
            &recommendations,
            &factorization.data_dict,
            settings.recommendations_path.clone(),
        )?;
    }

    Ok(())
}

fn rounded(values: &[f64], top: usize, decimals: usize) -> String {
    let shown: Vec<String> = values.iter()
        .take(top)
        .map(|value| format!("{:.*}", decimals, value))
        .collect();

    format!("[{}]", shown.join(", "))
}

fn print_report(report: &Report, top: usize) {

    let summary = &report.summary;

    println!("\n== Dataset summary ==");
    println!("Ratings: {}", summary.num_ratings);
    println!("Distinct users: {}", summary.num_users);
    println!("Distinct items: {}", summary.num_items);

    if let (Some(min), Some(max)) = (summary.min_rating, summary.max_rating) {
        println!("Rating min/max: {} / {}", min, max);
    }

    println!("Stored ratings (nnz): {}", summary.num_stored_ratings);
    println!("Density: {:.4} (~{:.2}%)", summary.density, summary.density * 100.0);

    println!("\n== Results ==");
    println!("Top {} singular values:", top);
    println!("{}", rounded(&report.singular_values, top, 4));

    println!("\nApproximate energy captured:");
    println!("{}", rounded(&report.energy, top, 4));
    println!("Energy sum ({} components): {:.4}",
        report.singular_values.len(), report.energy_sum);

    let example = &report.example_prediction;
    println!("\n== Example prediction ==");
    println!("Predicted rating of user {} for item {}: {:.3}",
        example.user_index, example.item_index, example.rating);
}
