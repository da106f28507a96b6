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

use std::fs::File;
use std::hash::Hash;
use std::io::{stdout, Read, Write};
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{Result, SvdRecoError};
use crate::predict::ScoredItem;
use crate::stats::DataDictionary;
use crate::types::Interaction;

/// Reads a CSV input file. We expect NO headers, and a user, item, rating and optional timestamp
/// per line with tab separation, as in the MovieLens `u.data` file.
pub fn csv_reader(file: &str) -> Result<csv::Reader<File>> {

    if !Path::new(file).exists() {
        return Err(SvdRecoError::MissingDataset(file.to_string()));
    }

    let reader = reader_builder().from_path(file)?;

    Ok(reader)
}

/// Same format as `csv_reader`, but for data which is already in memory or arrives on a pipe.
pub fn csv_reader_from<R: Read>(input: R) -> csv::Reader<R> {
    reader_builder().from_reader(input)
}

fn reader_builder() -> csv::ReaderBuilder {
    let mut builder = csv::ReaderBuilder::new();
    builder
        .has_headers(false)
        .delimiter(b'\t')
        .flexible(true);

    builder
}

/// Deserializes all rows. A malformed row fails the whole read, we never silently drop ratings.
pub fn interactions_from_csv<R, U, I>(
    reader: &mut csv::Reader<R>
) -> Result<Vec<Interaction<U, I>>>
    where R: Read,
          U: DeserializeOwned,
          I: DeserializeOwned {

    let mut interactions = Vec::new();

    for result in reader.deserialize() {
        let interaction: Interaction<U, I> = result?;
        interactions.push(interaction);
    }

    Ok(interactions)
}

/// Struct used for JSON serialization of recommendations. Field names will be used in JSON.
#[derive(Serialize)]
struct Recommendations<'a, U: 'a, I: 'a> {
    for_user: &'a U,
    recommended_items: Vec<RecommendedItem<'a, I>>,
}

#[derive(Serialize)]
struct RecommendedItem<'a, I: 'a> {
    item: &'a I,
    score: f64,
}

/// Output the computed recommendations in JSON format, one user per line, using the original
/// identifiers from the inputfile. If a `recommendations_path` is supplied, we write to a file
/// at the specified path, otherwise, we output to stdout.
pub fn write_recommendations<U, I>(
    recommendations: &[Vec<ScoredItem>],
    data_dict: &DataDictionary<U, I>,
    recommendations_path: Option<String>,
) -> Result<()>
    where U: Hash + Eq + Serialize,
          I: Hash + Eq + Serialize {

    let out: Box<dyn Write> = match recommendations_path {
        Some(path) => Box::new(File::create(&Path::new(&path))?),
        _ => Box::new(stdout()),
    };

    write_recommendations_to(out, recommendations, data_dict)
}

pub fn write_recommendations_to<W, U, I>(
    mut out: W,
    recommendations: &[Vec<ScoredItem>],
    data_dict: &DataDictionary<U, I>,
) -> Result<()>
    where W: Write,
          U: Hash + Eq + Serialize,
          I: Hash + Eq + Serialize {

    for (user_index, recommended) in recommendations.iter().enumerate() {

        let for_user = match data_dict.user(user_index as u32) {
            Some(user) => user,
            None => continue,
        };

        let recommended_items: Vec<RecommendedItem<I>> = recommended.iter()
            .filter_map(|scored_item| {
                data_dict.item(scored_item.item)
                    .map(|item| RecommendedItem { item, score: scored_item.score })
            })
            .collect();

        let as_json = serde_json::to_string(&Recommendations { for_user, recommended_items })
            .map_err(std::io::Error::from)?;

        writeln!(out, "{}", as_json)?;
    }

    out.flush()?;

    Ok(())
}
