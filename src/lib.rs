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

extern crate csv;
extern crate fnv;
extern crate nalgebra;
extern crate scoped_pool;
extern crate serde;
extern crate serde_json;
extern crate sprs;
extern crate thiserror;
#[macro_use]
extern crate log;
#[macro_use]
extern crate serde_derive;

use std::fmt::Debug;
use std::hash::Hash;
use std::time::Instant;

pub mod error;
pub mod io;
pub mod matrix;
pub mod predict;
pub mod stats;
pub mod svd;
pub mod types;


use error::Result;
use predict::ScoredItem;
use stats::{DataDictionary, DatasetSummary};
use svd::{FactorTriplet, RankReducer};
use types::{DenseVector, Interaction, RatingMatrix};

/// Everything computed in one run over a set of interactions.
pub struct Factorization<U: Hash + Eq, I: Hash + Eq> {
    pub data_dict: DataDictionary<U, I>,
    pub summary: DatasetSummary,
    pub ratings: RatingMatrix,
    pub user_means: DenseVector,
    pub factors: FactorTriplet,
    pub energy: Vec<f64>,
}

/// Builds the rating matrix from the interactions, centers it per user and factorizes it with
/// `rank` components via the given `reducer`. The rank is validated before the reducer runs.
pub fn factorize<U, I, R>(
    interactions: &[Interaction<U, I>],
    rank: usize,
    reducer: &R,
) -> Result<Factorization<U, I>>
    where U: Ord + Hash + Clone + Debug,
          I: Ord + Hash + Clone + Debug,
          R: RankReducer + ?Sized {

    let start = Instant::now();

    let data_dict = DataDictionary::from(interactions);
    let ratings = matrix::build_rating_matrix(interactions, &data_dict)?;
    let summary = DatasetSummary::new(interactions, &data_dict, &ratings);

    info!("Built {}x{} rating matrix with {} entries in {}ms", ratings.rows(), ratings.cols(),
        ratings.nnz(), start.elapsed().as_millis());

    let (centered, user_means) = matrix::center_by_user(&ratings);

    let solver_start = Instant::now();
    let factors = svd::truncated_svd(reducer, &centered, rank)?;

    info!("Computed rank {} factorization in {}ms", rank, solver_start.elapsed().as_millis());

    let energy = svd::explained_energy(&factors.s);

    Ok(Factorization { data_dict, summary, ratings, user_means, factors, energy })
}

impl<U: Hash + Eq, I: Hash + Eq> Factorization<U, I> {

    /// Predicted rating for the user and item with the given indices.
    pub fn predict(&self, user_index: usize, item_index: usize) -> Result<f64> {
        predict::predict(&self.factors, &self.user_means, user_index, item_index)
    }

    /// Top-n unrated items per user, indexed like the users of the data dictionary.
    pub fn recommend(
        &self,
        num_items_to_recommend: usize,
        pool_size: usize,
    ) -> Vec<Vec<ScoredItem>> {
        predict::recommend(
            &self.factors,
            &self.user_means,
            &self.ratings,
            num_items_to_recommend,
            pool_size,
        )
    }

    /// Collects what a presentation layer needs to show the outcome of a run.
    pub fn report(&self, example_user: usize, example_item: usize) -> Result<Report> {

        let rating = self.predict(example_user, example_item)?;

        Ok(Report {
            summary: self.summary.clone(),
            singular_values: self.factors.s.iter().cloned().collect(),
            energy: self.energy.clone(),
            energy_sum: self.energy.iter().sum(),
            example_prediction: ExamplePrediction {
                user_index: example_user,
                item_index: example_item,
                rating,
            },
        })
    }
}

impl<U, I> Factorization<U, I>
    where U: Ord + Hash + Clone + Debug,
          I: Ord + Hash + Clone + Debug {

    /// Predicted rating for a user and an item referenced by their original identifiers.
    pub fn predict_for(&self, user: &U, item: &I) -> Result<f64> {
        let user_index = self.data_dict.user_index(user)?;
        let item_index = self.data_dict.item_index(item)?;

        self.predict(user_index as usize, item_index as usize)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ExamplePrediction {
    pub user_index: usize,
    pub item_index: usize,
    pub rating: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Report {
    pub summary: DatasetSummary,
    pub singular_values: Vec<f64>,
    pub energy: Vec<f64>,
    pub energy_sum: f64,
    pub example_prediction: ExamplePrediction,
}
