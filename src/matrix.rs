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

use std::fmt::Debug;
use std::hash::Hash;

use fnv::FnvHashMap;
use sprs::CsMat;

use crate::error::{Result, SvdRecoError};
use crate::stats::DataDictionary;
use crate::types;
use crate::types::{DenseVector, Interaction, RatingMatrix};

/// Assembles the user-item rating matrix. If the same user rated the same item more than once,
/// the rating which comes last in the input wins. NaN and infinite ratings are rejected.
pub fn build_rating_matrix<U, I>(
    interactions: &[Interaction<U, I>],
    data_dict: &DataDictionary<U, I>,
) -> Result<RatingMatrix>
    where U: Ord + Hash + Clone + Debug,
          I: Ord + Hash + Clone + Debug {

    let num_users = data_dict.num_users();
    let num_items = data_dict.num_items();

    let mut rows: Vec<FnvHashMap<usize, f64>> =
        vec![FnvHashMap::with_capacity_and_hasher(0, Default::default()); num_users];

    for record in interactions.iter() {
        let user_idx = data_dict.user_index(&record.user)? as usize;
        let item_idx = data_dict.item_index(&record.item)? as usize;

        if !record.rating.is_finite() {
            return Err(SvdRecoError::InvalidRating {
                user: format!("{:?}", record.user),
                item: format!("{:?}", record.item),
                rating: record.rating,
            });
        }

        rows[user_idx].insert(item_idx, record.rating);
    }

    let mut indptr: Vec<usize> = Vec::with_capacity(num_users + 1);
    let mut indices: Vec<usize> = Vec::with_capacity(interactions.len());
    let mut data: Vec<f64> = Vec::with_capacity(interactions.len());

    indptr.push(0);

    for row in rows.into_iter() {
        let mut entries: Vec<(usize, f64)> = row.into_iter().collect();
        entries.sort_by_key(|&(item_idx, _)| item_idx);

        for (item_idx, rating) in entries {
            indices.push(item_idx);
            data.push(rating);
        }

        indptr.push(indices.len());
    }

    Ok(CsMat::new((num_users, num_items), indptr, indices, data))
}

/// Subtracts each user's mean rating from the ratings the user actually gave. Unobserved entries
/// are never touched, users without ratings keep a mean of zero.
pub fn center_by_user(ratings: &RatingMatrix) -> (RatingMatrix, DenseVector) {

    let mut centered = ratings.clone();
    let mut user_means = types::new_dense_vector(centered.rows());

    for (user_idx, mut row) in centered.outer_iterator_mut().enumerate() {

        let num_ratings = row.nnz();

        if num_ratings == 0 {
            continue;
        }

        let mean = row.data().iter().sum::<f64>() / num_ratings as f64;
        user_means[user_idx] = mean;

        for (_, value) in row.iter_mut() {
            *value -= mean;
        }
    }

    (centered, user_means)
}
