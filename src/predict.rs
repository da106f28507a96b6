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

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::time::Instant;

use scoped_pool::Pool;

use crate::error::{Result, SvdRecoError};
use crate::svd::FactorTriplet;
use crate::types::{DenseVector, RatingMatrix};

/// Predicted rating of a user for an item, `(U[user] * s) . Vt[:, item] + user_mean`.
///
/// The result is not clamped to the rating scale of the input and may fall outside of it.
pub fn predict(
    factors: &FactorTriplet,
    user_means: &DenseVector,
    user: usize,
    item: usize,
) -> Result<f64> {

    let num_users = factors.u.nrows();
    let num_items = factors.vt.ncols();

    if user >= num_users {
        return Err(SvdRecoError::Index { entity: "user", index: user, len: num_users });
    }

    if item >= num_items {
        return Err(SvdRecoError::Index { entity: "item", index: item, len: num_items });
    }

    Ok(centered_prediction(factors, user, item) + user_means[user])
}

#[inline(always)]
fn centered_prediction(factors: &FactorTriplet, user: usize, item: usize) -> f64 {
    (0..factors.rank())
        .map(|component| {
            factors.u[(user, component)] * factors.s[component] * factors.vt[(component, item)]
        })
        .sum()
}

/// Result type used to find the top-n items per user via a binary heap
#[derive(PartialEq, Debug, Clone)]
pub struct ScoredItem {
    pub item: u32,
    pub score: f64,
}

/// Ordering for our max-heap, the best item compares as smallest so that the heap's top is the
/// candidate to evict. Equal scores prefer the lower item index, and as there is no total order on
/// floating point numbers, NaNs count as equal.
fn cmp_reverse(scored_item_a: &ScoredItem, scored_item_b: &ScoredItem) -> Ordering {
    match scored_item_a.score.partial_cmp(&scored_item_b.score) {
        Some(Ordering::Less) => Ordering::Greater,
        Some(Ordering::Greater) => Ordering::Less,
        _ => scored_item_a.item.cmp(&scored_item_b.item),
    }
}

impl Eq for ScoredItem {}

impl Ord for ScoredItem {
    fn cmp(&self, other: &Self) -> Ordering {
        cmp_reverse(self, other)
    }
}

impl PartialOrd for ScoredItem {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(cmp_reverse(self, other))
    }
}

/// Computes the `num_items_to_recommend` items with the highest predicted rating for every user,
/// leaving out the items the user already rated. Users are scored independently on a pool of
/// `pool_size` threads. The recommendations per user are sorted by descending score.
pub fn recommend(
    factors: &FactorTriplet,
    user_means: &DenseVector,
    ratings: &RatingMatrix,
    num_items_to_recommend: usize,
    pool_size: usize,
) -> Vec<Vec<ScoredItem>> {

    let num_users = ratings.rows();

    let mut recommendations: Vec<Vec<ScoredItem>> = vec![Vec::new(); num_users];

    if num_items_to_recommend == 0 {
        return recommendations;
    }

    let start = Instant::now();
    let pool = Pool::new(pool_size.max(1));

    pool.scoped(|scope| {
        for (user, recommendations_for_user) in recommendations.iter_mut().enumerate() {
            scope.execute(move || {
                *recommendations_for_user = top_items_for_user(
                    factors,
                    user_means,
                    ratings,
                    user,
                    num_items_to_recommend,
                );
            });
        }
    });

    pool.shutdown();

    info!("Computed {} recommendations for {} users in {}ms", num_items_to_recommend, num_users,
        start.elapsed().as_millis());

    recommendations
}

fn top_items_for_user(
    factors: &FactorTriplet,
    user_means: &DenseVector,
    ratings: &RatingMatrix,
    user: usize,
    num_items_to_recommend: usize,
) -> Vec<ScoredItem> {

    let row = ratings.outer_view(user);
    let history: &[usize] = match row {
        Some(ref row) => row.indices(),
        None => &[],
    };

    let mut heap = BinaryHeap::with_capacity(num_items_to_recommend);

    for item in 0..factors.vt.ncols() {

        // Column indices per row are sorted
        if history.binary_search(&item).is_ok() {
            continue;
        }

        let score = centered_prediction(factors, user, item) + user_means[user];
        let scored_item = ScoredItem { item: item as u32, score };

        if heap.len() < num_items_to_recommend {
            heap.push(scored_item);
        } else if let Some(mut top) = heap.peek_mut() {
            if scored_item < *top {
                *top = scored_item;
            }
        }
    }

    heap.into_sorted_vec()
}
