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

use sprs::CsMat;

pub type DenseVector = Vec<f64>;

/// Row-major sparse matrix of ratings, users are rows and items are columns. Entries which are
/// not stored are unobserved, not zero.
pub type RatingMatrix = CsMat<f64>;

/// A single observed rating. Rows of the input file are deserialized by position, the timestamp
/// column may be missing.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Interaction<U, I> {
    pub user: U,
    pub item: I,
    pub rating: f64,
    #[serde(default)]
    pub timestamp: Option<u64>,
}

impl<U, I> Interaction<U, I> {

    pub fn new(user: U, item: I, rating: f64) -> Self {
        Interaction { user, item, rating, timestamp: None }
    }
}

pub fn new_dense_vector(dimensions: usize) -> DenseVector {
    vec![0.0; dimensions]
}
