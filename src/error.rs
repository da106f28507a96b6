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

use thiserror::Error;

pub type Result<T> = std::result::Result<T, SvdRecoError>;

/// Everything that can go wrong during a run. None of these are transient, so callers are
/// expected to report them rather than retry.
#[derive(Debug, Error)]
pub enum SvdRecoError {
    /// The interactions file does not exist.
    #[error("No dataset found at {0}")]
    MissingDataset(String),

    /// A record refers to a user or item which is not part of the data dictionary.
    #[error("Unknown {entity} {key}")]
    Lookup { entity: &'static str, key: String },

    /// A rating which is NaN or infinite.
    #[error("Invalid rating {rating} of user {user} for item {item}")]
    InvalidRating { user: String, item: String, rating: f64 },

    /// The requested rank cannot be computed for a matrix of the given shape.
    #[error("Invalid rank {rank} for a {num_rows}x{num_cols} matrix, rank must be in [1, {max_rank}]")]
    Configuration { rank: usize, num_rows: usize, num_cols: usize, max_rank: usize },

    /// A prediction was requested for a user or item index outside of the matrix.
    #[error("{entity} index {index} out of range, only {len} {entity}s known")]
    Index { entity: &'static str, index: usize, len: usize },

    /// The rank reduction did not produce a usable factorization.
    #[error("Rank reduction failed: {0}")]
    Solver(String),

    #[error("Problem with the input data: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
