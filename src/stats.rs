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

use fnv::{FnvHashMap, FnvHashSet};

use crate::error::{Result, SvdRecoError};
use crate::types::{Interaction, RatingMatrix};

/// Maps the distinct keys of one entity type to consecutive indices. Keys are sorted before
/// indices are handed out, so the same set of keys always results in the same assignment.
#[derive(Clone, Debug, PartialEq)]
pub struct IndexMap<K: Hash + Eq> {
    indices: FnvHashMap<K, u32>,
    keys: Vec<K>,
}

impl<K: Ord + Hash + Clone> IndexMap<K> {

    pub fn from_keys<T>(keys: T) -> Self where T: IntoIterator<Item=K> {

        let distinct_keys: FnvHashSet<K> = keys.into_iter().collect();

        let mut keys: Vec<K> = distinct_keys.into_iter().collect();
        keys.sort();

        let mut indices: FnvHashMap<K, u32> =
            FnvHashMap::with_capacity_and_hasher(keys.len(), Default::default());

        for (index, key) in keys.iter().enumerate() {
            indices.insert(key.clone(), index as u32);
        }

        IndexMap { indices, keys }
    }
}

impl<K: Hash + Eq> IndexMap<K> {

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn index(&self, key: &K) -> Option<u32> {
        self.indices.get(key).cloned()
    }

    pub fn key(&self, index: u32) -> Option<&K> {
        self.keys.get(index as usize)
    }

    /// All keys in index order.
    pub fn keys(&self) -> &[K] {
        &self.keys
    }
}

/// Index maps for users and items plus basic counts of the data they were built from.
pub struct DataDictionary<U: Hash + Eq, I: Hash + Eq> {
    users: IndexMap<U>,
    items: IndexMap<I>,
    num_interactions: u64,
}

impl<U, I> DataDictionary<U, I>
    where U: Ord + Hash + Clone + Debug,
          I: Ord + Hash + Clone + Debug {

    pub fn from(interactions: &[Interaction<U, I>]) -> Self {

        let users = IndexMap::from_keys(interactions.iter().map(|record| record.user.clone()));
        let items = IndexMap::from_keys(interactions.iter().map(|record| record.item.clone()));

        DataDictionary { users, items, num_interactions: interactions.len() as u64 }
    }

    pub fn user_index(&self, user: &U) -> Result<u32> {
        self.users.index(user)
            .ok_or_else(|| SvdRecoError::Lookup { entity: "user", key: format!("{:?}", user) })
    }

    pub fn item_index(&self, item: &I) -> Result<u32> {
        self.items.index(item)
            .ok_or_else(|| SvdRecoError::Lookup { entity: "item", key: format!("{:?}", item) })
    }
}

impl<U: Hash + Eq, I: Hash + Eq> DataDictionary<U, I> {

    pub fn num_users(&self) -> usize {
        self.users.len()
    }

    pub fn num_items(&self) -> usize {
        self.items.len()
    }

    pub fn num_interactions(&self) -> u64 {
        self.num_interactions
    }

    pub fn user(&self, user_index: u32) -> Option<&U> {
        self.users.key(user_index)
    }

    pub fn item(&self, item_index: u32) -> Option<&I> {
        self.items.key(item_index)
    }

    pub fn users(&self) -> &IndexMap<U> {
        &self.users
    }

    pub fn items(&self) -> &IndexMap<I> {
        &self.items
    }
}

/// Descriptive statistics of the input data, handed to whoever presents the results.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DatasetSummary {
    pub num_ratings: u64,
    pub num_users: usize,
    pub num_items: usize,
    pub num_stored_ratings: usize,
    pub min_rating: Option<f64>,
    pub max_rating: Option<f64>,
    pub density: f64,
}

impl DatasetSummary {

    pub fn new<U, I>(
        interactions: &[Interaction<U, I>],
        data_dict: &DataDictionary<U, I>,
        ratings: &RatingMatrix,
    ) -> Self
        where U: Hash + Eq, I: Hash + Eq {

        let mut min_rating: Option<f64> = None;
        let mut max_rating: Option<f64> = None;

        for record in interactions.iter() {
            min_rating = Some(min_rating.map_or(record.rating, |min| min.min(record.rating)));
            max_rating = Some(max_rating.map_or(record.rating, |max| max.max(record.rating)));
        }

        let num_users = data_dict.num_users();
        let num_items = data_dict.num_items();
        let num_cells = num_users * num_items;

        let density = if num_cells == 0 {
            0.0
        } else {
            ratings.nnz() as f64 / num_cells as f64
        };

        DatasetSummary {
            num_ratings: data_dict.num_interactions(),
            num_users,
            num_items,
            num_stored_ratings: ratings.nnz(),
            min_rating,
            max_rating,
            density,
        }
    }
}

#[cfg(test)]
mod tests {

    use super::{DataDictionary, DatasetSummary, IndexMap};
    use crate::error::SvdRecoError;
    use crate::matrix;
    use crate::types::Interaction;

    #[test]
    fn indices_follow_sorted_key_order() {
        let index = IndexMap::from_keys(vec![30_u32, 10, 20, 10, 30]);

        assert_eq!(index.len(), 3);
        assert_eq!(index.index(&10), Some(0));
        assert_eq!(index.index(&20), Some(1));
        assert_eq!(index.index(&30), Some(2));
        assert_eq!(index.key(2), Some(&30));
        assert_eq!(index.index(&40), None);
        assert_eq!(index.key(3), None);
    }

    #[test]
    fn numeric_keys_are_not_sorted_lexicographically() {
        let index = IndexMap::from_keys(vec![100_u32, 9, 21]);
        assert_eq!(index.keys(), &[9, 21, 100]);
    }

    #[test]
    fn index_assignment_is_deterministic() {
        let keys = vec!["pony", "apple", "dog", "bike", "apple", "zebra"];

        let first = IndexMap::from_keys(keys.clone());
        let mut reversed = keys.clone();
        reversed.reverse();
        let second = IndexMap::from_keys(reversed);

        assert_eq!(first, second);
        assert_eq!(first.keys(), &["apple", "bike", "dog", "pony", "zebra"]);
    }

    #[test]
    fn empty_key_set() {
        let index: IndexMap<String> = IndexMap::from_keys(Vec::new());
        assert!(index.is_empty());
        assert_eq!(index.key(0), None);
    }

    #[test]
    fn unknown_keys_are_lookup_errors() {
        let interactions = vec![Interaction::new("u1", "i1", 5.0)];
        let data_dict = DataDictionary::from(&interactions);

        assert_eq!(data_dict.user_index(&"u1").unwrap(), 0);

        match data_dict.user_index(&"u2") {
            Err(SvdRecoError::Lookup { entity, .. }) => assert_eq!(entity, "user"),
            other => panic!("expected a lookup error, got {:?}", other),
        }

        match data_dict.item_index(&"i2") {
            Err(SvdRecoError::Lookup { entity, .. }) => assert_eq!(entity, "item"),
            other => panic!("expected a lookup error, got {:?}", other),
        }
    }

    #[test]
    fn summary() {
        let interactions = vec![
            Interaction::new("u1", "i1", 5.0),
            Interaction::new("u1", "i2", 3.0),
            Interaction::new("u2", "i1", 1.0),
        ];

        let data_dict = DataDictionary::from(&interactions);
        let ratings = matrix::build_rating_matrix(&interactions, &data_dict).unwrap();

        let summary = DatasetSummary::new(&interactions, &data_dict, &ratings);

        assert_eq!(summary.num_ratings, 3);
        assert_eq!(summary.num_users, 2);
        assert_eq!(summary.num_items, 2);
        assert_eq!(summary.num_stored_ratings, 3);
        assert_eq!(summary.min_rating, Some(1.0));
        assert_eq!(summary.max_rating, Some(5.0));
        assert!((summary.density - 0.75).abs() < 1e-12);
    }

    #[test]
    fn summary_of_nothing() {
        let interactions: Vec<Interaction<u32, u32>> = Vec::new();

        let data_dict = DataDictionary::from(&interactions);
        let ratings = matrix::build_rating_matrix(&interactions, &data_dict).unwrap();

        let summary = DatasetSummary::new(&interactions, &data_dict, &ratings);

        assert_eq!(summary.num_ratings, 0);
        assert_eq!(summary.min_rating, None);
        assert_eq!(summary.max_rating, None);
        assert_eq!(summary.density, 0.0);
    }
}
