use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::ConfigurationId;

/// A keyword distribution produced within one dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Topic {
    /// Topic index within its configuration
    pub index: usize,

    /// Keyword to probability mapping
    pub keywords: BTreeMap<String, f64>,
}

impl Topic {
    pub fn new(index: usize) -> Self {
        Self { index, keywords: BTreeMap::new() }
    }

    pub fn with_keywords<I, K>(index: usize, keywords: I) -> Self
    where
        I: IntoIterator<Item = (K, f64)>,
        K: Into<String>,
    {
        Self {
            index,
            keywords: keywords.into_iter().map(|(k, p)| (k.into(), p)).collect(),
        }
    }

    pub fn probability(&self, keyword: &str) -> Option<f64> {
        self.keywords.get(keyword).copied()
    }

    pub fn len(&self) -> usize {
        self.keywords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }
}

/// The topics produced by one configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub configuration: ConfigurationId,

    /// Topics ordered by index
    pub topics: Vec<Topic>,
}

impl Dataset {
    pub fn new(configuration: ConfigurationId, mut topics: Vec<Topic>) -> Self {
        topics.sort_by_key(|t| t.index);
        Self { configuration, topics }
    }

    /// Insert a keyword row, creating the topic on first sight
    pub fn insert_keyword(&mut self, topic: usize, keyword: impl Into<String>, probability: f64) {
        let position = match self.topics.binary_search_by_key(&topic, |t| t.index) {
            Ok(pos) => pos,
            Err(pos) => {
                self.topics.insert(pos, Topic::new(topic));
                pos
            }
        };
        self.topics[position].keywords.insert(keyword.into(), probability);
    }

    pub fn topic_count(&self) -> usize {
        self.topics.len()
    }
}

/// Datasets keyed by the configuration that produced them
pub type DatasetMap = BTreeMap<ConfigurationId, Dataset>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_keyword_keeps_topics_ordered() {
        let mut dataset = Dataset::new(ConfigurationId(1), Vec::new());
        dataset.insert_keyword(2, "river", 0.4);
        dataset.insert_keyword(0, "bank", 0.7);
        dataset.insert_keyword(2, "water", 0.6);

        let indices: Vec<usize> = dataset.topics.iter().map(|t| t.index).collect();
        assert_eq!(indices, vec![0, 2]);
        assert_eq!(dataset.topics[1].len(), 2);
        assert_eq!(dataset.topics[1].probability("water"), Some(0.6));
    }

    #[test]
    fn test_new_sorts_topics() {
        let dataset = Dataset::new(
            ConfigurationId(3),
            vec![Topic::with_keywords(4, [("a", 1.0)]), Topic::with_keywords(1, [("a", 1.0)])],
        );
        assert_eq!(dataset.topics[0].index, 1);
        assert_eq!(dataset.topic_count(), 2);
    }
}
