//! Distribution distances between two topics
//!
//! Every metric walks both keyword maps in lockstep. The maps are ordered, so
//! identical vocabularies line up pair by pair; the first key present on only
//! one side is reported as [`LdavizError::MissingKeyword`].

use ldaviz_core::error::{LdavizError, Result};
use ldaviz_core::models::{Topic, TopicMetric};
use std::cmp::Ordering;
use std::f64::consts::SQRT_2;

/// Distance from `source` to `target` under `metric`
///
/// Only Kullback–Leibler depends on the argument order.
pub fn topic_distance(metric: TopicMetric, source: &Topic, target: &Topic) -> Result<f64> {
    let value = match metric {
        TopicMetric::Bhattacharyya => {
            let coefficient = fold_aligned(source, target, |p, q| (p * q).sqrt())?;
            -coefficient.log2()
        }
        TopicMetric::Hellinger => {
            let sum = fold_aligned(source, target, |p, q| (p.sqrt() - q.sqrt()).powi(2))?;
            sum.sqrt() / SQRT_2
        }
        TopicMetric::KullbackLeibler => fold_aligned(source, target, kl_term)?,
        TopicMetric::JensenShannon => fold_aligned(source, target, |p, q| {
            let m = (p + q) / 2.0;
            0.5 * kl_term(p, m) + 0.5 * kl_term(q, m)
        })?,
        TopicMetric::Euclidean => fold_aligned(source, target, |p, q| (p - q).powi(2))?.sqrt(),
    };

    if !value.is_finite() {
        return Err(LdavizError::NonFiniteDistance {
            metric: metric.to_string(),
            value,
            source_topic: source.index,
            target_topic: target.index,
        });
    }

    Ok(value)
}

/// One term of `Σ p·log2(p/q)`; zero-probability source terms vanish
fn kl_term(p: f64, q: f64) -> f64 {
    if p == 0.0 {
        0.0
    } else {
        p * (p / q).log2()
    }
}

/// Sum `term(p, q)` over the shared vocabulary of two topics
fn fold_aligned<F>(source: &Topic, target: &Topic, mut term: F) -> Result<f64>
where
    F: FnMut(f64, f64) -> f64,
{
    let mut left = source.keywords.iter();
    let mut right = target.keywords.iter();
    let mut sum = 0.0;

    loop {
        match (left.next(), right.next()) {
            (None, None) => return Ok(sum),
            (Some((ks, &p)), Some((kt, &q))) => match ks.cmp(kt) {
                Ordering::Equal => sum += term(p, q),
                Ordering::Less => return Err(missing(ks, target)),
                Ordering::Greater => return Err(missing(kt, source)),
            },
            (Some((ks, _)), None) => return Err(missing(ks, target)),
            (None, Some((kt, _))) => return Err(missing(kt, source)),
        }
    }
}

fn missing(keyword: &str, absent_from: &Topic) -> LdavizError {
    LdavizError::MissingKeyword { keyword: keyword.to_string(), topic: absent_from.index }
}
