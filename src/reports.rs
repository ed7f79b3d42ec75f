use crate::domain::Exam;
use std::collections::HashMap;

/// Price bucket boundaries, inclusive-lower / exclusive-upper. Values at or
/// above the last boundary fall into the open-ended top bucket.
pub const PRICE_BOUNDARIES: [u32; 5] = [0, 100, 200, 300, 500];

pub const OTHER_BUCKET: &str = "Other";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryCount {
    pub categoria: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndicationCount {
    pub indicacion: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceBucket {
    pub rango: String,
    pub count: usize,
}

/// Number of exams per `categoria`, ordered by category name.
pub fn category_counts(exams: &[Exam]) -> Vec<CategoryCount> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for exam in exams {
        *counts.entry(exam.categoria.as_str()).or_default() += 1;
    }

    let mut rows: Vec<CategoryCount> = counts
        .into_iter()
        .map(|(categoria, count)| CategoryCount {
            categoria: categoria.to_string(),
            count,
        })
        .collect();
    rows.sort_by(|a, b| a.categoria.cmp(&b.categoria));
    rows
}

/// The single most frequent indication across all exams, expanding each
/// exam's `indicaciones` list into one row per value. Ties break by name.
pub fn most_common_indication(exams: &[Exam]) -> Option<IndicationCount> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for exam in exams {
        for indicacion in &exam.indicaciones {
            *counts.entry(indicacion.as_str()).or_default() += 1;
        }
    }

    counts
        .into_iter()
        .max_by(|a, b| a.1.cmp(&b.1).then_with(|| b.0.cmp(a.0)))
        .map(|(indicacion, count)| IndicationCount {
            indicacion: indicacion.to_string(),
            count,
        })
}

/// Exam counts bucketed by numeric `precio`. Unparseable or negative prices
/// land in the `Other` bucket. All buckets are present, zero counts included.
pub fn price_histogram(exams: &[Exam]) -> Vec<PriceBucket> {
    let mut buckets: Vec<PriceBucket> = PRICE_BOUNDARIES
        .iter()
        .enumerate()
        .map(|(i, lower)| {
            let rango = match PRICE_BOUNDARIES.get(i + 1) {
                Some(upper) => format!("{}-{}", lower, upper),
                None => format!("{}+", lower),
            };
            PriceBucket { rango, count: 0 }
        })
        .collect();
    buckets.push(PriceBucket {
        rango: OTHER_BUCKET.to_string(),
        count: 0,
    });

    let other = buckets.len() - 1;
    for exam in exams {
        let slot = match exam.precio.trim().parse::<f64>() {
            Ok(value) if value >= 0.0 => PRICE_BOUNDARIES
                .iter()
                .rposition(|lower| value >= f64::from(*lower))
                .unwrap_or(other),
            _ => other,
        };
        buckets[slot].count += 1;
    }

    buckets
}
