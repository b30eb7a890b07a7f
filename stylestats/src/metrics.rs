//! The metric record and the table that fills it
//!
//! Every metric is one row of [`METRICS`]: a name, a switch read from
//! [`Options`], and a projection over [`MetricInput`]. Building a record walks
//! the table once; disabled rows are skipped before their projection runs.

use indexmap::IndexMap;
use serde::Serialize;

use crate::analyzer::{Analysis, PropertyCount};
use crate::gzip::gzip_size;
use crate::options::Options;

/// A single metric value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MetricValue {
    Count(usize),
    Ratio(f64),
    Text(String),
    List(Vec<String>),
    Properties(Vec<PropertyCount>),
}

/// Flat mapping from metric name to value, in table order
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct MetricRecord(IndexMap<&'static str, MetricValue>);

impl MetricRecord {
    pub fn get(&self, name: &str) -> Option<&MetricValue> {
        self.0.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &MetricValue)> {
        self.0.iter().map(|(name, value)| (*name, value))
    }
}

/// Everything a metric can be computed from
#[derive(Debug, Clone, Copy)]
pub struct MetricInput<'a> {
    pub published: &'a str,
    pub paths: &'a [String],
    /// Local files plus remote stylesheets
    pub stylesheets: usize,
    pub style_elements: usize,
    pub document: &'a str,
    pub rules: usize,
    pub selectors: usize,
    pub media_queries: usize,
    pub analysis: &'a Analysis,
}

impl MetricInput<'_> {
    /// UTF-8 byte size of the merged document
    pub fn size(&self) -> usize {
        self.document.len()
    }
}

struct MetricDef {
    name: &'static str,
    enabled: fn(&Options) -> bool,
    compute: fn(&MetricInput<'_>, &Options) -> Option<MetricValue>,
}

fn count(value: usize) -> Option<MetricValue> {
    Some(MetricValue::Count(value))
}

fn list(values: &[String]) -> Option<MetricValue> {
    Some(MetricValue::List(values.to_vec()))
}

static METRICS: &[MetricDef] = &[
    MetricDef {
        name: "published",
        enabled: |o| o.published,
        compute: |m, _| Some(MetricValue::Text(m.published.to_string())),
    },
    MetricDef {
        name: "paths",
        enabled: |o| o.paths,
        compute: |m, _| list(m.paths),
    },
    MetricDef {
        name: "stylesheets",
        enabled: |o| o.stylesheets,
        compute: |m, _| count(m.stylesheets),
    },
    MetricDef {
        name: "styleElements",
        enabled: |o| o.style_elements,
        compute: |m, _| (m.style_elements > 0).then_some(MetricValue::Count(m.style_elements)),
    },
    MetricDef {
        name: "size",
        enabled: |o| o.size,
        compute: |m, _| count(m.size()),
    },
    MetricDef {
        name: "dataUriSize",
        enabled: |o| o.data_uri_size,
        compute: |m, _| count(m.analysis.declarations.data_uri_size),
    },
    MetricDef {
        name: "ratioOfDataUriSize",
        enabled: |o| o.data_uri_size && o.ratio_of_data_uri_size,
        compute: |m, _| {
            let data_uri_size = m.analysis.declarations.data_uri_size;
            (data_uri_size > 0 && m.size() > 0)
                .then(|| MetricValue::Ratio(data_uri_size as f64 / m.size() as f64))
        },
    },
    MetricDef {
        name: "gzippedSize",
        enabled: |o| o.gzipped_size,
        compute: |m, _| match gzip_size(m.document) {
            Ok(size) => count(size),
            Err(err) => {
                tracing::warn!(%err, "Failed to compute gzipped size");
                None
            }
        },
    },
    MetricDef {
        name: "rules",
        enabled: |o| o.rules,
        compute: |m, _| count(m.rules),
    },
    MetricDef {
        name: "selectors",
        enabled: |o| o.selectors,
        compute: |m, _| count(m.selectors),
    },
    MetricDef {
        name: "simplicity",
        enabled: |o| o.rules && o.selectors && o.simplicity,
        compute: |m, _| {
            (m.selectors > 0).then(|| MetricValue::Ratio(m.rules as f64 / m.selectors as f64))
        },
    },
    MetricDef {
        name: "mostIdentifier",
        enabled: |o| o.most_identifier,
        compute: |m, _| {
            let most = m.analysis.selectors.most_identifier()?;
            count(most.count)
        },
    },
    MetricDef {
        name: "mostIdentifierSelector",
        enabled: |o| o.most_identifier_selector,
        compute: |m, _| {
            let most = m.analysis.selectors.most_identifier()?;
            Some(MetricValue::Text(most.selector.clone()))
        },
    },
    MetricDef {
        name: "lowestCohesion",
        enabled: |o| o.lowest_cohesion,
        compute: |m, _| {
            let lowest = m.analysis.rules.lowest_cohesion()?;
            count(lowest.count)
        },
    },
    MetricDef {
        name: "lowestCohesionSelector",
        enabled: |o| o.lowest_cohesion_selector,
        compute: |m, _| {
            let lowest = m.analysis.rules.lowest_cohesion()?;
            Some(MetricValue::Text(lowest.selector.clone()))
        },
    },
    MetricDef {
        name: "totalUniqueFontSizes",
        enabled: |o| o.total_unique_font_sizes,
        compute: |m, _| count(m.analysis.declarations.unique_font_sizes.len()),
    },
    MetricDef {
        name: "uniqueFontSizes",
        enabled: |o| o.unique_font_sizes,
        compute: |m, _| list(&m.analysis.declarations.unique_font_sizes),
    },
    MetricDef {
        name: "totalUniqueFontFamilies",
        enabled: |o| o.total_unique_font_families,
        compute: |m, _| count(m.analysis.declarations.unique_font_families.len()),
    },
    MetricDef {
        name: "uniqueFontFamilies",
        enabled: |o| o.unique_font_families,
        compute: |m, _| list(&m.analysis.declarations.unique_font_families),
    },
    MetricDef {
        name: "totalUniqueColors",
        enabled: |o| o.total_unique_colors,
        compute: |m, _| count(m.analysis.declarations.unique_colors.len()),
    },
    MetricDef {
        name: "uniqueColors",
        enabled: |o| o.unique_colors,
        compute: |m, _| list(&m.analysis.declarations.unique_colors),
    },
    MetricDef {
        name: "idSelectors",
        enabled: |o| o.id_selectors,
        compute: |m, _| count(m.analysis.selectors.id_selectors),
    },
    MetricDef {
        name: "universalSelectors",
        enabled: |o| o.universal_selectors,
        compute: |m, _| count(m.analysis.selectors.universal_selectors),
    },
    MetricDef {
        name: "unqualifiedAttributeSelectors",
        enabled: |o| o.unqualified_attribute_selectors,
        compute: |m, _| count(m.analysis.selectors.unqualified_attribute_selectors),
    },
    MetricDef {
        name: "javascriptSpecificSelectors",
        enabled: |o| o.javascript_specific_selectors.is_some(),
        compute: |m, _| count(m.analysis.selectors.javascript_specific_selectors),
    },
    MetricDef {
        name: "userSpecifiedSelectors",
        enabled: |o| o.user_specified_selectors.is_some(),
        compute: |m, _| count(m.analysis.selectors.user_specified_selectors),
    },
    MetricDef {
        name: "importantKeywords",
        enabled: |o| o.important_keywords,
        compute: |m, _| count(m.analysis.declarations.important_keywords),
    },
    MetricDef {
        name: "floatProperties",
        enabled: |o| o.float_properties,
        compute: |m, _| count(m.analysis.declarations.float_properties),
    },
    MetricDef {
        name: "propertiesCount",
        enabled: |o| o.properties_count.is_some_and(|top| top > 0),
        compute: |m, o| {
            let top = o.properties_count?;
            let properties = &m.analysis.declarations.properties;
            Some(MetricValue::Properties(
                properties.iter().take(top).cloned().collect(),
            ))
        },
    },
    MetricDef {
        name: "mediaQueries",
        enabled: |o| o.media_queries,
        compute: |m, _| count(m.media_queries),
    },
];

/// Names of every metric, in record order
pub fn metric_names() -> impl Iterator<Item = &'static str> {
    METRICS.iter().map(|metric| metric.name)
}

/// Build the record for the metrics enabled in `options`
pub fn build_record(input: &MetricInput<'_>, options: &Options) -> MetricRecord {
    let mut record = IndexMap::new();
    for metric in METRICS {
        if !(metric.enabled)(options) {
            continue;
        }
        if let Some(value) = (metric.compute)(input, options) {
            record.insert(metric.name, value);
        }
    }
    MetricRecord(record)
}
