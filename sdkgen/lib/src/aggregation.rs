//! Cross-group aggregation endpoints.
//!
//! Endpoints whose path ends with the aggregation suffix are pulled out of
//! their group clients and combined into one client. The same suffix occurs
//! under several groups, so each such endpoint carries a context
//! discriminator (`live`, `forecast`) that goes into its method name.

use crate::endpoint::EndpointDescriptor;

/// Discriminators searched for, in order, when none are configured.
pub const DEFAULT_DISCRIMINATORS: &[&str] = &["live", "forecast"];

/// Client type name for the combined class.
pub const AGGREGATION_CLIENT: &str = "AggregationClient";

/// An endpoint with its optional context discriminator.
pub type ContextualEndpoint = (EndpointDescriptor, Option<String>);

#[derive(Debug, Clone)]
pub struct AggregationGrouping {
    suffix: String,
    discriminators: Vec<String>,
}

impl AggregationGrouping {
    pub fn new(suffix: impl Into<String>, discriminators: Vec<String>) -> Self {
        Self {
            suffix: suffix.into(),
            discriminators,
        }
    }

    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    pub fn matches(&self, path: &str) -> bool {
        !self.suffix.is_empty() && path.ends_with(&self.suffix)
    }

    /// The first discriminator (in configured order) found anywhere in the
    /// path. This is a substring search: `/data/delivery/x` contains `live`.
    pub fn discriminator(&self, path: &str) -> Option<&str> {
        self.discriminators
            .iter()
            .find(|d| !d.is_empty() && path.contains(d.as_str()))
            .map(String::as_str)
    }

    /// Moves aggregation endpoints out of `group` into `combined`, tagging
    /// each with its discriminator. Returns the endpoints that stay.
    pub fn split_off(
        &self,
        group: Vec<EndpointDescriptor>,
        combined: &mut Vec<ContextualEndpoint>,
    ) -> Vec<EndpointDescriptor> {
        let mut remaining = Vec::with_capacity(group.len());
        for endpoint in group {
            if self.matches(&endpoint.path) {
                let context = self.discriminator(&endpoint.path).map(str::to_string);
                combined.push((endpoint, context));
            } else {
                remaining.push(endpoint);
            }
        }
        remaining
    }
}

impl Default for AggregationGrouping {
    fn default() -> Self {
        Self::new(
            "/aggregations",
            DEFAULT_DISCRIMINATORS.iter().map(|d| d.to_string()).collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoint::Verb;

    fn endpoint(path: &str) -> EndpointDescriptor {
        EndpointDescriptor {
            path: path.to_string(),
            verb: Verb::Get,
            operation_id: None,
            summary: None,
            description: None,
            parameters: Vec::new(),
            response: None,
        }
    }

    #[test]
    fn discriminator_search_order() {
        let grouping = AggregationGrouping::default();
        assert_eq!(grouping.discriminator("/data/live/x/aggregations"), Some("live"));
        assert_eq!(grouping.discriminator("/data/forecast/x/aggregations"), Some("forecast"));
        assert_eq!(grouping.discriminator("/data/historic/x/aggregations"), None);
        // `live` is checked first even when both occur.
        assert_eq!(grouping.discriminator("/data/forecast/live/aggregations"), Some("live"));
        assert_eq!(grouping.discriminator("/data/delivery/aggregations"), Some("live"));
    }

    #[test]
    fn split_off_moves_suffixed_endpoints() {
        let grouping = AggregationGrouping::default();
        let mut combined = Vec::new();
        let live = grouping.split_off(
            vec![endpoint("/data/live/radiation"), endpoint("/data/live/x/aggregations")],
            &mut combined,
        );
        let forecast = grouping.split_off(vec![endpoint("/data/forecast/x/aggregations")], &mut combined);

        assert_eq!(live.len(), 1);
        assert!(forecast.is_empty());
        let contexts: Vec<(&str, Option<&str>)> = combined
            .iter()
            .map(|(e, c)| (e.path.as_str(), c.as_deref()))
            .collect();
        assert_eq!(
            contexts,
            vec![
                ("/data/live/x/aggregations", Some("live")),
                ("/data/forecast/x/aggregations", Some("forecast"))
            ]
        );
    }

    #[test]
    fn empty_suffix_matches_nothing() {
        let grouping = AggregationGrouping::new("", vec![]);
        assert!(!grouping.matches("/data/live/radiation"));
    }
}
