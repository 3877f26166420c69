//! Endpoint classification into named groups.
//!
//! Every path is assigned to the **first** configured prefix it starts with.
//! Paths that match no prefix are dropped. Within a group each path gets a
//! constant name built from its segments; when two paths produce the same
//! name the later one replaces the earlier one.

use indexmap::IndexMap;
use tracing::debug;

use crate::document::SchemaDocument;
use crate::naming::{to_pascal_case, to_type_name};

/// Constant name -> path, in document order.
pub type GroupUrls = IndexMap<String, String>;

/// Group prefix -> its URL constants, in configured prefix order.
pub type Classification = IndexMap<String, GroupUrls>;

/// Partitions the document's paths by prefix.
///
/// Every configured prefix appears in the result, even when no path falls
/// into it.
///
/// ## Examples
///
/// ```
/// use sdkgen_lib::classify::classify;
/// use sdkgen_lib::document::SchemaDocument;
///
/// let doc = SchemaDocument::parse(r#"{"paths": {"/data/live/radiation_and_weather": {}}}"#).unwrap();
/// let groups = classify(&doc, &["/data/live/".to_string()]);
/// assert_eq!(
///     groups["/data/live/"]["LiveRadiationAndWeather"],
///     "/data/live/radiation_and_weather"
/// );
/// ```
pub fn classify(document: &SchemaDocument, prefixes: &[String]) -> Classification {
    let mut groups: Classification = prefixes
        .iter()
        .map(|prefix| (prefix.clone(), GroupUrls::new()))
        .collect();

    for (path, _) in document.paths() {
        let Some(group) = group_of(path, prefixes) else {
            debug!(path = %path, "path matches no endpoint group; skipping");
            continue;
        };
        let constant = constant_name_from_path(path);
        if let Some(urls) = groups.get_mut(group)
            && let Some(previous) = urls.insert(constant.clone(), path.clone())
        {
            debug!(constant = %constant, replaced = %previous, path = %path, "constant name collision");
        }
    }

    groups
}

/// The first prefix (in the given order) that `path` starts with.
pub fn group_of<'p>(path: &str, prefixes: &'p [String]) -> Option<&'p str> {
    prefixes
        .iter()
        .find(|prefix| path.starts_with(prefix.as_str()))
        .map(String::as_str)
}

/// Builds a constant name from every segment after the first.
///
/// `/data/live/radiation/forecast` -> `LiveRadiationForecast`. A path with
/// nothing after its first segment uses all of its segments (`/health` ->
/// `Health`), and a path with no usable segment at all is `Root`.
pub fn constant_name_from_path(path: &str) -> String {
    let segments: Vec<&str> = path.split('/').filter(|segment| !segment.is_empty()).collect();
    let tail: String = segments.iter().skip(1).map(|segment| to_pascal_case(segment)).collect();
    if !tail.is_empty() {
        return tail;
    }
    let whole: String = segments.iter().map(|segment| to_pascal_case(segment)).collect();
    if whole.is_empty() { "Root".to_string() } else { whole }
}

/// The client type name for a group: the last prefix segment plus `Client`.
///
/// `/data/live/` -> `LiveClient`, `/resources/pv_power_site` -> `PvPowerSiteClient`
pub fn client_name_for_group(prefix: &str) -> String {
    let last = prefix
        .split('/')
        .filter(|segment| !segment.is_empty())
        .next_back()
        .unwrap_or_default();
    let base = to_pascal_case(last);
    if base.is_empty() {
        "DefaultClient".to_string()
    } else {
        format!("{}Client", to_type_name(&base))
    }
}

/// The path as stored in the URL table, without surrounding slashes.
pub fn url_value(path: &str) -> &str {
    path.trim_matches('/')
}
