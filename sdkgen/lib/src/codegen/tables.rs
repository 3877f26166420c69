//! The URL table and the static location table.

use std::collections::HashSet;

use proc_macro2::{Literal, TokenStream};
use quote::{format_ident, quote};
use tracing::debug;

use crate::classify::{Classification, client_name_for_group, url_value};
use crate::loader::Location;
use crate::naming::{to_screaming_snake_case, to_snake_case};

/// Generates `urls.rs`: `BASE_URL` and one constant per classified path.
///
/// Groups appear in configured order, each headed by a doc line naming it.
/// A constant name already emitted by an earlier group keeps its first path.
pub fn urls_tokens(classification: &Classification, base_url: &str) -> TokenStream {
    let mut seen = HashSet::new();
    let mut constants = Vec::new();

    for (prefix, urls) in classification {
        let heading = format!(" {} data endpoints (`{}`).", group_words(prefix), prefix);
        let mut first = true;
        for (constant, path) in urls {
            let name = to_screaming_snake_case(constant);
            if !seen.insert(name.clone()) {
                debug!(constant = %name, group = %prefix, "URL constant already defined by an earlier group; skipped");
                continue;
            }
            let ident = format_ident!("{}", name);
            let value = url_value(path);
            let doc = if first {
                quote! { #[doc = #heading] }
            } else {
                quote! {}
            };
            first = false;
            constants.push(quote! {
                #doc
                pub const #ident: &str = #value;
            });
        }
    }

    quote! {
        //! API base URL and endpoint paths.

        /// Base URL every path is resolved against.
        pub const BASE_URL: &str = #base_url;

        #(#constants)*
    }
}

/// `/data/live/` -> `Live`, `/resources/pv_power_site` -> `Pv power site`.
fn group_words(prefix: &str) -> String {
    let client = client_name_for_group(prefix);
    let words = to_snake_case(client.trim_end_matches("Client")).replace('_', " ");
    let mut chars = words.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => words,
    }
}

fn float(value: f64) -> TokenStream {
    let literal = Literal::f64_unsuffixed(value.abs());
    if value.is_sign_negative() {
        quote! { -#literal }
    } else {
        quote! { #literal }
    }
}

/// Generates `locations.rs` with the static location table and its lookups.
pub fn locations_tokens(locations: &[Location]) -> TokenStream {
    let entries: Vec<TokenStream> = locations
        .iter()
        .map(|location| {
            let name = location.name.as_str();
            let latitude = float(location.latitude);
            let longitude = float(location.longitude);
            let resource_id = location.resource_id.as_str();
            quote! {
                Location {
                    name: #name,
                    latitude: #latitude,
                    longitude: #longitude,
                    resource_id: #resource_id,
                },
            }
        })
        .collect();

    quote! {
        //! Named sample locations with coordinates and resource ids.

        /// A named location.
        #[derive(Debug, Clone, Copy, PartialEq)]
        pub struct Location {
            pub name: &'static str,
            pub latitude: f64,
            pub longitude: f64,
            /// Identifier of the rooftop site or resource at this location.
            pub resource_id: &'static str,
        }

        pub static LOCATIONS: &[Location] = &[
            #(#entries)*
        ];

        /// Names of all locations, in table order.
        pub fn location_names() -> Vec<&'static str> {
            LOCATIONS.iter().map(|location| location.name).collect()
        }

        /// Latitudes and longitudes of all locations, as parallel lists.
        pub fn location_coordinates() -> (Vec<f64>, Vec<f64>) {
            LOCATIONS
                .iter()
                .map(|location| (location.latitude, location.longitude))
                .unzip()
        }

        /// Looks a location up by its exact name.
        pub fn find_location(name: &str) -> Option<&'static Location> {
            LOCATIONS.iter().find(|location| location.name == name)
        }
    }
}
