//! Typed route table for content URIs.
//!
//! Accepted forms: `content://{authority}/metadata`, `/metadata` and
//! `metadata`. Path parameters are percent-decoded after matching.

use matchit::Router;
use percent_encoding::percent_decode_str;
use tracing::trace;

use super::ContentError;

pub const METADATA: &str = "metadata";
pub const STICKERS: &str = "stickers";
pub const STICKERS_ASSET: &str = "stickers_asset";

const CONTENT_SCHEME: &str = "content://";

/// A resolved content request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    AllPacks,
    Pack { identifier: String },
    Stickers { identifier: String },
    Asset { identifier: String, file_name: String },
}

impl Route {
    pub const fn name(&self) -> &'static str {
        match self {
            Self::AllPacks => "all_packs",
            Self::Pack { .. } => "pack",
            Self::Stickers { .. } => "stickers",
            Self::Asset { .. } => "asset",
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum RouteKind {
    AllPacks,
    Pack,
    Stickers,
    Asset,
}

/// Path templates compiled once, bound to one authority.
pub struct RouteTable {
    authority: String,
    router: Router<RouteKind>,
}

impl std::fmt::Debug for RouteTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteTable")
            .field("authority", &self.authority)
            .finish_non_exhaustive()
    }
}

impl RouteTable {
    pub fn new(authority: impl Into<String>) -> Self {
        let mut router = Router::new();
        // Fixed templates; insertion cannot conflict.
        router
            .insert(format!("/{METADATA}"), RouteKind::AllPacks)
            .expect("Failed to insert metadata route");
        router
            .insert(format!("/{METADATA}/{{identifier}}"), RouteKind::Pack)
            .expect("Failed to insert metadata/{identifier} route");
        router
            .insert(format!("/{STICKERS}/{{identifier}}"), RouteKind::Stickers)
            .expect("Failed to insert stickers/{identifier} route");
        router
            .insert(format!("/{STICKERS_ASSET}/{{*rest}}"), RouteKind::Asset)
            .expect("Failed to insert stickers_asset route");
        Self {
            authority: authority.into(),
            router,
        }
    }

    pub fn authority(&self) -> &str {
        &self.authority
    }

    /// Decode `uri` into a [`Route`].
    pub fn resolve(&self, uri: &str) -> Result<Route, ContentError> {
        let path = self.strip_authority(uri)?;
        trace!(uri, path = %path, "Resolving content URI");

        let asset_prefix = format!("/{STICKERS_ASSET}");
        if path == asset_prefix || path == format!("{asset_prefix}/") {
            return Err(ContentError::MalformedPath {
                uri: uri.to_string(),
                expected: 2,
                actual: 0,
            });
        }

        let matched = self
            .router
            .at(&path)
            .map_err(|_| ContentError::UnknownResource(uri.to_string()))?;
        let param = |name: &str| decode(matched.params.get(name).unwrap_or_default());

        let route = match matched.value {
            RouteKind::AllPacks => Route::AllPacks,
            RouteKind::Pack => Route::Pack {
                identifier: param("identifier"),
            },
            RouteKind::Stickers => Route::Stickers {
                identifier: param("identifier"),
            },
            RouteKind::Asset => {
                let segments: Vec<String> = matched
                    .params
                    .get("rest")
                    .unwrap_or_default()
                    .split('/')
                    .map(decode)
                    .collect();
                match segments.as_slice() {
                    [identifier, file_name] if !identifier.is_empty() && !file_name.is_empty() => {
                        Route::Asset {
                            identifier: identifier.clone(),
                            file_name: file_name.clone(),
                        }
                    }
                    _ => {
                        return Err(ContentError::MalformedPath {
                            uri: uri.to_string(),
                            expected: 2,
                            actual: segments.iter().filter(|s| !s.is_empty()).count(),
                        });
                    }
                }
            }
        };
        Ok(route)
    }

    /// Reduce a URI to its absolute path. A `content://` URI must name this
    /// table's authority.
    fn strip_authority(&self, uri: &str) -> Result<String, ContentError> {
        let without_query = uri.split(['?', '#']).next().unwrap_or_default();
        let path = match without_query.strip_prefix(CONTENT_SCHEME) {
            Some(rest) => {
                let (authority, path) = rest.split_once('/').unwrap_or((rest, ""));
                if authority != self.authority {
                    return Err(ContentError::UnknownResource(uri.to_string()));
                }
                path
            }
            None => without_query.trim_start_matches('/'),
        };
        Ok(format!("/{path}"))
    }
}

fn decode(segment: &str) -> String {
    percent_decode_str(segment).decode_utf8_lossy().into_owned()
}

/// Build the canonical URI of a route.
pub fn content_uri(authority: &str, route: &Route) -> String {
    use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};
    let enc = |s: &str| utf8_percent_encode(s, NON_ALPHANUMERIC).to_string();
    let path = match route {
        Route::AllPacks => METADATA.to_string(),
        Route::Pack { identifier } => format!("{METADATA}/{}", enc(identifier)),
        Route::Stickers { identifier } => format!("{STICKERS}/{}", enc(identifier)),
        Route::Asset {
            identifier,
            file_name,
        } => format!("{STICKERS_ASSET}/{}/{}", enc(identifier), enc(file_name)),
    };
    format!("{CONTENT_SCHEME}{authority}/{path}")
}
