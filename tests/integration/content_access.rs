//! The URI surface over a populated store.

use std::fs;
use std::sync::Arc;

use stickers::config::DEFAULT_AUTHORITY;
use stickers::content::{
    CellValue, ContentError, ContentResponse, NoWhitelist, ProviderState, Route, StaticWhitelist,
    columns, content_uri,
};
use stickers::content::{MIME_PNG, MIME_WEBP};
use stickers::pack::PackLinks;

use crate::common::fixtures::{PRIVILEGED, StoreFixture, write_webp};

fn uri(path: &str) -> String {
    format!("content://{DEFAULT_AUTHORITY}/{path}")
}

fn populated() -> StoreFixture {
    let fx = StoreFixture::new(Default::default());
    let links = PackLinks {
        publisher_website: Some("https://example.com".into()),
        ..PackLinks::default()
    };
    assert!(fx.service.save_pack(fx.pack("cats", 3).with_links(links)).is_success());
    assert!(fx.service.save_pack(fx.pack("dogs", 3)).is_success());
    fx
}

// ============================================================================
// Tables
// ============================================================================

#[test]
fn metadata_lists_every_pack_with_fixed_columns() {
    let fx = populated();
    let provider = fx.provider(Arc::new(NoWhitelist));
    assert_eq!(provider.state(), ProviderState::Uninitialized);

    let table = provider.query(&uri("metadata"), None).unwrap();
    assert_eq!(provider.state(), ProviderState::Ready);
    assert_eq!(table.columns(), columns::PACK);
    assert_eq!(table.len(), 2);

    let ids: Vec<_> = (0..table.len())
        .filter_map(|row| table.cell(row, columns::PACK_IDENTIFIER)?.as_text())
        .collect();
    assert!(ids.contains(&"cats") && ids.contains(&"dogs"));
}

#[test]
fn single_pack_row_carries_links_and_flags() {
    let fx = populated();
    let provider = fx.provider(Arc::new(NoWhitelist));

    let table = provider.query(&uri("metadata/cats"), None).unwrap();
    assert_eq!(table.len(), 1);
    assert_eq!(
        table.cell(0, columns::PUBLISHER_WEBSITE),
        Some(&CellValue::Text("https://example.com".into()))
    );
    assert_eq!(table.cell(0, columns::PUBLISHER_EMAIL), Some(&CellValue::Null));
    assert_eq!(table.cell(0, columns::ANIMATED), Some(&CellValue::Integer(0)));
    assert_eq!(table.cell(0, columns::AVOID_CACHE), Some(&CellValue::Integer(0)));
    assert_eq!(
        table.cell(0, columns::IMAGE_DATA_VERSION),
        Some(&CellValue::Text("1".into()))
    );
}

#[test]
fn unknown_pack_gives_empty_tables() {
    let fx = populated();
    let provider = fx.provider(Arc::new(NoWhitelist));

    let table = provider.query(&uri("metadata/nope"), None).unwrap();
    assert!(table.is_empty());
    assert_eq!(table.columns(), columns::PACK);

    let stickers = provider.query(&uri("stickers/nope"), None).unwrap();
    assert!(stickers.is_empty());
    assert_eq!(stickers.columns(), columns::STICKER);
}

#[test]
fn sticker_rows_expose_markers_and_joined_emojis() {
    let fx = StoreFixture::new(Default::default());
    let mut pack = fx.pack("cats", 3);
    pack.stickers[0].emojis = vec!["😺".into(), "😸".into()];
    fs::remove_file(fx.asset("cats", "s2.webp")).unwrap();
    fx.service.save_pack(pack);
    let provider = fx.provider(Arc::new(NoWhitelist));

    let table = provider.query("/stickers/cats", None).unwrap();
    assert_eq!(table.len(), 3);
    assert_eq!(table.cell(0, columns::STICKER_EMOJI), Some(&CellValue::Text("😺,😸".into())));
    assert_eq!(table.cell(0, columns::STICKER_IS_VALID), Some(&CellValue::Text(String::new())));
    assert_eq!(
        table.cell(1, columns::STICKER_IS_VALID),
        Some(&CellValue::Text("INVALID_STICKER_PATH".into()))
    );
}

#[test]
fn bare_paths_and_percent_encoding_resolve() {
    let fx = StoreFixture::new(Default::default());
    fx.service.save_pack(fx.pack("my pack", 3));
    let provider = fx.provider(Arc::new(NoWhitelist));

    let encoded = content_uri(
        DEFAULT_AUTHORITY,
        &Route::Pack {
            identifier: "my pack".into(),
        },
    );
    assert!(encoded.contains("my%20pack"));
    assert_eq!(provider.query(&encoded, None).unwrap().len(), 1);
    assert_eq!(provider.query("metadata/my%20pack", None).unwrap().len(), 1);
}

// ============================================================================
// Routing faults
// ============================================================================

#[test]
fn unknown_uris_are_rejected() {
    let fx = populated();
    let provider = fx.provider(Arc::new(NoWhitelist));

    for bad in [
        uri("nothing"),
        uri("stickers"),
        "content://other.authority/metadata".to_string(),
    ] {
        assert!(
            matches!(provider.dispatch(&bad, None), Err(ContentError::UnknownResource(_))),
            "{bad} should be unknown"
        );
    }
}

#[test]
fn asset_uri_needs_exactly_two_segments() {
    let fx = populated();
    let provider = fx.provider(Arc::new(NoWhitelist));

    for bad in ["stickers_asset/cats", "stickers_asset/cats/a/b", "stickers_asset"] {
        assert!(
            matches!(
                provider.dispatch(&uri(bad), Some(PRIVILEGED)),
                Err(ContentError::MalformedPath { expected: 2, .. })
            ),
            "{bad} should be malformed"
        );
    }
}

#[test]
fn query_and_open_asset_stay_on_their_routes() {
    let fx = populated();
    let provider = fx.provider(Arc::new(NoWhitelist));

    assert!(matches!(
        provider.query(&uri("stickers_asset/cats/s1.webp"), Some(PRIVILEGED)),
        Err(ContentError::UnknownResource(_))
    ));
    assert!(matches!(
        provider.open_asset(&uri("metadata"), Some(PRIVILEGED)),
        Err(ContentError::UnknownResource(_))
    ));
}

// ============================================================================
// Asset access
// ============================================================================

#[test]
fn privileged_caller_reads_unwhitelisted_assets() {
    let fx = populated();
    let provider = fx.provider(Arc::new(NoWhitelist));

    let asset = provider
        .open_asset(&uri("stickers_asset/cats/s1.webp"), Some(PRIVILEGED))
        .unwrap()
        .expect("sticker should be served");
    assert_eq!(asset.mime_type, MIME_WEBP);
    assert_eq!(asset.len, fs::metadata(fx.asset("cats", "s1.webp")).unwrap().len());
    assert_eq!(asset.read().unwrap().len() as u64, asset.len);

    let tray = provider
        .open_asset(&uri("stickers_asset/cats/tray.png"), Some(PRIVILEGED))
        .unwrap()
        .expect("tray should be served");
    assert_eq!(tray.mime_type, MIME_PNG);
}

#[test]
fn external_caller_is_denied_unless_whitelisted() {
    let fx = populated();

    let closed = fx.provider(Arc::new(NoWhitelist));
    let denied = closed.open_asset(&uri("stickers_asset/cats/s1.webp"), Some("com.other.app"));
    assert!(matches!(
        denied,
        Err(ContentError::AccessDenied { ref identifier, .. }) if identifier == "cats"
    ));
    assert!(matches!(
        closed.open_asset(&uri("stickers_asset/cats/s1.webp"), None),
        Err(ContentError::AccessDenied { .. })
    ));

    let open = fx.provider(Arc::new(StaticWhitelist::new(["cats".to_string()])));
    assert!(
        open.open_asset(&uri("stickers_asset/cats/s1.webp"), Some("com.other.app"))
            .unwrap()
            .is_some()
    );
    assert!(matches!(
        open.open_asset(&uri("stickers_asset/dogs/s1.webp"), Some("com.other.app")),
        Err(ContentError::AccessDenied { .. })
    ));
}

#[test]
fn owner_bypasses_the_whitelist() {
    let fx = populated();
    let provider = fx.provider(Arc::new(NoWhitelist));
    let owner = stickers::config::DEFAULT_OWNER_PACKAGE;
    assert!(
        provider
            .open_asset(&uri("stickers_asset/dogs/s2.webp"), Some(owner))
            .unwrap()
            .is_some()
    );
}

#[test]
fn nothing_to_serve_is_not_an_error() {
    let fx = populated();
    let provider = fx.provider(Arc::new(NoWhitelist));

    assert!(matches!(
        provider.dispatch(&uri("stickers_asset/ghost/s1.webp"), Some(PRIVILEGED)),
        Ok(ContentResponse::NotFound)
    ));
    assert!(matches!(
        provider.dispatch(&uri("stickers_asset/cats/missing.webp"), Some(PRIVILEGED)),
        Ok(ContentResponse::NotFound)
    ));
}

#[test]
fn privileged_caller_never_gets_invalid_stickers() {
    let fx = populated();
    write_webp(&fx.asset("cats", "s3.webp"), 100, 100);
    fs::write(fx.asset("cats", "notes.txt"), b"hello").unwrap();
    let provider = fx.provider(Arc::new(NoWhitelist));

    assert!(
        provider
            .open_asset(&uri("stickers_asset/cats/s3.webp"), Some(PRIVILEGED))
            .unwrap()
            .is_none()
    );
    assert!(
        provider
            .open_asset(&uri("stickers_asset/cats/notes.txt"), Some(PRIVILEGED))
            .unwrap()
            .is_none()
    );

    // The owner still sees the file as it is.
    let owner = stickers::config::DEFAULT_OWNER_PACKAGE;
    assert!(
        provider
            .open_asset(&uri("stickers_asset/cats/s3.webp"), Some(owner))
            .unwrap()
            .is_some()
    );
}

#[test]
fn traversal_in_file_name_is_not_served() {
    let fx = populated();
    let provider = fx.provider(Arc::new(NoWhitelist));
    let outcome = provider
        .open_asset(&uri("stickers_asset/cats/..%2F..%2Fstickers.db"), Some(PRIVILEGED))
        .unwrap();
    assert!(outcome.is_none());
}

// ============================================================================
// MIME types
// ============================================================================

#[test]
fn mime_types_follow_the_route() {
    let fx = populated();
    let provider = fx.provider(Arc::new(NoWhitelist));

    assert_eq!(
        provider.mime_type(&uri("metadata")).unwrap(),
        format!("vnd.android.cursor.dir/vnd.{DEFAULT_AUTHORITY}.metadata")
    );
    assert_eq!(
        provider.mime_type(&uri("metadata/cats")).unwrap(),
        format!("vnd.android.cursor.item/vnd.{DEFAULT_AUTHORITY}.metadata")
    );
    assert_eq!(
        provider.mime_type(&uri("stickers/cats")).unwrap(),
        format!("vnd.android.cursor.dir/vnd.{DEFAULT_AUTHORITY}.stickers")
    );
    assert_eq!(provider.mime_type(&uri("stickers_asset/cats/tray.png")).unwrap(), MIME_PNG);
    assert_eq!(provider.mime_type(&uri("stickers_asset/cats/s1.webp")).unwrap(), MIME_WEBP);
}

#[test]
fn reads_see_later_writes() {
    let fx = populated();
    let provider = fx.provider(Arc::new(NoWhitelist));
    assert_eq!(provider.query(&uri("metadata"), None).unwrap().len(), 2);

    fx.service.delete_pack("dogs");
    fx.service.update_pack_name("cats", "Kittens");

    let table = provider.query(&uri("metadata"), None).unwrap();
    assert_eq!(table.len(), 1);
    assert_eq!(
        table.cell(0, columns::PACK_NAME),
        Some(&CellValue::Text("Kittens".into()))
    );
}
