//! Which rule wins when a pack breaks several, and which faults reject a
//! save versus only flag a sticker.

use stickers::error::StickerError;
use stickers::pack::{PackLinks, Sticker, StickerPack};
use stickers::validation::{ValidationCode, ValidationFailure};

use crate::common::fixtures::{StoreFixture, write_png};

fn rejected_with(fx: &StoreFixture, pack: StickerPack) -> ValidationFailure {
    let identifier = pack.identifier.clone();
    match fx.service.save_pack(pack) {
        stickers::outcome::Outcome::Failure(StickerError::Validation(failure)) => {
            assert!(
                fx.service.fetch_pack(&identifier).is_warning(),
                "rejected pack must not be stored"
            );
            failure
        }
        outcome => panic!("expected validation failure, got {outcome:?}"),
    }
}

#[test]
fn name_is_checked_before_email() {
    let fx = StoreFixture::new(Default::default());
    let mut pack = fx.pack("p", 3);
    pack.name = "n".repeat(40);
    pack.publisher_email = Some("bad".into());

    let failure = rejected_with(&fx, pack);
    assert_eq!(failure.code, ValidationCode::InvalidName);
    assert_eq!(failure.offending_field, "name");
}

#[test]
fn identifier_is_checked_first() {
    let fx = StoreFixture::new(Default::default());
    let mut pack = fx.pack("p", 3);
    pack.identifier = "a..b".into();
    pack.name = String::new();

    let failure = rejected_with(&fx, pack);
    assert_eq!(failure.code, ValidationCode::InvalidIdentifier);
}

#[test]
fn identifier_length_counts_characters() {
    let fx = StoreFixture::new(Default::default());
    let at_limit = "é".repeat(36);
    let pack = fx.pack(&at_limit, 3);
    assert!(fx.service.save_pack(pack).is_success());

    let mut over = fx.pack("x", 3);
    over.identifier = "é".repeat(37);
    assert_eq!(rejected_with(&fx, over).code, ValidationCode::InvalidIdentifier);
}

#[test]
fn publisher_is_checked_before_links() {
    let fx = StoreFixture::new(Default::default());
    let mut pack = fx.pack("p", 3);
    pack.publisher = " ".into();
    pack.android_store_link = Some("https://example.com/app".into());

    assert_eq!(rejected_with(&fx, pack).code, ValidationCode::InvalidPublisher);
}

#[test]
fn store_links_must_point_at_their_store() {
    let fx = StoreFixture::new(Default::default());

    let android = fx.pack("p", 3).with_links(PackLinks {
        android_store_link: Some("https://apps.example.com/details?id=x".into()),
        ..PackLinks::default()
    });
    assert_eq!(rejected_with(&fx, android).code, ValidationCode::InvalidAndroidUrl);

    let ios = fx.pack("p", 3).with_links(PackLinks {
        android_store_link: Some("https://play.google.com/store/apps/details?id=x".into()),
        ios_store_link: Some("https://play.google.com/app".into()),
        ..PackLinks::default()
    });
    assert_eq!(rejected_with(&fx, ios).code, ValidationCode::InvalidIosUrl);
}

#[test]
fn websites_are_checked_before_email() {
    let fx = StoreFixture::new(Default::default());
    let pack = fx.pack("p", 3).with_links(PackLinks {
        privacy_policy_website: Some("ftp://example.com/privacy".into()),
        publisher_email: Some("nope".into()),
        ..PackLinks::default()
    });

    let failure = rejected_with(&fx, pack);
    assert_eq!(failure.code, ValidationCode::InvalidWebsite);
    assert_eq!(failure.offending_field, "privacy_policy_website");
}

#[test]
fn tray_problems_come_before_pack_size() {
    let fx = StoreFixture::new(Default::default());
    let mut pack = fx.pack("p", 1);
    write_png(&fx.asset("p", "tray.png"), 600);

    let failure = rejected_with(&fx, pack.clone());
    assert_eq!(failure.code, ValidationCode::InvalidTrayImage);

    pack.tray_image = "missing.png".into();
    assert_eq!(rejected_with(&fx, pack).code, ValidationCode::InvalidTrayImage);
}

#[test]
fn pack_size_bounds() {
    let fx = StoreFixture::new(Default::default());
    assert_eq!(
        rejected_with(&fx, fx.pack("few", 2)).code,
        ValidationCode::InvalidPackSize
    );
    assert_eq!(
        rejected_with(&fx, fx.pack("many", 31)).code,
        ValidationCode::InvalidPackSize
    );
    assert!(fx.service.save_pack(fx.pack("max", 30)).is_success());
}

#[test]
fn missing_emoji_rejects_the_whole_pack() {
    let fx = StoreFixture::new(Default::default());
    let mut pack = fx.pack("p", 3);
    pack.stickers[1].emojis.clear();

    let failure = rejected_with(&fx, pack);
    assert_eq!(failure.code, ValidationCode::InvalidEmoji);
    assert!(failure.offending_field.contains("s2.webp"));
}

#[test]
fn accessibility_text_limit_depends_on_pack_kind() {
    let fx = StoreFixture::new(Default::default());
    let mut pack = fx.pack("p", 3);
    pack.stickers[0].accessibility_text = "a".repeat(126);
    assert_eq!(rejected_with(&fx, pack).code, ValidationCode::InvalidAccessibility);

    let mut ok = fx.pack("q", 3);
    ok.stickers[0].accessibility_text = "a".repeat(125);
    assert!(fx.service.save_pack(ok).is_success());
}

#[test]
fn file_faults_flag_instead_of_rejecting() {
    let fx = StoreFixture::new(Default::default());
    let pack = fx.pack("p", 3).with_sticker(Sticker::new(
        "absent.webp",
        vec!["😀".into()],
        "not on disk",
    ));

    let saved = fx.service.save_pack(pack).success().unwrap();
    let flagged: Vec<_> = saved.invalid_stickers().map(|s| s.file_name.as_str()).collect();
    assert_eq!(flagged, ["absent.webp"]);
}

#[test]
fn static_pack_rejects_animated_flag_mismatch_as_marker() {
    let fx = StoreFixture::new(Default::default());
    let pack = fx.pack("anim", 3).with_animated(true);

    let saved = fx.service.save_pack(pack).success().unwrap();
    assert!(
        saved
            .stickers
            .iter()
            .all(|s| s.validity_marker == ValidationCode::StickerType.token()),
        "still images in an animated pack must be flagged: {:?}",
        saved.stickers
    );
}

#[test]
fn report_collects_every_sticker_fault() {
    let fx = StoreFixture::new(Default::default());
    let mut pack = fx.pack("p", 3);
    pack.stickers[0].emojis.clear();
    std::fs::remove_file(fx.asset("p", "s3.webp")).unwrap();

    let report = fx.service.validator().report(&pack);
    assert!(report.pack.is_none());
    let codes: Vec<_> = report.stickers.iter().map(|(f, e)| (f.as_str(), e.code)).collect();
    assert_eq!(
        codes,
        [
            ("s1.webp", ValidationCode::InvalidEmoji),
            ("s3.webp", ValidationCode::InvalidStickerPath),
        ]
    );
    assert_eq!(report.first().unwrap().code, ValidationCode::InvalidEmoji);
}
