//! The write pool under concurrent callers.

use std::sync::{Arc, Barrier};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use stickers::error::StickerError;
use stickers::outcome::Outcome;
use stickers::pack::Sticker;
use stickers::validation::Limits;
use stickers::service::{UpdateStatus, WritePool};

use crate::common::fixtures::{StoreFixture, write_webp};
use crate::common::init_test_logging;

#[test]
fn racing_saves_of_one_identifier_store_exactly_one_pack() {
    init_test_logging();
    let fx = StoreFixture::new(Default::default());
    let template = fx.pack("race", 3);
    let pool = Arc::new(WritePool::new(Arc::clone(&fx.service), 2).unwrap());

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let pool = Arc::clone(&pool);
            let mut pack = template.clone();
            pack.name = format!("Racer {i}");
            thread::spawn(move || pool.save_pack(pack).wait())
        })
        .collect();
    let outcomes: Vec<Outcome<_>> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    let winners = outcomes.iter().filter(|o| o.is_success()).count();
    let duplicates = outcomes
        .iter()
        .filter(|o| matches!(o.failure(), Some(StickerError::DuplicateIdentifier { .. })))
        .count();
    assert_eq!(winners, 1, "{outcomes:?}");
    assert_eq!(duplicates, 7, "{outcomes:?}");

    let stored = fx.service.fetch_pack("race").success().unwrap();
    assert_eq!(stored.stickers.len(), 3);
}

#[test]
fn racing_appends_never_exceed_max_pack_size() {
    let fx = StoreFixture::new(Limits {
        min_pack_size: 1,
        max_pack_size: 3,
        ..Limits::default()
    });

    for round in 0..10 {
        let id = format!("grow{round}");
        assert!(fx.service.save_pack(fx.pack(&id, 1)).is_success());
        let barrier = Arc::new(Barrier::new(6));
        let handles: Vec<_> = (0..6)
            .map(|i| {
                let file = format!("extra{i}.webp");
                write_webp(&fx.asset(&id, &file), 512, 512);
                let service = Arc::clone(&fx.service);
                let barrier = Arc::clone(&barrier);
                let id = id.clone();
                thread::spawn(move || {
                    barrier.wait();
                    service.add_stickers(&id, vec![Sticker::new(file, vec!["😀".into()], "extra")])
                })
            })
            .collect();
        let outcomes: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        let appended = outcomes.iter().filter(|o| o.is_success()).count();
        assert_eq!(appended, 2, "round {round}: {outcomes:?}");
        assert!(outcomes
            .iter()
            .filter(|o| !o.is_success())
            .all(|o| o.message().is_some_and(|m| m.contains("INVALID_STICKERPACK_SIZE"))));

        let stored = fx.service.fetch_pack(&id).success().unwrap();
        assert_eq!(stored.stickers.len(), 3, "round {round}");
        assert_eq!(stored.image_data_version, "3", "every append bumps the version");
    }
}

#[test]
fn racing_appends_through_the_pool_keep_every_version_bump() {
    let fx = StoreFixture::relaxed();
    assert!(fx.service.save_pack(fx.pack("cats", 1)).is_success());
    let pool = WritePool::new(Arc::clone(&fx.service), 2).unwrap();

    let pending: Vec<_> = (0..8)
        .map(|i| {
            let file = format!("more{i}.webp");
            write_webp(&fx.asset("cats", &file), 512, 512);
            pool.add_stickers("cats", vec![Sticker::new(file, vec!["😺".into()], "cat")])
        })
        .collect();
    for write in pending {
        assert!(write.wait().is_success());
    }

    let stored = fx.service.fetch_pack("cats").success().unwrap();
    assert_eq!(stored.stickers.len(), 9);
    assert_eq!(stored.image_data_version, "9");
}

#[test]
fn reads_proceed_while_writes_are_queued() {
    let fx = StoreFixture::new(Default::default());
    let packs: Vec<_> = (0..5).map(|i| fx.pack(&format!("p{i}"), 3)).collect();
    let pool = WritePool::new(Arc::clone(&fx.service), 2).unwrap();

    let done = Arc::new(AtomicBool::new(false));
    let reader = {
        let service = Arc::clone(&fx.service);
        let done = Arc::clone(&done);
        thread::spawn(move || {
            let mut reads = 0usize;
            let mut last = 0usize;
            while !done.load(Ordering::Acquire) {
                let fetched = service.fetch_packs().success().expect("read failed");
                assert!(fetched.len() >= last, "pack count went backwards");
                last = fetched.len();
                reads += 1;
            }
            reads
        })
    };

    let pending: Vec<_> = packs.into_iter().map(|p| pool.save_pack(p)).collect();
    for write in pending {
        assert!(write.wait().is_success());
    }
    done.store(true, Ordering::Release);

    assert!(reader.join().unwrap() > 0);
    assert_eq!(fx.service.fetch_packs().success().unwrap().len(), 5);
}

#[test]
fn writes_from_one_caller_apply_in_submission_order() {
    let fx = StoreFixture::new(Default::default());
    let pool = WritePool::new(Arc::clone(&fx.service), 1).unwrap();
    assert_eq!(pool.threads(), 1);

    let save = pool.save_pack(fx.pack("cats", 3));
    let first = pool.update_pack_name("cats", "One");
    let second = pool.update_pack_name("cats", "Two");
    assert!(save.wait().is_success());
    assert_eq!(first.wait().success(), Some(UpdateStatus::Updated));
    assert_eq!(second.wait().success(), Some(UpdateStatus::Updated));

    assert_eq!(fx.service.fetch_pack("cats").success().unwrap().name, "Two");
}

#[test]
fn thread_count_is_clamped() {
    let fx = StoreFixture::new(Default::default());
    assert_eq!(WritePool::new(Arc::clone(&fx.service), 0).unwrap().threads(), 1);
    assert_eq!(WritePool::new(Arc::clone(&fx.service), 64).unwrap().threads(), 2);
}

#[test]
fn submitting_after_shutdown_fails_cleanly() {
    let fx = StoreFixture::new(Default::default());
    let mut pool = WritePool::new(Arc::clone(&fx.service), 2).unwrap();
    pool.shutdown();

    let outcome = pool.delete_pack("anything").wait();
    assert!(matches!(outcome.failure(), Some(StickerError::WorkerUnavailable(_))));
}

#[tokio::test]
async fn pending_writes_can_be_awaited() {
    let fx = StoreFixture::new(Default::default());
    let pool = WritePool::new(Arc::clone(&fx.service), 2).unwrap();

    let saved = pool.save_pack(fx.pack("async", 3)).await;
    assert!(saved.is_success());
    let deleted = pool.delete_pack("async").await;
    assert_eq!(deleted.success(), Some(4));
}
