use std::{
    sync::Arc,
    thread,
    time::{Duration, Instant},
};

use slideviewer::error::ViewerError;
use slideviewer::image_utils::{FileDecoder, ImageSource, SlideImage};
use slideviewer::viewer::loader::ImageLoader;
use tempfile::tempdir;

mod common;
use common::{solid_image, sources, write_image, StubDecoder};

fn wait_for_publish(loader: &mut ImageLoader) -> Vec<ViewerError> {
    let deadline = Instant::now() + Duration::from_secs(5);
    let mut failures = Vec::new();
    loop {
        let update = loader.update(Instant::now());
        failures.extend(update.failures);
        if update.published {
            return failures;
        }
        assert!(Instant::now() < deadline, "timed out waiting for loader");
        thread::sleep(Duration::from_millis(5));
    }
}

#[test]
fn loader_decodes_files_in_order() {
    let tmp = tempdir().unwrap();
    let mut list = Vec::new();
    for (idx, (w, h)) in [(4, 2), (3, 5), (7, 7)].into_iter().enumerate() {
        let path = tmp.path().join(format!("{idx}.png"));
        write_image(&path, &solid_image(w, h, [10, 20, 30, 255]));
        list.push(ImageSource::from_path(&path));
    }

    let decoder = Arc::new(FileDecoder::new((3840, 2160)));
    let mut loader = ImageLoader::new(decoder, None, Duration::ZERO);
    assert!(loader.load(list.clone()));
    assert!(loader.is_loading());
    assert!(wait_for_publish(&mut loader).is_empty());

    let sizes: Vec<_> = loader
        .images()
        .iter()
        .map(|slot| {
            let image = slot.loaded().unwrap();
            (image.width, image.height)
        })
        .collect();
    assert_eq!(sizes, vec![(4, 2), (3, 5), (7, 7)]);
    let urls: Vec<_> = loader.images().iter().map(|s| s.source().clone()).collect();
    assert_eq!(urls, list);
}

#[test]
fn identical_list_is_a_no_op() {
    let decoder = Arc::new(StubDecoder::new(2, 2));
    let mut loader = ImageLoader::new(decoder.clone(), None, Duration::ZERO);
    assert!(loader.load(sources(&["a", "b"])));
    wait_for_publish(&mut loader);
    let generation = loader.generation();

    assert!(!loader.load(sources(&["a", "b"])));
    assert!(!loader.is_loading());
    assert_eq!(loader.generation(), generation);
    assert_eq!(decoder.calls(), vec!["a", "b"]);

    // Same URLs, different order is a new list
    assert!(loader.load(sources(&["b", "a"])));
    assert!(loader.is_loading());
}

#[test]
fn minimum_loading_time_delays_publish() {
    let decoder = Arc::new(StubDecoder::new(2, 2));
    let min_loading = Duration::from_millis(200);
    let mut loader = ImageLoader::new(decoder, None, min_loading);
    let started = Instant::now();
    loader.load(sources(&["a"]));

    // Decoding is instant, publishing has to wait
    thread::sleep(Duration::from_millis(50));
    assert!(!loader.update(Instant::now()).published);
    assert!(loader.is_loading());
    assert!(loader.images().is_empty());

    wait_for_publish(&mut loader);
    assert!(started.elapsed() >= min_loading);
    assert_eq!(loader.images().len(), 1);
}

#[test]
fn newer_list_supersedes_in_flight_run() {
    let decoder = Arc::new(
        StubDecoder::new(2, 2).with_delay("old-1", Duration::from_millis(100)),
    );
    let mut loader = ImageLoader::new(decoder.clone(), None, Duration::ZERO);
    loader.load(sources(&["old-1", "old-2", "old-3"]));
    thread::sleep(Duration::from_millis(20));
    loader.load(sources(&["new-1", "new-2"]));

    wait_for_publish(&mut loader);
    let urls: Vec<_> = loader
        .images()
        .iter()
        .map(|s| s.source().url.as_str())
        .collect();
    assert_eq!(urls, vec!["new-1", "new-2"]);
    // The worker noticed the new list before touching the rest of the old one
    assert!(!decoder.calls().contains(&"old-2".to_string()));
}

#[test]
fn hung_decode_does_not_block_the_next_list() {
    // Without a timeout the first decode would hold the worker for seconds
    let decoder = Arc::new(
        StubDecoder::new(2, 2).with_delay("hung", Duration::from_secs(3)),
    );
    let mut loader = ImageLoader::new(decoder.clone(), None, Duration::ZERO);
    loader.load(sources(&["hung"]));
    thread::sleep(Duration::from_millis(30));

    let replaced = Instant::now();
    loader.load(sources(&["ok"]));
    let failures = wait_for_publish(&mut loader);

    assert!(
        replaced.elapsed() < Duration::from_secs(1),
        "new list waited {:?} for the old decode",
        replaced.elapsed()
    );
    assert!(failures.is_empty());
    let urls: Vec<_> = loader
        .images()
        .iter()
        .map(|s| s.source().url.as_str())
        .collect();
    assert_eq!(urls, vec!["ok"]);
    assert_eq!(decoder.calls(), vec!["hung", "ok"]);
}

#[test]
fn failed_image_keeps_its_slot() {
    let decoder = Arc::new(StubDecoder::new(2, 2));
    let mut loader = ImageLoader::new(decoder, None, Duration::ZERO);
    loader.load(sources(&["a", "fail-b", "c"]));
    let failures = wait_for_publish(&mut loader);

    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].url(), Some("fail-b"));
    assert_eq!(loader.images().len(), 3);
    assert!(matches!(loader.images()[1], SlideImage::Failed { .. }));
    assert!(loader.images()[2].loaded().is_some());
}

#[test]
fn slow_decode_times_out_and_pipeline_continues() {
    let decoder = Arc::new(
        StubDecoder::new(2, 2).with_delay("slow", Duration::from_millis(500)),
    );
    let timeout = Duration::from_millis(50);
    let mut loader = ImageLoader::new(decoder, Some(timeout), Duration::ZERO);
    let started = Instant::now();
    loader.load(sources(&["slow", "fast"]));
    let failures = wait_for_publish(&mut loader);

    assert!(started.elapsed() < Duration::from_millis(450));
    assert_eq!(
        failures,
        vec![ViewerError::DecodeTimeout {
            url: "slow".into(),
            after: timeout,
        }]
    );
    assert!(loader.images()[1].loaded().is_some());
}

#[test]
fn missing_file_is_reported_as_read_error() {
    let tmp = tempdir().unwrap();
    let missing = tmp.path().join("nope.png");
    let decoder = Arc::new(FileDecoder::new((3840, 2160)));
    let mut loader = ImageLoader::new(decoder, None, Duration::ZERO);
    loader.load(vec![ImageSource::from_path(&missing)]);
    let failures = wait_for_publish(&mut loader);
    assert!(matches!(failures.as_slice(), [ViewerError::Read { .. }]));
}
