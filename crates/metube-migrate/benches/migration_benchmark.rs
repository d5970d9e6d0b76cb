//! Benchmarks for metube-migrate on synthetic exports.
//!
//! Run with: cargo bench -p metube-migrate

#![allow(clippy::pedantic)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use serde_json::json;
use std::path::Path;

use metube_migrate::associate::resolve_associations;
use metube_migrate::builder::{normalize_timestamp, VideoBuilder};
use metube_migrate::classify::Classifier;
use metube_migrate::games::GameTable;
use metube_migrate::identity::{SequentialIds, StaticIdentityTable};
use metube_migrate::record::RawRecord;

/// An export with `n` uploads, each with a converted variant, spread over ten games.
fn synthetic_export(n: i64) -> Vec<RawRecord> {
    let mut records = Vec::with_capacity(n as usize * 3 + 10);
    for g in 0..10i64 {
        records.push(RawRecord::new(
            "video_share.game",
            g,
            json!({"name": format!("Game {g}"), "users": [1, 4, 5]}),
        ));
    }
    for i in 0..n {
        records.push(RawRecord::new(
            "video_share.convertedvideo",
            100_000 + i,
            json!({
                "file": format!("converted/{i}.mp4"),
                "codec_audio": "aac",
                "codec_video": "h264",
                "_duration": 10.0
            }),
        ));
        records.push(RawRecord::new(
            "video_share.uploadedvideo",
            i,
            json!({
                "file": format!("videos/{i}.mkv"),
                "code": format!("code{i}"),
                "codec_audio": "mp3",
                "codec_video": "hevc",
                "_duration": 10.0,
                "custom_name": format!("Video {i}"),
                "game": i % 10,
                "public": i % 2 == 0,
                "owner": 1,
                "added": "2022-03-04T05:06:07.123456",
                "thumbnail": null,
                "converted": 100_000 + i
            }),
        ));
        records.push(RawRecord::new("sessions.session", format!("s{i}").as_str(), json!({})));
    }
    records
}

fn bench_classify(c: &mut Criterion) {
    let mut group = c.benchmark_group("classify");
    for n in [1_000, 10_000] {
        let records = synthetic_export(n);
        group.bench_with_input(BenchmarkId::new("records", records.len()), &records, |b, r| {
            let classifier = Classifier::new();
            b.iter(|| black_box(classifier.classify(r.iter().cloned())))
        });
    }
    group.finish();
}

fn bench_associate(c: &mut Criterion) {
    let mut group = c.benchmark_group("associate");
    for n in [1_000, 10_000] {
        let (buckets, _) = Classifier::new().classify(synthetic_export(n));
        let identities = StaticIdentityTable::legacy_default();

        group.bench_with_input(BenchmarkId::new("uploads", n), &buckets, |b, buckets| {
            b.iter(|| {
                let ids = SequentialIds::new();
                let games = GameTable::build(&buckets.games, &identities, &ids).unwrap();
                let builder = VideoBuilder::new(
                    Path::new("/nonexistent"),
                    &games,
                    &buckets.thumbnails,
                    &identities,
                    &ids,
                )
                .check_existing(false);
                black_box(resolve_associations(buckets, &builder).unwrap())
            })
        });
    }
    group.finish();
}

fn bench_normalize_timestamp(c: &mut Criterion) {
    c.bench_function("normalize_timestamp_naive", |b| {
        b.iter(|| black_box(normalize_timestamp(black_box("2022-03-04T05:06:07.123456"))))
    });
    c.bench_function("normalize_timestamp_offset", |b| {
        b.iter(|| black_box(normalize_timestamp(black_box("2022-03-04T05:06:07+02:00"))))
    });
}

criterion_group!(
    benches,
    bench_classify,
    bench_associate,
    bench_normalize_timestamp
);
criterion_main!(benches);
