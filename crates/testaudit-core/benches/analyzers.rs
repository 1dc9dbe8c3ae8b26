use std::collections::HashMap;

use chrono::{TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

use testaudit_core::aggregator::evaluate_responses;
use testaudit_core::guttman::{count_guttman_errors, GuttmanItem};
use testaudit_core::model::{DifficultyLevel, Question, Response};
use testaudit_core::person_fit::{analyze_person_fit, FitItem};

fn level(i: usize) -> DifficultyLevel {
    match i % 3 {
        0 => DifficultyLevel::Easy,
        1 => DifficultyLevel::Medium,
        _ => DifficultyLevel::Hard,
    }
}

fn guttman_items(n: usize) -> Vec<GuttmanItem> {
    (0..n)
        .map(|i| GuttmanItem {
            p_value: (i % 17) as f64 / 17.0,
            is_correct: i % 3 != 0,
        })
        .collect()
}

fn bench_guttman(c: &mut Criterion) {
    let mut group = c.benchmark_group("guttman_errors");

    for n in [20, 200, 2000] {
        let items = guttman_items(n);
        group.bench_function(format!("n={n}"), |b| {
            b.iter(|| count_guttman_errors(black_box(&items)))
        });
    }

    group.finish();
}

fn bench_person_fit(c: &mut Criterion) {
    let items: Vec<FitItem> = (0..40)
        .map(|i| FitItem {
            difficulty: level(i),
            is_correct: i % 4 != 0,
        })
        .collect();

    c.bench_function("person_fit/40", |b| {
        b.iter(|| analyze_person_fit(black_box(&items)))
    });
}

fn bench_full_session(c: &mut Criterion) {
    let at = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
    let questions: HashMap<_, _> = (0..30)
        .map(|id| {
            (
                id,
                Question {
                    id,
                    difficulty_level: level(id as usize),
                    empirical_p_value: Some(0.2 + (id % 7) as f64 / 10.0),
                    question_type: "logic".into(),
                },
            )
        })
        .collect();
    let responses: Vec<Response> = (0..30)
        .map(|id| Response {
            question_id: id,
            is_correct: id % 5 != 0,
            time_spent_seconds: Some(15 + (id as u32 * 7) % 90),
            answered_at: at,
        })
        .collect();

    c.bench_function("evaluate_responses/30", |b| {
        b.iter(|| evaluate_responses(black_box(1), black_box(&responses), black_box(&questions)))
    });
}

criterion_group!(benches, bench_guttman, bench_person_fit, bench_full_session);
criterion_main!(benches);
