use std::collections::BTreeSet;

use ndarray::Array1;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use redeem_logistic::data_handling::row;
use redeem_logistic::encoding::{AdaptiveEncoding, Encoding, StandardEncoding, StatSettings};
use redeem_logistic::schema::Schema;
use redeem_logistic::trainer::triage;
use redeem_logistic::{Formula, Row, Value};

/// Three outcome classes, two high-cardinality variables, one continuous.
fn dataset() -> Vec<Row> {
    let mut rng = StdRng::seed_from_u64(42);
    (0..400)
        .map(|i| {
            let store = format!("s{}", rng.gen_range(0..25));
            let product = format!("p{}", i % 12);
            let price: f64 = rng.gen_range(-2.0..2.0);
            let outcome = ["low", "mid", "high"][rng.gen_range(0..3)];
            let mut r = row([
                ("outcome", Value::from(outcome)),
                ("store", Value::from(store)),
                ("product", Value::from(product)),
            ]);
            // some rows leave the continuous value out
            if i % 7 != 0 {
                r.insert("price".to_string(), Value::Num(price));
            }
            r
        })
        .collect()
}

fn setup(rows: &[Row]) -> (Schema, StandardEncoding, BTreeSet<String>) {
    let formula: Formula = "outcome ~ store + product + price".parse().unwrap();
    let schema = Schema::build(&formula, rows, None).unwrap();
    let standard = StandardEncoding::new(&schema, true);
    let flagged = triage(&schema, 10);
    (schema, standard, flagged)
}

fn random_coefficients(rng: &mut StdRng, len: usize) -> Array1<f64> {
    Array1::from_iter((0..len).map(|_| rng.gen_range(-1.5..1.5)))
}

fn assert_translation_is_exact(
    adaptive: &AdaptiveEncoding<'_>,
    standard: &StandardEncoding,
    coefficients: &Array1<f64>,
    rows: &[Row],
) {
    let translated = adaptive.translate_to(standard, coefficients).unwrap();
    assert_eq!(translated.len(), standard.coefficient_len());
    let mut queries: Vec<Row> = rows.to_vec();
    queries.push(row([("store", "never-seen")]));
    queries.push(Row::new());
    for r in &queries {
        let reduced = adaptive.predict_proba(r, coefficients);
        let full = standard.predict_proba(r, &translated);
        for (a, b) in reduced.iter().zip(&full) {
            assert!((a - b).abs() <= 1e-6, "{:?} vs {:?}", reduced, full);
        }
    }
}

#[test]
fn test_translation_fidelity_over_passes() {
    let rows = dataset();
    let (_, standard, flagged) = setup(&rows);
    assert_eq!(flagged.iter().map(String::as_str).collect::<Vec<_>>(), vec!["product", "store"]);

    let settings = StatSettings::new(1.0e-3, 250_000, rows.len());
    let mut rng = StdRng::seed_from_u64(23_626_236);
    let mut coefficient_rng = StdRng::seed_from_u64(7);

    let mut encoding = AdaptiveEncoding::build(&standard, &flagged, &rows, None, &settings, &mut rng).unwrap();
    // intercept + 2 statistics per flagged variable + price
    assert_eq!(encoding.dim(), 6);
    assert_eq!(standard.dim(), 1 + 25 + 12 + 1);

    for _ in 0..3 {
        let coefficients = random_coefficients(&mut coefficient_rng, encoding.coefficient_len());
        assert_translation_is_exact(&encoding, &standard, &coefficients, &rows);
        encoding = AdaptiveEncoding::build(
            &standard,
            &flagged,
            &rows,
            Some((&encoding, &coefficients)),
            &settings,
            &mut rng,
        )
        .unwrap();
    }
}

#[test]
fn test_refined_warm_start_keeps_predictions_for_untouched_rows() {
    let rows = dataset();
    let (_, standard, flagged) = setup(&rows);
    let settings = StatSettings::new(1.0e-3, 250_000, rows.len());
    let mut rng = StdRng::seed_from_u64(1);
    let first = AdaptiveEncoding::build(&standard, &flagged, &rows, None, &settings, &mut rng).unwrap();
    let coefficients = random_coefficients(&mut StdRng::seed_from_u64(3), first.coefficient_len());
    let second = AdaptiveEncoding::build(
        &standard,
        &flagged,
        &rows,
        Some((&first, &coefficients)),
        &settings,
        &mut rng,
    )
    .unwrap();

    // without any categorical value only the shared columns matter
    let bare = row([("price", Value::Num(0.75))]);
    let before = first.predict_proba(&bare, &coefficients);
    let after = second.predict_proba(&bare, second.warm_start());
    for (a, b) in before.iter().zip(&after) {
        assert!((a - b).abs() < 1e-12);
    }
}

#[test]
fn test_subsampled_statistics_still_translate_exactly() {
    let rows = dataset();
    let (schema, standard, flagged) = setup(&rows);
    let settings = StatSettings::new(1.0e-3, 100, schema.row_count);
    assert!(settings.sample_rate < 1.0);
    let mut rng = StdRng::seed_from_u64(5);
    let encoding = AdaptiveEncoding::build(&standard, &flagged, &rows, None, &settings, &mut rng).unwrap();
    let coefficients = random_coefficients(&mut StdRng::seed_from_u64(9), encoding.coefficient_len());
    assert_translation_is_exact(&encoding, &standard, &coefficients, &rows);
}
