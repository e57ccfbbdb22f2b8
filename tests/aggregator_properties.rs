use std::collections::HashSet;

use proptest::prelude::*;
use restaurant_daka::records::VisitRecord;
use restaurant_daka::stats::{
    RecordFilter, average_score, most_common_type, restaurant_average_scores, top_restaurants,
};

const NAMES: &[&str] = &["海底捞", "小四川", "A", "a", "A ", "川味坊"];
const TYPES: &[&str] = &["火锅", "川菜", "粤菜"];

fn arb_records() -> impl Strategy<Value = Vec<VisitRecord>> {
    proptest::collection::vec(
        (0..NAMES.len(), 0..TYPES.len(), 1..=28u32, 0..=100u32),
        0..40,
    )
    .prop_map(|rows| {
        rows.into_iter()
            .enumerate()
            .map(|(i, (name, category, day, score))| VisitRecord {
                id: i as u64 + 1,
                name: NAMES[name].to_string(),
                category: TYPES[category].to_string(),
                date: format!("2023-10-{day:02}"),
                score: score as f64 / 10.0,
                comment: String::new(),
                image_path: None,
            })
            .collect()
    })
}

proptest! {
    #[test]
    fn prop_unfiltered_average_is_mean(records in arb_records()) {
        let expected = if records.is_empty() {
            0.0
        } else {
            records.iter().map(|r| r.score).sum::<f64>() / records.len() as f64
        };
        prop_assert!((average_score(&records, &RecordFilter::new()) - expected).abs() < 1e-9);
    }

    #[test]
    fn prop_grouping_conserves_score_mass(records in arb_records()) {
        let total: f64 = records.iter().map(|r| r.score).sum();
        let regrouped: f64 = restaurant_average_scores(&records)
            .iter()
            .map(|s| {
                let count = records.iter().filter(|r| r.name == s.name).count();
                count as f64 * s.average
            })
            .sum();
        prop_assert!((total - regrouped).abs() < 1e-6);
    }

    #[test]
    fn prop_ranking_sorted_with_one_entry_per_name(records in arb_records()) {
        let scores = restaurant_average_scores(&records);

        for pair in scores.windows(2) {
            prop_assert!(pair[0].average >= pair[1].average);
        }

        let distinct: HashSet<&str> = records.iter().map(|r| r.name.as_str()).collect();
        let ranked: HashSet<&str> = scores.iter().map(|s| s.name.as_str()).collect();
        prop_assert_eq!(scores.len(), distinct.len());
        prop_assert_eq!(ranked, distinct);
    }

    #[test]
    fn prop_top_is_prefix_of_filtered_ranking(
        records in arb_records(),
        limit in 0..10usize,
        category in proptest::option::of(0..TYPES.len()),
    ) {
        let category = category.map(|i| TYPES[i]);
        let filtered: Vec<VisitRecord> = records
            .iter()
            .filter(|r| category.is_none_or(|c| r.category == c))
            .cloned()
            .collect();
        let full = restaurant_average_scores(&filtered);

        let top = top_restaurants(&records, limit, category);
        prop_assert_eq!(top.len(), limit.min(full.len()));
        prop_assert_eq!(&top[..], &full[..top.len()]);
    }

    #[test]
    fn prop_calls_are_idempotent(records in arb_records()) {
        prop_assert_eq!(
            average_score(&records, &RecordFilter::new()).to_bits(),
            average_score(&records, &RecordFilter::new()).to_bits()
        );
        prop_assert_eq!(restaurant_average_scores(&records), restaurant_average_scores(&records));
        prop_assert_eq!(most_common_type(&records, None), most_common_type(&records, None));
        prop_assert_eq!(top_restaurants(&records, 3, None), top_restaurants(&records, 3, None));
    }
}

#[test]
fn test_single_type_dataset_label() {
    let records: Vec<VisitRecord> = (1..=4)
        .map(|i| VisitRecord {
            id: i,
            name: format!("店{i}"),
            category: "粤菜".into(),
            date: "2023-10-01".into(),
            score: 7.0,
            comment: String::new(),
            image_path: None,
        })
        .collect();
    assert_eq!(most_common_type(&records, None), "粤菜 (4次)");
}
