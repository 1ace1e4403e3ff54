#[cfg(test)]
mod tests {
    use crate::{
        error::ScanError,
        execution::{executor::ScanExecutor, request::ScanRequest},
        service::ChangeFeedService,
    };
    use connectors::memory::{FaultPlan, MemoryStore};
    use engine_config::settings::{UnavailableRangePolicy, validated::ValidatedSettings};
    use engine_core::retry::RetryPolicy;
    use engine_processing::error::EnumerationError;
    use model::{
        core::{
            identifiers::{CollectionRef, RangeId},
            watermark::{Watermark, parse_reference_zone},
        },
        pagination::continuation::ContinuationToken,
        records::{outcome::ScanOutcome, range::PartitionKeyRange},
    };
    use serde_json::{Value, json};
    use std::{collections::BTreeMap, sync::Arc, time::Duration};
    use tokio_util::sync::CancellationToken;
    use tracing_test::traced_test;

    fn coll() -> CollectionRef {
        CollectionRef::new("fhir", "resources")
    }

    fn doc(id: &str, resource_type: &str, ts: i64) -> Value {
        json!({"id": id, "resourceType": resource_type, "_ts": ts})
    }

    fn settings() -> ValidatedSettings {
        ValidatedSettings::default()
            .with_default_collection(coll())
            .with_retry(RetryPolicy::new(
                3,
                Duration::from_millis(1),
                Duration::from_millis(2),
            ))
    }

    fn store_with(partitions: Vec<Vec<Value>>) -> MemoryStore {
        let store = MemoryStore::new();
        for (i, documents) in partitions.into_iter().enumerate() {
            store.add_partition(
                &coll(),
                PartitionKeyRange::new(i.to_string(), "", ""),
                documents,
            );
        }
        store
    }

    fn executor(store: &MemoryStore, settings: ValidatedSettings) -> ScanExecutor {
        ScanExecutor::new(Arc::new(store.clone()), settings)
    }

    fn ts_of(outcome: &ScanOutcome) -> Vec<i64> {
        outcome.documents().iter().map(|d| d.ts).collect()
    }

    #[tokio::test]
    async fn test_results_keep_range_order_regardless_of_completion() {
        let store = store_with(vec![
            vec![doc("a", "Patient", 10), doc("b", "Patient", 20)],
            vec![doc("c", "Patient", 30)],
            vec![doc("d", "Patient", 40), doc("e", "Patient", 50)],
        ])
        .with_feed_page_size(1);

        for concurrency in [1, 2, 8] {
            let result = executor(&store, settings().with_concurrency(concurrency))
                .execute(ScanRequest::new("Patient"), CancellationToken::new())
                .await
                .unwrap();
            assert_eq!(ts_of(&result.outcome), vec![10, 20, 30, 40, 50]);
            assert_eq!(result.report.ranges.len(), 3);
        }
    }

    #[tokio::test]
    async fn test_watermark_is_converted_in_reference_zone() {
        let store = store_with(vec![vec![
            doc("a", "Patient", 18_000 - 1),
            doc("b", "Patient", 18_000),
        ]]);
        let new_york = parse_reference_zone("America/New_York").unwrap();
        let settings = settings().with_reference_zone(new_york);

        let result = executor(&store, settings)
            .execute(
                ScanRequest::new("Patient").since("1970-01-01T00:00:00".parse().unwrap()),
                CancellationToken::new(),
            )
            .await
            .unwrap();

        assert_eq!(result.report.watermark_seconds, Some(18_000));
        assert_eq!(ts_of(&result.outcome), vec![18_000]);
    }

    #[traced_test]
    #[tokio::test]
    async fn test_skip_policy_keeps_other_ranges() {
        let store = store_with(vec![
            vec![doc("a", "Patient", 100)],
            vec![doc("b", "Patient", 200)],
        ]);
        store.set_available(&coll(), &RangeId::from("0"), false);

        let result = executor(&store, settings())
            .execute(ScanRequest::new("Patient"), CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(ts_of(&result.outcome), vec![200]);
        assert!(!result.report.not_found);
        assert_eq!(
            result.report.unavailable_ranges().collect::<Vec<_>>(),
            vec![&RangeId::from("0")]
        );
        assert_eq!(result.report.metrics.ranges_unavailable, 1);
        assert!(logs_contain("Change feed unavailable"));
    }

    #[tokio::test]
    async fn test_abort_policy_discards_earlier_matches() {
        let store = store_with(vec![
            vec![doc("a", "Patient", 100)],
            vec![doc("b", "Patient", 200)],
            vec![doc("c", "Patient", 300)],
        ]);
        store.set_available(&coll(), &RangeId::from("1"), false);
        let settings = settings()
            .with_concurrency(1)
            .with_unavailable_range_policy(UnavailableRangePolicy::Abort);

        let result = executor(&store, settings)
            .execute(ScanRequest::new("Patient"), CancellationToken::new())
            .await
            .unwrap();

        assert!(result.outcome.is_not_found());
        assert!(result.report.not_found);
        assert_eq!(result.report.ranges.len(), 2);
    }

    #[tokio::test]
    async fn test_all_ranges_unavailable_is_not_found() {
        let store = store_with(vec![vec![doc("a", "Patient", 1)], vec![]]);
        store.set_available(&coll(), &RangeId::from("0"), false);
        store.set_available(&coll(), &RangeId::from("1"), false);

        let result = executor(&store, settings())
            .execute(ScanRequest::new("Patient"), CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(result.outcome, ScanOutcome::NotFound);
    }

    #[tokio::test]
    async fn test_nothing_matching_is_an_empty_success() {
        let store = store_with(vec![vec![doc("a", "Observation", 500)]]);

        let result = executor(&store, settings())
            .execute(ScanRequest::new("Patient"), CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(result.outcome, ScanOutcome::Found(vec![]));
    }

    #[tokio::test]
    async fn test_invalid_requests_fail_before_io() {
        let store = store_with(vec![vec![]]);

        let err = executor(&store, settings())
            .execute(ScanRequest::new(""), CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ScanError::InvalidRequest(_)));

        let err = executor(&store, ValidatedSettings::default())
            .execute(ScanRequest::new("Patient"), CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ScanError::InvalidRequest(_)));

        let valid = executor(&store, settings())
            .execute(
                ScanRequest::new("Patient").since(Watermark::EpochSeconds(0)),
                CancellationToken::new(),
            )
            .await;
        assert!(valid.is_ok());

        assert_eq!(store.listing_calls(), 1);
    }

    #[tokio::test]
    async fn test_zero_ranges_is_an_enumeration_error() {
        let store = MemoryStore::new();
        store.create_collection(&coll());

        let err = executor(&store, settings())
            .execute(ScanRequest::new("Patient"), CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ScanError::RangeEnumeration(EnumerationError::NoRanges(_))
        ));
    }

    #[tokio::test]
    async fn test_resume_tokens_skip_history() {
        let store = store_with(vec![
            vec![doc("a", "Patient", 10), doc("b", "Patient", 20)],
            vec![doc("c", "Patient", 30)],
        ]);
        let first = executor(&store, settings())
            .execute(ScanRequest::new("Patient"), CancellationToken::new())
            .await
            .unwrap();
        let tokens = first.report.continuations();
        assert_eq!(tokens.len(), 2);

        store
            .upsert_document(&coll(), &RangeId::from("0"), doc("d", "Patient", 40))
            .unwrap();

        let second = executor(&store, settings())
            .execute(
                ScanRequest::new("Patient").resume_from(tokens),
                CancellationToken::new(),
            )
            .await
            .unwrap();
        assert_eq!(ts_of(&second.outcome), vec![40]);
    }

    #[tokio::test]
    async fn test_bad_resume_token_fails_the_scan() {
        let store = store_with(vec![vec![doc("a", "Patient", 10)]]);
        let tokens = BTreeMap::from([(RangeId::from("0"), ContinuationToken::new("bogus"))]);

        let err = executor(&store, settings())
            .execute(
                ScanRequest::new("Patient").resume_from(tokens),
                CancellationToken::new(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ScanError::Feed(_)));
    }

    #[tokio::test]
    async fn test_cancellation_surfaces_no_partial_result() {
        let store = store_with(vec![
            vec![doc("a", "Patient", 10)],
            vec![doc("b", "Patient", 20)],
        ])
        .with_faults(FaultPlan {
            page_delay: Some(Duration::from_secs(5)),
            ..Default::default()
        });
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.cancel();
        });

        let err = executor(&store, settings())
            .execute(ScanRequest::new("Patient"), cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, ScanError::Cancelled));
    }

    #[tokio::test]
    async fn test_timeout() {
        let store = store_with(vec![vec![doc("a", "Patient", 10)]]).with_faults(FaultPlan {
            page_delay: Some(Duration::from_secs(5)),
            ..Default::default()
        });
        let settings = settings().with_timeout(Some(Duration::from_millis(20)));

        let err = executor(&store, settings)
            .execute(ScanRequest::new("Patient"), CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ScanError::TimedOut(_)));
    }

    #[tokio::test]
    async fn test_service_uses_default_collection() {
        let store = store_with(vec![
            vec![
                doc("a", "Patient", 100),
                doc("b", "Patient", 200),
                doc("c", "Observation", 300),
            ],
            vec![doc("d", "Patient", 50)],
        ]);
        let service = ChangeFeedService::new(
            Arc::new(store.clone()),
            settings(),
            CancellationToken::new(),
        );

        let outcome = service
            .get_new_or_modified_documents(None, "Patient", Some(Watermark::EpochSeconds(100)))
            .await
            .unwrap();
        assert_eq!(ts_of(&outcome), vec![100, 200]);

        let everything = service
            .get_new_or_modified_documents(Some(coll()), "Patient", None)
            .await
            .unwrap();
        assert_eq!(ts_of(&everything), vec![100, 200, 50]);
    }
}
