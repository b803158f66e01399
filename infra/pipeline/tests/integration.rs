pub mod fixtures;

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use conduit_pipeline::*;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Sample {
        sensor: String,
        value: f64,
    }

    #[tokio::test]
    async fn test_empty_pipeline_is_identity() {
        let pipeline = Pipeline::<i64>::new();
        assert!(pipeline.is_empty());
        assert_eq!(pipeline.process(7).await.unwrap(), Some(7));
    }

    #[tokio::test]
    async fn test_stages_run_in_insertion_order() {
        let pipeline = Pipeline::<i64>::new()
            .add(map("add-one", |n: i64| n + 1))
            .add(map("double", |n: i64| n * 2));

        assert_eq!(pipeline.process(3).await.unwrap(), Some(8));
        assert_eq!(pipeline.stage_names(), vec!["add-one", "double"]);
    }

    #[tokio::test]
    async fn test_error_short_circuits_later_stages() {
        let counter = Counter::new();
        let pipeline = Pipeline::<i64>::new()
            .add(map("add-one", |n: i64| n + 1))
            .add(Reject("too cold"))
            .add(counter.clone());

        let err = pipeline.process(1).await.unwrap_err();

        assert_eq!(err.stage(), Some(1));
        assert!(matches!(err, PipelineError::Stage { .. }));
        let source = err.stage_error().and_then(|e| e.downcast_ref::<Rejected>());
        assert_eq!(source, Some(&Rejected("too cold")));
        assert_eq!(counter.calls(), 0, "stages after a failure must not run");
    }

    #[tokio::test]
    async fn test_dropped_value_ends_run_without_error() {
        let counter = Counter::new();
        let pipeline = Pipeline::<i64>::new()
            .add(keep_if("positive", |n: &i64| *n > 0))
            .add(counter.clone());

        assert_eq!(pipeline.process(-5).await.unwrap(), None);
        assert_eq!(counter.calls(), 0);

        assert_eq!(pipeline.process(5).await.unwrap(), Some(5));
        assert_eq!(counter.calls(), 1);
    }

    #[tokio::test]
    async fn test_panicking_stage_becomes_error() {
        let counter = Counter::new();
        let pipeline = Pipeline::<i64>::new().add(Explode).add(counter.clone());

        let err = pipeline.process(9).await.unwrap_err();

        match &err {
            PipelineError::Panicked { stage, filter, message, .. } => {
                assert_eq!(*stage, 0);
                assert_eq!(filter, "explode");
                assert_eq!(message, "cannot handle 9");
            },
            other => panic!("expected a panic error, got {other:?}"),
        }
        assert_eq!(counter.calls(), 0);
    }

    #[tokio::test]
    async fn test_add_leaves_original_untouched() {
        let base = Pipeline::<i64>::new().add(map("add-one", |n: i64| n + 1));
        let extended = base.add(map("double", |n: i64| n * 2));

        assert_eq!(base.len(), 1);
        assert_eq!(extended.len(), 2);
        assert_eq!(base.process(1).await.unwrap(), Some(2));
        assert_eq!(extended.process(1).await.unwrap(), Some(4));
    }

    #[tokio::test]
    async fn test_pipeline_is_reusable_after_failure() {
        let pipeline = Pipeline::<String>::new().add(ParseInt);

        assert!(pipeline.process("abc".to_owned()).await.is_err());
        assert_eq!(pipeline.process(" 42 ".to_owned()).await.unwrap(), Some(42));
    }

    #[tokio::test]
    async fn test_parse_int_scenario() {
        let pipeline = Pipeline::<String>::new().add(ParseInt);

        assert_eq!(pipeline.process("42".to_owned()).await.unwrap(), Some(42));

        let err = pipeline.process("abc".to_owned()).await.unwrap_err();
        assert_eq!(err.stage(), Some(0));
        assert!(err.to_string().contains("parse-int"));
        assert!(
            err.stage_error().is_some_and(|e| e.is::<std::num::ParseIntError>()),
            "the parse error must be reachable"
        );
    }

    #[tokio::test]
    async fn test_from_fn_accepts_string_errors() {
        let pipeline = Pipeline::<i64>::new().add(from_fn("even-only", |n: i64| {
            if n % 2 == 0 { Ok(Some(n)) } else { Err(format!("{n} is odd")) }
        }));

        assert_eq!(pipeline.process(4).await.unwrap(), Some(4));
        let err = pipeline.process(3).await.unwrap_err();
        assert!(err.to_string().ends_with("3 is odd"), "{err}");
    }

    #[tokio::test]
    async fn test_async_filters_are_awaited() {
        let pipeline = Pipeline::<i64>::new().add(SlowIncrement).add(SlowIncrement);
        assert_eq!(pipeline.process(0).await.unwrap(), Some(2));
    }

    #[tokio::test]
    async fn test_json_round_trip_through_stages() {
        let decode = Pipeline::<String>::new().add(JsonDecode::<Sample>::new());
        let sample = decode
            .process(r#"{"sensor":"temp","value":72.5}"#.to_owned())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(sample, Sample { sensor: "temp".into(), value: 72.5 });

        let encode = Pipeline::<Sample>::new().add(JsonEncode::new());
        let bytes = encode.process(sample).await.unwrap().unwrap();
        let back = Pipeline::<Vec<u8>>::new().add(JsonDecode::<Sample>::new());
        assert_eq!(back.process(bytes).await.unwrap().unwrap().sensor, "temp");
    }

    #[tokio::test]
    async fn test_malformed_json_fails_the_stage() {
        let decode = Pipeline::<String>::new().add(JsonDecode::<Sample>::new());
        let err = decode.process("{not json".to_owned()).await.unwrap_err();
        assert!(err.stage_error().is_some_and(|e| e.is::<serde_json::Error>()));
    }

    #[tokio::test]
    async fn test_nested_pipeline_acts_as_filter() {
        let inner = Pipeline::<String>::new().add(ParseInt);
        let outer = Pipeline::<String>::new()
            .add(map("trim", |s: String| s.trim().to_owned()))
            .add(inner)
            .add(map("negate", |n: i64| -n));

        assert_eq!(outer.process(" 5 ".to_owned()).await.unwrap(), Some(-5));
        assert_eq!(outer.stage_names()[1], "pipeline[parse-int]");

        let err = outer.process("x".to_owned()).await.unwrap_err();
        assert_eq!(err.stage(), Some(1), "outer pipeline reports the nested stage");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_runs_share_one_pipeline() {
        let pipeline = Pipeline::<i64>::new().add(SlowIncrement).add(map("square", |n: i64| n * n));

        let handles: Vec<_> = (0..32)
            .map(|n| {
                let pipeline = pipeline.clone();
                tokio::spawn(async move { pipeline.process(n).await })
            })
            .collect();

        for (n, handle) in (0..32_i64).zip(handles) {
            assert_eq!(handle.await.unwrap().unwrap(), Some((n + 1) * (n + 1)));
        }
    }

    mod properties {
        use conduit_pipeline::{Pipeline, map};
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn test_chain_of_increments(start in -1_000_i64..1_000, len in 0_usize..16) {
                let mut pipeline = Pipeline::<i64>::new();
                for _ in 0..len {
                    pipeline = pipeline.add(map("inc", |n: i64| n + 1));
                }
                let out = futures::executor::block_on(pipeline.process(start)).unwrap();
                prop_assert_eq!(out, Some(start + i64::try_from(len).unwrap()));
            }
        }
    }
}
