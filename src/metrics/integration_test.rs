//! Integration test for decode -> aggregate

#[cfg(test)]
mod integration_tests {
    use crate::metrics::{CounterKind, MetricsStore, Series};
    use crate::receiver::metrics::decode_metrics;

    fn token_payload(input: u64, output: u64) -> String {
        format!(
            r#"{{"resourceMetrics":[{{"scopeMetrics":[{{"metrics":[
                {{"name":"claude_code.token.usage","sum":{{"dataPoints":[
                    {{"asInt":"{input}","attributes":[{{"key":"type","value":{{"stringValue":"input"}}}}]}},
                    {{"asInt":"{output}","attributes":[{{"key":"type","value":{{"stringValue":"output"}}}}]}}
                ]}}}}
            ]}}]}}]}}"#
        )
    }

    #[test]
    fn test_full_metrics_integration() {
        let mut store = MetricsStore::new();

        // Exporter reports 100 -> 250, restarts, then 40 -> 90
        for (input, output) in [(100, 10), (250, 20), (40, 5), (90, 15)] {
            let points = decode_metrics(token_payload(input, output).as_bytes());
            assert_eq!(points.len(), 2);
            store.ingest(&points);
        }

        let input = Series::Counter(CounterKind::InputTokens);
        let output = Series::Counter(CounterKind::OutputTokens);
        assert_eq!(store.samples(input), vec![100.0, 250.0, 290.0, 340.0]);
        assert_eq!(store.samples(output), vec![10.0, 20.0, 25.0, 35.0]);
        assert_eq!(store.total(input), 340.0);
    }

    #[test]
    fn test_history_capped_across_many_batches() {
        let mut store = MetricsStore::new();

        for i in 1..=40u64 {
            let points = decode_metrics(token_payload(i * 10, i).as_bytes());
            store.ingest(&points);
        }

        let history = store.history(Series::Counter(CounterKind::InputTokens));
        assert_eq!(history.len(), 30);
        assert_eq!(history.latest(), Some(400.0));
        assert_eq!(history.samples()[0], 110.0);
    }
}
