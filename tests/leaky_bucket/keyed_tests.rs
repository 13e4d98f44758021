// tests/leaky_bucket/keyed_tests.rs

#[cfg(test)]
mod tests {

    use crate::fixtures::test_clock::TestClock;
    use leaky_limiter::{KeyedLeakyBucket, LeakyBucketConfig};

    #[test]
    fn multiple_clients_independent() {
        let clock = TestClock::new(0.0);
        let config = LeakyBucketConfig::new(1.0, 1.0); // one unit, 1 unit/sec
        let limiter = KeyedLeakyBucket::with_config(config, clock.clone()).unwrap();

        // Both clients' first requests should be allowed
        assert!(limiter.allow("client1").unwrap());
        assert!(limiter.allow("client2").unwrap());

        // Both clients' immediate second requests should be blocked
        assert!(!limiter.allow("client1").unwrap());
        assert!(!limiter.allow("client2").unwrap());

        // After 1 second, both should be allowed again
        clock.set_time(1.0);
        assert!(limiter.allow("client1").unwrap());
        assert!(limiter.allow("client2").unwrap());

        // Client3 (new client) should be allowed even though others are blocked
        assert!(!limiter.allow("client1").unwrap());
        assert!(limiter.allow("client3").unwrap());
    }

    #[test]
    fn keyed_bucket_follows_single_bucket_semantics() {
        let clock = TestClock::new(0.0);
        let limiter = KeyedLeakyBucket::new(10.0, 2.0, clock.clone()).unwrap();
        let client = "client1".to_string();

        for _ in 0..10 {
            assert!(limiter.allow(client.clone()).unwrap());
        }
        assert!(!limiter.allow(client.clone()).unwrap());

        clock.advance(1.0);
        assert!(limiter.allow(client.clone()).unwrap());
        assert!(limiter.allow(client.clone()).unwrap());
        assert!(!limiter.allow(client).unwrap());
    }

    #[test]
    fn weighted_cost_per_key() {
        let limiter = KeyedLeakyBucket::new(5.0, 1.0, TestClock::new(0.0)).unwrap();

        assert!(limiter.allow_cost(1u64, 5.0).unwrap());
        assert!(!limiter.allow_cost(1u64, 0.5).unwrap());
        assert!(limiter.allow_cost(2u64, 4.5).unwrap());

        let decision = limiter.check_cost(2u64, 1.0).unwrap();
        assert!(!decision.allowed);
        assert!((decision.retry_after_seconds.unwrap() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn check_reports_metadata_per_key() {
        let limiter = KeyedLeakyBucket::new(3.0, 1.0, TestClock::new(0.0)).unwrap();

        let first = limiter.check("a").unwrap();
        assert!(first.allowed);
        assert_eq!(first.remaining_capacity, 2.0);

        let other = limiter.check("b").unwrap();
        assert_eq!(other.level, 1.0);
    }

    #[test]
    fn peek_never_creates_buckets() {
        let clock = TestClock::new(0.0);
        let limiter = KeyedLeakyBucket::new(4.0, 1.0, clock.clone()).unwrap();

        assert_eq!(limiter.peek_level(&"ghost").unwrap(), None);
        assert!(limiter.is_empty());

        limiter.allow_cost("real", 3.0).unwrap();
        clock.advance(1.0);
        assert_eq!(limiter.peek_level(&"real").unwrap(), Some(2.0));
        assert_eq!(limiter.len(), 1);
    }

    #[test]
    fn remove_resets_a_key() {
        let limiter = KeyedLeakyBucket::new(1.0, 0.001, TestClock::new(0.0)).unwrap();

        assert!(limiter.allow("client1").unwrap());
        assert!(!limiter.allow("client1").unwrap());

        assert!(limiter.remove(&"client1"));
        assert!(!limiter.contains_key(&"client1"));
        assert!(limiter.allow("client1").unwrap());
    }
}
