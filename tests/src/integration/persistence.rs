//! # Persistence
//!
//! Flush markers across several databases, and an engine restarted from
//! the last completed flush of its pool.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use crate::harness::{init_tracing, AppliedBlock, Application, TestNode};
    use hx_01_flushable_kv::{
        DbProducer, KeyValueStore, KvError, MemoryProducer, PoolConfig, SyncedPool, DIRTY_PREFIX,
    };
    use shared_testkit::{gen_nodes, MemoryEventSource};
    use shared_types::{BaseEvent, Validators};

    fn names(of: &[&str]) -> Vec<String> {
        of.iter().map(|n| n.to_string()).collect()
    }

    fn pool_over(producer: &MemoryProducer) -> SyncedPool {
        SyncedPool::new(Arc::new(producer.clone()), PoolConfig::default())
    }

    #[test]
    fn test_dirty_marker_blocks_restart() {
        init_tracing();
        let producer = MemoryProducer::new();
        {
            let pool = pool_over(&producer);
            let db = pool.open_db("state").unwrap();
            for i in 0u32..50 {
                db.put(&i.to_be_bytes(), b"value").unwrap();
            }
            pool.flush(b"one").unwrap();
        }

        {
            let pool = pool_over(&producer);
            pool.initialize(&names(&["state"]), Some(b"one")).unwrap();
            let db = pool.open_db("state").unwrap();
            assert_eq!(db.get(&7u32.to_be_bytes()).unwrap(), Some(b"value".to_vec()));
        }

        // crash between the dirty and the clean marker
        let backend = producer.store("state").unwrap();
        backend.put(b"flushID", &[DIRTY_PREFIX, b't', b'w', b'o']).unwrap();

        let pool = pool_over(&producer);
        let err = pool.initialize(&names(&["state"]), None).unwrap_err();
        assert!(matches!(err, KvError::DirtyState { ref db, .. } if db == "state"), "{err}");
    }

    #[test]
    fn test_unflushed_writes_are_lost() {
        let producer = MemoryProducer::new();
        {
            let pool = pool_over(&producer);
            let a = pool.open_db("a").unwrap();
            let b = pool.open_db("b").unwrap();
            a.put(b"k", b"1").unwrap();
            b.put(b"k", b"1").unwrap();
            pool.flush(b"first").unwrap();
            a.put(b"k", b"2").unwrap();
            b.delete(b"k").unwrap();
        }

        let pool = pool_over(&producer);
        pool.initialize(&names(&["a", "b"]), Some(b"first")).unwrap();
        assert_eq!(pool.last_flush_id().unwrap(), Some(b"first".to_vec()));
        let a = pool.open_db("a").unwrap();
        let b = pool.open_db("b").unwrap();
        assert_eq!(a.get(b"k").unwrap(), Some(b"1".to_vec()));
        assert_eq!(b.get(b"k").unwrap(), Some(b"1".to_vec()));
    }

    #[test]
    fn test_diverging_markers_not_synced() {
        let producer = MemoryProducer::new();
        {
            let pool = pool_over(&producer);
            pool.open_db("a").unwrap().put(b"k", b"v").unwrap();
            pool.flush(b"x").unwrap();
        }
        {
            let pool = pool_over(&producer);
            pool.open_db("b").unwrap().put(b"k", b"v").unwrap();
            pool.flush(b"y").unwrap();
        }

        let pool = pool_over(&producer);
        let err = pool.initialize(&names(&["a", "b"]), None).unwrap_err();
        assert!(matches!(err, KvError::DbsNotSynced { .. }), "{err}");
    }

    /// Uninterrupted run producing the events and the blocks to compare with.
    fn reference_run(validators: &Validators, seed: u64) -> (Vec<BaseEvent>, Vec<AppliedBlock>) {
        let nodes = validators.sorted_ids().to_vec();
        let mut node = TestNode::genesis(1, validators, Application::new());
        let mut rng = StdRng::seed_from_u64(seed);
        let events = node.run_epoch(&nodes, &[], 50, 3, 0, &mut rng);
        (events, node.app.blocks())
    }

    #[test]
    fn test_restart_from_last_flush() {
        init_tracing();
        let validators = Validators::equal(&gen_nodes(4)).unwrap();
        let (events, expected) = reference_run(&validators, 51);
        let half = events.len() / 2;
        let producer = MemoryProducer::new();
        let source = MemoryEventSource::new();

        let flushed_blocks = {
            let pool = Arc::new(pool_over(&producer));
            let main = pool.open_db("main").unwrap();
            let app = Application::new();
            let mut node = TestNode::with_source(main, pool.clone(), source.clone(), app.clone());
            node.start_from(1, &validators).unwrap();
            for e in &events[..half] {
                node.feed(e).unwrap();
            }
            pool.flush(b"half").unwrap();
            let flushed = app.blocks();
            assert!(!flushed.is_empty());

            // processed but never flushed
            for e in &events[half..half + 20] {
                node.feed(e).unwrap();
            }
            flushed
        };

        let pool = Arc::new(pool_over(&producer));
        pool.initialize(&producer.names(), Some(b"half")).unwrap();
        let main = pool.open_db("main").unwrap();
        let app = Application::new();
        let mut node = TestNode::with_source(main, pool.clone(), source, app.clone());
        node.bootstrap().unwrap();
        assert_eq!(node.last_decided_frame(), flushed_blocks.last().unwrap().frame);
        assert!(app.blocks().is_empty(), "known roots decide nothing new");

        for e in &events[half..] {
            node.feed(e).unwrap();
        }
        let mut blocks = flushed_blocks;
        blocks.extend(app.blocks());
        assert_eq!(blocks, expected);
    }

    #[cfg(feature = "rocksdb")]
    #[test]
    fn test_restart_over_rocksdb() {
        use hx_01_flushable_kv::{RocksDbConfig, RocksDbProducer};

        init_tracing();
        let validators = Validators::equal(&gen_nodes(3)).unwrap();
        let (events, expected) = reference_run(&validators, 61);
        let dir = tempfile::tempdir().unwrap();
        let source = MemoryEventSource::new();
        let half = events.len() / 2;

        let open = || {
            let producer = Arc::new(RocksDbProducer::new(dir.path(), RocksDbConfig::for_testing()));
            let names = producer.names();
            let pool = Arc::new(SyncedPool::new(producer, PoolConfig::default()));
            (pool, names)
        };

        let first = {
            let (pool, _) = open();
            let main = pool.open_db("main").unwrap();
            let app = Application::new();
            let mut node = TestNode::with_source(main, pool.clone(), source.clone(), app.clone());
            node.start_from(1, &validators).unwrap();
            for e in &events[..half] {
                node.feed(e).unwrap();
            }
            pool.flush(b"rocks").unwrap();
            app.blocks()
        };

        let (pool, names) = open();
        pool.initialize(&names, Some(b"rocks")).unwrap();
        let main = pool.open_db("main").unwrap();
        let app = Application::new();
        let mut node = TestNode::with_source(main, pool.clone(), source, app.clone());
        node.bootstrap().unwrap();
        for e in &events[half..] {
            node.feed(e).unwrap();
        }

        let mut blocks = first;
        blocks.extend(app.blocks());
        assert_eq!(blocks, expected);
    }
}
