//! # End-to-End Scenarios
//!
//! Random DAGs driven through the whole engine: honest and forking
//! validators, epoch sealing by the application, reset to a later epoch.

#[cfg(test)]
mod tests {
    use std::collections::{BTreeSet, HashMap, HashSet};

    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use crate::harness::{init_tracing, AppliedBlock, Application, TestNode};
    use hx_04_abft::AbftError;
    use shared_testkit::gen_nodes;
    use shared_types::{BaseEvent, Epoch, EventId, Seq, ValidatorId, Validators};

    /// Validators with two or more distinct events of the same seq among
    /// `head` and its ancestors.
    fn forked_in_past(events: &[BaseEvent], head: &EventId) -> BTreeSet<ValidatorId> {
        let by_id: HashMap<EventId, &BaseEvent> = events.iter().map(|e| (e.id, e)).collect();
        let mut seen: HashSet<EventId> = HashSet::new();
        let mut seqs: HashMap<(ValidatorId, Seq), usize> = HashMap::new();
        let mut stack = vec![*head];
        while let Some(id) = stack.pop() {
            if !seen.insert(id) {
                continue;
            }
            let e = by_id[&id];
            *seqs.entry((e.creator, e.seq)).or_default() += 1;
            stack.extend(e.parents.iter().copied());
        }
        seqs.into_iter()
            .filter(|(_, count)| *count > 1)
            .map(|((creator, _), _)| creator)
            .collect()
    }

    fn assert_consecutive_frames(blocks: &[AppliedBlock]) {
        for pair in blocks.windows(2) {
            assert_eq!(pair[1].frame, pair[0].frame + 1, "gap after frame {}", pair[0].frame);
        }
    }

    fn assert_cheaters_match_dag(blocks: &[AppliedBlock], events: &[BaseEvent], validators: &Validators) {
        for block in blocks {
            let forked = forked_in_past(events, &block.atropos);
            let expected: Vec<ValidatorId> = validators
                .sorted_ids()
                .iter()
                .copied()
                .filter(|v| forked.contains(v))
                .collect();
            assert_eq!(block.cheaters, expected, "frame {}", block.frame);
        }
    }

    fn assert_each_event_confirmed_once(blocks: &[AppliedBlock]) {
        let mut confirmed = HashSet::new();
        for block in blocks {
            assert_eq!(block.events.first(), Some(&block.atropos), "atropos applied first");
            for id in &block.events {
                assert!(confirmed.insert(*id), "{id:?} confirmed twice");
            }
        }
    }

    #[test]
    fn test_single_validator_decides_each_frame() {
        init_tracing();
        let nodes = gen_nodes(1);
        let validators = Validators::equal(&nodes).unwrap();
        let mut node = TestNode::genesis(1, &validators, Application::new());
        let mut rng = StdRng::seed_from_u64(7);

        let events = node.run_epoch(&nodes, &[], 200, 1, 0, &mut rng);
        assert_eq!(events.len(), 200);

        let blocks = node.app.blocks();
        assert!(blocks.len() >= 40, "only {} blocks", blocks.len());
        assert_eq!(blocks[0].frame, 1);
        assert_consecutive_frames(&blocks);
        assert!(blocks.iter().all(|b| b.cheaters.is_empty()));
        // a lone chain confirms exactly its atropos per frame
        assert!(blocks.iter().all(|b| b.events == vec![b.atropos]));
        assert_eq!(node.last_decided_frame(), 198);
    }

    #[test]
    fn test_honest_validators_confirm_everything_below_last_atropos() {
        init_tracing();
        let nodes = gen_nodes(5);
        let validators = Validators::equal(&nodes).unwrap();
        let mut node = TestNode::genesis(1, &validators, Application::new());
        let mut rng = StdRng::seed_from_u64(11);

        let events = node.run_epoch(&nodes, &[], 60, 3, 0, &mut rng);
        let blocks = node.app.blocks();
        assert!(blocks.len() > 5);
        assert_consecutive_frames(&blocks);
        assert_each_event_confirmed_once(&blocks);
        assert!(blocks.iter().all(|b| b.cheaters.is_empty()));

        // everything an atropos observes is confirmed no later than its block
        let confirmed: HashSet<EventId> = blocks.iter().flat_map(|b| b.events.clone()).collect();
        let by_id: HashMap<EventId, &BaseEvent> = events.iter().map(|e| (e.id, e)).collect();
        let last = blocks.last().unwrap().atropos;
        let mut seen: HashSet<EventId> = HashSet::new();
        let mut stack = vec![last];
        while let Some(id) = stack.pop() {
            if !seen.insert(id) {
                continue;
            }
            assert!(confirmed.contains(&id), "{id:?} observed by the last atropos");
            stack.extend(by_id[&id].parents.iter().copied());
        }
    }

    #[test]
    fn test_single_cheater_with_minority_weight() {
        init_tracing();
        let nodes = gen_nodes(2);
        let validators = Validators::new([(nodes[0], 33), (nodes[1], 67)]).unwrap();
        let cheaters = [nodes[0]];

        for seed in 0..3 {
            let mut node = TestNode::genesis(1, &validators, Application::new());
            let mut rng = StdRng::seed_from_u64(seed);
            let events = node.run_epoch(&nodes, &cheaters, 100, 2, 10, &mut rng);

            let blocks = node.app.blocks();
            assert!(!blocks.is_empty(), "seed {seed}: nothing decided");
            assert_consecutive_frames(&blocks);
            assert_each_event_confirmed_once(&blocks);
            for block in &blocks {
                assert!(block.cheaters.iter().all(|c| cheaters.contains(c)));
            }
            assert_cheaters_match_dag(&blocks, &events, &validators);
        }
    }

    #[test]
    fn test_many_cheaters_with_minority_weight() {
        init_tracing();
        let nodes = gen_nodes(4);
        let validators =
            Validators::new([(nodes[0], 11), (nodes[1], 11), (nodes[2], 11), (nodes[3], 67)]).unwrap();
        let cheaters = &nodes[..3];

        for seed in 0..3 {
            let mut node = TestNode::genesis(1, &validators, Application::new());
            let mut rng = StdRng::seed_from_u64(100 + seed);
            let events = node.run_epoch(&nodes, cheaters, 80, 3, 10, &mut rng);

            let blocks = node.app.blocks();
            assert!(!blocks.is_empty(), "seed {seed}: nothing decided");
            assert_consecutive_frames(&blocks);
            assert_each_event_confirmed_once(&blocks);
            for block in &blocks {
                assert!(block.cheaters.len() <= cheaters.len());
                assert!(block.cheaters.iter().all(|c| cheaters.contains(c)));
            }
            assert_cheaters_match_dag(&blocks, &events, &validators);
        }
    }

    #[test]
    fn test_epoch_sealed_at_frame() {
        init_tracing();
        let nodes = gen_nodes(4);
        let validators = Validators::equal(&nodes).unwrap();
        let next = Validators::new(nodes.iter().map(|&v| (v, v))).unwrap();
        let sealed = next.clone();
        let app = Application::sealing(move |epoch: Epoch, block| {
            (epoch == 1 && block.frame == 5).then(|| sealed.clone())
        });
        let mut node = TestNode::genesis(1, &validators, app);
        let mut rng = StdRng::seed_from_u64(3);

        let epoch1 = node.run_epoch(&nodes, &[], 100, 3, 0, &mut rng);
        assert!(epoch1.len() < 400, "generator stops at the seal");
        assert_eq!(node.epoch(), 2);
        assert_eq!(node.last_decided_frame(), 0);
        assert_eq!(node.lachesis.validators().unwrap(), next);
        assert_eq!(node.app.loaded_epochs(), vec![1, 2]);

        let blocks = node.app.blocks_of(1);
        assert_eq!(blocks.len(), 5);
        assert_eq!(blocks.last().unwrap().frame, 5);

        let stale = epoch1.last().unwrap().clone();
        assert!(matches!(
            node.feed(&stale),
            Err(AbftError::NotRelevant { event_epoch: 1, .. })
        ));

        node.run_epoch(&nodes, &[], 40, 3, 0, &mut rng);
        let blocks = node.app.blocks_of(2);
        assert!(!blocks.is_empty());
        assert_eq!(blocks[0].frame, 1);
        assert_consecutive_frames(&blocks);
    }

    fn validators_for(nodes: &[ValidatorId], epoch: Epoch) -> Validators {
        Validators::new(nodes.iter().map(|&v| (v, 1 + (v + epoch) % 3))).unwrap()
    }

    #[test]
    fn test_reset_joins_late_epoch() {
        init_tracing();
        let nodes = gen_nodes(4);
        let seal_nodes = nodes.clone();
        let app = Application::sealing(move |epoch: Epoch, block| {
            (epoch < 5 && block.frame == 3).then(|| validators_for(&seal_nodes, epoch + 1))
        });
        let mut a = TestNode::genesis(1, &validators_for(&nodes, 1), app);
        let mut rng = StdRng::seed_from_u64(5);

        let mut last_epoch = Vec::new();
        for epoch in 1..=5 {
            assert_eq!(a.epoch(), epoch);
            last_epoch = a.run_epoch(&nodes, &[], 60, 3, 0, &mut rng);
        }
        assert_eq!(a.epoch(), 5);
        assert_eq!(a.app.loaded_epochs(), vec![1, 2, 3, 4, 5]);
        for epoch in 1..5 {
            let frames: Vec<_> = a.app.blocks_of(epoch).iter().map(|b| b.frame).collect();
            assert_eq!(frames, vec![1, 2, 3], "epoch {epoch}");
        }
        let a_blocks = a.app.blocks_of(5);
        assert!(!a_blocks.is_empty());

        let mut b = TestNode::genesis(1, &validators_for(&nodes, 1), Application::new());
        b.lachesis.reset(5, validators_for(&nodes, 5)).unwrap();
        for e in &last_epoch {
            b.feed(e).unwrap();
        }

        assert_eq!(b.last_decided_frame(), a.last_decided_frame());
        assert_eq!(
            b.lachesis.store().get_epoch_state().unwrap(),
            a.lachesis.store().get_epoch_state().unwrap()
        );
        assert_eq!(b.app.blocks_of(5), a_blocks);
        assert!(b.app.blocks_of(1).is_empty());
    }
}
