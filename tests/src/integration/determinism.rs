//! # Order Independence
//!
//! Every node that receives the same events decides the same blocks,
//! whatever the arrival order, as long as parents come first.

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use crate::harness::{init_tracing, AppliedBlock, Application, TestNode};
    use shared_testkit::{gen_nodes, shuffle_parents_first};
    use shared_types::{BaseEvent, Validators};

    fn replay(validators: &Validators, events: &[BaseEvent]) -> Vec<AppliedBlock> {
        let mut node = TestNode::genesis(1, validators, Application::new());
        for e in events {
            node.feed(e)
                .unwrap_or_else(|err| panic!("{:?} rejected on replay: {err}", e.id));
        }
        node.app.blocks()
    }

    fn assert_same_order(validators: &Validators, reference: &TestNode, seed: u64) {
        let expected = reference.app.blocks();
        assert!(!expected.is_empty());

        let mut rng = StdRng::seed_from_u64(seed);
        for round in 0..4 {
            let shuffled = shuffle_parents_first(&reference.processed, &mut rng);
            let blocks = replay(validators, &shuffled);
            assert_eq!(blocks.len(), expected.len(), "round {round}");
            for (got, want) in blocks.iter().zip(&expected) {
                assert_eq!(got, want, "round {round}, frame {}", want.frame);
            }
        }
    }

    #[test]
    fn test_honest_dag_any_order() {
        init_tracing();
        let nodes = gen_nodes(5);
        let validators = Validators::equal(&nodes).unwrap();
        let mut reference = TestNode::genesis(1, &validators, Application::new());
        let mut rng = StdRng::seed_from_u64(21);
        reference.run_epoch(&nodes, &[], 40, 3, 0, &mut rng);

        assert_same_order(&validators, &reference, 22);
    }

    #[test]
    fn test_forked_dag_any_order() {
        init_tracing();
        let nodes = gen_nodes(5);
        let validators = Validators::new(nodes.iter().map(|&v| (v, if v == nodes[0] { 10 } else { 20 }))).unwrap();
        let mut reference = TestNode::genesis(1, &validators, Application::new());
        let mut rng = StdRng::seed_from_u64(31);
        reference.run_epoch(&nodes, &nodes[..1], 40, 3, 5, &mut rng);

        assert_same_order(&validators, &reference, 32);
    }

    #[test]
    fn test_weighted_validators_any_order() {
        init_tracing();
        let nodes = gen_nodes(7);
        let validators = Validators::new(nodes.iter().map(|&v| (v, v * 3 + 1))).unwrap();
        let mut reference = TestNode::genesis(1, &validators, Application::new());
        let mut rng = StdRng::seed_from_u64(41);
        reference.run_epoch(&nodes, &[], 30, 4, 0, &mut rng);

        assert_same_order(&validators, &reference, 42);
    }
}
