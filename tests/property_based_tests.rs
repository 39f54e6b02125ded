mod common;

use common::strategies::*;
use proptest::prelude::*;
use relay_core::action::ActionFlow;

proptest! {
    /// Property: flow concatenation is associative
    #[test]
    fn flow_concatenation_is_associative(
        a in flow_strategy(),
        b in flow_strategy(),
        c in flow_strategy(),
    ) {
        let left = a.clone().then(b.clone()).then(c.clone());
        let right = a.then(b.then(c));
        prop_assert_eq!(left, right);
    }

    /// Property: the empty flow is the identity of concatenation
    #[test]
    fn empty_flow_is_concatenation_identity(flow in flow_strategy()) {
        prop_assert_eq!(flow.clone().then(ActionFlow::new()), flow.clone());
        prop_assert_eq!(ActionFlow::new().then(flow.clone()), flow);
    }

    /// Property: concatenation preserves the order of both operands
    #[test]
    fn concatenation_preserves_order(a in flow_strategy(), b in flow_strategy()) {
        let combined = a.clone().then(b.clone());
        prop_assert_eq!(combined.len(), a.len() + b.len());

        let names: Vec<&str> = combined.iter().map(|action| action.name()).collect();
        let expected: Vec<&str> = a.iter().chain(b.iter()).map(|action| action.name()).collect();
        prop_assert_eq!(names, expected);
    }

    /// Property: group union is commutative
    #[test]
    fn group_union_is_commutative(a in group_strategy(), b in group_strategy()) {
        prop_assert_eq!(a.clone().union(b.clone()), b.union(a));
    }

    /// Property: group union is associative
    #[test]
    fn group_union_is_associative(
        a in group_strategy(),
        b in group_strategy(),
        c in group_strategy(),
    ) {
        prop_assert_eq!(
            a.clone().union(b.clone()).union(c.clone()),
            a.union(b.union(c))
        );
    }

    /// Property: membership after union matches membership in either operand
    #[test]
    fn union_membership_matches_either_operand(
        a in group_strategy(),
        b in group_strategy(),
        action in action_strategy(),
    ) {
        let combined = a.clone().union(b.clone());
        prop_assert_eq!(
            combined.contains(&action),
            a.contains(&action) || b.contains(&action)
        );
    }

    /// Property: action serialization round-trips
    #[test]
    fn action_serde_round_trips(action in action_strategy()) {
        let encoded = serde_json::to_string(&action).unwrap();
        let decoded = serde_json::from_str(&encoded).unwrap();
        prop_assert_eq!(action, decoded);
    }
}
