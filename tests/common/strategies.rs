//! Proptest strategies for action values.

#![allow(dead_code)]

use proptest::prelude::*;

use relay_core::action::{Action, ActionFlow, ActionGroup};

/// Valid action names: identifier-ish, dot-separated segments allowed
pub fn action_name_strategy() -> impl Strategy<Value = String> {
    "[a-z_][a-z0-9_]{0,12}(\\.[a-z0-9_]{1,8}){0,2}"
}

pub fn action_strategy() -> impl Strategy<Value = Action> {
    action_name_strategy().prop_map(Action::named)
}

pub fn flow_strategy() -> impl Strategy<Value = ActionFlow> {
    prop::collection::vec(action_strategy(), 0..8).prop_map(ActionFlow::from)
}

pub fn group_strategy() -> impl Strategy<Value = ActionGroup> {
    prop::collection::vec(action_name_strategy(), 0..8).prop_map(ActionGroup::of)
}
