//! Small modules shared by the store layer's unit tests.

use serde::Serialize;

use crate::store::error::ModuleError;
use crate::store::module::{ActionContext, Module};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub(crate) struct CounterState {
    pub(crate) value: i64,
}

#[derive(Debug)]
pub(crate) enum CounterMutation {
    Add(i64),
    Reset,
}

#[derive(Debug)]
pub(crate) enum CounterAction {
    AddTwice(i64),
    Fail,
}

#[derive(Debug, Default)]
pub(crate) struct Counter;

impl Module for Counter {
    type State = CounterState;
    type Mutation = CounterMutation;
    type Action = CounterAction;

    fn initial_state(&self) -> CounterState {
        CounterState::default()
    }

    fn mutate(&self, state: &mut CounterState, mutation: CounterMutation) {
        match mutation {
            CounterMutation::Add(n) => state.value += n,
            CounterMutation::Reset => state.value = 0,
        }
    }

    fn handle(
        &self,
        ctx: &ActionContext<'_, Self>,
        action: CounterAction,
    ) -> Result<(), ModuleError> {
        match action {
            CounterAction::AddTwice(n) => {
                ctx.commit(CounterMutation::Add(n));
                ctx.commit(CounterMutation::Add(n));
                Ok(())
            }
            CounterAction::Fail => Err("counter cannot do that".into()),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub(crate) struct ToggleState {
    pub(crate) on: bool,
}

#[derive(Debug)]
pub(crate) enum ToggleMutation {
    Flip,
}

#[derive(Debug, Default)]
pub(crate) struct Toggle;

impl Module for Toggle {
    type State = ToggleState;
    type Mutation = ToggleMutation;
    type Action = ();

    fn initial_state(&self) -> ToggleState {
        ToggleState::default()
    }

    fn mutate(&self, state: &mut ToggleState, mutation: ToggleMutation) {
        match mutation {
            ToggleMutation::Flip => state.on = !state.on,
        }
    }
}
