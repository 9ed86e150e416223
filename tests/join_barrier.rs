use std::cell::Cell;
use std::rc::Rc;

use rowflow::join::JoinGroup;
use rowflow::requests::RequestOutcome;

fn fire_counter() -> (Rc<Cell<usize>>, impl FnOnce()) {
    let fired = Rc::new(Cell::new(0));
    let fired_in_finisher = fired.clone();
    (fired, move || {
        fired_in_finisher.set(fired_in_finisher.get() + 1)
    })
}

#[test]
fn finisher_fires_once_after_all_tokens_resolve() {
    let group = JoinGroup::new();
    let tokens: Vec<_> = (0..4)
        .map(|_| group.register().expect("register before seal"))
        .collect();
    let (fired, finisher) = fire_counter();
    group.seal(finisher).expect("seal");

    for (ix, token) in tokens.iter().enumerate() {
        assert_eq!(fired.get(), 0, "fired early after {ix} resolves");
        group.resolve(*token).expect("resolve");
    }
    assert_eq!(fired.get(), 1);
}

#[test]
fn resolution_order_does_not_matter() {
    let group = JoinGroup::new();
    let tokens: Vec<_> = (0..3)
        .map(|_| group.register().expect("register before seal"))
        .collect();
    let (fired, finisher) = fire_counter();
    group.seal(finisher).expect("seal");

    group.resolve(tokens[1]).expect("resolve second");
    group.resolve(tokens[0]).expect("resolve first");
    assert_eq!(fired.get(), 0);
    group.resolve(tokens[2]).expect("resolve third");
    assert_eq!(fired.get(), 1);
}

#[test]
fn tokens_resolved_before_seal_count() {
    let group = JoinGroup::new();
    let first = group.register().expect("register");
    let second = group.register().expect("register");
    group.resolve(first).expect("resolve");
    group.resolve(second).expect("resolve");

    let (fired, finisher) = fire_counter();
    group.seal(finisher).expect("seal");
    assert_eq!(fired.get(), 1, "finisher should fire on the sealing turn");
}

#[test]
fn duplicate_resolve_cannot_fire_early_or_twice() {
    let group = JoinGroup::new();
    let first = group.register().expect("register");
    let second = group.register().expect("register");
    let (fired, finisher) = fire_counter();
    group.seal(finisher).expect("seal");

    group.resolve(first).expect("resolve");
    group.resolve(first).expect("duplicate resolve");
    assert_eq!(fired.get(), 0);

    group.resolve(second).expect("resolve");
    group.resolve(second).expect("duplicate resolve after firing");
    assert_eq!(fired.get(), 1);
}

#[test]
fn failure_outcomes_still_complete_the_group() {
    let group = JoinGroup::new();
    let outcomes = Rc::new(Cell::new(0));

    let seen = outcomes.clone();
    let ok_callback = group
        .wrap(move |_outcome: RequestOutcome| seen.set(seen.get() + 1))
        .expect("wrap");
    let seen = outcomes.clone();
    let err_callback = group
        .wrap(move |_outcome: RequestOutcome| seen.set(seen.get() + 1))
        .expect("wrap");

    let (fired, finisher) = fire_counter();
    group.seal(finisher).expect("seal");

    ok_callback(RequestOutcome::Success("payload".into()));
    assert_eq!(fired.get(), 0);
    err_callback(RequestOutcome::Failure("boom".into()));
    assert_eq!(fired.get(), 1);
    assert_eq!(outcomes.get(), 2);
}
