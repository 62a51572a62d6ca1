use integration_tests::test_models::{Posterior, simulate};
use sbc_core::Marginals;
use sbc_observers::{ProgressLog, SkipFailures};
use sbc_ranks::{
    check::check_sbc,
    run::{self, Action, Config, Error, Event, Status},
};

#[test]
fn failures_are_skipped_and_reported() {
    let sims = simulate(300, 1, 11);
    let posterior = Posterior::exact().failing_every(7);
    let config = Config::with_samples(49).unwrap();

    let expected: Vec<usize> = (0..sims.len())
        .filter(|&i| posterior.fails_on(sims.observation(i)))
        .collect();
    assert!(!expected.is_empty(), "seed should produce some failures");

    let mut policy = SkipFailures::new();
    let solution = run::run(&posterior, &sims, &Marginals, &config, &mut policy).unwrap();

    assert_eq!(solution.status, Status::Complete);
    assert_eq!(solution.skipped, expected);
    assert_eq!(policy.failures(), expected.as_slice());
    assert_eq!(solution.ranks.len() + expected.len(), sims.len());
    assert!(solution.ranks.trials().iter().all(|t| !expected.contains(t)));
}

#[test]
fn skipping_data_dependent_failures_keeps_an_exact_posterior_calibrated() {
    let sims = simulate(1000, 1, 5);
    let posterior = Posterior::exact().failing_above(0.0);
    let config = Config::with_samples(99).unwrap();

    let mut policy = SkipFailures::new();
    let solution = run::run(&posterior, &sims, &Marginals, &config, &mut policy).unwrap();
    assert!(
        solution.skipped.len() > 300,
        "about half the trials should fail, got {}",
        solution.skipped.len()
    );

    // Only trials with positive measurements were dropped, so the DAP of the
    // ranked trials matches their own priors but not the full prior.
    let report = check_sbc(&sims, &solution, 10).unwrap();
    assert!(report.passes(0.001), "{report:?}");
}

#[test]
fn unhandled_failure_fails_the_run() {
    let sims = simulate(300, 1, 11);
    let posterior = Posterior::exact().failing_every(7);
    let config = Config::with_samples(49).unwrap();

    let first = (0..sims.len())
        .find(|&i| posterior.fails_on(sims.observation(i)))
        .expect("seed should produce some failures");

    let err = run::run_unobserved(&posterior, &sims, &Marginals, &config).unwrap_err();
    assert_eq!(err.trial(), Some(first));
    assert!(matches!(err, Error::Sampling { .. }));
}

#[test]
fn observers_compose_in_a_closure() {
    let sims = simulate(300, 1, 11);
    let posterior = Posterior::exact().failing_every(7);
    let config = Config::with_samples(49).unwrap();

    let mut progress = ProgressLog::new(50);
    let mut policy = SkipFailures::with_budget(0);
    let solution = run::run(
        &posterior,
        &sims,
        &Marginals,
        &config,
        |event: &Event<'_, Posterior>| -> Option<Action> {
            let _: Option<Action> = sbc_core::Observer::observe(&mut progress, event);
            sbc_core::Observer::observe(&mut policy, event)
        },
    )
    .unwrap();

    // A zero budget stops on the first failure.
    assert_eq!(solution.status, Status::StoppedByObserver);
    assert!(solution.skipped.is_empty());
    assert_eq!(policy.failures().len(), 1);
    assert_eq!(progress.failed(), 1);
    assert_eq!(progress.seen(), policy.failures()[0] + 1);
}
