/// Actions an observer can take during a calibration run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Stop the run early and return the ranks collected so far.
    StopEarly,

    /// Leave this trial out of the results and continue.
    ///
    /// On a sampling failure this is the skip-and-warn policy: the trial index
    /// is recorded in [`Solution::skipped`] instead of failing the run. On a
    /// ranked trial it discards the trial's ranks.
    ///
    /// [`Solution::skipped`]: super::Solution::skipped
    SkipTrial,
}
