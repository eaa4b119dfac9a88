/// Lifecycle of a stage handle. Construction is the open transition; a
/// handle that exists is at least `Open` and must end `Closed` exactly
/// once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StageState {
    Open,
    Draining,
    Closed,
}

impl StageState {
    pub(crate) fn name(self) -> &'static str {
        match self {
            StageState::Open => "open",
            StageState::Draining => "draining",
            StageState::Closed => "closed",
        }
    }
}
