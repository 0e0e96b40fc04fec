/// Resolution of a cancellable request.
///
/// `Canceled` is not an error: callers skip their state updates instead of
/// showing a failure.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome<T> {
    Completed(T),
    Canceled,
}

impl<T> FetchOutcome<T> {
    pub fn is_canceled(&self) -> bool {
        matches!(self, FetchOutcome::Canceled)
    }

    pub fn completed(self) -> Option<T> {
        match self {
            FetchOutcome::Completed(value) => Some(value),
            FetchOutcome::Canceled => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canceled_has_no_value() {
        let canceled: FetchOutcome<u32> = FetchOutcome::Canceled;
        assert!(canceled.is_canceled());
        assert_eq!(canceled.completed(), None);
        assert_eq!(FetchOutcome::Completed(2).completed(), Some(2));
    }
}
