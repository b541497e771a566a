use crate::app::ClassifiedError;

/// Lifecycle of one asynchronous result.
///
/// Every asynchronous operation surfaces as one of these four states; a
/// state only moves out of `Success` or `Error` through a new explicit fetch.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum DataState<T> {
    #[default]
    Idle,
    Loading,
    Success(T),
    Error(ClassifiedError),
}

impl<T> DataState<T> {
    pub fn is_idle(&self) -> bool {
        matches!(self, DataState::Idle)
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, DataState::Loading)
    }

    pub fn success(&self) -> Option<&T> {
        match self {
            DataState::Success(data) => Some(data),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&ClassifiedError> {
        match self {
            DataState::Error(err) => Some(err),
            _ => None,
        }
    }

    pub fn as_ref(&self) -> DataState<&T> {
        match self {
            DataState::Idle => DataState::Idle,
            DataState::Loading => DataState::Loading,
            DataState::Success(data) => DataState::Success(data),
            DataState::Error(err) => DataState::Error(err.clone()),
        }
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> DataState<U> {
        match self {
            DataState::Idle => DataState::Idle,
            DataState::Loading => DataState::Loading,
            DataState::Success(data) => DataState::Success(f(data)),
            DataState::Error(err) => DataState::Error(err),
        }
    }
}

impl<T> From<crate::app::Result<T>> for DataState<T> {
    fn from(result: crate::app::Result<T>) -> Self {
        match result {
            Ok(data) => DataState::Success(data),
            Err(e) => DataState::Error(ClassifiedError::from(e)),
        }
    }
}
