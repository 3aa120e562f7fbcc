// Every macro goes through `TrackerError::located`, file!/line!/column! resolve to the
// outermost call site even when nested.

/// `TrackerError` at the call site out of anything convertible into `ErrorBag`
#[macro_export]
macro_rules! err_create {
    ($inner:expr) => {
        $crate::error::TrackerError::located($inner, None, file!(), line!(), column!())
    };
}

/// `TrackerError` at the call site holding a formatted `CustomError`
#[macro_export]
macro_rules! err_custom_create {
    ($($fmt:tt)*) => {
        $crate::err_create!($crate::error::CustomError::from_owned_string(format!($($fmt)*)))
    };
}

/// Closure for `map_err`, keeps the error as the cause
#[macro_export]
macro_rules! err_from {
    () => {
        |e| $crate::err_create!(e)
    };
}

/// Closure for `map_err` adding a formatted context message to the cause
#[macro_export]
macro_rules! err_from_msg {
    ($($fmt:tt)*) => {
        |e| {
            $crate::error::TrackerError::located(
                e,
                Some(format!($($fmt)*)),
                file!(),
                line!(),
                column!(),
            )
        }
    };
}
