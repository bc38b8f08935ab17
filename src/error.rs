use core::fmt;

/// The reason a slot could not be called on a [`Poly`](crate::Poly).
///
/// Returned by [`Poly::try_call`](crate::Poly::try_call) and
/// [`Poly::try_call_mut`](crate::Poly::try_call_mut). The panicking
/// [`call`](crate::Poly::call) and [`call_mut`](crate::Poly::call_mut) report
/// the same conditions in their panic message.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum DispatchError {
    /// The wrapper holds no value.
    Empty,
    /// The slot needs mutable access, but the wrapper is a read-only alias.
    ReadOnlyAlias,
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => f.write_str("the wrapper holds no value"),
            Self::ReadOnlyAlias => {
                f.write_str("a mutating operation was called through a read-only alias")
            }
        }
    }
}

impl core::error::Error for DispatchError {}

#[cfg(test)]
mod tests {
    use alloc::string::ToString;

    use super::*;

    #[test]
    fn test_dispatch_error_display() {
        assert_eq!(DispatchError::Empty.to_string(), "the wrapper holds no value");
        assert!(
            DispatchError::ReadOnlyAlias
                .to_string()
                .contains("read-only alias")
        );
    }

    #[test]
    fn test_dispatch_error_is_error() {
        static_assertions::assert_impl_all!(DispatchError: core::error::Error, Send, Sync, Copy);
    }
}
