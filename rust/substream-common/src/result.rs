use crate::error::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Checks a caller-supplied argument, returning `InvalidArgument` from the
/// enclosing function when the condition does not hold.
#[macro_export]
macro_rules! verify_arg {
    ($name:expr, $expr:expr) => {{
        let result = $expr;
        $crate::result::verify_arg(result, stringify!($name), stringify!($expr))?;
    }};
}

/// Checks data decoded from a stream, returning `InvalidFormat` from the
/// enclosing function when the condition does not hold.
#[macro_export]
macro_rules! verify_data {
    ($name:expr, $expr:expr) => {{
        let result = $expr;
        $crate::result::verify_data(result, stringify!($name), stringify!($expr))?;
    }};
}

#[inline]
pub fn verify_arg(predicate: bool, name: &str, condition: &str) -> Result<()> {
    if predicate {
        Ok(())
    } else {
        Err(failed_arg(name, condition))
    }
}

#[inline]
pub fn verify_data(predicate: bool, name: &str, condition: &str) -> Result<()> {
    if predicate {
        Ok(())
    } else {
        Err(failed_data(name, condition))
    }
}

#[cold]
fn failed_arg(name: &str, condition: &str) -> Error {
    Error::invalid_arg(name, condition)
}

#[cold]
fn failed_data(name: &str, condition: &str) -> Error {
    Error::invalid_format(name, condition)
}

#[cfg(test)]
mod tests {
    use crate::error::ErrorKind;

    fn check_len(len: usize) -> super::Result<usize> {
        verify_arg!(len, len < 4);
        Ok(len)
    }

    fn check_marker(marker: u8) -> super::Result<()> {
        verify_data!(marker, marker == 0xAB);
        Ok(())
    }

    #[test]
    fn test_verify_arg() {
        assert_eq!(check_len(3).unwrap(), 3);
        let err = check_len(7).unwrap_err();
        match err.kind() {
            ErrorKind::InvalidArgument { name, message } => {
                assert_eq!(name, "len");
                assert_eq!(message, "len < 4");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_verify_data() {
        check_marker(0xAB).unwrap();
        let err = check_marker(0).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::InvalidFormat { .. }));
    }
}
