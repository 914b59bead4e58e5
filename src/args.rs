//! # Command-line arguments of a test program.
//!
//! Every multithreaded test program takes the same two arguments:
//!
//! ```text
//! <program> <threads_num> <addr>
//! ```
//!
//! - `threads_num`: positive number of worker threads
//! - `addr`: address (or any opaque endpoint string) the test connects to
//!
//! ## Example
//! ```
//! use mtt_harness::TestArgs;
//!
//! let args = TestArgs::parse(["mtt-test", "4", "192.168.0.1"]).unwrap();
//! assert_eq!(args.threads_num, 4);
//! assert_eq!(args.addr, "192.168.0.1");
//! ```

use crate::error::ArgsError;

/// Parsed arguments of a test program.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TestArgs {
    /// Number of worker threads (always >= 1).
    pub threads_num: u32,
    /// Address or endpoint string.
    pub addr: String,
}

impl TestArgs {
    /// Parses `<program> <threads_num> <addr>`.
    pub fn parse<I, A>(args: I) -> Result<Self, ArgsError>
    where
        I: IntoIterator<Item = A>,
        A: Into<String>,
    {
        let mut it = args.into_iter().map(Into::into);
        let program = it.next().unwrap_or_else(|| "mtt".to_string());

        let (Some(threads), Some(addr), None) = (it.next(), it.next(), it.next()) else {
            return Err(ArgsError::Usage { program });
        };

        let threads_num = match threads.trim().parse::<u32>() {
            Ok(n) if n > 0 => n,
            _ => return Err(ArgsError::InvalidThreads { value: threads }),
        };

        Ok(Self { threads_num, addr })
    }

    /// Parses the arguments of the current process.
    pub fn from_env() -> Result<Self, ArgsError> {
        Self::parse(std::env::args())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid() {
        let args = TestArgs::parse(["prog", "8", "10.0.0.1"]).unwrap();
        assert_eq!(
            args,
            TestArgs {
                threads_num: 8,
                addr: "10.0.0.1".into()
            }
        );
    }

    #[test]
    fn test_missing_addr_is_usage_error() {
        let err = TestArgs::parse(["prog", "8"]).unwrap_err();
        assert_eq!(
            err,
            ArgsError::Usage {
                program: "prog".into()
            }
        );
    }

    #[test]
    fn test_extra_argument_is_usage_error() {
        let err = TestArgs::parse(["prog", "8", "addr", "extra"]).unwrap_err();
        assert!(matches!(err, ArgsError::Usage { .. }));
    }

    #[test]
    fn test_zero_or_garbage_threads_rejected() {
        for bad in ["0", "-3", "four", ""] {
            let err = TestArgs::parse(["prog", bad, "addr"]).unwrap_err();
            assert_eq!(
                err,
                ArgsError::InvalidThreads {
                    value: bad.to_string()
                },
                "value {bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_empty_argv_uses_default_program_name() {
        let err = TestArgs::parse(Vec::<String>::new()).unwrap_err();
        assert_eq!(err.to_string(), "usage: mtt <threads_num> <addr>");
    }
}
