//! SQLSTATE error codes.
//!
//! Every error status code of postgres `errcodes.txt`, see
//! <https://www.postgresql.org/docs/current/errcodes-appendix.html>.
//!
//! The table is generated by the workspace `codegen` binary.
use std::fmt;

macro_rules! sqlstate {
    (
        codes {
            $(
                $(#[$meta:meta])*
                $name:ident = $code:literal,
            )*
        }
        classes {
            $($class:literal => $generic:ident,)*
        }
    ) => {
        /// Postgres SQLSTATE error code.
        ///
        /// Each variant is one of the 5 character error codes, the generic
        /// `XX000` code of a class also stands for the whole class.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[non_exhaustive]
        pub enum SqlState {
            $(
                $(#[$meta])*
                $name,
            )*
        }

        impl SqlState {
            /// Every code with its variant.
            pub(crate) const CODES: &'static [(&'static str, SqlState)] = &[$(($code, SqlState::$name)),*];

            /// Every 2 character class with its generic variant.
            pub(crate) const CLASSES: &'static [(&'static str, SqlState)] = &[$(($class, SqlState::$generic)),*];

            /// Returns the 5 character code, e.g. `"42P01"`.
            pub const fn code(self) -> &'static str {
                match self {
                    $(Self::$name => $code,)*
                }
            }

            /// Returns the variant name, e.g. `"UndefinedTable"`.
            pub const fn name(self) -> &'static str {
                match self {
                    $(Self::$name => stringify!($name),)*
                }
            }

            /// Find the variant of a 5 character code.
            pub fn from_code(code: &str) -> Option<SqlState> {
                match code {
                    $($code => Some(Self::$name),)*
                    _ => None,
                }
            }
        }
    };
}

mod generated;

pub use generated::SqlState;

impl SqlState {
    /// Returns the 2 character class, e.g. `"42"`.
    pub fn class(self) -> &'static str {
        &self.code()[..2]
    }

    /// Returns `true` if this is the generic code of its class, e.g. `42000`.
    pub fn is_class_level(self) -> bool {
        self.code().ends_with("000")
    }

    /// Find the generic variant of a 2 character class.
    pub fn from_class(class: &str) -> Option<SqlState> {
        SqlState::CLASSES
            .iter()
            .find_map(|&(c, state)| (c == class).then_some(state))
    }
}

impl fmt::Display for SqlState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn lookup_code() {
        assert_eq!(SqlState::from_code("42P01"), Some(SqlState::UndefinedTable));
        assert_eq!(SqlState::from_code("22012"), Some(SqlState::DivisionByZero));
        assert_eq!(SqlState::from_code("3F000"), Some(SqlState::InvalidSchemaName));
        assert_eq!(SqlState::from_code("ZZZZZ"), None);
        // success and warning are not errors
        assert_eq!(SqlState::from_code("00000"), None);
        assert_eq!(SqlState::from_code("01000"), None);
    }

    #[test]
    fn class_of_code() {
        let state = SqlState::UndefinedTable;
        assert_eq!(state.code(), "42P01");
        assert_eq!(state.name(), "UndefinedTable");
        assert_eq!(state.class(), "42");
        assert!(!state.is_class_level());
        assert_eq!(SqlState::from_class("42"), Some(SqlState::SyntaxErrorOrAccessRuleViolation));
        assert!(SqlState::SyntaxErrorOrAccessRuleViolation.is_class_level());
    }

    #[test]
    fn table_consistent() {
        for &(code, state) in SqlState::CODES {
            assert_eq!(state.code(), code);
            assert_eq!(SqlState::from_code(code), Some(state));
        }
        for &(class, state) in SqlState::CLASSES {
            assert_eq!(state.class(), class);
            assert!(state.is_class_level());
        }
    }
}
