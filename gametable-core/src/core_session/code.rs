//! Invite code generation
//!
//! Codes read as `<SLUG><SUFFIX>`: up to `slug_len` uppercase alphanumerics
//! taken from the session name, followed by `suffix_len` random characters
//! from [`CODE_CHARSET`]. Generation loops until the caller-supplied
//! existence check reports the code as free.

use super::errors::{SessionError, SessionResult};
use rand::Rng;
use tracing::debug;

/// Alphabet of the random suffix
pub const CODE_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Upper bound on a full code, matching the `code` column
pub const MAX_CODE_LEN: usize = 20;

pub const DEFAULT_SLUG_LEN: usize = 6;
pub const DEFAULT_SUFFIX_LEN: usize = 8;

/// Produces unique, human-shareable invite codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InviteCodeGenerator {
    slug_len: usize,
    suffix_len: usize,
}

impl Default for InviteCodeGenerator {
    fn default() -> Self {
        Self {
            slug_len: DEFAULT_SLUG_LEN,
            suffix_len: DEFAULT_SUFFIX_LEN,
        }
    }
}

impl InviteCodeGenerator {
    pub fn new(slug_len: usize, suffix_len: usize) -> SessionResult<Self> {
        if suffix_len == 0 {
            return Err(SessionError::Validation("invite code suffix must not be empty".into()));
        }
        if slug_len + suffix_len > MAX_CODE_LEN {
            return Err(SessionError::Validation(format!(
                "invite codes are limited to {} characters (slug {} + suffix {})",
                MAX_CODE_LEN, slug_len, suffix_len
            )));
        }
        Ok(Self {
            slug_len,
            suffix_len,
        })
    }

    pub fn slug_len(&self) -> usize {
        self.slug_len
    }

    pub fn suffix_len(&self) -> usize {
        self.suffix_len
    }

    /// Uppercase slug of `session_name`: ASCII alphanumerics only, truncated
    pub fn slug(&self, session_name: &str) -> String {
        session_name
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .take(self.slug_len)
            .map(|c| c.to_ascii_uppercase())
            .collect()
    }

    /// Generate a code using the thread-local CSPRNG.
    ///
    /// `exists` is consulted once per attempt; a code is returned only after
    /// it reports `false`.
    pub fn generate<F>(&self, session_name: &str, exists: F) -> SessionResult<String>
    where
        F: FnMut(&str) -> SessionResult<bool>,
    {
        self.generate_with(&mut rand::rng(), session_name, exists)
    }

    /// Generate a code drawing the suffix from `rng`
    pub fn generate_with<R, F>(
        &self,
        rng: &mut R,
        session_name: &str,
        mut exists: F,
    ) -> SessionResult<String>
    where
        R: Rng + ?Sized,
        F: FnMut(&str) -> SessionResult<bool>,
    {
        let slug = self.slug(session_name);
        let mut attempts: u64 = 0;

        loop {
            attempts += 1;
            let mut code = String::with_capacity(slug.len() + self.suffix_len);
            code.push_str(&slug);
            for _ in 0..self.suffix_len {
                let idx = rng.random_range(0..CODE_CHARSET.len());
                code.push(CODE_CHARSET[idx] as char);
            }

            if !exists(&code)? {
                if attempts > 1 {
                    debug!(attempts, "invite code collision resolved");
                }
                return Ok(code);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::test_rng;
    use proptest::prelude::*;
    use std::collections::HashSet;

    #[test]
    fn test_slug_strips_and_truncates() {
        let generator = InviteCodeGenerator::default();
        assert_eq!(generator.slug("Dragon Hunt"), "DRAGON");
        assert_eq!(generator.slug("a-b c!"), "ABC");
        assert_eq!(generator.slug("Ação 1"), "AO1");
        assert_eq!(generator.slug("???"), "");
    }

    #[test]
    fn test_generated_code_format() {
        let generator = InviteCodeGenerator::default();
        let code = generator.generate("Dragon Hunt", |_| Ok(false)).unwrap();

        assert!(code.starts_with("DRAGON"));
        assert_eq!(code.len(), DEFAULT_SLUG_LEN + DEFAULT_SUFFIX_LEN);
        assert!(code.bytes().all(|b| CODE_CHARSET.contains(&b)));
    }

    #[test]
    fn test_retries_until_free() {
        // One-character suffix: 36 possible codes, 35 of them already taken
        let generator = InviteCodeGenerator::new(4, 1).unwrap();
        let free = "DRAGZ";
        let taken: HashSet<String> = CODE_CHARSET
            .iter()
            .map(|&c| format!("DRAG{}", c as char))
            .filter(|code| code != free)
            .collect();

        let mut checks = 0;
        let code = generator
            .generate_with(&mut test_rng(), "Dragon", |candidate| {
                checks += 1;
                Ok(taken.contains(candidate))
            })
            .unwrap();

        assert_eq!(code, free);
        assert!(checks >= 1);
    }

    #[test]
    fn test_existence_check_errors_propagate() {
        let generator = InviteCodeGenerator::default();
        let result =
            generator.generate("x", |_| Err(SessionError::Storage("db offline".into())));
        assert!(matches!(result, Err(SessionError::Storage(_))));
    }

    #[test]
    fn test_rejects_invalid_lengths() {
        assert!(InviteCodeGenerator::new(6, 0).is_err());
        assert!(InviteCodeGenerator::new(12, 9).is_err());
        assert!(InviteCodeGenerator::new(0, 20).is_ok());
    }

    proptest! {
        #[test]
        fn prop_code_fits_column(
            name in ".{0,40}",
            slug_len in 0usize..8,
            suffix_len in 1usize..12
        ) {
            let generator = InviteCodeGenerator::new(slug_len, suffix_len).unwrap();
            let code = generator.generate(&name, |_| Ok(false)).unwrap();

            prop_assert!(code.len() <= MAX_CODE_LEN);
            prop_assert!(code.len() >= suffix_len);
            prop_assert!(code.bytes().all(|b| CODE_CHARSET.contains(&b)));
        }
    }
}
