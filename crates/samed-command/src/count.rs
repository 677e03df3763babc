//! [`Count`] — the inclusive iteration interval used by `COUNT` arguments
//! and by the repeat count on `TEXT` arguments (`3/foo/` inserts `foo`
//! three times).

/// Inclusive interval `[start, end]`, or (when `is_mod` is set) "every
/// `start`-th iteration" with `start == end == n`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Count {
    /// Lower bound (or modulus, when `is_mod`).
    pub start: i64,
    /// Upper bound (or modulus, when `is_mod`).
    pub end: i64,
    /// True for the `%n` "every n-th match" form.
    pub is_mod: bool,
}

impl Count {
    /// The default count for a command argument that was never supplied:
    /// every iteration passes.
    pub fn all() -> Self {
        Count {
            start: 1,
            end: i64::MAX,
            is_mod: false,
        }
    }

    /// A count that matches only `n`.
    pub fn exactly(n: i64) -> Self {
        Count {
            start: n,
            end: n,
            is_mod: false,
        }
    }

    /// A count that matches every `n`-th iteration.
    pub fn modulo(n: i64) -> Self {
        Count {
            start: n,
            end: n,
            is_mod: true,
        }
    }

    /// Resolve negative bounds by adding `total` (the number of matches
    /// found at loop-init time), per spec: "Negative bounds are resolved at
    /// loop-init by adding the match total."
    pub fn resolve(&mut self, total: i64) {
        if self.start < 0 {
            self.start += total;
        }
        if self.end < 0 {
            self.end += total;
        }
    }

    /// True if iteration number `n` (1-based) passes this count.
    pub fn matches(&self, n: i64) -> bool {
        if self.is_mod {
            self.start != 0 && n % self.start == 0
        } else {
            n >= self.start && n <= self.end
        }
    }
}

impl Default for Count {
    fn default() -> Self {
        Count::all()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_form_is_inclusive() {
        let c = Count { start: 2, end: 4, is_mod: false };
        assert!(!c.matches(1));
        assert!(c.matches(2));
        assert!(c.matches(4));
        assert!(!c.matches(5));
    }

    #[test]
    fn mod_form_matches_multiples() {
        let c = Count::modulo(3);
        assert!(!c.matches(1));
        assert!(c.matches(3));
        assert!(c.matches(6));
    }

    #[test]
    fn negative_bounds_resolve_against_total() {
        let mut c = Count { start: -1, end: -1, is_mod: false };
        c.resolve(5);
        assert_eq!(c.start, 4);
        assert_eq!(c.end, 4);
    }

    #[test]
    fn all_matches_every_iteration() {
        let c = Count::all();
        assert!(c.matches(1));
        assert!(c.matches(1_000_000));
    }
}
