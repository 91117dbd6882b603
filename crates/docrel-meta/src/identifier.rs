//! Physical identifier generation.
//!
//! Logical names (databases, collections, table paths, fields, indexes) are
//! encoded into short, backend-legal identifiers. Encoding is deterministic;
//! collisions are resolved by a [`ChainConverter`] strategy that is seedable
//! so tests can pin the full candidate sequence. When no unique, allowed
//! candidate is found within [`MAX_GENERATION_ATTEMPTS`], generation fails
//! with [`DocRelError::IdentifierExhausted`].

use std::fmt;

use docrel_error::{DocRelError, Result};
use docrel_types::Identifier;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use tracing::debug;
use xxhash_rust::xxh3::{xxh3_64, xxh3_64_with_seed};

/// How many candidates are tried before generation gives up.
pub const MAX_GENERATION_ATTEMPTS: u32 = 64;

/// `'_' +` 12 hex chars of xxh3, appended when a candidate is clamped.
const HASH_SUFFIX_LEN: usize = 13;

// ---------------------------------------------------------------------------
// Constraints
// ---------------------------------------------------------------------------

/// Backend-imposed identifier constraints.
///
/// The default is PostgreSQL-shaped: at most 63 bytes, `[a-z0-9_]`, not
/// starting with a digit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdentifierConstraints {
    max_len: usize,
}

impl IdentifierConstraints {
    /// Default maximum identifier length in bytes.
    pub const DEFAULT_MAX_LEN: usize = 63;

    /// Create constraints with an explicit length limit.
    ///
    /// Returns `None` when the limit cannot hold a clamped candidate
    /// (prefix + hash suffix).
    #[must_use]
    pub const fn new(max_len: usize) -> Option<Self> {
        if max_len < HASH_SUFFIX_LEN + 3 {
            None
        } else {
            Some(Self { max_len })
        }
    }

    /// Maximum identifier length in bytes.
    #[must_use]
    pub const fn max_len(&self) -> usize {
        self.max_len
    }

    /// Whether `candidate` satisfies the character and length rules.
    #[must_use]
    pub fn check(&self, candidate: &str) -> bool {
        if candidate.is_empty() || candidate.len() > self.max_len {
            return false;
        }
        let mut chars = candidate.chars();
        let first = chars.next().unwrap_or('0');
        if !(first.is_ascii_lowercase() || first == '_') {
            return false;
        }
        candidate
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
    }
}

impl Default for IdentifierConstraints {
    fn default() -> Self {
        Self {
            max_len: Self::DEFAULT_MAX_LEN,
        }
    }
}

// ---------------------------------------------------------------------------
// Checker capability
// ---------------------------------------------------------------------------

/// Capability object deciding whether a candidate identifier is usable in
/// its scope.
pub trait IdentifierChecker {
    /// Whether `candidate` is not already taken in this scope.
    fn is_unique(&self, candidate: &str) -> bool;

    /// Whether `candidate` is legal for the backend. The default defers to
    /// the constraints; implementations may add reserved-word rules.
    fn is_allowed(&self, constraints: &IdentifierConstraints, candidate: &str) -> bool {
        constraints.check(candidate)
    }
}

// ---------------------------------------------------------------------------
// Name chains
// ---------------------------------------------------------------------------

/// Ordered list of logical name components to encode into one identifier,
/// e.g. `[collection, path components…]` for a table or `[field]` for a
/// column.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameChain {
    components: Vec<String>,
}

impl NameChain {
    /// Empty chain.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            components: Vec::new(),
        }
    }

    /// Build a chain from components.
    pub fn of<I, S>(parts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            components: parts.into_iter().map(Into::into).collect(),
        }
    }

    /// Append a component.
    pub fn push(&mut self, part: impl Into<String>) {
        self.components.push(part.into());
    }

    /// The components, in order.
    #[must_use]
    pub fn components(&self) -> &[String] {
        &self.components
    }

    /// Components joined with `_`, the raw material for encoding.
    #[must_use]
    pub fn joined(&self) -> String {
        self.components.join("_")
    }
}

impl fmt::Display for NameChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.components.join("."))
    }
}

// ---------------------------------------------------------------------------
// Conversion strategies
// ---------------------------------------------------------------------------

/// Strategy producing the next candidate after a collision.
///
/// Implementations must be deterministic given their construction
/// parameters: the same chain and attempt sequence yields the same
/// candidates on every run.
pub trait ChainConverter {
    /// Produce a raw candidate for `attempt` (0-based). The generator
    /// sanitizes and clamps the result before checking it.
    fn convert(&mut self, chain: &NameChain, attempt: u32) -> String;
}

/// Deterministic converter: re-suffixes the chain with an attempt-seeded
/// xxh3 hash. Stateless, so retries are reproducible with no seed at all.
#[derive(Debug, Clone, Copy, Default)]
pub struct HashSuffixConverter;

impl ChainConverter for HashSuffixConverter {
    fn convert(&mut self, chain: &NameChain, attempt: u32) -> String {
        let raw = chain.joined();
        let h = xxh3_64_with_seed(raw.as_bytes(), u64::from(attempt) + 1);
        format!("{raw}_{h:012x}")
    }
}

/// Converter that truncates a pseudo-randomly chosen component.
///
/// Seeded explicitly; library code never reaches for ambient randomness,
/// so a test that fixes the seed fixes the whole candidate sequence.
#[derive(Debug, Clone)]
pub struct RandomTruncationConverter {
    rng: SmallRng,
}

impl RandomTruncationConverter {
    /// Create a converter with a fixed seed.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
        }
    }
}

impl ChainConverter for RandomTruncationConverter {
    fn convert(&mut self, chain: &NameChain, attempt: u32) -> String {
        let components = chain.components();
        if components.is_empty() {
            return format!("_{attempt}");
        }
        let victim = self.rng.gen_range(0..components.len());
        let mut parts: Vec<String> = components.to_vec();
        let keep = self.rng.gen_range(1..=parts[victim].chars().count().max(1));
        let truncated: String = parts[victim].chars().take(keep).collect();
        parts[victim] = truncated;
        format!("{}_{attempt}", parts.join("_"))
    }
}

// ---------------------------------------------------------------------------
// Generator
// ---------------------------------------------------------------------------

/// Encodes name chains into backend-safe identifiers and resolves
/// collisions through the configured converter.
#[derive(Debug)]
pub struct UniqueIdentifierGenerator<C: ChainConverter = HashSuffixConverter> {
    constraints: IdentifierConstraints,
    converter: C,
}

impl UniqueIdentifierGenerator<HashSuffixConverter> {
    /// Generator with default constraints and the deterministic hash
    /// converter.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(IdentifierConstraints::default(), HashSuffixConverter)
    }
}

impl<C: ChainConverter> UniqueIdentifierGenerator<C> {
    /// Create a generator.
    #[must_use]
    pub const fn new(constraints: IdentifierConstraints, converter: C) -> Self {
        Self {
            constraints,
            converter,
        }
    }

    /// The active constraints.
    #[must_use]
    pub const fn constraints(&self) -> &IdentifierConstraints {
        &self.constraints
    }

    /// Deterministically encode a chain, without any uniqueness check.
    #[must_use]
    pub fn generate_identifier(&self, chain: &NameChain) -> Identifier {
        Identifier::new(self.sanitize(&chain.joined(), ""))
    }

    /// Encode a chain into an identifier that is unique and allowed
    /// according to `checker`.
    pub fn generate_unique_identifier(
        &mut self,
        chain: &NameChain,
        checker: &dyn IdentifierChecker,
    ) -> Result<Identifier> {
        self.generate_unique_with_suffix(chain, "", checker)
    }

    /// Like [`Self::generate_unique_identifier`], with a fixed suffix token
    /// (e.g. a type mangle) that survives clamping.
    pub fn generate_unique_with_suffix(
        &mut self,
        chain: &NameChain,
        suffix: &str,
        checker: &dyn IdentifierChecker,
    ) -> Result<Identifier> {
        let mut candidate = self.sanitize(&chain.joined(), suffix);
        for attempt in 0..MAX_GENERATION_ATTEMPTS {
            if checker.is_allowed(&self.constraints, &candidate) && checker.is_unique(&candidate) {
                return Ok(Identifier::new(candidate));
            }
            debug!(
                chain = %chain,
                candidate,
                attempt,
                "identifier candidate rejected"
            );
            let converted = self.converter.convert(chain, attempt);
            candidate = self.sanitize(&converted, suffix);
        }
        Err(DocRelError::IdentifierExhausted {
            chain: chain.to_string(),
            attempts: MAX_GENERATION_ATTEMPTS,
        })
    }

    /// Map `raw` into the legal character set, guard the leading digit
    /// case, append `suffix`, and clamp over-long results by replacing the
    /// tail with an xxh3 hash of the raw input.
    fn sanitize(&self, raw: &str, suffix: &str) -> String {
        let mut out = String::with_capacity(raw.len() + suffix.len() + 1);
        for c in raw.chars() {
            let mapped = c.to_ascii_lowercase();
            if mapped.is_ascii_lowercase() || mapped.is_ascii_digit() || mapped == '_' {
                out.push(mapped);
            } else {
                out.push('_');
            }
        }
        if out.is_empty() {
            out.push('_');
        }
        if out.as_bytes()[0].is_ascii_digit() {
            out.insert(0, '_');
        }

        let budget = self.constraints.max_len() - suffix.len();
        if out.len() > budget {
            let h = xxh3_64(raw.as_bytes());
            out.truncate(budget - HASH_SUFFIX_LEN);
            out.push('_');
            out.push_str(&format!("{h:012x}"));
        }
        out.push_str(suffix);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct AlwaysUnique;
    impl IdentifierChecker for AlwaysUnique {
        fn is_unique(&self, _candidate: &str) -> bool {
            true
        }
    }

    struct NeverUnique;
    impl IdentifierChecker for NeverUnique {
        fn is_unique(&self, _candidate: &str) -> bool {
            false
        }
    }

    struct TakenSet(Vec<String>);
    impl IdentifierChecker for TakenSet {
        fn is_unique(&self, candidate: &str) -> bool {
            !self.0.iter().any(|t| t == candidate)
        }
    }

    #[test]
    fn constraints_check() {
        let c = IdentifierConstraints::default();
        assert!(c.check("orders_a_s"));
        assert!(c.check("_1"));
        assert!(!c.check("1abc"));
        assert!(!c.check("Orders"));
        assert!(!c.check(""));
        assert!(!c.check(&"x".repeat(64)));
        assert!(c.check(&"x".repeat(63)));
        assert!(IdentifierConstraints::new(8).is_none());
    }

    #[test]
    fn encoding_is_deterministic() {
        let generator = UniqueIdentifierGenerator::with_defaults();
        let chain = NameChain::of(["Orders", "Ship-To", "a"]);
        let a = generator.generate_identifier(&chain);
        let b = generator.generate_identifier(&chain);
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "orders_ship_to_a");
    }

    #[test]
    fn long_chains_are_clamped_with_hash_suffix() {
        let generator = UniqueIdentifierGenerator::with_defaults();
        let chain = NameChain::of([
            "a_very_long_collection_name_indeed",
            "deeply",
            "nested",
            "path_components",
        ]);
        assert!(chain.joined().len() > IdentifierConstraints::DEFAULT_MAX_LEN);
        let id = generator.generate_identifier(&chain);
        assert_eq!(id.len(), IdentifierConstraints::DEFAULT_MAX_LEN);
        assert!(generator.constraints().check(id.as_str()));

        // Distinct raw inputs must clamp to distinct identifiers even when
        // the kept prefix is identical.
        let other = NameChain::of([
            "a_very_long_collection_name_indeed",
            "deeply",
            "nested",
            "path_componentz",
        ]);
        assert_ne!(generator.generate_identifier(&other), id);
    }

    #[test]
    fn unique_generation_resolves_collisions_deterministically() {
        let taken = TakenSet(vec!["orders_a".to_owned()]);
        let chain = NameChain::of(["orders", "a"]);

        let mut g1 = UniqueIdentifierGenerator::with_defaults();
        let mut g2 = UniqueIdentifierGenerator::with_defaults();
        let r1 = g1.generate_unique_identifier(&chain, &taken).unwrap();
        let r2 = g2.generate_unique_identifier(&chain, &taken).unwrap();
        assert_eq!(r1, r2);
        assert_ne!(r1.as_str(), "orders_a");
        assert!(g1.constraints().check(r1.as_str()));
    }

    #[test]
    fn seeded_random_truncation_is_reproducible() {
        let chain = NameChain::of(["orders", "shipping"]);
        let taken = TakenSet(vec!["orders_shipping".to_owned()]);

        let mut g1 = UniqueIdentifierGenerator::new(
            IdentifierConstraints::default(),
            RandomTruncationConverter::new(7),
        );
        let mut g2 = UniqueIdentifierGenerator::new(
            IdentifierConstraints::default(),
            RandomTruncationConverter::new(7),
        );
        assert_eq!(
            g1.generate_unique_identifier(&chain, &taken).unwrap(),
            g2.generate_unique_identifier(&chain, &taken).unwrap()
        );
    }

    #[test]
    fn exhaustion_fails_instead_of_looping() {
        let mut generator = UniqueIdentifierGenerator::with_defaults();
        let chain = NameChain::of(["doomed"]);
        let err = generator
            .generate_unique_identifier(&chain, &NeverUnique)
            .unwrap_err();
        assert!(matches!(
            err,
            DocRelError::IdentifierExhausted {
                attempts: MAX_GENERATION_ATTEMPTS,
                ..
            }
        ));
    }

    #[test]
    fn suffix_survives_clamping() {
        let mut generator = UniqueIdentifierGenerator::with_defaults();
        let chain = NameChain::of(["field".repeat(30)]);
        let id = generator
            .generate_unique_with_suffix(&chain, "_s", &AlwaysUnique)
            .unwrap();
        assert!(id.as_str().ends_with("_s"));
        assert_eq!(id.len(), IdentifierConstraints::DEFAULT_MAX_LEN);
    }

    #[test]
    fn digit_prefix_is_guarded() {
        let generator = UniqueIdentifierGenerator::with_defaults();
        let id = generator.generate_identifier(&NameChain::of(["0"]));
        assert_eq!(id.as_str(), "_0");
    }
}
