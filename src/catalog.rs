//! Pattern catalog grouped by category.
//!
//! A descriptor is a name, a category and a factory. Instantiating a
//! descriptor always yields the pattern in its documented default state, so
//! "reset" is simply building a fresh instance.

use heapless::Vec;
use rand::Rng;

use crate::pattern::{
    AutoMotion, CrazyDots, DriftingDot, LineWithDots, Oscillator, PATTERN_NAME_CIRCLE_ZOOM_IN,
    PATTERN_NAME_CRAZY_DOTS, PATTERN_NAME_CRAZY_DOTS_AUTO, PATTERN_NAME_DOT_LR,
    PATTERN_NAME_DOT_RL, PATTERN_NAME_DRIFTING_DOT, PATTERN_NAME_HORIZONTAL_LINE_LR,
    PATTERN_NAME_HORIZONTAL_LINE_RL, PATTERN_NAME_HORIZONTAL_LINE_SIDE_TO_SIDE,
    PATTERN_NAME_LINE_WITH_DOTS_RL, PATTERN_NAME_RANDOM_SINGLE_DOT,
    PATTERN_NAME_SIDE_TO_SIDE_DOT, PATTERN_NAME_SPAZZ_CIRCLE, PATTERN_NAME_SPOTLIGHT,
    PATTERN_NAME_STILL_BEAM, PATTERN_NAME_TWO_CIRCLE_SPIN, PATTERN_NAME_VOICE_WAVE,
    PATTERN_NAME_WIGGLE_LINE, Pattern, PatternRng, RandomDot, SpazzCircle, Spotlight, StillBeam,
    Sweep, SweepMotion,
};

/// Maximum number of patterns a catalog can hold.
pub const MAX_PATTERNS: usize = 32;

const CATEGORY_ID_POSITIONAL: u8 = 1;
const CATEGORY_ID_FLASHING: u8 = 2;
const CATEGORY_ID_FLOWING: u8 = 3;

/// Group of interchangeable patterns with a similar character.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum Category {
    /// Panning / positional motion.
    Positional = CATEGORY_ID_POSITIONAL,
    /// Flashing / stroboscopic.
    Flashing = CATEGORY_ID_FLASHING,
    /// Flowing / organic motion.
    Flowing = CATEGORY_ID_FLOWING,
}

impl Category {
    pub const ALL: [Self; 3] = [Self::Positional, Self::Flashing, Self::Flowing];

    pub fn from_raw(value: u8) -> Option<Self> {
        Some(match value {
            CATEGORY_ID_POSITIONAL => Self::Positional,
            CATEGORY_ID_FLASHING => Self::Flashing,
            CATEGORY_ID_FLOWING => Self::Flowing,
            _ => return None,
        })
    }

    pub const fn id(self) -> u8 {
        self as u8
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Positional => "positional",
            Self::Flashing => "flashing",
            Self::Flowing => "flowing",
        }
    }
}

/// Builds a pattern in its default state.
pub type PatternFactory = fn() -> Box<dyn Pattern>;

/// Catalog entry.
#[derive(Clone, Copy, Debug)]
pub struct PatternDescriptor {
    pub name: &'static str,
    pub category: Category,
    factory: PatternFactory,
}

impl PatternDescriptor {
    pub const fn new(name: &'static str, category: Category, factory: PatternFactory) -> Self {
        Self {
            name,
            category,
            factory,
        }
    }

    /// Fresh instance with default progression state.
    pub fn instantiate(&self) -> Box<dyn Pattern> {
        (self.factory)()
    }
}

/// Stable identity of a descriptor inside its catalog.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PatternKey(u8);

impl PatternKey {
    #[allow(clippy::cast_possible_truncation)]
    const fn from_index(index: usize) -> Self {
        // Indices are bounded by `MAX_PATTERNS`.
        Self(index as u8)
    }

    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Build a descriptor from a constructor expression.
macro_rules! descriptor {
    ($name:expr, $category:expr, $pattern:expr) => {
        PatternDescriptor::new($name, $category, || -> Box<dyn Pattern> {
            Box::new($pattern)
        })
    };
}

/// Fixed registry of patterns.
#[derive(Debug, Clone, Default)]
pub struct PatternCatalog {
    entries: Vec<PatternDescriptor, MAX_PATTERNS>,
}

impl PatternCatalog {
    /// Empty catalog.
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Catalog with every built-in pattern.
    pub fn builtin() -> Self {
        use Category::{Flashing, Flowing, Positional};

        let descriptors = [
            descriptor!(PATTERN_NAME_STILL_BEAM, Positional, StillBeam::default()),
            descriptor!(PATTERN_NAME_DOT_LR, Positional, Sweep::dot(SweepMotion::Ascending)),
            descriptor!(PATTERN_NAME_DOT_RL, Positional, Sweep::dot(SweepMotion::Descending)),
            descriptor!(
                PATTERN_NAME_SIDE_TO_SIDE_DOT,
                Positional,
                Sweep::dot(SweepMotion::BounceDown)
            ),
            descriptor!(PATTERN_NAME_RANDOM_SINGLE_DOT, Positional, RandomDot),
            descriptor!(
                PATTERN_NAME_HORIZONTAL_LINE_RL,
                Positional,
                Sweep::line(SweepMotion::Ascending)
            ),
            descriptor!(
                PATTERN_NAME_HORIZONTAL_LINE_LR,
                Positional,
                Sweep::line(SweepMotion::Descending)
            ),
            descriptor!(
                PATTERN_NAME_HORIZONTAL_LINE_SIDE_TO_SIDE,
                Positional,
                Sweep::line(SweepMotion::BounceUp)
            ),
            descriptor!(PATTERN_NAME_CIRCLE_ZOOM_IN, Flashing, Oscillator::circle_zoom()),
            descriptor!(PATTERN_NAME_CRAZY_DOTS, Flashing, CrazyDots::default()),
            descriptor!(PATTERN_NAME_CRAZY_DOTS_AUTO, Flashing, AutoMotion::crazy_dots()),
            descriptor!(PATTERN_NAME_LINE_WITH_DOTS_RL, Flashing, LineWithDots::default()),
            descriptor!(PATTERN_NAME_SPAZZ_CIRCLE, Flashing, SpazzCircle::default()),
            descriptor!(PATTERN_NAME_WIGGLE_LINE, Flowing, Oscillator::wiggle_line()),
            descriptor!(PATTERN_NAME_SPOTLIGHT, Flowing, Spotlight::default()),
            descriptor!(PATTERN_NAME_DRIFTING_DOT, Flowing, DriftingDot::default()),
            descriptor!(PATTERN_NAME_VOICE_WAVE, Flowing, AutoMotion::voice_wave()),
            descriptor!(PATTERN_NAME_TWO_CIRCLE_SPIN, Flowing, AutoMotion::two_circle_spin()),
        ];

        let mut catalog = Self::new();
        for descriptor in descriptors {
            // The built-in set is far below capacity and has unique names.
            let _ = catalog.register(descriptor);
        }
        catalog
    }

    /// Add a descriptor.
    ///
    /// Returns the descriptor back if the catalog is full or the name is taken.
    pub fn register(
        &mut self,
        descriptor: PatternDescriptor,
    ) -> Result<PatternKey, PatternDescriptor> {
        if self.by_name(descriptor.name).is_some() {
            return Err(descriptor);
        }
        let index = self.entries.len();
        self.entries.push(descriptor)?;
        Ok(PatternKey::from_index(index))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: PatternKey) -> Option<&PatternDescriptor> {
        self.entries.get(key.index())
    }

    pub fn by_name(&self, name: &str) -> Option<PatternKey> {
        self.iter()
            .find(|(_, descriptor)| descriptor.name == name)
            .map(|(key, _)| key)
    }

    /// Every descriptor with its key, in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (PatternKey, &PatternDescriptor)> {
        self.entries
            .iter()
            .enumerate()
            .map(|(index, descriptor)| (PatternKey::from_index(index), descriptor))
    }

    /// Descriptors belonging to one category.
    pub fn in_category(
        &self,
        category: Category,
    ) -> impl Iterator<Item = (PatternKey, &PatternDescriptor)> {
        self.iter()
            .filter(move |(_, descriptor)| descriptor.category == category)
    }

    pub fn has_category(&self, category: Category) -> bool {
        self.in_category(category).next().is_some()
    }

    /// Pick a descriptor of the category uniformly at random.
    pub fn choose(&self, category: Category, rng: &mut PatternRng) -> Option<PatternKey> {
        let keys: Vec<PatternKey, MAX_PATTERNS> =
            self.in_category(category).map(|(key, _)| key).collect();
        if keys.is_empty() {
            return None;
        }
        keys.get(rng.random_range(0..keys.len())).copied()
    }
}
