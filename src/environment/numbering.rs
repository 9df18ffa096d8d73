//! Hierarchical title numbering and adornment-character depth allocation.

use crate::error::BuildonomyError;

/// Number of numbering depths (0 through 15).
pub const TITLE_DEPTHS: usize = 16;

/// Marker prefixed to every title anchor token.
pub const TITLE_MARKER: &str = "title";

/// Numbering of one title: the counters of depths `1..=level` at the time it was created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TitleNumber {
    counters: Vec<usize>,
}

impl TitleNumber {
    pub fn level(&self) -> usize {
        self.counters.len()
    }

    pub fn counters(&self) -> &[usize] {
        &self.counters
    }

    /// Dot joined numbering without the marker, e.g. `1.2.1`.
    pub fn numbering(&self) -> String {
        self.counters
            .iter()
            .map(|c| c.to_string())
            .collect::<Vec<_>>()
            .join(".")
    }

    /// Anchor token: the marker followed by the numbering, e.g. `title.1.2.1`.
    pub fn token(&self) -> String {
        std::iter::once(TITLE_MARKER.to_string())
            .chain(self.counters.iter().map(|c| c.to_string()))
            .collect::<Vec<_>>()
            .join(".")
    }
}

impl std::fmt::Display for TitleNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.token())
    }
}

fn check_level(level: usize) -> Result<(), BuildonomyError> {
    if level >= TITLE_DEPTHS {
        return Err(BuildonomyError::OutOfRange(format!(
            "numbering depth {level} (expected 0..{TITLE_DEPTHS})"
        )));
    }
    Ok(())
}

/// Per-document numbering state.
///
/// Two counter families share the same depths. Title counters start at 0 and are bumped before
/// use, so the first title of a depth is numbered 1. Enumeration counters (figures, footnotes)
/// start at 1 and are bumped after use. Creating a title resets both families below its depth.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Numbering {
    title_counters: [usize; TITLE_DEPTHS],
    number_counters: [usize; TITLE_DEPTHS],
    /// Adornment characters in allocation order; the depth of `title_letters[i]` is `i + 1`.
    title_letters: Vec<char>,
    current_level: usize,
}

impl Default for Numbering {
    fn default() -> Self {
        Numbering {
            title_counters: [0; TITLE_DEPTHS],
            number_counters: [1; TITLE_DEPTHS],
            title_letters: Vec::new(),
            current_level: 0,
        }
    }
}

impl Numbering {
    pub fn reset(&mut self) {
        *self = Numbering::default();
    }

    pub fn current_level(&self) -> usize {
        self.current_level
    }

    pub fn create_title(&mut self, level: usize) -> Result<TitleNumber, BuildonomyError> {
        check_level(level)?;
        for depth in (level + 1)..TITLE_DEPTHS {
            self.title_counters[depth] = 0;
            self.number_counters[depth] = 1;
        }
        // A title nested under a depth that never had a title of its own opens that depth at 1.
        for depth in 1..level {
            if self.title_counters[depth] == 0 {
                self.title_counters[depth] = 1;
            }
        }
        self.title_counters[level] += 1;
        self.current_level = level;

        let number = TitleNumber {
            counters: self.title_counters[1..=level].to_vec(),
        };
        tracing::debug!("[Numbering::create_title] level {level} -> {number}");
        Ok(number)
    }

    /// Return the enumeration counter at `level`, then advance it.
    pub fn get_number(&mut self, level: usize) -> Result<usize, BuildonomyError> {
        check_level(level)?;
        let number = self.number_counters[level];
        self.number_counters[level] += 1;
        Ok(number)
    }

    /// Depth associated with a heading adornment character, allocating the next free depth
    /// (starting at 1) on first sight.
    pub fn get_level(&mut self, letter: char) -> Result<usize, BuildonomyError> {
        if let Some(idx) = self.title_letters.iter().position(|l| *l == letter) {
            return Ok(idx + 1);
        }
        let depth = self.title_letters.len() + 1;
        check_level(depth)?;
        self.title_letters.push(letter);
        tracing::debug!("[Numbering::get_level] '{letter}' allocated depth {depth}");
        Ok(depth)
    }

    pub fn title_letters(&self) -> &[char] {
        &self.title_letters
    }
}
