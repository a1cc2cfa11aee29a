//! # Guitar Strings
//!
//! The six strings in their selection cycle and the string-selection state
//! machine. Expected frequencies come from a static table and are never
//! cached alongside the selection.

/// Which side of the headstock a string's tuning peg sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeadstockSide {
    Left,
    Right,
}

/// One physical guitar string.
///
/// Variants are declared in selection-cycle order: the three left-hand pegs
/// from the nut outwards, then the three right-hand pegs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GuitarString {
    D,
    A,
    LowE,
    G,
    B,
    HighE,
}

/// Standard-tuning fundamentals in Hz, indexed by cycle position.
const FREQUENCY_TABLE: [f32; 6] = [146.83, 110.00, 82.41, 196.00, 246.94, 329.63];

impl GuitarString {
    /// Every string in cycle order.
    pub const ALL: [GuitarString; 6] = [
        GuitarString::D,
        GuitarString::A,
        GuitarString::LowE,
        GuitarString::G,
        GuitarString::B,
        GuitarString::HighE,
    ];

    /// Position of this string in the selection cycle.
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Expected fundamental frequency in Hz.
    pub fn expected_frequency(self) -> f32 {
        FREQUENCY_TABLE[self.index()]
    }

    /// Scientific pitch name of the open string.
    pub fn note_name(self) -> &'static str {
        match self {
            GuitarString::D => "D3",
            GuitarString::A => "A2",
            GuitarString::LowE => "E2",
            GuitarString::G => "G3",
            GuitarString::B => "B3",
            GuitarString::HighE => "E4",
        }
    }

    pub fn headstock_side(self) -> HeadstockSide {
        match self {
            GuitarString::D | GuitarString::A | GuitarString::LowE => HeadstockSide::Left,
            GuitarString::G | GuitarString::B | GuitarString::HighE => HeadstockSide::Right,
        }
    }

    /// The following string in the cycle, wrapping from last to first.
    pub fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    /// The preceding string in the cycle, wrapping from first to last.
    pub fn previous(self) -> Self {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

impl Default for GuitarString {
    fn default() -> Self {
        Self::ALL[0]
    }
}

impl std::fmt::Display for GuitarString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.note_name())
    }
}

/// The currently selected string.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StringSelection {
    current: GuitarString,
}

impl StringSelection {
    pub fn current(&self) -> GuitarString {
        self.current
    }

    /// Always re-derived from the table.
    pub fn expected_frequency(&self) -> f32 {
        self.current.expected_frequency()
    }

    pub fn select_next(&mut self) -> GuitarString {
        self.current = self.current.next();
        self.current
    }

    pub fn select_previous(&mut self) -> GuitarString {
        self.current = self.current.previous();
        self.current
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_on_first_string_in_cycle() {
        let selection = StringSelection::default();
        assert_eq!(selection.current(), GuitarString::D);
        assert_eq!(selection.expected_frequency(), 146.83);
    }

    #[test]
    fn six_nexts_return_to_start() {
        let mut selection = StringSelection::default();
        let start = selection.current();
        let visited: Vec<GuitarString> = (0..6).map(|_| selection.select_next()).collect();
        assert_eq!(selection.current(), start);
        assert_eq!(
            visited,
            vec![
                GuitarString::A,
                GuitarString::LowE,
                GuitarString::G,
                GuitarString::B,
                GuitarString::HighE,
                GuitarString::D,
            ]
        );
    }

    #[test]
    fn previous_from_start_wraps_to_last() {
        let mut selection = StringSelection::default();
        assert_eq!(selection.select_previous(), GuitarString::HighE);
        assert_eq!(selection.expected_frequency(), 329.63);
        assert_eq!(selection.select_next(), GuitarString::D);
    }

    #[test]
    fn table_is_total() {
        let expected = [
            (GuitarString::LowE, 82.41),
            (GuitarString::A, 110.00),
            (GuitarString::D, 146.83),
            (GuitarString::G, 196.00),
            (GuitarString::B, 246.94),
            (GuitarString::HighE, 329.63),
        ];
        for (string, hz) in expected {
            assert_eq!(string.expected_frequency(), hz, "{}", string);
            assert_eq!(GuitarString::from_index(string.index()), Some(string));
        }
        assert_eq!(GuitarString::from_index(6), None);
    }

    #[test]
    fn headstock_sides_split_three_and_three() {
        let left = GuitarString::ALL
            .iter()
            .filter(|s| s.headstock_side() == HeadstockSide::Left)
            .count();
        assert_eq!(left, 3);
    }
}
