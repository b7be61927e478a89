use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RpsChoice {
    Rock,
    Paper,
    Scissors,
}

impl RpsChoice {
    pub const ALL: [RpsChoice; 3] = [Self::Rock, Self::Paper, Self::Scissors];

    pub fn beats(self, other: RpsChoice) -> bool {
        matches!(
            (self, other),
            (Self::Rock, Self::Scissors) | (Self::Paper, Self::Rock) | (Self::Scissors, Self::Paper)
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Rock => "rock",
            Self::Paper => "paper",
            Self::Scissors => "scissors",
        }
    }
}

impl FromStr for RpsChoice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rock" => Ok(Self::Rock),
            "paper" => Ok(Self::Paper),
            "scissors" => Ok(Self::Scissors),
            other => Err(format!("unknown choice {other:?}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundResult {
    First,
    Second,
    Tie,
}

pub fn resolve(first: RpsChoice, second: RpsChoice) -> RoundResult {
    if first.beats(second) {
        RoundResult::First
    } else if second.beats(first) {
        RoundResult::Second
    } else {
        RoundResult::Tie
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use RpsChoice::{Paper, Rock, Scissors};

    #[test]
    fn test_truth_table() {
        assert_eq!(resolve(Rock, Scissors), RoundResult::First);
        assert_eq!(resolve(Paper, Rock), RoundResult::First);
        assert_eq!(resolve(Scissors, Paper), RoundResult::First);
        assert_eq!(resolve(Scissors, Rock), RoundResult::Second);
        assert_eq!(resolve(Rock, Paper), RoundResult::Second);
        assert_eq!(resolve(Paper, Scissors), RoundResult::Second);
    }

    #[test]
    fn test_equal_choices_tie() {
        for choice in RpsChoice::ALL {
            assert_eq!(resolve(choice, choice), RoundResult::Tie);
        }
    }

    #[test]
    fn test_parse() {
        assert_eq!(" Rock ".parse::<RpsChoice>(), Ok(Rock));
        assert!("lizard".parse::<RpsChoice>().is_err());
    }
}
