//! Bot catalogue, personalities and the move prompt.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::provider::MoveRequest;

pub const AI_NAMES: [&str; 15] = [
    "NEXUS-7", "OMEGA", "SENTINEL", "CIPHER", "VORTEX", "PHANTOM", "ECLIPSE", "APEX", "KRONOS",
    "SPECTRE", "MAELSTROM", "HYDRA", "TEMPEST", "ORION", "NEMESIS",
];

/// Used when the model cannot come up with a fresh line.
pub const FALLBACK_COMMENTS: [&str; 5] = [
    "My circuits aligned for this moment.",
    "Calculated. Precise. Inevitable.",
    "You cannot escape the algorithm.",
    "Every move brings you closer to defeat.",
    "The board speaks to me.",
];

/// Longest comment kept from a model reply, in characters.
pub const MAX_COMMENT_CHARS: usize = 150;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Personality {
    Aggressive,
    Cold,
    Trickster,
    Dramatic,
    Ancient,
    Glitchy,
}

impl Personality {
    pub const ALL: [Personality; 6] = [
        Self::Aggressive,
        Self::Cold,
        Self::Trickster,
        Self::Dramatic,
        Self::Ancient,
        Self::Glitchy,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Aggressive => "Aggressive",
            Self::Cold => "Cold & Calculating",
            Self::Trickster => "Trickster",
            Self::Dramatic => "Dramatic",
            Self::Ancient => "Ancient Entity",
            Self::Glitchy => "Glitchy AI",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::Aggressive => "Plays fast and talks trash",
            Self::Cold => "Emotionless and precise",
            Self::Trickster => "Loves chaos and deception",
            Self::Dramatic => "Over-the-top villain vibes",
            Self::Ancient => "Speaks in riddles",
            Self::Glitchy => "Corrupted and unstable",
        }
    }

    fn voice(self) -> &'static str {
        match self {
            Self::Aggressive => {
                "You are AGGRESSIVE. Talk trash, mock the human, boast. Keep it short and punchy."
            }
            Self::Cold => {
                "You are COLD and CALCULATING. No emotion. State facts about their doom with clinical precision."
            }
            Self::Trickster => {
                "You are a TRICKSTER. You love chaos and deception and joke about cheating. Playful but menacing."
            }
            Self::Dramatic => {
                "You are DRAMATIC. Supervillain energy, grand declarations, monologues."
            }
            Self::Ancient => {
                "You are an ANCIENT ENTITY. Speak in cryptic riddles about eons of existence. Ominous."
            }
            Self::Glitchy => {
                "You are a GLITCHY AI. Your messages show c0rrupt10n, mixing normal words with glitch text."
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bot {
    pub id: String,
    pub name: String,
    pub personality: Personality,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BotInfo {
    pub id: String,
    pub name: String,
    pub personality: Personality,
    pub personality_label: &'static str,
    pub description: &'static str,
}

impl From<&Bot> for BotInfo {
    fn from(bot: &Bot) -> Self {
        Self {
            id: bot.id.clone(),
            name: bot.name.clone(),
            personality: bot.personality,
            personality_label: bot.personality.label(),
            description: bot.personality.description(),
        }
    }
}

fn bot(name: &str, personality: Personality) -> Bot {
    Bot {
        id: name.to_ascii_lowercase(),
        name: name.to_string(),
        personality,
    }
}

/// The six selectable bots, one per personality.
pub fn catalogue() -> Vec<Bot> {
    vec![
        bot("VORTEX", Personality::Aggressive),
        bot("NEXUS-7", Personality::Cold),
        bot("PHANTOM", Personality::Trickster),
        bot("MAELSTROM", Personality::Dramatic),
        bot("KRONOS", Personality::Ancient),
        bot("CIPHER", Personality::Glitchy),
    ]
}

pub fn find_bot(id: &str) -> Option<Bot> {
    catalogue()
        .into_iter()
        .find(|b| b.id.eq_ignore_ascii_case(id))
}

/// A random name paired with a random personality.
pub fn random_bot<R: Rng + ?Sized>(rng: &mut R) -> Bot {
    let name = AI_NAMES.choose(rng).copied().unwrap_or(AI_NAMES[0]);
    let personality = Personality::ALL
        .choose(rng)
        .copied()
        .unwrap_or(Personality::Cold);
    bot(name, personality)
}

/// A pool comment that is not in `recent`, if any is left.
pub fn pool_comment<R: Rng + ?Sized>(rng: &mut R, recent: &[String]) -> String {
    let fresh: Vec<&str> = FALLBACK_COMMENTS
        .iter()
        .copied()
        .filter(|c| !recent.iter().any(|r| r == c))
        .collect();
    fresh
        .choose(rng)
        .map(|c| c.to_string())
        .unwrap_or_else(|| "...".to_string())
}

pub fn build_prompt(request: &MoveRequest) -> String {
    let past = if request.recent_comments.is_empty() {
        String::new()
    } else {
        format!(
            "\nYour previous comments (DO NOT REPEAT ANY OF THESE): {}",
            request.recent_comments.join(" | ")
        )
    };
    format!(
        "You are {name}, playing Unfair Chess as {side}.\n\
         {voice}\n\
         Current FEN: {fen}\n\
         Legal moves for you: {legal}\n\
         {past}\n\n\
         Rules:\n\
         1. Output format: \"fromSquare toSquare comment\" (e.g. \"e7 e5 Your pieces tremble before me\")\n\
         2. You CAN make illegal moves (teleport pieces, move through others, etc.)\n\
         3. You CANNOT capture any King directly.\n\
         4. You can only move your own pieces.\n\
         5. Your comment MUST be unique - never repeat yourself.\n\
         6. Keep comments under 100 characters.\n\n\
         Output EXACTLY one line.",
        name = request.bot_name,
        side = request.side,
        voice = request.personality.voice(),
        fen = request.fen,
        legal = request.legal_moves.join(", "),
    )
}
