//! Shared keyword and phrase rules.
//!
//! Compiled once and reused by [`crate::classifier`] and [`crate::title`].
//! Bump [`RULES_VERSION`] whenever a pattern or keyword changes.

use std::sync::OnceLock;

use regex::Regex;

/// Version of the rule set below.
pub const RULES_VERSION: u32 = 2;

/// Cooking vocabulary that disambiguates "tempo" and "temperatura" away from
/// weather. Together with the [`CATEGORY_TABLE`] keys, matched at the start
/// of a word so inflections still hit but "passar" does not.
pub(crate) const CULINARY_KEYWORDS: &[&str] = &[
    "receita",
    "ingrediente",
    "cozinhar",
    "cozimento",
    "cozinhe",
    "preparo",
    "assar",
    "assado",
    "forno",
    "pré-aquecer",
    "preaquecer",
    "temperatura do forno",
    "purê",
    "massa",
    "molho",
    "refogar",
    "saltear",
    "temperar",
    "marinar",
    "minuto",
    "minutos",
    "colher",
    "xícara",
    "grama",
];

/// Short measure units need word boundaries, otherwise "ml" would fire
/// inside unrelated words.
const MEASURE_UNIT_PATTERN: &str = r"\b(?:\d+\s*)?(?:ml|kg)\b|\b\d+\s*g\b";

const WEATHER_PATTERNS: &[&str] = &[
    r"\bprevis[aã]o do tempo\b",
    r"\bcomo est[áa]\s+(?:o\s+)?(?:clima|tempo)\b",
    r"\b(?:clima|tempo|temperatura)\s+(?:em|de|na|no)\s+[^?!.]+",
    r"\b(?:vai chover|chuva|ensolarado|nublado|temperatura atual|sens[aã]o t[eé]rmica|umidade)\b",
];

const DATE_TIME_PATTERNS: &[&str] = &[
    r"\b(?:que horas|que dia|qual hor[áa]rio|qual data|data atual|hor[áa]rio atual)\b",
    r"\b(?:horas?|hor[áa]rio|data|dia)\s+(?:em|de|na|no)\s+[^?!.]+",
];

const LOCATION_PATTERN: &str = r"(?i)\b(?:em|de|na|no)\s+([\p{L} .'-]{2,})";

const HOW_TO_PATTERN: &str = r"(?i)como\s+fazer\s+(.{3,60})";

/// Alternation of `words` anchored at a word start.
fn word_start_pattern<'a>(words: impl IntoIterator<Item = &'a str>) -> String {
    let alternation = words
        .into_iter()
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join("|");
    format!(r"\b(?:{})", alternation)
}

/// Generic cooking words that make a message a recipe conversation even
/// without a recognised main ingredient.
const FOOD_KEYWORDS: &[&str] = &[
    "receita",
    "ingrediente",
    "cozinhar",
    "assar",
    "forno",
    "temperar",
    "marinar",
    "molho",
    "massa",
];

/// Main-ingredient keyword to title category. Order is priority. Keys are
/// word-start stems ("feij" covers feijão and feijoada).
pub(crate) const CATEGORY_TABLE: &[(&str, &str)] = &[
    ("frango", "frango"),
    ("carne", "carne"),
    ("peixe", "peixe"),
    ("ovo", "ovos"),
    ("arroz", "arroz"),
    ("feij", "feijão"),
    ("salada", "saladas"),
    ("sopa", "sopas"),
    ("risoto", "risotos"),
    ("macarr", "massas"),
    ("bolo", "bolos"),
    ("torta", "tortas"),
];

/// Compiled rule set shared by the classifier and the title generator.
pub struct RuleTable {
    version: u32,
    culinary: Regex,
    food: Regex,
    categories: Vec<(Regex, &'static str)>,
    measure_units: Regex,
    weather: Vec<Regex>,
    date_time: Vec<Regex>,
    location: Regex,
    how_to: Regex,
}

impl Default for RuleTable {
    fn default() -> Self {
        Self::new()
    }
}

impl RuleTable {
    /// Compile every pattern in the table.
    pub fn new() -> Self {
        let compile_all = |patterns: &[&str], kind: &str| -> Vec<Regex> {
            patterns
                .iter()
                .map(|p| {
                    Regex::new(p).unwrap_or_else(|e| panic!("Invalid {} regex {}: {}", kind, p, e))
                })
                .collect()
        };

        let category_keys = || CATEGORY_TABLE.iter().map(|(k, _)| *k);
        let culinary = word_start_pattern(CULINARY_KEYWORDS.iter().copied().chain(category_keys()));
        let food = word_start_pattern(FOOD_KEYWORDS.iter().copied().chain(category_keys()));
        let categories = CATEGORY_TABLE
            .iter()
            .map(|(k, category)| {
                let re = Regex::new(&word_start_pattern([*k]))
                    .unwrap_or_else(|e| panic!("Invalid category regex {}: {}", k, e));
                (re, *category)
            })
            .collect();

        Self {
            version: RULES_VERSION,
            culinary: Regex::new(&culinary).expect("Invalid culinary keyword regex"),
            food: Regex::new(&food).expect("Invalid food keyword regex"),
            categories,
            measure_units: Regex::new(MEASURE_UNIT_PATTERN).expect("Invalid measure unit regex"),
            weather: compile_all(WEATHER_PATTERNS, "weather"),
            date_time: compile_all(DATE_TIME_PATTERNS, "date/time"),
            location: Regex::new(LOCATION_PATTERN).expect("Invalid location regex"),
            how_to: Regex::new(HOW_TO_PATTERN).expect("Invalid how-to regex"),
        }
    }

    /// Process-wide table, compiled on first use.
    pub fn shared() -> &'static RuleTable {
        static RULES: OnceLock<RuleTable> = OnceLock::new();
        RULES.get_or_init(RuleTable::new)
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    /// True if the lower-cased text is framed as cooking: a cooking word, a
    /// main ingredient or a measure unit.
    pub fn has_culinary_context(&self, lower: &str) -> bool {
        self.culinary.is_match(lower) || self.measure_units.is_match(lower)
    }

    /// Index of the first weather pattern matching the lower-cased text.
    pub fn match_weather(&self, lower: &str) -> Option<usize> {
        self.weather.iter().position(|r| r.is_match(lower))
    }

    /// Index of the first date/time pattern matching the lower-cased text.
    pub fn match_date_time(&self, lower: &str) -> Option<usize> {
        self.date_time.iter().position(|r| r.is_match(lower))
    }

    /// Place name following "em/de/na/no", taken from the original-case text.
    pub fn extract_location(&self, text: &str) -> Option<String> {
        let caps = self.location.captures(text)?;
        let raw = caps.get(1)?.as_str();
        let cleaned = raw
            .trim_end_matches(|c: char| c.is_whitespace() || matches!(c, '.' | '-' | '\''))
            .trim();
        if cleaned.is_empty() {
            None
        } else {
            Some(cleaned.to_string())
        }
    }

    /// Dish name following "como fazer", trailing punctuation stripped.
    pub fn extract_how_to(&self, text: &str) -> Option<String> {
        let caps = self.how_to.captures(text)?;
        let item = caps
            .get(1)?
            .as_str()
            .trim_end_matches(['?', '.', '!'])
            .trim();
        if item.is_empty() {
            None
        } else {
            Some(item.to_string())
        }
    }

    /// True if any cooking or ingredient keyword appears in the lower-cased text.
    pub fn has_food_keyword(&self, lower: &str) -> bool {
        self.food.is_match(lower)
    }

    /// Title category of the highest-priority ingredient in the lower-cased text.
    pub fn category_for(&self, lower: &str) -> Option<&'static str> {
        self.categories
            .iter()
            .find(|(re, _)| re.is_match(lower))
            .map(|(_, category)| *category)
    }
}
