use lazy_static::lazy_static;
use regex::Regex;
use std::borrow::Cow;

// Upper bound for repeated application of a single rule.
// Every round consumes at least one insertion point,
// so real addresses settle after a few rounds.
const MAX_ROUNDS: usize = 16;

/// A single text transformation of the normalization pipeline.
#[derive(Debug)]
pub struct Rule {
    pub name: &'static str,
    pattern: Regex,
    replacement: &'static str,
    /// Re-apply until nothing changes. Needed for rules
    /// with overlapping matches like `AveStJames`.
    repeat: bool,
}

impl Rule {
    fn new(name: &'static str, pattern: &str, replacement: &'static str) -> Self {
        Self {
            name,
            pattern: Regex::new(pattern).unwrap(),
            replacement,
            repeat: false,
        }
    }

    fn repeated(name: &'static str, pattern: &str, replacement: &'static str) -> Self {
        Self {
            repeat: true,
            ..Self::new(name, pattern, replacement)
        }
    }

    pub fn apply<'a>(&self, text: &'a str) -> Cow<'a, str> {
        let mut result = self.pattern.replace_all(text, self.replacement);
        if !self.repeat {
            return result;
        }
        for _ in 1..MAX_ROUNDS {
            let next = match self.pattern.replace_all(&result, self.replacement) {
                Cow::Borrowed(_) => break,
                Cow::Owned(next) => next,
            };
            result = Cow::Owned(next);
        }
        result
    }
}

// Known truncations produced by the scraper.
// A typo only matches if it is not followed by a lowercase
// letter, so the restored word never matches again.
// The match consumes the following character, so back-to-back
// truncations need repeated application.
const TYPOS: &[(&str, &str, &str)] = &[
    ("typo-turnpike", r"Turnpik([^a-z]|$)", "Turnpike$1"),
    ("typo-expressway", r"Expresswa([^a-z]|$)", "Expressway$1"),
    ("typo-boulevard", r"Boulevar([^a-z]|$)", "Boulevard$1"),
    ("typo-parkway", r"Parkwa([^a-z]|$)", "Parkway$1"),
    ("typo-avenue", r"Avenu([^a-z]|$)", "Avenue$1"),
];

const STREET_TYPES: &str = "Drive|Dr|Street|St|Avenue|Ave|Road|Rd|Court|Ct|Lane|Ln|\
    Place|Pl|Boulevard|Blvd|Parkway|Pkwy|Terrace|Ter|Circle|Cir|Highway|Hwy|\
    Turnpike|Tpke|Expressway|Expy|Square|Sq|Trail|Trl|Way|Route";

lazy_static! {
    /// Rules that are applied to the whole address, in this order.
    pub static ref ADDRESS_RULES: Vec<Rule> = {
        let mut rules: Vec<Rule> = TYPOS
            .iter()
            .map(|(name, pattern, replacement)| Rule::repeated(name, pattern, replacement))
            .collect();
        rules.extend([
            // 153-16TuskegeeAve -> 153-16 TuskegeeAve
            Rule::new("house-number", r"(\d+\s*-\s*\d+)([A-Za-z])", "$1 $2"),
            // Route 25AMain -> Route 25A Main
            Rule::new(
                "route-number",
                r"((?:Route|Rte|Highway|Hwy|Interstate|\bRt|\bUS|\bSR|\bCR|\bI-)\s*\d+[A-Z]?)([A-Z][a-z])",
                "$1 $2",
            ),
            // Apt 4BMain -> Apt 4B Main
            Rule::new(
                "unit-marker",
                r"((?:Apt|Unit|Suite|Ste|Bldg|Fl|#)\.?\s*\d+[A-Z]?)([A-Z][a-z])",
                "$1 $2",
            ),
            // AveStJames -> Ave St James
            Rule::repeated(
                "street-type",
                &format!("({STREET_TYPES})([A-Z])"),
                "$1 $2",
            ),
            // TuskegeeAve -> Tuskegee Ave
            Rule::repeated("camel-case", r"([a-z])([A-Z][a-z])", "$1 $2"),
            // JamesNY11780 -> James NY11780
            Rule::new("state-code", r"([a-z])([A-Z]{2}\d)", "$1 $2"),
            // NY11780 -> NY 11780
            Rule::new("zip-code", r"([A-Z]{2})(\d{5}(?:-\d{4})?)\b", "$1 $2"),
            Rule::new("whitespace", r"\s+", " "),
        ]);
        rules
    };

    /// Rules that are only applied to the first segment (street line).
    pub static ref STREET_LINE_RULES: Vec<Rule> = vec![
        // 1 st -> 1st
        Rule::new("ordinal", r"\b(\d+) (st|nd|rd|th)\b", "$1$2"),
        // 153 - 16 -> 153-16
        Rule::new("hyphenated-number", r"\b(\d+) ?- ?(\d+)\b", "$1-$2"),
    ];
}
