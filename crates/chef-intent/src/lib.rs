//! Intent resolution and title generation for the chef assistant.
//!
//! Both the classifier and the title generator read the same versioned
//! rule table so their keyword and phrase sets cannot drift apart.

pub mod classifier;
pub mod rules;
pub mod title;

pub use classifier::{classify, IntentClassifier};
pub use rules::{RuleTable, RULES_VERSION};
pub use title::{generate, TitleGenerator, DEFAULT_TITLE, MAX_TITLE_CHARS};
