use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString, IntoEnumIterator};

fn label_key(raw: &str) -> String {
    raw.trim().to_ascii_lowercase().replace(['-', ' ', '/'], "_")
}

/// Ordinal skill mastery.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    AsRefStr,
    Display,
    EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Proficiency {
    Beginner,
    Intermediate,
    Advanced,
    Expert,
}

impl Proficiency {
    pub fn rank(self) -> u8 {
        match self {
            Self::Beginner => 1,
            Self::Intermediate => 2,
            Self::Advanced => 3,
            Self::Expert => 4,
        }
    }

    pub fn parse_label(raw: &str) -> Option<Self> {
        match label_key(raw).as_str() {
            "novice" | "basic" | "entry" => Some(Self::Beginner),
            "proficient" | "working" => Some(Self::Intermediate),
            "senior" | "strong" => Some(Self::Advanced),
            "master" | "mastery" => Some(Self::Expert),
            other => other.parse().ok(),
        }
    }
}

/// Seniority ladder derived from years of experience.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    AsRefStr,
    Display,
    EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum ExperienceLevel {
    Entry,
    Junior,
    Mid,
    Senior,
    Lead,
    Principal,
}

impl ExperienceLevel {
    pub fn rank(self) -> i32 {
        match self {
            Self::Entry => 0,
            Self::Junior => 1,
            Self::Mid => 2,
            Self::Senior => 3,
            Self::Lead => 4,
            Self::Principal => 5,
        }
    }

    /// entry <1, junior <3, mid <6, senior <10, lead <15, principal otherwise.
    pub fn from_years(years: f64) -> Self {
        if years < 1.0 {
            Self::Entry
        } else if years < 3.0 {
            Self::Junior
        } else if years < 6.0 {
            Self::Mid
        } else if years < 10.0 {
            Self::Senior
        } else if years < 15.0 {
            Self::Lead
        } else {
            Self::Principal
        }
    }

    pub fn parse_label(raw: &str) -> Option<Self> {
        match label_key(raw).as_str() {
            "entry_level" | "intern" | "graduate" | "trainee" => Some(Self::Entry),
            "associate" => Some(Self::Junior),
            "mid_level" | "middle" | "intermediate" => Some(Self::Mid),
            "staff" | "team_lead" | "tech_lead" => Some(Self::Lead),
            "executive" | "director" | "architect" => Some(Self::Principal),
            other => other.parse().ok(),
        }
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    AsRefStr,
    Display,
    EnumIter,
    EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum SkillCategory {
    Programming,
    Web,
    DataScience,
    Databases,
    Cloud,
    Mobile,
    Design,
    ProjectManagement,
    SoftSkills,
    Other,
}

impl SkillCategory {
    pub fn parse_label(raw: &str) -> Option<Self> {
        match label_key(raw).as_str() {
            "programming_languages" | "languages" | "language" => Some(Self::Programming),
            "web_development" | "frontend" | "backend" => Some(Self::Web),
            "science" | "machine_learning" | "ml" | "ai" | "analytics" => Some(Self::DataScience),
            "database" | "db" => Some(Self::Databases),
            "cloud_technologies" | "devops" | "infrastructure" => Some(Self::Cloud),
            "mobile_development" => Some(Self::Mobile),
            "ux" | "ui" => Some(Self::Design),
            "management" | "pm" => Some(Self::ProjectManagement),
            "soft" | "interpersonal" => Some(Self::SoftSkills),
            other => other.parse().ok(),
        }
    }

    fn default_weight(self) -> f64 {
        match self {
            Self::Programming => 0.30,
            Self::Web | Self::DataScience => 0.25,
            Self::Databases => 0.20,
            Self::Cloud | Self::Mobile => 0.15,
            Self::Design | Self::ProjectManagement | Self::SoftSkills | Self::Other => 0.10,
        }
    }
}

/// Canonical skill name → category. Keys are outputs of `normalize_skill`.
const SKILL_CATEGORIES: &[(SkillCategory, &[&str])] = &[
    (
        SkillCategory::Programming,
        &[
            "python", "java", "javascript", "typescript", "golang", "rust", "csharp",
            "cplusplus", "c", "php", "ruby", "kotlin", "scala", "perl", "bash",
        ],
    ),
    (
        SkillCategory::Web,
        &[
            "react", "vue", "angular", "svelte", "nextjs", "nuxt", "html", "css", "sass",
            "tailwind", "bootstrap", "nodejs", "express", "django", "flask", "fastapi",
            "spring", "laravel", "rails", "graphql", "rest",
        ],
    ),
    (
        SkillCategory::DataScience,
        &[
            "machine learning", "pandas", "numpy", "tensorflow", "pytorch", "scikit-learn",
            "spark", "hadoop", "statistics", "r", "tableau", "data analysis",
        ],
    ),
    (
        SkillCategory::Databases,
        &[
            "sql", "postgresql", "mysql", "mongodb", "redis", "sqlite", "elasticsearch",
            "oracle", "dynamodb", "cassandra",
        ],
    ),
    (
        SkillCategory::Cloud,
        &[
            "aws", "gcp", "azure", "docker", "kubernetes", "terraform", "ansible", "jenkins",
            "firebase", "kafka",
        ],
    ),
    (
        SkillCategory::Mobile,
        &["swift", "android", "ios", "reactnative", "flutter", "xamarin", "ionic"],
    ),
    (
        SkillCategory::Design,
        &["figma", "sketch", "photoshop", "illustrator", "ux design", "ui design"],
    ),
    (
        SkillCategory::ProjectManagement,
        &["agile", "scrum", "jira", "kanban", "project management", "pmp"],
    ),
    (
        SkillCategory::SoftSkills,
        &["communication", "leadership", "teamwork", "problem solving", "mentoring"],
    ),
];

/// Related-industry pairs. Looked up symmetrically.
const RELATED_DOMAINS: &[(&str, &[&str])] = &[
    (
        "technology",
        &[
            "finance", "healthcare", "education", "e-commerce", "retail", "manufacturing",
            "consulting", "government", "defense", "banking", "automobile",
        ],
    ),
    ("finance", &["banking", "consulting"]),
    ("healthcare", &["consulting"]),
    ("education", &["government"]),
    ("retail", &["e-commerce"]),
    ("manufacturing", &["consulting", "automobile"]),
    ("government", &["defense"]),
];

/// Static lookup tables consulted by the matchers.
///
/// Built once and handed to `MatchingConfig`; tests swap in alternative
/// weightings through the `with_*` builders.
#[derive(Debug, Clone, PartialEq)]
pub struct Taxonomy {
    category_weights: BTreeMap<SkillCategory, f64>,
    skill_categories: HashMap<String, SkillCategory>,
    related_domains: BTreeMap<String, BTreeSet<String>>,
}

impl Default for Taxonomy {
    fn default() -> Self {
        let category_weights = SkillCategory::iter()
            .map(|category| (category, category.default_weight()))
            .collect();

        let skill_categories = SKILL_CATEGORIES
            .iter()
            .flat_map(|(category, skills)| {
                skills.iter().map(move |skill| (skill.to_string(), *category))
            })
            .collect();

        let mut taxonomy = Self {
            category_weights,
            skill_categories,
            related_domains: BTreeMap::new(),
        };
        for (domain, related) in RELATED_DOMAINS {
            for other in *related {
                taxonomy.insert_related(domain, other);
            }
        }
        taxonomy
    }
}

impl Taxonomy {
    pub fn category_weight(&self, category: SkillCategory) -> f64 {
        self.category_weights
            .get(&category)
            .copied()
            .unwrap_or_else(|| SkillCategory::Other.default_weight())
    }

    /// Category for a canonical skill name; unknown skills fall into `Other`.
    pub fn category_for(&self, canonical_skill: &str) -> SkillCategory {
        self.skill_categories
            .get(canonical_skill)
            .copied()
            .unwrap_or(SkillCategory::Other)
    }

    pub fn domains_related(&self, a: &str, b: &str) -> bool {
        let a = normalize_domain(a);
        let b = normalize_domain(b);
        self.related_domains
            .get(&a)
            .is_some_and(|related| related.contains(&b))
    }

    pub fn with_category_weight(mut self, category: SkillCategory, weight: f64) -> Self {
        self.category_weights.insert(category, weight.max(0.0));
        self
    }

    pub fn with_skill_category(mut self, canonical_skill: &str, category: SkillCategory) -> Self {
        self.skill_categories
            .insert(canonical_skill.to_string(), category);
        self
    }

    pub fn with_related_domains(mut self, a: &str, b: &str) -> Self {
        self.insert_related(a, b);
        self
    }

    fn insert_related(&mut self, a: &str, b: &str) {
        let a = normalize_domain(a);
        let b = normalize_domain(b);
        self.related_domains
            .entry(a.clone())
            .or_default()
            .insert(b.clone());
        self.related_domains.entry(b).or_default().insert(a);
    }
}

/// Domain tags compare case-insensitively with `_`/space folded to `-`.
pub fn normalize_domain(raw: &str) -> String {
    raw.trim()
        .to_lowercase()
        .split(|c: char| c.is_whitespace() || c == '_')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}
