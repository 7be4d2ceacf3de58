use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::LazyLock;

use strsim::damerau_levenshtein;
use unicode_normalization::UnicodeNormalization;

/// Skill alias → canonical name (O(1) lookup).
///
/// Canonical names are the keys used by `Taxonomy::category_for`.
static ALIAS_TO_CANONICAL: LazyLock<HashMap<&'static str, &'static str>> = LazyLock::new(|| {
    let aliases: &[(&str, &[&str])] = &[
        // Languages
        (
            "javascript",
            &["js", "java script", "ecmascript", "es6", "es2015", "vanilla js"],
        ),
        ("typescript", &["ts", "type script"]),
        ("python", &["python3", "python 3", "py", "python2.7", "cpython"]),
        ("java", &["java8", "java11", "java17", "openjdk", "core java"]),
        ("csharp", &["c#", "c sharp", ".net", "dotnet", "asp.net"]),
        ("cplusplus", &["c++", "cpp", "c plus plus"]),
        ("golang", &["go", "go lang"]),
        ("rust", &["rust lang", "rustlang"]),
        ("php", &["php7", "php8"]),
        ("ruby", &["ruby lang"]),
        ("kotlin", &["kotlin jvm"]),
        ("bash", &["shell", "shell scripting", "sh"]),
        // Web
        ("nodejs", &["node.js", "node js", "node"]),
        ("react", &["reactjs", "react.js", "react js"]),
        ("vue", &["vue.js", "vuejs", "vue js", "vue3"]),
        ("angular", &["angularjs", "angular.js", "angular2"]),
        ("nextjs", &["next.js", "next js"]),
        ("nuxt", &["nuxtjs", "nuxt.js"]),
        ("html", &["html5"]),
        ("css", &["css3", "cascading style sheets"]),
        ("sass", &["scss"]),
        ("tailwind", &["tailwindcss", "tailwind css"]),
        ("spring", &["spring boot", "springboot", "spring framework"]),
        ("django", &["django rest framework", "drf"]),
        ("express", &["express.js", "expressjs"]),
        ("fastapi", &["fast api"]),
        ("rails", &["ruby on rails", "ror"]),
        ("rest", &["rest api", "restful", "restful api", "rest apis"]),
        // Databases
        ("sql", &["structured query language", "t-sql", "tsql", "pl/sql", "sql server", "mssql"]),
        ("postgresql", &["postgres", "pg", "postgre sql"]),
        ("mysql", &["my sql", "mariadb"]),
        ("mongodb", &["mongo", "mongo db"]),
        ("redis", &["redis cache"]),
        ("elasticsearch", &["elastic search", "elastic"]),
        ("sqlite", &["sqlite3"]),
        ("dynamodb", &["dynamo db", "amazon dynamodb"]),
        // Cloud and DevOps
        ("aws", &["amazon web services", "amazon aws"]),
        ("gcp", &["google cloud platform", "google cloud"]),
        ("azure", &["microsoft azure", "ms azure"]),
        ("docker", &["docker container", "containers"]),
        ("kubernetes", &["k8s", "kube"]),
        ("terraform", &["infrastructure as code", "iac"]),
        ("jenkins", &["jenkins ci"]),
        ("kafka", &["apache kafka"]),
        // Data science
        ("machine learning", &["ml", "machine-learning", "machinelearning"]),
        ("tensorflow", &["tensor flow", "tf"]),
        ("pytorch", &["torch", "py torch"]),
        ("scikit-learn", &["sklearn", "scikit learn", "scikit"]),
        ("spark", &["apache spark", "pyspark"]),
        ("hadoop", &["apache hadoop"]),
        ("pandas", &["python pandas"]),
        ("numpy", &["numerical python"]),
        ("statistics", &["statistical analysis", "stats"]),
        ("data analysis", &["data analytics", "analytics"]),
        // Mobile
        ("reactnative", &["react native", "react-native"]),
        ("flutter", &["dart flutter"]),
        ("android", &["android development", "android sdk"]),
        ("ios", &["ios development", "iphone development"]),
        // Design
        ("figma", &["figma design"]),
        ("ux design", &["ux", "user experience", "ux/ui", "ui/ux"]),
        ("ui design", &["ui", "user interface design"]),
        // Management and soft skills
        ("project management", &["project manager", "pm"]),
        ("agile", &["agile methodology", "agile methodologies"]),
        ("scrum", &["scrum master"]),
        ("communication", &["communication skills", "verbal communication"]),
        ("leadership", &["team leadership", "people management"]),
        ("problem solving", &["problem-solving", "analytical thinking"]),
    ];

    let mut map = HashMap::new();
    for (canonical, alias_list) in aliases {
        map.insert(*canonical, *canonical);
        for alias in *alias_list {
            map.insert(*alias, *canonical);
        }
    }
    map
});

/// Separator-stripped keys for tolerant lookups. Ordered so that fuzzy
/// matching visits aliases deterministically.
static COMPACT_ALIAS_TO_CANONICAL: LazyLock<BTreeMap<String, &'static str>> =
    LazyLock::new(|| {
        let mut map = BTreeMap::new();
        let mut entries: Vec<_> = ALIAS_TO_CANONICAL.iter().collect();
        entries.sort();

        for (alias, canonical) in entries {
            map.entry(compact_key(alias)).or_insert(*canonical);
        }

        map
    });

/// Real technologies one edit away from a canonical skill. They are never
/// typo-corrected onto it.
static DISTINCT_TECHNOLOGIES: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "preact", "preactjs", "nestjs", "kotlinjs", "kotlinx", "postgis", "pandasai",
        "containerd", "jenkinsx",
    ]
    .into_iter()
    .collect()
});

fn nfkc_lower_trim(input: &str) -> String {
    input.nfkc().collect::<String>().trim().to_lowercase()
}

fn compact_key(input: &str) -> String {
    input
        .nfkc()
        .collect::<String>()
        .to_lowercase()
        .chars()
        .filter(|c| !matches!(c, ' ' | '.' | '-' | '_' | '/' | ','))
        .collect()
}

fn match_canonical_token(token: &str) -> Option<String> {
    if token.is_empty() {
        return None;
    }

    if let Some(canonical) = ALIAS_TO_CANONICAL.get(token) {
        return Some(canonical.to_string());
    }

    let compact = compact_key(token);
    if let Some(canonical) = COMPACT_ALIAS_TO_CANONICAL.get(&compact) {
        return Some((*canonical).to_string());
    }

    if DISTINCT_TECHNOLOGIES.contains(compact.as_str()) {
        return None;
    }
    fuzzy_match_canonical(&compact)
}

fn split_segments(input: &str) -> impl Iterator<Item = String> + '_ {
    input
        .split(|c: char| matches!(c, '/' | ',' | ';' | '|' | '(' | ')'))
        .map(nfkc_lower_trim)
        .filter(|s| !s.is_empty())
}

fn fuzzy_match_canonical(compact: &str) -> Option<String> {
    // Short tokens (java, rust, sql) are only matched exactly.
    if compact.len() < 5 {
        return None;
    }

    let mut best: Option<(&str, usize)> = None;
    for (alias, canonical) in COMPACT_ALIAS_TO_CANONICAL.iter() {
        if alias.len() < 5 || canonical.len() < 5 {
            continue;
        }

        // "p" + "react" is another word, not a typo.
        if compact.len() == alias.len() + 1 && compact.ends_with(alias.as_str()) {
            continue;
        }

        let distance = damerau_levenshtein(compact, alias);
        let len = compact.len().max(alias.len());
        let acceptable = distance == 1 || (len >= 8 && distance == 2);
        if !acceptable {
            continue;
        }

        match best {
            None => best = Some((*canonical, distance)),
            Some((_, best_dist)) if distance < best_dist => best = Some((*canonical, distance)),
            _ => {}
        }
    }

    best.map(|(canonical, _)| canonical.to_string())
}

/// Canonical form of a skill name.
///
/// Exact alias → separator-insensitive alias → fuzzy (typo) match → the
/// individual segments of "Python / Django" style entries → lower-cased input.
pub fn normalize_skill(skill: &str) -> String {
    let normalized = nfkc_lower_trim(skill);
    if let Some(canonical) = match_canonical_token(&normalized) {
        return canonical;
    }

    for segment in split_segments(skill) {
        if segment == normalized {
            continue;
        }
        if let Some(canonical) = match_canonical_token(&segment) {
            return canonical;
        }
    }

    normalized
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn case_and_alias_equivalence() {
        assert_eq!(normalize_skill("JavaScript"), "javascript");
        assert_eq!(normalize_skill("js"), "javascript");
        assert_eq!(normalize_skill("K8s"), "kubernetes");
        assert_eq!(normalize_skill("C#"), "csharp");
        assert_eq!(normalize_skill("Postgres"), "postgresql");
        assert_eq!(normalize_skill("Python 3"), "python");
    }

    #[test]
    fn normalizes_fullwidth_and_separators() {
        assert_eq!(normalize_skill("ＡＷＳ"), "aws");
        assert_eq!(normalize_skill("Node.JS"), "nodejs");
        assert_eq!(normalize_skill("React.js"), "react");
        assert_eq!(normalize_skill("Python / Django"), "python");
    }

    #[test]
    fn tolerates_small_typos_for_known_aliases() {
        assert_eq!(normalize_skill("javascirpt"), "javascript");
        assert_eq!(normalize_skill("pytroch"), "pytorch");
        assert_eq!(normalize_skill("kuberntes"), "kubernetes");
    }

    #[test]
    fn does_not_fuzz_short_tokens() {
        assert_eq!(normalize_skill("javaa"), "javaa");
        assert_eq!(normalize_skill("rustt"), "rustt");
        assert_eq!(normalize_skill("x"), "x");
    }

    #[test]
    fn unknown_skill_lowercases() {
        assert_eq!(normalize_skill("MyCustomFramework"), "mycustomframework");
    }

    #[test]
    fn neighbouring_technologies_stay_distinct() {
        assert_eq!(normalize_skill("Preact"), "preact");
        assert_eq!(normalize_skill("NestJS"), "nestjs");
        assert_eq!(normalize_skill("PostGIS"), "postgis");
        assert_eq!(normalize_skill("xreact"), "xreact");
        assert_eq!(normalize_skill("reactt"), "react");
    }
}
