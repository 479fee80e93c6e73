//! Storage identifiers to API identifiers
//!
//! Tables are snake_case and usually plural (`user_roles`), types are
//! PascalCase singular (`UserRole`), fields are camelCase.
//!
//! Pluralization is an English heuristic: regular suffix rules, a short
//! irregular list and a handful of uncountable nouns. Words outside that
//! ruleset (e.g. `movies` → `Movy`) are a known limitation.

use convert_case::{Case, Casing};

const UNCOUNTABLE: &[&str] = &[
    "data",
    "equipment",
    "fish",
    "information",
    "metadata",
    "news",
    "series",
    "sheep",
    "species",
];

/// (singular, plural)
const IRREGULAR: &[(&str, &str)] = &[
    ("person", "people"),
    ("child", "children"),
    ("man", "men"),
    ("woman", "women"),
    ("mouse", "mice"),
    ("goose", "geese"),
    ("tooth", "teeth"),
    ("foot", "feet"),
];

/// `posts` → `Post`, `user_roles` → `UserRole`
pub fn table_name_to_type_name(table: &str) -> String {
    singularize(&table.to_case(Case::Pascal))
}

/// `user_id` → `userId`
pub fn column_name_to_field_name(column: &str) -> String {
    column.to_case(Case::Camel)
}

/// `posts` → `posts`, `user_role` → `userRoles`
pub fn table_name_to_collection_field_name(table: &str) -> String {
    pluralize(&table.to_case(Case::Camel))
}

/// `users` → `user`, `user_roles` → `userRole`
pub fn table_name_to_singular_field_name(table: &str) -> String {
    singularize(&table.to_case(Case::Camel))
}

/// `reviewer_id` → `reviewer`; used when belongs-to fields are named after
/// the foreign key column instead of the referenced table
pub fn foreign_key_column_to_field_name(column: &str) -> String {
    let lowered = column.to_ascii_lowercase();
    let stem = if lowered.len() > 3 && lowered.ends_with("_id") {
        &column[..column.len() - 3]
    } else if lowered.len() > 2 && lowered.ends_with("id") && column.ends_with("Id") {
        &column[..column.len() - 2]
    } else {
        column
    };
    stem.to_case(Case::Camel)
}

/// GraphQL names match `[_A-Za-z][_0-9A-Za-z]*`
pub fn is_valid_graphql_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first == '_' || first.is_ascii_alphabetic() => {
            chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
        }
        _ => false,
    }
}

/// Singularize the trailing word of an identifier
pub fn singularize(word: &str) -> String {
    let lower = word.to_ascii_lowercase();

    if UNCOUNTABLE.iter().any(|u| ends_with_word(word, u)) {
        return word.to_string();
    }

    for (singular, plural) in IRREGULAR {
        if ends_with_word(word, plural) {
            return replace_suffix(word, plural.len(), singular);
        }
        if ends_with_word(word, singular) {
            return word.to_string();
        }
    }

    if lower.len() > 3 && lower.ends_with("ies") {
        return replace_suffix(word, 3, "y");
    }

    for suffix in ["sses", "xes", "ches", "shes", "zes", "uses"] {
        if lower.ends_with(suffix) {
            return word[..word.len() - 2].to_string();
        }
    }

    if lower.ends_with("ss") || lower.ends_with("us") || lower.ends_with("is") {
        return word.to_string();
    }

    if lower.len() > 1 && lower.ends_with('s') {
        return word[..word.len() - 1].to_string();
    }

    word.to_string()
}

/// Pluralize the trailing word of an identifier; already-plural input is returned as is
pub fn pluralize(word: &str) -> String {
    let lower = word.to_ascii_lowercase();

    if UNCOUNTABLE.iter().any(|u| ends_with_word(word, u)) {
        return word.to_string();
    }

    for (singular, plural) in IRREGULAR {
        if ends_with_word(word, plural) {
            return word.to_string();
        }
        if ends_with_word(word, singular) {
            return replace_suffix(word, singular.len(), plural);
        }
    }

    if singularize(word) != word {
        return word.to_string();
    }

    if lower.ends_with("is") && lower.len() > 2 {
        return replace_suffix(word, 2, "es");
    }

    if lower.ends_with('y') && lower.len() > 1 {
        let before = lower.as_bytes()[lower.len() - 2];
        if !matches!(before, b'a' | b'e' | b'i' | b'o' | b'u') {
            return replace_suffix(word, 1, "ies");
        }
    }

    if ["s", "x", "z", "ch", "sh"].iter().any(|s| lower.ends_with(s)) {
        return format!("{}es", word);
    }

    format!("{}s", word)
}

/// `suffix` is the whole trailing word: preceded by `_`, starting with an
/// uppercase letter, or the entire identifier (`SalesPeople`, but not `human`)
fn ends_with_word(word: &str, suffix: &str) -> bool {
    let lower = word.to_ascii_lowercase();
    if !lower.ends_with(suffix) {
        return false;
    }
    let cut = word.len() - suffix.len();
    if cut == 0 {
        return true;
    }
    word[..cut].ends_with('_') || word[cut..].starts_with(|c: char| c.is_uppercase())
}

/// Swap the last `len` bytes for `replacement`, keeping the case of the
/// replaced suffix's first letter
fn replace_suffix(word: &str, len: usize, replacement: &str) -> String {
    let cut = word.len() - len;
    let (head, tail) = word.split_at(cut);
    let capitalize = tail.chars().next().is_some_and(|c| c.is_uppercase());

    let mut out = String::with_capacity(head.len() + replacement.len());
    out.push_str(head);
    if capitalize {
        let mut chars = replacement.chars();
        if let Some(first) = chars.next() {
            out.extend(first.to_uppercase());
            out.push_str(chars.as_str());
        }
    } else {
        out.push_str(replacement);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_names() {
        assert_eq!(table_name_to_type_name("posts"), "Post");
        assert_eq!(table_name_to_type_name("user_roles"), "UserRole");
        assert_eq!(table_name_to_type_name("categories"), "Category");
        assert_eq!(table_name_to_type_name("addresses"), "Address");
        assert_eq!(table_name_to_type_name("people"), "Person");
        assert_eq!(table_name_to_type_name("sales_people"), "SalesPerson");
        assert_eq!(table_name_to_type_name("status"), "Status");
    }

    #[test]
    fn test_field_names() {
        assert_eq!(column_name_to_field_name("user_id"), "userId");
        assert_eq!(column_name_to_field_name("title"), "title");
        assert_eq!(column_name_to_field_name("created_at"), "createdAt");
    }

    #[test]
    fn test_collection_names() {
        assert_eq!(table_name_to_collection_field_name("posts"), "posts");
        assert_eq!(table_name_to_collection_field_name("user_role"), "userRoles");
        assert_eq!(table_name_to_collection_field_name("category"), "categories");
        assert_eq!(table_name_to_collection_field_name("box"), "boxes");
        assert_eq!(table_name_to_collection_field_name("status"), "statuses");
        assert_eq!(table_name_to_collection_field_name("person"), "people");
        assert_eq!(table_name_to_collection_field_name("day"), "days");
    }

    #[test]
    fn test_singular_field_names() {
        assert_eq!(table_name_to_singular_field_name("users"), "user");
        assert_eq!(table_name_to_singular_field_name("user_roles"), "userRole");
        assert_eq!(table_name_to_singular_field_name("statuses"), "status");
    }

    #[test]
    fn test_foreign_key_column_names() {
        assert_eq!(foreign_key_column_to_field_name("reviewer_id"), "reviewer");
        assert_eq!(foreign_key_column_to_field_name("authorId"), "author");
        assert_eq!(foreign_key_column_to_field_name("owner"), "owner");
    }

    #[test]
    fn test_normalization_is_idempotent() {
        for table in ["posts", "user_roles", "categories", "people", "addresses", "status"] {
            let once = table_name_to_type_name(table);
            assert_eq!(table_name_to_type_name(&once), once, "type name of {}", table);

            let once = table_name_to_collection_field_name(table);
            assert_eq!(table_name_to_collection_field_name(&once), once, "collection of {}", table);

            let once = table_name_to_singular_field_name(table);
            assert_eq!(table_name_to_singular_field_name(&once), once, "singular of {}", table);
        }

        for column in ["user_id", "title", "created_at"] {
            let once = column_name_to_field_name(column);
            assert_eq!(column_name_to_field_name(&once), once);
        }
    }

    #[test]
    fn test_irregulars_only_match_whole_words() {
        assert_eq!(pluralize("human"), "humans");
        assert_eq!(singularize("women"), "woman");
    }

    #[test]
    fn test_uncountable_words_are_untouched() {
        assert_eq!(singularize("metadata"), "metadata");
        assert_eq!(pluralize("news"), "news");
    }

    #[test]
    fn test_graphql_name_validity() {
        assert!(is_valid_graphql_name("userId"));
        assert!(is_valid_graphql_name("_internal"));
        assert!(!is_valid_graphql_name(""));
        assert!(!is_valid_graphql_name("2Fa"));
        assert!(!is_valid_graphql_name("näme"));
    }
}
