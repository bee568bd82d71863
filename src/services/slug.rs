// src/services/slug.rs
// DOCUMENTATION: URL slugs for albums, series and tags

const MAX_SLUG_LEN: usize = 120;

/// Lowercase ASCII slug: alphanumerics kept, everything else folded into
/// single dashes. Common Latin accents are transliterated.
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut pending_dash = false;

    for c in input.chars().flat_map(fold_accent) {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
        if slug.len() >= MAX_SLUG_LEN {
            break;
        }
    }

    slug.truncate(MAX_SLUG_LEN);
    slug.trim_end_matches('-').to_string()
}

/// Slug for user input, or None if nothing usable remains
pub fn slugify_non_empty(input: &str) -> Option<String> {
    let slug = slugify(input);
    (!slug.is_empty()).then_some(slug)
}

fn fold_accent(c: char) -> Vec<char> {
    let folded = match c {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' | 'À' | 'Á' | 'Â' | 'Ã' | 'Ä' | 'Å' => "a",
        'æ' | 'Æ' => "ae",
        'ç' | 'Ç' => "c",
        'è' | 'é' | 'ê' | 'ë' | 'È' | 'É' | 'Ê' | 'Ë' => "e",
        'ì' | 'í' | 'î' | 'ï' | 'Ì' | 'Í' | 'Î' | 'Ï' => "i",
        'ñ' | 'Ñ' => "n",
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' | 'Ò' | 'Ó' | 'Ô' | 'Õ' | 'Ö' | 'Ø' => "o",
        'ù' | 'ú' | 'û' | 'ü' | 'Ù' | 'Ú' | 'Û' | 'Ü' => "u",
        'ý' | 'ÿ' | 'Ý' => "y",
        'ß' => "ss",
        other => return vec![other],
    };
    folded.chars().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify_basic() {
        assert_eq!(slugify("Iceland 2023"), "iceland-2023");
        assert_eq!(slugify("  Black & White -- Street  "), "black-white-street");
        assert_eq!(slugify("Café Señor Größe"), "cafe-senor-grosse");
    }

    #[test]
    fn test_slugify_empty_and_symbols() {
        assert_eq!(slugify("!!!"), "");
        assert_eq!(slugify_non_empty("???"), None);
        assert_eq!(slugify_non_empty("Night"), Some("night".to_string()));
    }

    #[test]
    fn test_slugify_caps_length() {
        let slug = slugify(&"word ".repeat(100));
        assert!(slug.len() <= 120);
        assert!(!slug.ends_with('-'));
    }
}
