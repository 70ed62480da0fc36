//! Machine-safe name derivation for map labels.

/// Lowercase the label and collapse whitespace runs into single underscores.
pub fn slugify(label: &str) -> String {
    let mut slug = String::with_capacity(label.len());
    let mut pending_sep = false;
    for ch in label.trim().chars() {
        if ch.is_whitespace() {
            pending_sep = !slug.is_empty();
        } else {
            if pending_sep {
                slug.push('_');
                pending_sep = false;
            }
            slug.extend(ch.to_lowercase());
        }
    }
    slug
}

/// Derived artifact name for a map's stored scan.
pub fn file_name_for(slug: &str) -> String {
    format!("{slug}.png")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowercases_and_underscores() {
        assert_eq!(slugify("Husky Depot Map"), "husky_depot_map");
        assert_eq!(slugify("Depot"), "depot");
    }

    #[test]
    fn collapses_whitespace_runs() {
        assert_eq!(slugify("  Warehouse   Layout \t B "), "warehouse_layout_b");
    }

    #[test]
    fn empty_label_gives_empty_slug() {
        assert_eq!(slugify("   "), "");
    }

    #[test]
    fn derived_file_name() {
        assert_eq!(file_name_for("depot"), "depot.png");
    }
}
