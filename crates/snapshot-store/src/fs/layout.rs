use std::path::{Path, PathBuf};

pub const TASK_SLUG_MAX: usize = 80;
pub const DESCRIPTION_SLUG_MAX: usize = 70;
pub const METADATA_FILE: &str = "metadata.json";

/// Lowercase ASCII alphanumerics with single dashes between runs.
pub fn slugify(raw: &str) -> String {
    let mut slug = String::with_capacity(raw.len());
    let mut pending_dash = false;
    for ch in raw.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(ch.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }
    if slug.is_empty() {
        slug.push_str("untitled");
    }
    slug
}

/// First `max` characters of `value`.
pub fn truncate_chars(value: &str, max: usize) -> &str {
    match value.char_indices().nth(max) {
        Some((end, _)) => &value[..end],
        None => value,
    }
}

pub fn task_dir(out_root: &Path, app: &str, task: &str) -> PathBuf {
    let slug = slugify(task);
    out_root.join(app).join(truncate_chars(&slug, TASK_SLUG_MAX))
}

pub fn screenshot_path(
    out_root: &Path,
    app: &str,
    task: &str,
    index: u32,
    description: &str,
) -> PathBuf {
    let slug = slugify(description);
    let name = format!(
        "step-{index:02}-{}.png",
        truncate_chars(&slug, DESCRIPTION_SLUG_MAX)
    );
    task_dir(out_root, app, task).join(name)
}

pub fn metadata_path(out_root: &Path, app: &str, task: &str) -> PathBuf {
    task_dir(out_root, app, task).join(METADATA_FILE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_collapses_separators() {
        assert_eq!(slugify("Navigate to Notion workspace"), "navigate-to-notion-workspace");
        assert_eq!(slugify("  --Filter: by   status!! "), "filter-by-status");
        assert_eq!(slugify("Créer une page"), "cr-er-une-page");
    }

    #[test]
    fn empty_slug_becomes_untitled() {
        assert_eq!(slugify(""), "untitled");
        assert_eq!(slugify("???"), "untitled");
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("abc", 10), "abc");
    }

    #[test]
    fn paths_follow_the_dataset_layout() {
        let root = Path::new("dataset");
        let path = screenshot_path(root, "linear", "Filter issues by status", 3, "Open filter menu");
        assert_eq!(
            path,
            Path::new("dataset/linear/filter-issues-by-status/step-03-open-filter-menu.png")
        );
        assert_eq!(
            metadata_path(root, "linear", "Filter issues by status"),
            Path::new("dataset/linear/filter-issues-by-status/metadata.json")
        );
    }

    #[test]
    fn long_names_are_cut() {
        let task = "word ".repeat(40);
        let dir = task_dir(Path::new("out"), "trello", &task);
        let slug = dir.file_name().unwrap().to_str().unwrap();
        assert_eq!(slug.chars().count(), TASK_SLUG_MAX);

        let desc = "x".repeat(200);
        let shot = screenshot_path(Path::new("out"), "trello", "t", 12, &desc);
        let name = shot.file_name().unwrap().to_str().unwrap();
        assert_eq!(name.len(), "step-12-".len() + DESCRIPTION_SLUG_MAX + ".png".len());
    }
}
