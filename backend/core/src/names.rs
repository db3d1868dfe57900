//! Strategy names, in default priority order.

pub const YOUTUBE: &str = "youtube";
pub const GITHUB: &str = "github";
pub const UNSHORTENER: &str = "unshortener";
pub const OPENGRAPH: &str = "opengraph";

/// Every known strategy, fallback last.
pub const ALL: [&str; 4] = [YOUTUBE, GITHUB, UNSHORTENER, OPENGRAPH];

pub fn is_known(name: &str) -> bool {
    ALL.contains(&name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_names_are_exact() {
        assert!(is_known("opengraph"));
        assert!(!is_known("OpenGraph"));
        assert!(!is_known("vimeo"));
        assert_eq!(ALL.last(), Some(&OPENGRAPH));
    }
}
