//! URL extraction, used by feature plugins that react to
//! links in channel chatter (e.g. title-fetching) without owning their own
//! URL-finding logic.

const TRAILING_PUNCTUATION: &[char] = &['.', ',', '?', ':', '!', ';'];

/// Finds every `http(s)://` URL in `text`, trimming trailing punctuation
/// that's more likely to be sentence structure than part of the URL.
pub fn find_urls(text: &str) -> Vec<String> {
    text.split_whitespace()
    .filter(|word| word.starts_with("http://") || word.starts_with("https://"))
    .map(|word| word.trim_end_matches(TRAILING_PUNCTUATION).to_owned())
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_trailing_punctuation_from_each_url() {
        let urls = find_urls("nyaa is now at https://nyaa.si, https://nyaa.si? https://nyaa.si.");
        assert_eq!(urls, vec!["https://nyaa.si", "https://nyaa.si", "https://nyaa.si"]);
    }

    #[test]
    fn ignores_words_without_a_scheme() {
        let urls = find_urls("visit nyaa.si for more");
        assert!(urls.is_empty());
    }

    #[test]
    fn keeps_meaningful_trailing_slash() {
        let urls = find_urls("see https://nyaa.si/view/123");
        assert_eq!(urls, vec!["https://nyaa.si/view/123"]);
    }
}
