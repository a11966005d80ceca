//! Content-Type guessing for uploads

/// Picks a `Content-Type` for a key when the caller supplies none.
pub trait MimeGuesser: Send + Sync {
    fn guess(&self, key: &str) -> String;
}

/// Guesses from the key's file extension, falling back to
/// `application/octet-stream`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ExtensionMimeGuesser;

impl MimeGuesser for ExtensionMimeGuesser {
    fn guess(&self, key: &str) -> String {
        mime_guess::from_path(key)
            .first_or_octet_stream()
            .essence_str()
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guess_by_extension() {
        let guesser = ExtensionMimeGuesser;
        assert_eq!(guesser.guess("photos/cat.png"), "image/png");
        assert_eq!(guesser.guess("index.html"), "text/html");
        assert_eq!(guesser.guess("blob"), "application/octet-stream");
    }
}
