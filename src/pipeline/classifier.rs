/// Rough tokens-per-word ratio for sub-word tokenizers.
const TOKENS_PER_WORD: usize = 2;

#[derive(Debug, Clone, Copy)]
pub struct SizeClassifier {
    token_limit: usize,
}

impl SizeClassifier {
    pub fn new(token_limit: usize) -> Self {
        Self { token_limit }
    }

    pub fn estimate_tokens(body: &str) -> usize {
        body.split_whitespace().count() * TOKENS_PER_WORD
    }

    pub fn is_oversized(&self, body: &str) -> bool {
        Self::estimate_tokens(body) >= self.token_limit
    }
}
