const LEADING_TRIM: &[char] = &['"', '\'', '`', '(', '[', '{', '<'];
const TRAILING_TRIM: &[char] = &['"', '\'', '`', ')', ']', '}', '>', ',', ';', ':', '!', '?'];
const FORBIDDEN: &[char] = &['"', '\'', '<', '>', '*', '?', '|'];

#[derive(Debug, Clone, Default)]
pub struct InstructionParser {
    prefixes: Vec<String>,
}

impl InstructionParser {
    pub fn new<I, S>(prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            prefixes: prefixes.into_iter().map(Into::into).collect(),
        }
    }

    /// Lazily yields every reference candidate in `content`, in order and
    /// without deduplication. Call again to restart the scan.
    pub fn extract_references<'a>(&'a self, content: &'a str) -> References<'a> {
        References {
            parser: self,
            tokens: content.split_whitespace(),
        }
    }

    fn is_candidate(&self, token: &str) -> bool {
        if token.starts_with("./") || token.starts_with("../") || token.starts_with('/') {
            return true;
        }
        self.prefixes.iter().any(|prefix| {
            token
                .strip_prefix(prefix.as_str())
                .is_some_and(|rest| rest.starts_with('/'))
        })
    }
}

pub struct References<'a> {
    parser: &'a InstructionParser,
    tokens: std::str::SplitWhitespace<'a>,
}

impl<'a> Iterator for References<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        for raw in self.tokens.by_ref() {
            let token = clean_token(raw);
            if token.is_empty() || !self.parser.is_candidate(token) || is_bare_marker(token) {
                continue;
            }
            return Some(token);
        }
        None
    }
}

fn clean_token(raw: &str) -> &str {
    let token = raw.trim_start_matches(LEADING_TRIM);
    let token = match token.find(FORBIDDEN) {
        Some(end) => &token[..end],
        None => token,
    };
    let token = token.trim_end_matches(TRAILING_TRIM);
    strip_sentence_period(token)
}

// "see ./b.txt." ends a sentence, "./" and "../" do not.
fn strip_sentence_period(token: &str) -> &str {
    let mut token = token;
    while let Some(rest) = token.strip_suffix('.') {
        if rest.is_empty() || rest.ends_with('.') || rest.ends_with('/') {
            break;
        }
        token = rest;
    }
    token
}

fn is_bare_marker(token: &str) -> bool {
    token
        .trim_end_matches('/')
        .chars()
        .all(|c| c == '.' || c == '/')
}
