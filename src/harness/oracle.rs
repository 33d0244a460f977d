use thiserror::Error;

/// The emulator's stdout could not be read as a single hash token.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedOutput {
    #[error("emulator produced no output")]
    Empty,
    #[error("emulator output is not valid UTF-8")]
    InvalidUtf8,
    #[error("expected a single hash token, got {count} tokens: {output:?}")]
    MultipleTokens { count: usize, output: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashVerdict {
    pub matched: bool,
    pub observed: String,
}

pub struct HashOracle;

impl HashOracle {
    // Golden hashes are opaque tokens: no case folding or numeric interpretation.
    pub fn normalize(output: &[u8]) -> Result<String, MalformedOutput> {
        let text = std::str::from_utf8(output).map_err(|_| MalformedOutput::InvalidUtf8)?;
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(MalformedOutput::Empty);
        }

        let count = trimmed.split_whitespace().count();
        if count > 1 {
            return Err(MalformedOutput::MultipleTokens {
                count,
                output: trimmed.to_owned(),
            });
        }

        Ok(trimmed.to_owned())
    }

    pub fn check(output: &[u8], expected: &str) -> Result<HashVerdict, MalformedOutput> {
        let observed = Self::normalize(output)?;
        Ok(HashVerdict {
            matched: observed == expected,
            observed,
        })
    }
}
