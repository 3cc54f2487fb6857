//! Word-level bigram language model.
//!
//! Weights are successor counts: for every token, how often each other token
//! followed it in the training corpus. The end-of-text marker is an ordinary
//! token that separates documents, and the corpus is treated as if it began
//! with one, so its successors form the document-start distribution.

use rand::Rng;
use std::collections::HashMap;

use super::sampling::sample_index;
use crate::generation::END_OF_TEXT;

pub type TokenId = u32;

#[derive(Debug)]
pub struct BigramModel {
    vocab: Vec<String>,
    index: HashMap<String, TokenId>,
    /// prev token -> (next token, count)
    transitions: HashMap<TokenId, Vec<(TokenId, u32)>>,
    end_of_text: TokenId,
}

impl BigramModel {
    /// Build the successor table from raw corpus text.
    pub fn from_corpus(text: &str) -> Result<Self, String> {
        let mut model = Self {
            vocab: vec![END_OF_TEXT.to_string()],
            index: HashMap::from([(END_OF_TEXT.to_string(), 0)]),
            transitions: HashMap::new(),
            end_of_text: 0,
        };

        let mut counts: HashMap<(TokenId, TokenId), u32> = HashMap::new();
        let mut prev = model.end_of_text;
        let spaced = text.replace(END_OF_TEXT, &format!(" {} ", END_OF_TEXT));
        for word in spaced.split_whitespace() {
            let id = model.intern(word);
            *counts.entry((prev, id)).or_insert(0) += 1;
            prev = id;
        }

        for ((from, to), count) in counts {
            model.transitions.entry(from).or_default().push((to, count));
        }
        // Fixed successor order keeps seeded runs reproducible
        for successors in model.transitions.values_mut() {
            successors.sort_unstable();
        }

        if model.vocab.len() == 1 {
            return Err("corpus contains no text".to_string());
        }

        Ok(model)
    }

    fn intern(&mut self, word: &str) -> TokenId {
        if let Some(&id) = self.index.get(word) {
            return id;
        }
        let id = self.vocab.len() as TokenId;
        self.vocab.push(word.to_string());
        self.index.insert(word.to_string(), id);
        id
    }

    fn successors(&self, token: TokenId) -> &[(TokenId, u32)] {
        self.transitions.get(&token).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of distinct tokens, including the end-of-text marker
    pub fn vocab_size(&self) -> usize {
        self.vocab.len()
    }

    /// Echo `prompt` and append `length` sampled tokens.
    pub fn continue_prompt<R: Rng + ?Sized>(
        &self,
        prompt: &str,
        length: usize,
        temperature: f64,
        top_p: f64,
        rng: &mut R,
    ) -> String {
        let mut out = prompt.to_string();

        let mut prev = prompt
            .split_whitespace()
            .last()
            .and_then(|word| self.index.get(word).copied())
            .unwrap_or(self.end_of_text);

        for _ in 0..length {
            let mut successors = self.successors(prev);
            if successors.is_empty() {
                // Dead end (last corpus token): start a fresh document
                successors = self.successors(self.end_of_text);
            }

            let logits: Vec<f64> = successors.iter().map(|(_, c)| (*c as f64).ln()).collect();
            let Some(choice) = sample_index(&logits, temperature, top_p, rng) else {
                break;
            };
            let next = successors[choice].0;

            let word = &self.vocab[next as usize];
            if next != self.end_of_text
                && !out.is_empty()
                && !out.ends_with(char::is_whitespace)
                && !out.ends_with(END_OF_TEXT)
            {
                out.push(' ');
            }
            out.push_str(word);
            prev = next;
        }

        out
    }
}
